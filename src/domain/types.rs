// ==========================================
// 学位市场饱和度分析 - 领域类型定义
// ==========================================
// 职责: 饱和度标签、市场景气、数据表类别等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 饱和度标签 (Saturation Tag)
// ==========================================
// 阈值来自配置: high_saturation_threshold / low_saturation_threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaturationTag {
    HighlySaturated,     // 高度饱和
    ModeratelySaturated, // 中度饱和
    Unsaturated,         // 未饱和
    Unknown,             // 无法判定
}

impl fmt::Display for SaturationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaturationTag::HighlySaturated => write!(f, "HIGHLY_SATURATED"),
            SaturationTag::ModeratelySaturated => write!(f, "MODERATELY_SATURATED"),
            SaturationTag::Unsaturated => write!(f, "UNSATURATED"),
            SaturationTag::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ==========================================
// 市场景气 (Market Sentiment)
// ==========================================
// 由饱和度 + 岗位增长率共同判定，文案由展示层负责
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketSentiment {
    Oversaturated,          // 过度饱和，入门岗位竞争激烈
    Undersaturated,         // 供给不足，对应届生更友好
    NearlySaturatedGrowing, // 接近饱和但岗位稳步增长
    SaturatedStagnant,      // 饱和且无明显扩张
}

impl fmt::Display for MarketSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketSentiment::Oversaturated => write!(f, "OVERSATURATED"),
            MarketSentiment::Undersaturated => write!(f, "UNDERSATURATED"),
            MarketSentiment::NearlySaturatedGrowing => write!(f, "NEARLY_SATURATED_GROWING"),
            MarketSentiment::SaturatedStagnant => write!(f, "SATURATED_STAGNANT"),
        }
    }
}

// ==========================================
// 数据表类别 (Dataset Kind)
// ==========================================
// 用途: DQ 报告、导入批次统计按表归类
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Degrees,    // 毕业生人数（IPEDS）
    Jobs,       // 岗位空缺预测（BLS）
    Crosswalk,  // 学位→职业对照表
    Employment, // 职业就业人数（可选）
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Degrees => "degrees",
            DatasetKind::Jobs => "jobs",
            DatasetKind::Crosswalk => "crosswalk",
            DatasetKind::Employment => "employment",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
