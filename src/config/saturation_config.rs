// ==========================================
// 学位市场饱和度分析 - 饱和度配置
// ==========================================
// 职责: 加载器与引擎共用的配置项（含默认值）
// 存储: config_kv（scope_id='global'，每个字段一个 key，值为 JSON）
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 饱和度配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaturationConfig {
    /// 对照表权重合计容差（|sum - 1| <= tolerance 视为合规）
    #[serde(default = "default_weight_tolerance")]
    pub weight_tolerance: f64,

    /// 替代学位的最小余弦相似度
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// 替代学位默认返回个数
    #[serde(default = "default_alternatives_k")]
    pub default_alternatives_k: usize,

    /// 保留的 IPEDS 学历层次（5=学士, 7=硕士）；为空表示不过滤
    #[serde(default = "default_award_levels")]
    pub award_levels: Vec<i64>,

    /// 高度饱和阈值（score > 此值）
    #[serde(default = "default_high_saturation_threshold")]
    pub high_saturation_threshold: f64,

    /// 未饱和阈值（score < 此值）
    #[serde(default = "default_low_saturation_threshold")]
    pub low_saturation_threshold: f64,

    /// 市场景气判定中的“过度饱和”阈值
    #[serde(default = "default_sentiment_high_threshold")]
    pub sentiment_high_threshold: f64,

    /// 岗位增长率阈值（高于此值视为稳步增长）
    #[serde(default = "default_growth_threshold")]
    pub growth_threshold: f64,

    /// 替代学位是否必须严格低于查询学位的饱和度
    #[serde(default)]
    pub only_less_saturated_alternatives: bool,

    /// 学位路径查找表（原始标签 → 规范学位路径）；为空则直通
    #[serde(default)]
    pub degree_lookup: BTreeMap<String, String>,

    /// 职业代码查找表（原始代码 → 规范 SOC 代码）；为空则直通
    #[serde(default)]
    pub occupation_lookup: BTreeMap<String, String>,
}

fn default_weight_tolerance() -> f64 {
    0.01
}

fn default_similarity_threshold() -> f64 {
    0.3
}

fn default_alternatives_k() -> usize {
    3
}

fn default_award_levels() -> Vec<i64> {
    vec![5, 7]
}

fn default_high_saturation_threshold() -> f64 {
    1.5
}

fn default_low_saturation_threshold() -> f64 {
    0.8
}

fn default_sentiment_high_threshold() -> f64 {
    1.2
}

fn default_growth_threshold() -> f64 {
    0.05
}

impl Default for SaturationConfig {
    fn default() -> Self {
        Self {
            weight_tolerance: default_weight_tolerance(),
            similarity_threshold: default_similarity_threshold(),
            default_alternatives_k: default_alternatives_k(),
            award_levels: default_award_levels(),
            high_saturation_threshold: default_high_saturation_threshold(),
            low_saturation_threshold: default_low_saturation_threshold(),
            sentiment_high_threshold: default_sentiment_high_threshold(),
            growth_threshold: default_growth_threshold(),
            only_less_saturated_alternatives: false,
            degree_lookup: BTreeMap::new(),
            occupation_lookup: BTreeMap::new(),
        }
    }
}

impl SaturationConfig {
    /// 校验配置取值范围
    pub fn validate(&self) -> Result<(), String> {
        if !(self.weight_tolerance.is_finite() && self.weight_tolerance >= 0.0) {
            return Err(format!("weight_tolerance 非法: {}", self.weight_tolerance));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(format!(
                "similarity_threshold 超出 [0, 1]: {}",
                self.similarity_threshold
            ));
        }
        if self.low_saturation_threshold > self.high_saturation_threshold {
            return Err(format!(
                "low_saturation_threshold ({}) 大于 high_saturation_threshold ({})",
                self.low_saturation_threshold, self.high_saturation_threshold
            ));
        }
        Ok(())
    }
}
