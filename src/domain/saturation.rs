// ==========================================
// 学位市场饱和度分析 - 饱和度派生模型
// ==========================================
// 职责: SaturationRecord 及其衍生查询结果
// 红线: 派生结果只在查询时计算，不落库
// ==========================================

use crate::domain::types::{MarketSentiment, SaturationTag};
use serde::{Deserialize, Serialize};

// ==========================================
// SaturationRecord - 饱和度记录
// ==========================================
// 不变式:
// - grad_count = 0            → score = 0
// - job_count = 0, grads > 0  → score = +∞（哨兵值，不是错误）
// - 其他                       → score = grad_count / job_count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaturationRecord {
    pub degree_path: String,
    pub year: i32,
    #[serde(with = "score_format")]
    pub score: f64,
    pub job_count: f64, // 加权岗位空缺数
    pub grad_count: u64,
}

impl SaturationRecord {
    /// 按不变式构造饱和度记录
    pub fn new(degree_path: impl Into<String>, year: i32, grad_count: u64, job_count: f64) -> Self {
        let score = if grad_count == 0 {
            0.0
        } else if job_count > 0.0 {
            grad_count as f64 / job_count
        } else {
            f64::INFINITY
        };

        Self {
            degree_path: degree_path.into(),
            year,
            score,
            job_count,
            grad_count,
        }
    }

    /// 是否为“无岗位”哨兵值
    pub fn is_unbounded(&self) -> bool {
        self.score.is_infinite()
    }
}

// ==========================================
// 分数序列化
// ==========================================
// serde_json 会把 inf 写成 null，这里显式输出 "Infinity"
pub mod score_format {
    use serde::{Deserialize, Deserializer, Serializer};

    pub const INFINITY_LITERAL: &str = "Infinity";

    pub fn serialize<S: Serializer>(score: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if score.is_infinite() && score.is_sign_positive() {
            serializer.serialize_str(INFINITY_LITERAL)
        } else {
            serializer.serialize_f64(*score)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ScoreRepr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match ScoreRepr::deserialize(deserializer)? {
            ScoreRepr::Number(v) => Ok(v),
            ScoreRepr::Text(s) if s.eq_ignore_ascii_case(INFINITY_LITERAL) || s == "inf" => {
                Ok(f64::INFINITY)
            }
            ScoreRepr::Text(s) => Err(serde::de::Error::custom(format!(
                "无法解析饱和度分数: {}",
                s
            ))),
        }
    }
}

// ==========================================
// SupplyForecast - 毕业生供给预测
// ==========================================
// 用途: 线性回归外推未来毕业生人数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyForecast {
    pub degree_path: String,
    pub current_year: i32,
    pub target_year: i32,
    pub predicted_graduates: u64,    // 预测毕业生人数（截断取整，不小于 0）
    pub growth_per_year: f64,        // 回归斜率（人/年）
    pub history: Vec<(i32, u64)>,    // 参与回归的历史点
    #[serde(with = "score_format")]
    pub projected_score: f64,        // 以 current_year 岗位数计算的预测饱和度
}

// ==========================================
// DegreeOutlook - 学位市场展望
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeOutlook {
    pub record: SaturationRecord,
    pub tag: SaturationTag,
    pub family: String,                      // CIP 大类名称
    pub job_growth_rate: Option<f64>,        // 就业人数增长率（无数据为 None）
    pub sentiment: Option<MarketSentiment>,
}
