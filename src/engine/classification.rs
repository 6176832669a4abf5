// ==========================================
// 学位市场饱和度分析 - 饱和度分类与市场展望
// ==========================================
// 职责:
// - 饱和度标签（高度饱和/中度饱和/未饱和/未知）
// - CIP 大类名称
// - 市场景气（饱和度 + 岗位增长率）
// - 学位展望（以上各项打包）
// ==========================================

use crate::config::SaturationConfig;
use crate::domain::saturation::DegreeOutlook;
use crate::domain::types::{MarketSentiment, SaturationTag};
use crate::engine::error::EngineResult;
use crate::engine::forecast::SupplyForecaster;
use crate::engine::saturation::SaturationEngine;
use crate::engine::snapshot::DatasetSnapshot;

pub const UNKNOWN_CIP_FAMILY: &str = "Unknown CIP Family";
pub const OTHER_CIP_FAMILY: &str = "Other/Specialized Fields";

/// CIP 两位大类代码 → 名称
const CIP_FAMILY_MAP: &[(&str, &str)] = &[
    ("01", "Agriculture & Veterinary Sciences"),
    ("03", "Natural Resources & Conservation"),
    ("04", "Architecture & Related Services"),
    ("05", "Area, Ethnic, Cultural, Gender Studies"),
    ("09", "Communication & Journalism"),
    ("10", "Communications Technologies"),
    ("11", "Computer & Information Sciences"),
    ("12", "Personal & Culinary Services"),
    ("13", "Education"),
    ("14", "Engineering"),
    ("15", "Engineering Technologies"),
    ("16", "Foreign Languages & Literatures"),
    ("19", "Family & Consumer Sciences"),
    ("22", "Legal Professions & Studies"),
    ("23", "English Language & Literature"),
    ("24", "Liberal Arts & Sciences"),
    ("25", "Library Science"),
    ("26", "Biological & Biomedical Sciences"),
    ("27", "Mathematics & Statistics"),
    ("29", "Military Technologies"),
    ("30", "Multi/Interdisciplinary Studies"),
    ("31", "Parks, Recreation, Leisure, Fitness"),
    ("38", "Philosophy & Religious Studies"),
    ("39", "Theology & Religious Vocations"),
    ("40", "Physical Sciences"),
    ("41", "Science Technologies"),
    ("42", "Psychology"),
    ("43", "Homeland Security, Law Enforcement"),
    ("44", "Public Administration & Social Service"),
    ("45", "Social Sciences"),
    ("46", "Construction Trades"),
    ("47", "Mechanic & Repair Technologies"),
    ("48", "Precision Production"),
    ("49", "Transportation & Materials Moving"),
    ("50", "Visual & Performing Arts"),
    ("51", "Health Professions"),
    ("52", "Business, Management, Marketing"),
    ("54", "History"),
];

/// CIP 大类名称
///
/// 取第一个 '.' 之前的部分，一位数补零；不在表中的标签归入 "Other/Specialized Fields"
pub fn cip_family(code: &str) -> &'static str {
    let code = code.trim();
    if code.chars().count() < 2 {
        return UNKNOWN_CIP_FAMILY;
    }

    let family = code.split('.').next().unwrap_or(code);
    let family = if family.len() == 1 {
        format!("0{}", family)
    } else {
        family.to_string()
    };

    CIP_FAMILY_MAP
        .iter()
        .find(|(key, _)| *key == family)
        .map(|(_, name)| *name)
        .unwrap_or(OTHER_CIP_FAMILY)
}

// ==========================================
// Classifier - 分类器（阈值来自配置）
// ==========================================
#[derive(Debug, Clone)]
pub struct Classifier {
    high_saturation_threshold: f64,
    low_saturation_threshold: f64,
    sentiment_high_threshold: f64,
    growth_threshold: f64,
}

impl Classifier {
    pub fn from_config(config: &SaturationConfig) -> Self {
        Self {
            high_saturation_threshold: config.high_saturation_threshold,
            low_saturation_threshold: config.low_saturation_threshold,
            sentiment_high_threshold: config.sentiment_high_threshold,
            growth_threshold: config.growth_threshold,
        }
    }

    /// 饱和度标签（+∞ 归入高度饱和）
    pub fn classify(&self, score: f64) -> SaturationTag {
        if score.is_nan() {
            SaturationTag::Unknown
        } else if score > self.high_saturation_threshold {
            SaturationTag::HighlySaturated
        } else if score < self.low_saturation_threshold {
            SaturationTag::Unsaturated
        } else {
            SaturationTag::ModeratelySaturated
        }
    }

    /// 市场景气（规则顺序执行，命中即返回）
    pub fn market_sentiment(&self, score: f64, growth: Option<f64>) -> Option<MarketSentiment> {
        if score.is_nan() {
            return None;
        }
        if score > self.sentiment_high_threshold {
            return Some(MarketSentiment::Oversaturated);
        }
        if score < self.low_saturation_threshold {
            return Some(MarketSentiment::Undersaturated);
        }
        if growth.is_some_and(|g| g > self.growth_threshold) {
            return Some(MarketSentiment::NearlySaturatedGrowing);
        }
        if score.is_finite() && score != 0.0 {
            return Some(MarketSentiment::SaturatedStagnant);
        }
        None
    }

    /// 学位市场展望
    ///
    /// base_year 缺省时取早于 year 的最早就业人数年份；没有则增长率为 None
    pub fn degree_outlook(
        &self,
        snapshot: &DatasetSnapshot,
        degree_path: &str,
        year: i32,
        base_year: Option<i32>,
    ) -> EngineResult<DegreeOutlook> {
        let record = SaturationEngine::new().compute_saturation(snapshot, degree_path, year)?;

        let base_year = base_year.or_else(|| {
            snapshot
                .employment_years()
                .into_iter()
                .find(|y| *y < year)
        });
        let job_growth_rate = match base_year {
            Some(base) => SupplyForecaster::new().job_growth_rate(snapshot, degree_path, base, year)?,
            None => None,
        };

        Ok(DegreeOutlook {
            tag: self.classify(record.score),
            family: cip_family(degree_path).to_string(),
            job_growth_rate,
            sentiment: self.market_sentiment(record.score, job_growth_rate),
            record,
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&SaturationConfig::default())
    }
}
