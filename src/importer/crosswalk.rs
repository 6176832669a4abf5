// ==========================================
// 学位市场饱和度分析 - 对照表权重处理
// ==========================================
// 阶段 5: 学位→职业对照表聚合与权重校验
// 规则:
// - 同 (degree_path, occupation_code) 多行: 权重累加
// - 权重缺失: 按该学位剩余权重 (1 - 已给权重之和) 均分，记 WARNING
// - 权重合计偏离 1.0 超过容差: 按合计重新归一化，记 WARNING
// - 权重合计为 0: 无法归一化，整次加载失败
// ==========================================

use crate::domain::dataset::DegreeOccupationMapping;
use crate::domain::import::{DqLevel, DqViolation, RenormalizedMapping};
use crate::domain::types::DatasetKind;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::BTreeMap;

/// 已校验、已规范化的对照表行（权重可缺失）
#[derive(Debug, Clone, PartialEq)]
pub struct CrosswalkEntry {
    pub degree_path: String,
    pub occupation_code: String,
    pub weight: Option<f64>,
    pub row_number: usize,
}

/// 对照表处理结果
#[derive(Debug, Clone, Default)]
pub struct CrosswalkOutcome {
    pub mappings: Vec<DegreeOccupationMapping>,
    pub renormalized: Vec<RenormalizedMapping>,
    pub violations: Vec<DqViolation>,
}

pub struct CrosswalkBuilder {
    tolerance: f64,
}

impl CrosswalkBuilder {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn build(&self, entries: Vec<CrosswalkEntry>) -> ImportResult<CrosswalkOutcome> {
        // degree_path → occupation_code → 累加权重（None 表示所有重复行都缺失权重）
        let mut grouped: BTreeMap<String, BTreeMap<String, Option<f64>>> = BTreeMap::new();
        for entry in entries {
            let slot = grouped
                .entry(entry.degree_path)
                .or_default()
                .entry(entry.occupation_code)
                .or_insert(None);
            *slot = match (*slot, entry.weight) {
                (Some(a), Some(b)) => Some(a + b),
                (Some(a), None) => Some(a),
                (None, w) => w,
            };
        }

        let mut outcome = CrosswalkOutcome::default();
        for (degree_path, occupations) in grouped {
            let weights = self.resolve_degree(&degree_path, occupations, &mut outcome)?;
            outcome
                .mappings
                .extend(weights.into_iter().map(|(occupation_code, weight)| {
                    DegreeOccupationMapping {
                        degree_path: degree_path.clone(),
                        occupation_code,
                        weight,
                    }
                }));
        }

        Ok(outcome)
    }

    fn resolve_degree(
        &self,
        degree_path: &str,
        occupations: BTreeMap<String, Option<f64>>,
        outcome: &mut CrosswalkOutcome,
    ) -> ImportResult<BTreeMap<String, f64>> {
        let given: f64 = occupations.values().flatten().sum();
        let missing = occupations.values().filter(|w| w.is_none()).count();

        let mut weights: BTreeMap<String, f64> = BTreeMap::new();
        if missing > 0 {
            let share = (1.0 - given).max(0.0) / missing as f64;
            for (occupation_code, weight) in occupations {
                weights.insert(occupation_code, weight.unwrap_or(share));
            }
            tracing::warn!(degree_path, missing, share, "对照表权重缺失，按剩余权重均分");
            outcome.violations.push(DqViolation {
                dataset: DatasetKind::Crosswalk,
                row_number: 0,
                key: Some(degree_path.to_string()),
                level: DqLevel::Warning,
                field: "weight".to_string(),
                message: format!("{} 个职业缺失权重，按剩余权重均分（每个 {:.4}）", missing, share),
            });
        } else {
            weights.extend(
                occupations
                    .into_iter()
                    .map(|(code, weight)| (code, weight.unwrap_or(0.0))),
            );
        }

        let total: f64 = weights.values().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(ImportError::CrosswalkError {
                degree_path: degree_path.to_string(),
                message: format!("权重合计为 {}，无法归一化", total),
            });
        }

        if (total - 1.0).abs() > self.tolerance {
            for weight in weights.values_mut() {
                *weight /= total;
            }
            tracing::warn!(degree_path, total, "对照表权重超出容差，已重新归一化");
            outcome.renormalized.push(RenormalizedMapping {
                degree_path: degree_path.to_string(),
                original_total: total,
            });
            outcome.violations.push(DqViolation {
                dataset: DatasetKind::Crosswalk,
                row_number: 0,
                key: Some(degree_path.to_string()),
                level: DqLevel::Warning,
                field: "weight".to_string(),
                message: format!("权重合计 {:.4} 超出 1.0 ± {}，已重新归一化", total, self.tolerance),
            });
        }

        Ok(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(degree: &str, occupation: &str, weight: Option<f64>) -> CrosswalkEntry {
        CrosswalkEntry {
            degree_path: degree.to_string(),
            occupation_code: occupation.to_string(),
            weight,
            row_number: 2,
        }
    }

    fn weight_of(outcome: &CrosswalkOutcome, degree: &str, occupation: &str) -> f64 {
        outcome
            .mappings
            .iter()
            .find(|m| m.degree_path == degree && m.occupation_code == occupation)
            .map(|m| m.weight)
            .unwrap()
    }

    #[test]
    fn test_within_tolerance_kept_as_is() {
        let outcome = CrosswalkBuilder::new(0.01)
            .build(vec![
                entry("11.0101", "15-1252", Some(0.6)),
                entry("11.0101", "15-1211", Some(0.395)),
            ])
            .unwrap();

        assert!(outcome.renormalized.is_empty());
        assert_eq!(weight_of(&outcome, "11.0101", "15-1252"), 0.6);
    }

    #[test]
    fn test_out_of_tolerance_renormalized() {
        let outcome = CrosswalkBuilder::new(0.01)
            .build(vec![
                entry("11.0101", "15-1252", Some(0.5)),
                entry("11.0101", "15-1211", Some(0.5)),
                entry("11.0101", "15-1244", Some(0.5)),
            ])
            .unwrap();

        assert_eq!(outcome.renormalized.len(), 1);
        assert!((outcome.renormalized[0].original_total - 1.5).abs() < 1e-9);
        let total: f64 = outcome.mappings.iter().map(|m| m.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_pairs_summed_before_check() {
        let outcome = CrosswalkBuilder::new(0.01)
            .build(vec![
                entry("11.0101", "15-1252", Some(0.3)),
                entry("11.0101", "15-1252", Some(0.3)),
                entry("11.0101", "15-1211", Some(0.4)),
            ])
            .unwrap();

        assert_eq!(outcome.mappings.len(), 2);
        assert!(outcome.renormalized.is_empty());
        assert!((weight_of(&outcome, "11.0101", "15-1252") - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_missing_weights_split_equally() {
        let outcome = CrosswalkBuilder::new(0.01)
            .build(vec![
                entry("26.0101", "19-1021", None),
                entry("26.0101", "19-1029", None),
                entry("26.0101", "29-1071", None),
                entry("26.0101", "19-4021", None),
            ])
            .unwrap();

        assert!((weight_of(&outcome, "26.0101", "19-1021") - 0.25).abs() < 1e-9);
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].level, DqLevel::Warning);
    }

    #[test]
    fn test_zero_total_is_fatal() {
        let result = CrosswalkBuilder::new(0.01).build(vec![
            entry("50.0101", "27-2011", Some(0.0)),
            entry("50.0101", "27-2012", Some(0.0)),
        ]);

        assert!(matches!(
            result,
            Err(ImportError::CrosswalkError { ref degree_path, .. }) if degree_path == "50.0101"
        ));
    }
}
