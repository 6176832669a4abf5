// ==========================================
// 学位市场饱和度分析 - 供给预测与岗位增长
// ==========================================
// 职责:
// - 毕业生供给: 对历年毕业生人数做最小二乘线性回归并外推
// - 岗位增长: 按对照表权重加权的就业人数增长率
// ==========================================

use crate::domain::saturation::{SaturationRecord, SupplyForecast};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::saturation::SaturationEngine;
use crate::engine::snapshot::DatasetSnapshot;
use tracing::instrument;

/// 默认外推年数
pub const DEFAULT_PROJECTION_YEARS: i32 = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct SupplyForecaster {
    engine: SaturationEngine,
}

impl SupplyForecaster {
    pub fn new() -> Self {
        Self {
            engine: SaturationEngine::new(),
        }
    }

    /// 预测 current_year + projection_years 的毕业生人数
    ///
    /// 规则:
    /// - 只用 year ≤ current_year 的历史点
    /// - 少于 2 个点: 取最后一个值（无则 0），斜率 0
    /// - 预测值截断取整，不小于 0
    /// - projected_score 以 current_year 的加权岗位数计算
    #[instrument(skip(self, snapshot))]
    pub fn forecast_supply(
        &self,
        snapshot: &DatasetSnapshot,
        degree_path: &str,
        current_year: i32,
        projection_years: i32,
    ) -> EngineResult<SupplyForecast> {
        if !snapshot.knows_degree(degree_path) {
            return Err(EngineError::DegreeNotFound(degree_path.to_string()));
        }
        if projection_years < 0 {
            return Err(EngineError::InvalidArgument(format!(
                "projection_years 不能为负: {}",
                projection_years
            )));
        }

        let target_year = current_year.checked_add(projection_years).ok_or_else(|| {
            EngineError::InvalidArgument(format!(
                "目标年份溢出: {} + {}",
                current_year, projection_years
            ))
        })?;

        let history: Vec<(i32, u64)> = snapshot
            .graduate_history(degree_path)
            .map(|by_year| {
                by_year
                    .range(..=current_year)
                    .map(|(year, count)| (*year, *count))
                    .collect()
            })
            .unwrap_or_default();

        let (predicted_graduates, growth_per_year) = match fit_line(&history) {
            Some((slope, intercept)) => {
                let predicted = intercept + slope * target_year as f64;
                (predicted.max(0.0).trunc() as u64, slope)
            }
            None => (history.last().map(|(_, count)| *count).unwrap_or(0), 0.0),
        };

        let job_count = self.engine.job_count(snapshot, degree_path, current_year);
        let projected = SaturationRecord::new(degree_path, target_year, predicted_graduates, job_count);

        Ok(SupplyForecast {
            degree_path: degree_path.to_string(),
            current_year,
            target_year,
            predicted_graduates,
            growth_per_year,
            history,
            projected_score: projected.score,
        })
    }

    /// 岗位增长率: (E_target − E_base) / E_base，E = Σ weight × employment
    ///
    /// 无就业数据、学位不在对照表或 E_base = 0 时返回 None
    pub fn job_growth_rate(
        &self,
        snapshot: &DatasetSnapshot,
        degree_path: &str,
        base_year: i32,
        target_year: i32,
    ) -> EngineResult<Option<f64>> {
        if !snapshot.knows_degree(degree_path) {
            return Err(EngineError::DegreeNotFound(degree_path.to_string()));
        }
        if !snapshot.has_employment_data() {
            return Ok(None);
        }
        let Some(weights) = snapshot.occupation_weights(degree_path) else {
            return Ok(None);
        };

        let weighted = |year: i32| -> f64 {
            weights
                .iter()
                .map(|(code, weight)| weight * snapshot.employment(code, year).unwrap_or(0) as f64)
                .sum()
        };

        let base = weighted(base_year);
        if base <= 0.0 {
            return Ok(None);
        }
        Ok(Some((weighted(target_year) - base) / base))
    }
}

/// 最小二乘拟合 y = intercept + slope × x，少于 2 个点返回 None
fn fit_line(points: &[(i32, u64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| *x as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| *y as f64).sum::<f64>() / n;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
        let dx = *x as f64 - mean_x;
        (sxy + dx * (*y as f64 - mean_y), sxx + dx * dx)
    });
    if sxx <= f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{
        DegreeOccupationMapping, DegreeRecord, EmploymentRecord, JobRecord, ValidatedDataset,
    };

    fn snapshot(with_employment: bool) -> DatasetSnapshot {
        let degree = |path: &str, year: i32, count: u64| DegreeRecord {
            degree_path: path.to_string(),
            year,
            graduate_count: count,
        };
        let employment = |code: &str, year: i32, employment: u64| EmploymentRecord {
            occupation_code: code.to_string(),
            year,
            employment,
        };

        DatasetSnapshot::from_dataset(&ValidatedDataset {
            degrees: vec![
                degree("CS", 2020, 1_000),
                degree("CS", 2021, 1_100),
                degree("CS", 2022, 1_200),
                degree("CS", 2023, 1_300),
                degree("CS", 2025, 9_999),
                degree("Single", 2024, 70),
                degree("Shrinking", 2023, 100),
                degree("Shrinking", 2024, 10),
            ],
            jobs: vec![JobRecord {
                occupation_code: "SWDEV".to_string(),
                year: 2023,
                openings: 1_000,
            }],
            mappings: vec![
                DegreeOccupationMapping {
                    degree_path: "CS".to_string(),
                    occupation_code: "SWDEV".to_string(),
                    weight: 0.5,
                },
                DegreeOccupationMapping {
                    degree_path: "CS".to_string(),
                    occupation_code: "DATA".to_string(),
                    weight: 0.5,
                },
            ],
            employment: if with_employment {
                vec![
                    employment("SWDEV", 2024, 1_000),
                    employment("DATA", 2024, 3_000),
                    employment("SWDEV", 2034, 1_200),
                    employment("DATA", 2034, 3_200),
                ]
            } else {
                vec![]
            },
        })
    }

    #[test]
    fn test_linear_forecast() {
        let forecast = SupplyForecaster::new()
            .forecast_supply(&snapshot(false), "CS", 2023, 4)
            .unwrap();

        // 2025 的点晚于 current_year，不参与回归
        assert_eq!(forecast.history.len(), 4);
        assert!((forecast.growth_per_year - 100.0).abs() < 1e-9);
        assert_eq!(forecast.target_year, 2027);
        assert_eq!(forecast.predicted_graduates, 1_700);
        // 1700 / (0.5 × 1000)
        assert!((forecast.projected_score - 3.4).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_returns_last_value() {
        let forecast = SupplyForecaster::new()
            .forecast_supply(&snapshot(false), "Single", 2024, 4)
            .unwrap();

        assert_eq!(forecast.predicted_graduates, 70);
        assert_eq!(forecast.growth_per_year, 0.0);
        // 无对照表 → 无岗位 → +∞
        assert!(forecast.projected_score.is_infinite());
    }

    #[test]
    fn test_negative_prediction_clamped() {
        let forecast = SupplyForecaster::new()
            .forecast_supply(&snapshot(false), "Shrinking", 2024, 4)
            .unwrap();
        assert_eq!(forecast.predicted_graduates, 0);
        assert_eq!(forecast.projected_score, 0.0);
    }

    #[test]
    fn test_forecast_errors() {
        let forecaster = SupplyForecaster::new();
        assert!(matches!(
            forecaster.forecast_supply(&snapshot(false), "Nope", 2024, 4),
            Err(EngineError::DegreeNotFound(_))
        ));
        assert!(matches!(
            forecaster.forecast_supply(&snapshot(false), "CS", 2024, -1),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_forecast_target_year_overflow() {
        let forecaster = SupplyForecaster::new();
        assert!(matches!(
            forecaster.forecast_supply(&snapshot(false), "CS", i32::MAX, 4),
            Err(EngineError::InvalidArgument(_))
        ));

        // 投影 0 年不溢出
        let forecast = forecaster
            .forecast_supply(&snapshot(false), "CS", i32::MAX, 0)
            .unwrap();
        assert_eq!(forecast.target_year, i32::MAX);
    }

    #[test]
    fn test_job_growth_rate() {
        let forecaster = SupplyForecaster::new();

        // base = 0.5×1000 + 0.5×3000 = 2000; target = 0.5×1200 + 0.5×3200 = 2200
        let growth = forecaster
            .job_growth_rate(&snapshot(true), "CS", 2024, 2034)
            .unwrap()
            .unwrap();
        assert!((growth - 0.1).abs() < 1e-12);

        assert_eq!(
            forecaster.job_growth_rate(&snapshot(true), "CS", 2000, 2034).unwrap(),
            None
        );
        assert_eq!(
            forecaster.job_growth_rate(&snapshot(false), "CS", 2024, 2034).unwrap(),
            None
        );
    }
}
