// ==========================================
// 学位市场饱和度分析 - 饱和度引擎
// ==========================================
// 红线: 纯函数，只读快照；派生结果不落库
// ==========================================
// 职责: 计算 (学位, 年份) 饱和度 + 按年排名
// 公式: score = graduates / Σ(weight × openings)
// 哨兵: 岗位为 0 且毕业生 > 0 → +∞；毕业生为 0 → 0
// ==========================================

use crate::domain::saturation::SaturationRecord;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::snapshot::DatasetSnapshot;
use std::cmp::Ordering;
use tracing::instrument;

// ==========================================
// SaturationEngine - 饱和度引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct SaturationEngine;

impl SaturationEngine {
    pub fn new() -> Self {
        Self
    }

    /// 加权岗位数: Σ weight × openings（学位无对照表时为 0）
    pub fn job_count(&self, snapshot: &DatasetSnapshot, degree_path: &str, year: i32) -> f64 {
        snapshot
            .occupation_weights(degree_path)
            .map(|weights| {
                weights
                    .iter()
                    .map(|(code, weight)| weight * snapshot.openings(code, year) as f64)
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// 计算单个学位某年的饱和度
    ///
    /// # 错误
    /// - DegreeNotFound: 学位既无毕业生记录也不在对照表中
    /// - YearNotFound: 该学位在该年无毕业生记录
    pub fn compute_saturation(
        &self,
        snapshot: &DatasetSnapshot,
        degree_path: &str,
        year: i32,
    ) -> EngineResult<SaturationRecord> {
        if !snapshot.knows_degree(degree_path) {
            return Err(EngineError::DegreeNotFound(degree_path.to_string()));
        }

        let grad_count = snapshot
            .graduates(degree_path, year)
            .ok_or_else(|| EngineError::YearNotFound {
                degree_path: Some(degree_path.to_string()),
                year,
            })?;

        let job_count = self.job_count(snapshot, degree_path, year);
        Ok(SaturationRecord::new(degree_path, year, grad_count, job_count))
    }

    /// 某年全部学位按饱和度升序排名
    ///
    /// 排序: score 升序 → job_count 降序 → degree_path 字典序
    #[instrument(skip(self, snapshot))]
    pub fn rank_degrees(
        &self,
        snapshot: &DatasetSnapshot,
        year: i32,
    ) -> EngineResult<Vec<SaturationRecord>> {
        if !snapshot.has_year(year) {
            return Err(EngineError::YearNotFound {
                degree_path: None,
                year,
            });
        }

        let mut records: Vec<SaturationRecord> = snapshot
            .degrees_in_year(year)
            .map(|(degree_path, grad_count)| {
                let job_count = self.job_count(snapshot, degree_path, year);
                SaturationRecord::new(degree_path, year, grad_count, job_count)
            })
            .collect();

        records.sort_by(compare_records);
        tracing::debug!(year, count = records.len(), "饱和度排名完成");
        Ok(records)
    }
}

/// 排名比较器（Ordering::Less 表示 a 排在 b 前）
pub fn compare_records(a: &SaturationRecord, b: &SaturationRecord) -> Ordering {
    // 1. 饱和度升序（+∞ 最后）
    match a.score.total_cmp(&b.score) {
        Ordering::Equal => {}
        other => return other,
    }

    // 2. 岗位数降序
    match b.job_count.total_cmp(&a.job_count) {
        Ordering::Equal => {}
        other => return other,
    }

    // 3. 学位路径字典序
    a.degree_path.cmp(&b.degree_path)
}
