// ==========================================
// 学位市场饱和度分析 - 替代学位推荐
// ==========================================
// 职责: 为查询学位找出职业相近、饱和度最低的 k 个学位
// 候选条件:
// - 与查询学位至少共享一个职业
// - 职业权重向量余弦相似度 ≥ similarity_threshold
// - 该年有毕业生记录
// - 不含查询学位本身
// 排序: 与 rank_degrees 相同；不足 k 个时不补齐
// ==========================================

use crate::config::SaturationConfig;
use crate::domain::saturation::SaturationRecord;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::saturation::{compare_records, SaturationEngine};
use crate::engine::similarity::cosine_similarity;
use crate::engine::snapshot::DatasetSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// 带相似度的推荐结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    #[serde(flatten)]
    pub record: SaturationRecord,
    pub similarity: f64,
}

// ==========================================
// AlternativeFinder - 替代学位推荐器
// ==========================================
#[derive(Debug, Clone)]
pub struct AlternativeFinder {
    engine: SaturationEngine,
    similarity_threshold: f64,
    only_less_saturated: bool,
}

impl AlternativeFinder {
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            engine: SaturationEngine::new(),
            similarity_threshold,
            only_less_saturated: false,
        }
    }

    pub fn from_config(config: &SaturationConfig) -> Self {
        Self::new(config.similarity_threshold)
            .only_less_saturated(config.only_less_saturated_alternatives)
    }

    /// 只保留饱和度严格低于查询学位（且非 0）的候选
    pub fn only_less_saturated(mut self, enabled: bool) -> Self {
        self.only_less_saturated = enabled;
        self
    }

    /// 返回至多 k 个替代学位（饱和度升序）
    pub fn find_alternatives(
        &self,
        snapshot: &DatasetSnapshot,
        degree_path: &str,
        year: i32,
        k: usize,
    ) -> EngineResult<Vec<SaturationRecord>> {
        Ok(self
            .find_alternatives_scored(snapshot, degree_path, year, k)?
            .into_iter()
            .map(|alt| alt.record)
            .collect())
    }

    /// 同 find_alternatives，附带每个候选的相似度
    #[instrument(skip(self, snapshot))]
    pub fn find_alternatives_scored(
        &self,
        snapshot: &DatasetSnapshot,
        degree_path: &str,
        year: i32,
        k: usize,
    ) -> EngineResult<Vec<Alternative>> {
        if !snapshot.knows_degree(degree_path) {
            return Err(EngineError::DegreeNotFound(degree_path.to_string()));
        }

        let Some(query_vector) = snapshot.occupation_weights(degree_path) else {
            debug!(degree_path, "学位不在对照表中，无替代候选");
            return Ok(Vec::new());
        };

        // 查询学位本年饱和度（仅在 only_less_saturated 时使用）
        let ceiling = if self.only_less_saturated {
            self.engine
                .compute_saturation(snapshot, degree_path, year)
                .ok()
                .map(|r| r.score)
        } else {
            None
        };

        let mut candidates: Vec<Alternative> = Vec::new();
        for candidate in snapshot.degrees_sharing_occupation(degree_path) {
            let Some(candidate_vector) = snapshot.occupation_weights(candidate) else {
                continue;
            };
            let Some(similarity) = cosine_similarity(query_vector, candidate_vector) else {
                continue;
            };
            if similarity < self.similarity_threshold {
                continue;
            }

            let Some(grad_count) = snapshot.graduates(candidate, year) else {
                continue;
            };
            let job_count = self.engine.job_count(snapshot, candidate, year);
            let record = SaturationRecord::new(candidate, year, grad_count, job_count);

            if let Some(ceiling) = ceiling {
                if record.score >= ceiling || record.score == 0.0 {
                    continue;
                }
            }

            candidates.push(Alternative { record, similarity });
        }

        candidates.sort_by(|a, b| compare_records(&a.record, &b.record));
        candidates.truncate(k);

        debug!(degree_path, year, found = candidates.len(), "替代学位检索完成");
        Ok(candidates)
    }
}
