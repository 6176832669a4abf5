// ==========================================
// 饱和度查询API
// ==========================================
// 职责: 封装快照上的查询（饱和度/排名/替代/展望/预测）与快照重载
// 红线: 每次查询只取一次当前快照，查询期间不受重载影响
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::SaturationConfig;
use crate::domain::dataset::ValidatedDataset;
use crate::domain::saturation::{DegreeOutlook, SaturationRecord, SupplyForecast};
use crate::engine::{
    Alternative, AlternativeFinder, Classifier, DatasetSnapshot, SaturationEngine, SnapshotInfo,
    SnapshotStore, SupplyForecaster, DEFAULT_PROJECTION_YEARS,
};
use crate::repository::DatasetRepository;
use std::io::Write;
use std::sync::Arc;

/// 饱和度查询API
pub struct SaturationApi {
    store: Arc<SnapshotStore>,
    config: SaturationConfig,
    engine: SaturationEngine,
    finder: AlternativeFinder,
    classifier: Classifier,
    forecaster: SupplyForecaster,
}

impl SaturationApi {
    /// 创建新的SaturationApi实例
    pub fn new(store: Arc<SnapshotStore>, config: SaturationConfig) -> Self {
        Self {
            finder: AlternativeFinder::from_config(&config),
            classifier: Classifier::from_config(&config),
            engine: SaturationEngine::new(),
            forecaster: SupplyForecaster::new(),
            store,
            config,
        }
    }

    pub fn store(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// 当前快照元信息
    pub fn snapshot_info(&self) -> SnapshotInfo {
        self.store.current().info()
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 单个学位某年饱和度
    pub fn compute_saturation(&self, degree_path: &str, year: i32) -> ApiResult<SaturationRecord> {
        let degree_path = require_degree(degree_path)?;
        let snapshot = self.store.current();
        Ok(self.engine.compute_saturation(&snapshot, degree_path, year)?)
    }

    /// 某年全部学位按饱和度升序
    pub fn rank_degrees(&self, year: i32) -> ApiResult<Vec<SaturationRecord>> {
        let snapshot = self.store.current();
        Ok(self.engine.rank_degrees(&snapshot, year)?)
    }

    /// 排名导出为 CSV（表头: degree_path,year,score,job_count,grad_count）
    pub fn export_rank_csv<W: Write>(&self, year: i32, writer: W) -> ApiResult<usize> {
        let records = self.rank_degrees(year)?;

        let mut csv_writer = csv::Writer::from_writer(writer);
        for record in &records {
            csv_writer
                .serialize(record)
                .map_err(|e| ApiError::InternalError(format!("CSV 写出失败: {}", e)))?;
        }
        csv_writer
            .flush()
            .map_err(|e| ApiError::InternalError(format!("CSV 写出失败: {}", e)))?;

        tracing::info!(year, rows = records.len(), "排名已导出为 CSV");
        Ok(records.len())
    }

    /// 替代学位（k 缺省取配置 default_alternatives_k）
    pub fn find_alternatives(
        &self,
        degree_path: &str,
        year: i32,
        k: Option<usize>,
    ) -> ApiResult<Vec<SaturationRecord>> {
        Ok(self
            .find_alternatives_scored(degree_path, year, k)?
            .into_iter()
            .map(|alt| alt.record)
            .collect())
    }

    /// 替代学位（附相似度）
    pub fn find_alternatives_scored(
        &self,
        degree_path: &str,
        year: i32,
        k: Option<usize>,
    ) -> ApiResult<Vec<Alternative>> {
        let degree_path = require_degree(degree_path)?;
        let k = k.unwrap_or(self.config.default_alternatives_k);
        let snapshot = self.store.current();
        Ok(self
            .finder
            .find_alternatives_scored(&snapshot, degree_path, year, k)?)
    }

    /// 学位市场展望
    pub fn degree_outlook(
        &self,
        degree_path: &str,
        year: i32,
        base_year: Option<i32>,
    ) -> ApiResult<DegreeOutlook> {
        let degree_path = require_degree(degree_path)?;
        let snapshot = self.store.current();
        Ok(self
            .classifier
            .degree_outlook(&snapshot, degree_path, year, base_year)?)
    }

    /// 毕业生供给预测
    ///
    /// current_year 缺省取该学位最近一年的毕业生记录；projection_years 缺省 4 年
    pub fn forecast_supply(
        &self,
        degree_path: &str,
        current_year: Option<i32>,
        projection_years: Option<i32>,
    ) -> ApiResult<SupplyForecast> {
        let degree_path = require_degree(degree_path)?;
        let snapshot = self.store.current();

        let current_year = match current_year {
            Some(year) => year,
            None => snapshot
                .graduate_history(degree_path)
                .and_then(|history| history.keys().next_back().copied())
                .ok_or_else(|| {
                    ApiError::NotFound(format!("学位路径 {} 无毕业生历史", degree_path))
                })?,
        };

        Ok(self.forecaster.forecast_supply(
            &snapshot,
            degree_path,
            current_year,
            projection_years.unwrap_or(DEFAULT_PROJECTION_YEARS),
        )?)
    }

    // ==========================================
    // 重载
    // ==========================================

    /// 用已校验数据集替换快照
    pub fn reload_from_dataset(
        &self,
        dataset: &ValidatedDataset,
        batch_id: Option<&str>,
    ) -> SnapshotInfo {
        let mut snapshot = DatasetSnapshot::from_dataset(dataset);
        if let Some(batch_id) = batch_id {
            snapshot = snapshot.with_batch(batch_id);
        }
        let info = snapshot.info();
        self.store.replace(snapshot);
        info
    }

    /// 从数据库重新加载快照；读取失败时保留旧快照
    pub fn reload_from_repository(&self, repo: &DatasetRepository) -> ApiResult<SnapshotInfo> {
        let snapshot = self
            .store
            .reload(|| -> ApiResult<DatasetSnapshot> {
                let dataset = repo.load_dataset()?;
                let batch = repo.latest_batch()?;
                let snapshot = DatasetSnapshot::from_dataset(&dataset);
                Ok(match batch {
                    Some(batch) => snapshot.with_batch(batch.batch_id),
                    None => snapshot,
                })
            })
            .map_err(|e| ApiError::ReloadFailed(e.to_string()))?;

        Ok(snapshot.info())
    }
}

fn require_degree(degree_path: &str) -> ApiResult<&str> {
    let trimmed = degree_path.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("degree_path 不能为空".to_string()));
    }
    Ok(trimmed)
}
