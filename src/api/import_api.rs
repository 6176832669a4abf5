// ==========================================
// 数据集导入API
// ==========================================
// 职责: 源文件 → 加载校验 → 落库（单事务） → 快照替换
// 红线: 任一步失败都不替换快照，旧快照继续服务
//       落库与快照替换在导入锁内串行，库中最新批次始终等于在服务的快照
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::SaturationConfig;
use crate::domain::import::{ImportBatch, LoadReport};
use crate::engine::{DatasetSnapshot, SnapshotInfo, SnapshotStore};
use crate::importer::{DatasetFiles, DatasetLoader};
use crate::repository::DatasetRepository;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 导入批次（已落库）
    pub batch: ImportBatch,
    /// 加载报告（逐表统计 + DQ 违规明细）
    pub report: LoadReport,
    /// 替换后的快照
    pub snapshot: SnapshotInfo,
}

/// 导入API
pub struct ImportApi {
    repo: Arc<DatasetRepository>,
    store: Arc<SnapshotStore>,
    config: SaturationConfig,
    // 串行化 批次登记 → 落库 → 快照替换
    import_lock: Mutex<()>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(
        repo: Arc<DatasetRepository>,
        store: Arc<SnapshotStore>,
        config: SaturationConfig,
    ) -> Self {
        Self {
            repo,
            store,
            config,
            import_lock: Mutex::new(()),
        }
    }

    /// 导入数据集
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果
    /// - Err(ApiError): 加载或落库失败（快照未替换）
    #[instrument(skip(self, files))]
    pub fn import_dataset(&self, files: &DatasetFiles) -> ApiResult<ImportApiResponse> {
        let start = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        info!(batch_id = %batch_id, "开始导入数据集");

        // === 步骤 1: 加载与校验 ===
        let loader = DatasetLoader::new(self.config.clone());
        let (dataset, report) = loader.load_files(files).map_err(|e| {
            error!(batch_id = %batch_id, error = %e, "数据集加载失败，保留旧快照");
            ApiError::from(e)
        })?;

        let dq_report_json = serde_json::to_string(&report)
            .map_err(|e| ApiError::InternalError(format!("DQ 报告序列化失败: {}", e)))?;

        // 锁内只有 ()，中毒时照常继续
        let _guard = self.import_lock.lock().unwrap_or_else(|e| e.into_inner());

        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            source_files: files.file_names(),
            rows_read: report.rows_read(),
            rows_kept: report.rows_kept(),
            rows_dropped: report.rows_dropped(),
            rows_filtered: report.rows_filtered(),
            renormalized_mappings: report.renormalized.len(),
            imported_at: Utc::now(),
            elapsed_ms: Some(start.elapsed().as_millis() as i64),
            dq_report_json: Some(dq_report_json),
        };

        // === 步骤 2: 落库 ===
        self.repo.replace_dataset(&batch, &dataset).map_err(|e| {
            error!(batch_id = %batch_id, error = %e, "数据集落库失败，保留旧快照");
            ApiError::from(e)
        })?;

        // === 步骤 3: 替换快照 ===
        let snapshot = DatasetSnapshot::from_dataset(&dataset).with_batch(batch_id.clone());
        let snapshot_info = snapshot.info();
        self.store.replace(snapshot);

        info!(
            batch_id = %batch_id,
            rows_kept = batch.rows_kept,
            rows_dropped = batch.rows_dropped,
            "数据集导入完成"
        );

        Ok(ImportApiResponse {
            snapshot: snapshot_info,
            batch,
            report,
        })
    }

    /// 导入历史（按时间倒序）
    pub fn list_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        Ok(self.repo.list_batches(limit)?)
    }

    /// 按批次 ID 查询
    pub fn get_batch(&self, batch_id: &str) -> ApiResult<ImportBatch> {
        Ok(self.repo.find_batch(batch_id)?)
    }
}
