// ==========================================
// 学位市场饱和度分析 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 启动: 打开数据库 → 读取配置 → 从已落库数据构建首个快照
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ApiResult, ImportApi, SaturationApi};
use crate::config::{ConfigManager, SaturationConfig, SaturationConfigReader};
use crate::db::{open_sqlite_connection, read_schema_version};
use crate::engine::{DatasetSnapshot, SnapshotStore};
use crate::repository::{DatasetRepository, RepositoryError};

/// 应用状态
///
/// 所有 API 共享同一个数据库连接与同一个快照持有者
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 生效配置
    pub config: SaturationConfig,

    /// 快照持有者（导入与重载会替换其中的快照）
    pub store: Arc<SnapshotStore>,

    /// 源数据仓储
    pub dataset_repo: Arc<DatasetRepository>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 饱和度查询API
    pub saturation_api: Arc<SaturationApi>,

    /// 数据集导入API
    pub import_api: Arc<ImportApi>,
}

impl AppState {
    /// 创建新的AppState实例（配置读自 config_kv）
    pub fn new(db_path: String) -> ApiResult<Self> {
        Self::build(db_path, None)
    }

    /// 使用外部配置创建（忽略 config_kv）
    pub fn with_config_reader<C: SaturationConfigReader>(
        db_path: String,
        reader: &C,
    ) -> ApiResult<Self> {
        let config = reader.saturation_config()?;
        Self::build(db_path, Some(config))
    }

    fn build(db_path: String, config: Option<SaturationConfig>) -> ApiResult<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path).map_err(RepositoryError::from)?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层与配置
        // ==========================================
        let dataset_repo = Arc::new(DatasetRepository::from_connection(conn.clone())?);
        if let Ok(guard) = conn.lock() {
            let schema_version = read_schema_version(&guard).map_err(RepositoryError::from)?;
            tracing::info!(?schema_version, "数据库 schema 已就绪");
        }
        let config_manager = Arc::new(ConfigManager::from_connection(conn)?);

        let config = match config {
            Some(config) => config,
            None => config_manager.saturation_config()?,
        };
        config.validate().map_err(crate::api::ApiError::InvalidInput)?;

        // ==========================================
        // 从已落库数据构建首个快照
        // ==========================================
        let dataset = dataset_repo.load_dataset()?;
        let mut snapshot = DatasetSnapshot::from_dataset(&dataset);
        if let Some(batch) = dataset_repo.latest_batch()? {
            snapshot = snapshot.with_batch(batch.batch_id);
        }
        let store = Arc::new(SnapshotStore::new(snapshot));

        // ==========================================
        // 创建API实例
        // ==========================================
        let saturation_api = Arc::new(SaturationApi::new(store.clone(), config.clone()));
        let import_api = Arc::new(ImportApi::new(
            dataset_repo.clone(),
            store.clone(),
            config.clone(),
        ));

        tracing::info!(
            degrees = saturation_api.snapshot_info().degree_count,
            "AppState初始化完成"
        );

        Ok(Self {
            db_path,
            config,
            store,
            dataset_repo,
            config_manager,
            saturation_api,
            import_api,
        })
    }
}

// ==========================================
// 数据库路径
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 DEGREE_SATURATION_DB_PATH（非空时）
/// - 用户数据目录/degree-saturation/degree_saturation.db
/// - 无法获取用户数据目录时: ./degree_saturation.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("DEGREE_SATURATION_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./degree_saturation.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("degree-saturation");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("degree_saturation.db");
        }
    }

    path.to_string_lossy().to_string()
}
