// ==========================================
// 学位市场饱和度分析 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 学位供给（IPEDS 毕业生）与岗位需求（BLS 职位空缺）的对比分析
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 饱和度/排名/替代/预测
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DatasetKind, MarketSentiment, SaturationTag};

// 领域记录
pub use domain::{
    DegreeOccupationMapping, DegreeOutlook, DegreeRecord, EmploymentRecord, ImportBatch,
    JobRecord, LoadReport, SaturationRecord, SupplyForecast, ValidatedDataset,
};

// 导入
pub use importer::{DatasetFiles, DatasetLoader, ImportError};

// 引擎
pub use engine::{
    AlternativeFinder, Classifier, DatasetSnapshot, EngineError, SaturationEngine,
    SnapshotStore, SupplyForecaster,
};

// API
pub use api::{ApiError, ImportApi, SaturationApi};

// 配置
pub use config::SaturationConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "学位市场饱和度分析";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
