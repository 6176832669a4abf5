// ==========================================
// 学位市场饱和度分析 - 引擎层
// ==========================================
// 职责: 在不可变快照上实现饱和度、排名、替代推荐、预测与分类
// 红线: Engine 不拼 SQL，不持有可变全局状态，快照显式传入
// ==========================================

pub mod alternatives;
pub mod classification;
pub mod error;
pub mod forecast;
pub mod saturation;
pub mod similarity;
pub mod snapshot;

// 重导出核心引擎
pub use alternatives::{Alternative, AlternativeFinder};
pub use classification::{cip_family, Classifier};
pub use error::{EngineError, EngineResult};
pub use forecast::{SupplyForecaster, DEFAULT_PROJECTION_YEARS};
pub use saturation::{compare_records, SaturationEngine};
pub use similarity::cosine_similarity;
pub use snapshot::{DatasetSnapshot, SnapshotInfo, SnapshotStore};
