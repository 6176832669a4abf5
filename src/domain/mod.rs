// ==========================================
// 学位市场饱和度分析 - 领域模型层
// ==========================================
// 职责: 定义源数据记录、派生饱和度记录、导入报告类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod dataset;
pub mod import;
pub mod saturation;
pub mod types;

// 重导出核心类型
pub use dataset::{
    DegreeOccupationMapping, DegreeRecord, EmploymentRecord, JobRecord, RawCrosswalkRow,
    RawDataset, RawDegreeRow, RawEmploymentRow, RawJobRow, ValidatedDataset,
};
pub use import::{
    DqLevel, DqViolation, ImportBatch, LoadReport, RenormalizedMapping, TableSummary,
};
pub use saturation::{DegreeOutlook, SaturationRecord, SupplyForecast};
pub use types::{DatasetKind, MarketSentiment, SaturationTag};
