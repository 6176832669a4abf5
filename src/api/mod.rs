// ==========================================
// 学位市场饱和度分析 - API 层
// ==========================================
// 职责: 提供查询与导入 API，供命令行与展示层调用
// ==========================================

pub mod error;
pub mod import_api;
pub mod saturation_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse};
pub use saturation_api::SaturationApi;
