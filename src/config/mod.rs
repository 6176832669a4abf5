// ==========================================
// 学位市场饱和度分析 - 配置层
// ==========================================
// 职责: 系统配置管理,支持 config_kv 覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod saturation_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, SaturationConfigReader};
pub use saturation_config::SaturationConfig;
