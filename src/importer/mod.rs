// ==========================================
// 学位市场饱和度分析 - 导入层
// ==========================================
// 职责: 源表（毕业生/岗位/对照表/就业人数）→ 已校验数据集
// 支持: CSV（规范列名）
// ==========================================

// 模块声明
pub mod code_normalizer;
pub mod crosswalk;
pub mod dataset_loader;
pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;

// 重导出核心类型
pub use code_normalizer::{CodeNormalizer, UNCLASSIFIED};
pub use crosswalk::{CrosswalkBuilder, CrosswalkEntry};
pub use dataset_loader::{DatasetFiles, DatasetLoader};
pub use dq_validator::DqValidatorImpl;
pub use error::{ImportError, ImportResult, ValidationError};
pub use field_mapper::CanonicalFieldMapper;
pub use file_parser::CsvParser;

// 重导出 Trait 接口
pub use importer_trait::{DqValidator, FieldMapper, FileParser, ParsedRow};
