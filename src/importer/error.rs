// ==========================================
// 学位市场饱和度分析 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分层: ImportError 为整次加载失败；ValidationError 为单行失败（丢弃该行）
// ==========================================

use thiserror::Error;

/// 导入模块错误类型（致命，整次加载中止）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 对照表错误 =====
    #[error("对照表权重无法修复 (degree_path={degree_path}): {message}")]
    CrosswalkError {
        degree_path: String,
        message: String,
    },

    // ===== 配置错误 =====
    #[error("配置值格式错误: {0}")]
    InvalidConfig(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// 行级校验错误（非致命：该行被丢弃、计数并记录）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("必填字段缺失 (行 {row}, 字段 {field})")]
    MissingField { row: usize, field: String },

    #[error("类型转换失败 (行 {row}, 字段 {field}): {message}")]
    TypeConversion {
        row: usize,
        field: String,
        message: String,
    },

    #[error("数值为负 (行 {row}, 字段 {field}): {value}")]
    NegativeValue { row: usize, field: String, value: i64 },

    #[error("年份超出范围 (行 {row}): {value}")]
    YearOutOfRange { row: usize, value: i64 },

    #[error("权重非法 (行 {row}): {value}，应在 [0, 1] 内")]
    InvalidWeight { row: usize, value: f64 },
}

impl ValidationError {
    pub fn row(&self) -> usize {
        match self {
            ValidationError::MissingField { row, .. }
            | ValidationError::TypeConversion { row, .. }
            | ValidationError::NegativeValue { row, .. }
            | ValidationError::YearOutOfRange { row, .. }
            | ValidationError::InvalidWeight { row, .. } => *row,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field, .. }
            | ValidationError::TypeConversion { field, .. }
            | ValidationError::NegativeValue { field, .. } => field,
            ValidationError::YearOutOfRange { .. } => "year",
            ValidationError::InvalidWeight { .. } => "weight",
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
