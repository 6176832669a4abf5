// ==========================================
// 学位市场饱和度分析 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 除零不是错误（+∞ 哨兵值），不在此定义
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("学位路径不存在: {0}")]
    DegreeNotFound(String),

    #[error("年份无数据 (degree_path={degree_path:?}): {year}")]
    YearNotFound {
        degree_path: Option<String>,
        year: i32,
    },

    #[error("参数非法: {0}")]
    InvalidArgument(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
