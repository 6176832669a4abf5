// ==========================================
// 学位市场饱和度分析 - 导入管道 Trait
// ==========================================
// 职责: 定义加载管道各阶段接口（不包含实现）
// 阶段: 文件解析 → 字段映射 → DQ 校验 → 代码规范化 → 聚合 → 对照表权重校验
// ==========================================

use crate::domain::dataset::{
    DegreeRecord, EmploymentRecord, JobRecord, RawCrosswalkRow, RawDegreeRow,
    RawEmploymentRow, RawJobRow,
};
use crate::importer::crosswalk::CrosswalkEntry;
use crate::importer::error::{ImportResult, ValidationError};
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// ParsedRow - 解析后的一行（列名已规范化为小写）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRow {
    pub row_number: usize, // 源文件行号（表头为第 1 行）
    pub fields: HashMap<String, String>,
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录
    ///
    /// # 返回
    /// - Ok(Vec<ParsedRow>): 行记录列表（已跳过完全空白的行）
    /// - Err: 文件不存在、格式不支持、CSV 结构错误
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<ParsedRow>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 字段映射接口（阶段 1），处理列名别名与类型转换
// 实现者: CanonicalFieldMapper
pub trait FieldMapper: Send + Sync {
    fn map_degree_row(&self, row: &ParsedRow) -> Result<RawDegreeRow, ValidationError>;

    fn map_job_row(&self, row: &ParsedRow) -> Result<RawJobRow, ValidationError>;

    fn map_crosswalk_row(&self, row: &ParsedRow) -> Result<RawCrosswalkRow, ValidationError>;

    fn map_employment_row(&self, row: &ParsedRow) -> Result<RawEmploymentRow, ValidationError>;
}

// ==========================================
// DqValidator Trait
// ==========================================
// 用途: 行级数据质量校验（阶段 2）
// 规则: 必填字段缺失、计数为负、年份越界、权重越界 → ValidationError（丢弃该行）
// 实现者: DqValidatorImpl
pub trait DqValidator: Send + Sync {
    fn validate_degree(&self, row: &RawDegreeRow) -> Result<DegreeRecord, ValidationError>;

    fn validate_job(&self, row: &RawJobRow) -> Result<JobRecord, ValidationError>;

    fn validate_crosswalk(&self, row: &RawCrosswalkRow) -> Result<CrosswalkEntry, ValidationError>;

    fn validate_employment(
        &self,
        row: &RawEmploymentRow,
    ) -> Result<EmploymentRecord, ValidationError>;
}
