// ==========================================
// 学位市场饱和度分析 - 字段映射器实现
// ==========================================
// 阶段 1: 规范列名（含别名） → 原始行结构体 + 类型转换
// 红线: 只做映射与类型转换，不做非负/范围校验（交给 DqValidator）
// ==========================================

use crate::domain::dataset::{RawCrosswalkRow, RawDegreeRow, RawEmploymentRow, RawJobRow};
use crate::importer::error::ValidationError;
use crate::importer::importer_trait::{FieldMapper, ParsedRow};

// 规范字段名
pub const DEGREE_PATH: &str = "degree_path";
pub const YEAR: &str = "year";
pub const GRADUATE_COUNT: &str = "graduate_count";
pub const AWARD_LEVEL: &str = "award_level";
pub const OCCUPATION_CODE: &str = "occupation_code";
pub const OPENINGS: &str = "openings";
pub const WEIGHT: &str = "weight";
pub const EMPLOYMENT: &str = "employment";

pub struct CanonicalFieldMapper;

impl FieldMapper for CanonicalFieldMapper {
    fn map_degree_row(&self, row: &ParsedRow) -> Result<RawDegreeRow, ValidationError> {
        Ok(RawDegreeRow {
            degree_path: self.get_string(row, DEGREE_PATH),
            year: self.parse_integer(row, YEAR)?,
            graduate_count: self.parse_integer(row, GRADUATE_COUNT)?,
            award_level: self.parse_integer(row, AWARD_LEVEL)?,
            row_number: row.row_number,
        })
    }

    fn map_job_row(&self, row: &ParsedRow) -> Result<RawJobRow, ValidationError> {
        Ok(RawJobRow {
            occupation_code: self.get_string(row, OCCUPATION_CODE),
            year: self.parse_integer(row, YEAR)?,
            openings: self.parse_integer(row, OPENINGS)?,
            row_number: row.row_number,
        })
    }

    fn map_crosswalk_row(&self, row: &ParsedRow) -> Result<RawCrosswalkRow, ValidationError> {
        Ok(RawCrosswalkRow {
            degree_path: self.get_string(row, DEGREE_PATH),
            occupation_code: self.get_string(row, OCCUPATION_CODE),
            weight: self.parse_f64(row, WEIGHT)?,
            row_number: row.row_number,
        })
    }

    fn map_employment_row(&self, row: &ParsedRow) -> Result<RawEmploymentRow, ValidationError> {
        Ok(RawEmploymentRow {
            occupation_code: self.get_string(row, OCCUPATION_CODE),
            year: self.parse_integer(row, YEAR)?,
            employment: self.parse_integer(row, EMPLOYMENT)?,
            row_number: row.row_number,
        })
    }
}

impl CanonicalFieldMapper {
    /// 提取字符串字段（返回 Option），支持多个可能的列名（别名）
    fn get_string(&self, row: &ParsedRow, key: &str) -> Option<String> {
        let aliases: &[&str] = match key {
            DEGREE_PATH => &["degree_path", "cip_code", "cipcode"],
            GRADUATE_COUNT => &["graduate_count", "graduates", "ctotalt"],
            AWARD_LEVEL => &["award_level", "awlevel"],
            OCCUPATION_CODE => &["occupation_code", "soc_code", "soccode"],
            OPENINGS => &["openings", "annual_openings"],
            _ => &[],
        };

        std::iter::once(key)
            .chain(aliases.iter().copied())
            .filter_map(|alias| row.fields.get(alias))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// 解析整数（容忍 "500.0" 这类整数值浮点表示）
    fn parse_integer(&self, row: &ParsedRow, key: &str) -> Result<Option<i64>, ValidationError> {
        let Some(value) = self.get_string(row, key) else {
            return Ok(None);
        };
        let cleaned = value.replace(',', "");

        if let Ok(v) = cleaned.parse::<i64>() {
            return Ok(Some(v));
        }
        match cleaned.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                Ok(Some(v as i64))
            }
            _ => Err(ValidationError::TypeConversion {
                row: row.row_number,
                field: key.to_string(),
                message: format!("无法解析为整数: {}", value),
            }),
        }
    }

    /// 解析浮点数
    fn parse_f64(&self, row: &ParsedRow, key: &str) -> Result<Option<f64>, ValidationError> {
        match self.get_string(row, key) {
            None => Ok(None),
            Some(value) => value
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ValidationError::TypeConversion {
                    row: row.row_number,
                    field: key.to_string(),
                    message: format!("无法解析为浮点数: {}", value),
                }),
        }
    }
}
