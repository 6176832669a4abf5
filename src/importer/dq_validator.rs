// ==========================================
// 学位市场饱和度分析 - 数据质量校验器实现
// ==========================================
// 阶段 2: 行级校验，原始行 → 已校验记录
// 规则:
// - 必填字段缺失 → MissingField
// - 计数为负 → NegativeValue
// - 年份不在 [MIN_YEAR, MAX_YEAR] → YearOutOfRange
// - 权重非有限值或不在 [0, 1] → InvalidWeight
// ==========================================

use crate::domain::dataset::{
    DegreeRecord, EmploymentRecord, JobRecord, RawCrosswalkRow, RawDegreeRow,
    RawEmploymentRow, RawJobRow,
};
use crate::importer::crosswalk::CrosswalkEntry;
use crate::importer::error::ValidationError;
use crate::importer::field_mapper::{
    DEGREE_PATH, EMPLOYMENT, GRADUATE_COUNT, OCCUPATION_CODE, OPENINGS, YEAR,
};
use crate::importer::importer_trait::DqValidator;

pub const MIN_YEAR: i64 = 1900;
pub const MAX_YEAR: i64 = 2200;

pub struct DqValidatorImpl;

impl DqValidator for DqValidatorImpl {
    fn validate_degree(&self, row: &RawDegreeRow) -> Result<DegreeRecord, ValidationError> {
        let degree_path = required(row.degree_path.clone(), DEGREE_PATH, row.row_number)?;
        let year = validate_year(row.year, row.row_number)?;
        let graduate_count = non_negative(row.graduate_count, GRADUATE_COUNT, row.row_number)?;

        Ok(DegreeRecord {
            degree_path,
            year,
            graduate_count,
        })
    }

    fn validate_job(&self, row: &RawJobRow) -> Result<JobRecord, ValidationError> {
        let occupation_code = required(row.occupation_code.clone(), OCCUPATION_CODE, row.row_number)?;
        let year = validate_year(row.year, row.row_number)?;
        let openings = non_negative(row.openings, OPENINGS, row.row_number)?;

        Ok(JobRecord {
            occupation_code,
            year,
            openings,
        })
    }

    fn validate_crosswalk(&self, row: &RawCrosswalkRow) -> Result<CrosswalkEntry, ValidationError> {
        let degree_path = required(row.degree_path.clone(), DEGREE_PATH, row.row_number)?;
        let occupation_code = required(row.occupation_code.clone(), OCCUPATION_CODE, row.row_number)?;

        if let Some(weight) = row.weight {
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(ValidationError::InvalidWeight {
                    row: row.row_number,
                    value: weight,
                });
            }
        }

        Ok(CrosswalkEntry {
            degree_path,
            occupation_code,
            weight: row.weight,
            row_number: row.row_number,
        })
    }

    fn validate_employment(
        &self,
        row: &RawEmploymentRow,
    ) -> Result<EmploymentRecord, ValidationError> {
        let occupation_code = required(row.occupation_code.clone(), OCCUPATION_CODE, row.row_number)?;
        let year = validate_year(row.year, row.row_number)?;
        let employment = non_negative(row.employment, EMPLOYMENT, row.row_number)?;

        Ok(EmploymentRecord {
            occupation_code,
            year,
            employment,
        })
    }
}

fn required<T>(value: Option<T>, field: &str, row: usize) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingField {
        row,
        field: field.to_string(),
    })
}

fn validate_year(value: Option<i64>, row: usize) -> Result<i32, ValidationError> {
    let year = required(value, YEAR, row)?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ValidationError::YearOutOfRange { row, value: year });
    }
    // 范围已校验，转换不会截断
    Ok(year as i32)
}

fn non_negative(value: Option<i64>, field: &str, row: usize) -> Result<u64, ValidationError> {
    let count = required(value, field, row)?;
    if count < 0 {
        return Err(ValidationError::NegativeValue {
            row,
            field: field.to_string(),
            value: count,
        });
    }
    Ok(count as u64)
}
