// ==========================================
// 学位市场饱和度分析 - 源数据领域模型
// ==========================================
// 职责: 源数据记录（已校验）与导入中间结构体（未校验）
// 红线: 已校验记录加载后不可变，引擎层只读
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// DegreeRecord - 毕业生人数记录
// ==========================================
// 主键: (degree_path, year)，同键多行在加载时累加
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeRecord {
    pub degree_path: String, // 学位路径（CIP 规范化）
    pub year: i32,           // 年份
    pub graduate_count: u64, // 毕业生人数
}

// ==========================================
// JobRecord - 岗位空缺记录
// ==========================================
// 主键: (occupation_code, year)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub occupation_code: String, // 职业代码（SOC 规范化）
    pub year: i32,               // 年份
    pub openings: u64,           // 岗位空缺数
}

// ==========================================
// EmploymentRecord - 职业就业人数记录（可选）
// ==========================================
// 用途: 计算岗位增长率
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentRecord {
    pub occupation_code: String,
    pub year: i32,
    pub employment: u64,
}

// ==========================================
// DegreeOccupationMapping - 学位→职业对照（一条边）
// ==========================================
// 约束: 同一 degree_path 下所有 weight 之和 = 1.0（加载时保证）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeOccupationMapping {
    pub degree_path: String,
    pub occupation_code: String,
    pub weight: f64, // [0, 1]
}

// ==========================================
// 导入中间结构体
// ==========================================
// 用途: 字段映射后的原始行（数值未做非负校验）
// 生命周期: 仅在加载流程内

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDegreeRow {
    pub degree_path: Option<String>,
    pub year: Option<i64>,
    pub graduate_count: Option<i64>,
    pub award_level: Option<i64>, // IPEDS AWLEVEL（可选）
    pub row_number: usize,        // 原始文件行号（用于 DQ 报告）
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawJobRow {
    pub occupation_code: Option<String>,
    pub year: Option<i64>,
    pub openings: Option<i64>,
    pub row_number: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCrosswalkRow {
    pub degree_path: Option<String>,
    pub occupation_code: Option<String>,
    pub weight: Option<f64>, // 缺失时按该学位的职业数均分
    pub row_number: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEmploymentRow {
    pub occupation_code: Option<String>,
    pub year: Option<i64>,
    pub employment: Option<i64>,
    pub row_number: usize,
}

// ==========================================
// RawDataset - 一次加载的全部原始行
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    pub degrees: Vec<RawDegreeRow>,
    pub jobs: Vec<RawJobRow>,
    pub crosswalk: Vec<RawCrosswalkRow>,
    pub employment: Vec<RawEmploymentRow>,
}

// ==========================================
// ValidatedDataset - 校验、规范化、聚合后的数据集
// ==========================================
// 排序: 各集合按主键升序（保证落库/重载结果确定）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedDataset {
    pub degrees: Vec<DegreeRecord>,
    pub jobs: Vec<JobRecord>,
    pub mappings: Vec<DegreeOccupationMapping>,
    pub employment: Vec<EmploymentRecord>,
}

impl ValidatedDataset {
    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty() && self.jobs.is_empty() && self.mappings.is_empty()
    }

    /// 按主键排序，消除输入顺序带来的差异
    pub fn sort(&mut self) {
        self.degrees
            .sort_by(|a, b| (&a.degree_path, a.year).cmp(&(&b.degree_path, b.year)));
        self.jobs
            .sort_by(|a, b| (&a.occupation_code, a.year).cmp(&(&b.occupation_code, b.year)));
        self.mappings.sort_by(|a, b| {
            (&a.degree_path, &a.occupation_code).cmp(&(&b.degree_path, &b.occupation_code))
        });
        self.employment
            .sort_by(|a, b| (&a.occupation_code, a.year).cmp(&(&b.occupation_code, b.year)));
    }
}
