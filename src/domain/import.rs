// ==========================================
// 学位市场饱和度分析 - 导入领域模型
// ==========================================
// 职责: 导入批次、DQ 违规、加载报告
// ==========================================

use crate::domain::types::DatasetKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ImportBatch - 导入批次
// ==========================================
// 对齐: import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,                   // 批次 ID（UUID）
    pub source_files: Vec<String>,          // 源文件列表
    pub rows_read: usize,                   // 读取行数（全部表）
    pub rows_kept: usize,                   // 保留行数
    pub rows_dropped: usize,                // 丢弃行数（DQ ERROR）
    pub rows_filtered: usize,               // 过滤行数（学历层次不在范围内）
    pub renormalized_mappings: usize,       // 被重新归一化的学位数
    pub imported_at: DateTime<Utc>,         // 导入时间
    pub elapsed_ms: Option<i64>,            // 导入耗时（毫秒）
    pub dq_report_json: Option<String>,     // DQ 报告 JSON
}

// ==========================================
// DqLevel - 数据质量级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DqLevel {
    Error,   // 错误（该行丢弃）
    Warning, // 警告（保留并标记，如权重重新归一化）
    Info,    // 提示（仅记录，如归入 unclassified）
}

// ==========================================
// DqViolation - 数据质量违规记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqViolation {
    pub dataset: DatasetKind,  // 所属数据表
    pub row_number: usize,     // 原始文件行号（0 = 聚合级别）
    pub key: Option<String>,   // 学位路径/职业代码（如果可解析）
    pub level: DqLevel,
    pub field: String,
    pub message: String,
}

// ==========================================
// TableSummary - 单表统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,  // ValidationError 丢弃
    pub rows_filtered: usize, // 配置过滤（非错误）
    pub unclassified: usize,  // 归入 unclassified 的行数
}

// ==========================================
// RenormalizedMapping - 被重新归一化的对照权重
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenormalizedMapping {
    pub degree_path: String,
    pub original_total: f64, // 归一化前权重合计
}

// ==========================================
// LoadReport - 加载报告
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub tables: BTreeMap<DatasetKind, TableSummary>,
    pub renormalized: Vec<RenormalizedMapping>,
    pub violations: Vec<DqViolation>,
}

impl LoadReport {
    pub fn table(&self, kind: DatasetKind) -> TableSummary {
        self.tables.get(&kind).cloned().unwrap_or_default()
    }

    pub(crate) fn table_mut(&mut self, kind: DatasetKind) -> &mut TableSummary {
        self.tables.entry(kind).or_default()
    }

    pub fn rows_read(&self) -> usize {
        self.tables.values().map(|t| t.rows_read).sum()
    }

    pub fn rows_kept(&self) -> usize {
        self.tables.values().map(|t| t.rows_kept).sum()
    }

    pub fn rows_dropped(&self) -> usize {
        self.tables.values().map(|t| t.rows_dropped).sum()
    }

    pub fn rows_filtered(&self) -> usize {
        self.tables.values().map(|t| t.rows_filtered).sum()
    }

    pub fn error_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| matches!(v.level, DqLevel::Error))
            .count()
    }
}
