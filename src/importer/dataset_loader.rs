// ==========================================
// 学位市场饱和度分析 - 数据集加载器
// ==========================================
// 职责: 整合加载流程，从原始表到已校验数据集
// 流程: 解析 → 映射 → DQ 校验 → 学历层次过滤 → 代码规范化 → 同键聚合 → 对照表权重校验
// 红线: 行级错误只丢弃该行；仅对照表无法修复时整次失败
// ==========================================

use crate::config::SaturationConfig;
use crate::domain::dataset::{
    DegreeOccupationMapping, DegreeRecord, EmploymentRecord, JobRecord, RawDataset,
    ValidatedDataset,
};
use crate::domain::import::{DqLevel, DqViolation, LoadReport};
use crate::domain::types::DatasetKind;
use crate::importer::code_normalizer::CodeNormalizer;
use crate::importer::crosswalk::{CrosswalkBuilder, CrosswalkEntry};
use crate::importer::dq_validator::DqValidatorImpl;
use crate::importer::error::{ImportError, ImportResult, ValidationError};
use crate::importer::field_mapper::CanonicalFieldMapper;
use crate::importer::file_parser::CsvParser;
use crate::importer::importer_trait::{DqValidator, FieldMapper, FileParser, ParsedRow};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

// ==========================================
// DatasetFiles - 一次加载的源文件
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFiles {
    pub degrees: PathBuf,
    pub jobs: PathBuf,
    pub crosswalk: PathBuf,
    pub employment: Option<PathBuf>,
}

impl DatasetFiles {
    /// 文件名列表（用于导入批次记录）
    pub fn file_names(&self) -> Vec<String> {
        let mut names = vec![
            self.degrees.display().to_string(),
            self.jobs.display().to_string(),
            self.crosswalk.display().to_string(),
        ];
        if let Some(employment) = &self.employment {
            names.push(employment.display().to_string());
        }
        names
    }
}

// ==========================================
// DatasetLoader - 数据集加载器
// ==========================================
pub struct DatasetLoader {
    config: SaturationConfig,

    // 加载组件
    file_parser: Box<dyn FileParser>,
    field_mapper: Box<dyn FieldMapper>,
    dq_validator: Box<dyn DqValidator>,
    normalizer: CodeNormalizer,
}

impl DatasetLoader {
    /// 使用默认组件创建加载器
    pub fn new(config: SaturationConfig) -> Self {
        Self::with_components(
            config,
            Box::new(CsvParser),
            Box::new(CanonicalFieldMapper),
            Box::new(DqValidatorImpl),
        )
    }

    /// 注入自定义组件
    pub fn with_components(
        config: SaturationConfig,
        file_parser: Box<dyn FileParser>,
        field_mapper: Box<dyn FieldMapper>,
        dq_validator: Box<dyn DqValidator>,
    ) -> Self {
        let normalizer = CodeNormalizer::new(
            config.degree_lookup.clone(),
            config.occupation_lookup.clone(),
        );
        Self {
            config,
            file_parser,
            field_mapper,
            dq_validator,
            normalizer,
        }
    }

    pub fn config(&self) -> &SaturationConfig {
        &self.config
    }

    /// 从 CSV 文件加载
    #[instrument(skip(self, files), fields(degrees = %files.degrees.display()))]
    pub fn load_files(&self, files: &DatasetFiles) -> ImportResult<(ValidatedDataset, LoadReport)> {
        let mut report = LoadReport::default();
        let mut raw = RawDataset::default();

        debug!("步骤 1: 解析文件 + 字段映射");
        let rows = self.parse(&files.degrees)?;
        raw.degrees = self.map_rows(rows, DatasetKind::Degrees, &mut report, |m, r| {
            m.map_degree_row(r)
        });

        let rows = self.parse(&files.jobs)?;
        raw.jobs = self.map_rows(rows, DatasetKind::Jobs, &mut report, |m, r| m.map_job_row(r));

        let rows = self.parse(&files.crosswalk)?;
        raw.crosswalk = self.map_rows(rows, DatasetKind::Crosswalk, &mut report, |m, r| {
            m.map_crosswalk_row(r)
        });

        if let Some(path) = &files.employment {
            let rows = self.parse(path)?;
            raw.employment = self.map_rows(rows, DatasetKind::Employment, &mut report, |m, r| {
                m.map_employment_row(r)
            });
        }

        self.load_with_report(raw, report)
    }

    /// 从已映射的原始行加载
    #[instrument(skip(self, raw))]
    pub fn load(&self, raw: RawDataset) -> ImportResult<(ValidatedDataset, LoadReport)> {
        self.load_with_report(raw, LoadReport::default())
    }

    fn parse(&self, path: &Path) -> ImportResult<Vec<ParsedRow>> {
        let rows = self.file_parser.parse_to_raw_records(path)?;
        debug!(file = %path.display(), rows = rows.len(), "文件解析完成");
        Ok(rows)
    }

    fn map_rows<T>(
        &self,
        rows: Vec<ParsedRow>,
        kind: DatasetKind,
        report: &mut LoadReport,
        map: impl Fn(&dyn FieldMapper, &ParsedRow) -> Result<T, ValidationError>,
    ) -> Vec<T> {
        let mut mapped = Vec::with_capacity(rows.len());
        for row in &rows {
            match map(self.field_mapper.as_ref(), row) {
                Ok(record) => mapped.push(record),
                Err(e) => {
                    // 映射失败的行在此计入读取与丢弃
                    report.table_mut(kind).rows_read += 1;
                    drop_row(report, kind, &e, None);
                }
            }
        }
        mapped
    }

    fn load_with_report(
        &self,
        raw: RawDataset,
        mut report: LoadReport,
    ) -> ImportResult<(ValidatedDataset, LoadReport)> {
        self.config.validate().map_err(ImportError::InvalidConfig)?;

        debug!("步骤 2: 毕业生人数");
        let degrees = self.load_degrees(&raw, &mut report);

        debug!("步骤 3: 岗位空缺");
        let jobs = self.load_jobs(&raw, &mut report);

        debug!("步骤 4: 就业人数");
        let employment = self.load_employment(&raw, &mut report);

        debug!("步骤 5: 对照表");
        let mappings = self.load_crosswalk(&raw, &mut report)?;

        let mut dataset = ValidatedDataset {
            degrees,
            jobs,
            mappings,
            employment,
        };
        dataset.sort();

        info!(
            rows_read = report.rows_read(),
            rows_kept = report.rows_kept(),
            rows_dropped = report.rows_dropped(),
            rows_filtered = report.rows_filtered(),
            renormalized = report.renormalized.len(),
            "数据集加载完成"
        );
        Ok((dataset, report))
    }

    fn load_degrees(&self, raw: &RawDataset, report: &mut LoadReport) -> Vec<DegreeRecord> {
        let kind = DatasetKind::Degrees;
        let mut totals: BTreeMap<(String, i32), u64> = BTreeMap::new();

        for row in &raw.degrees {
            report.table_mut(kind).rows_read += 1;

            let record = match self.dq_validator.validate_degree(row) {
                Ok(record) => record,
                Err(e) => {
                    drop_row(report, kind, &e, row.degree_path.clone());
                    continue;
                }
            };

            // 学历层次过滤（只针对已通过校验的行，不是错误）
            if let Some(level) = row.award_level {
                if !self.config.award_levels.is_empty()
                    && !self.config.award_levels.contains(&level)
                {
                    report.table_mut(kind).rows_filtered += 1;
                    continue;
                }
            }

            let degree_path = self.normalize_degree(&record.degree_path, row.row_number, kind, report);
            let total = totals.entry((degree_path, record.year)).or_insert(0);
            *total = total.saturating_add(record.graduate_count);
            report.table_mut(kind).rows_kept += 1;
        }

        totals
            .into_iter()
            .map(|((degree_path, year), graduate_count)| DegreeRecord {
                degree_path,
                year,
                graduate_count,
            })
            .collect()
    }

    fn load_jobs(&self, raw: &RawDataset, report: &mut LoadReport) -> Vec<JobRecord> {
        let kind = DatasetKind::Jobs;
        let mut totals: BTreeMap<(String, i32), u64> = BTreeMap::new();

        for row in &raw.jobs {
            report.table_mut(kind).rows_read += 1;

            let record = match self.dq_validator.validate_job(row) {
                Ok(record) => record,
                Err(e) => {
                    drop_row(report, kind, &e, row.occupation_code.clone());
                    continue;
                }
            };

            let code = self.normalize_occupation(&record.occupation_code, row.row_number, kind, report);
            let total = totals.entry((code, record.year)).or_insert(0);
            *total = total.saturating_add(record.openings);
            report.table_mut(kind).rows_kept += 1;
        }

        totals
            .into_iter()
            .map(|((occupation_code, year), openings)| JobRecord {
                occupation_code,
                year,
                openings,
            })
            .collect()
    }

    fn load_employment(&self, raw: &RawDataset, report: &mut LoadReport) -> Vec<EmploymentRecord> {
        let kind = DatasetKind::Employment;
        let mut totals: BTreeMap<(String, i32), u64> = BTreeMap::new();

        for row in &raw.employment {
            report.table_mut(kind).rows_read += 1;

            let record = match self.dq_validator.validate_employment(row) {
                Ok(record) => record,
                Err(e) => {
                    drop_row(report, kind, &e, row.occupation_code.clone());
                    continue;
                }
            };

            let code = self.normalize_occupation(&record.occupation_code, row.row_number, kind, report);
            let total = totals.entry((code, record.year)).or_insert(0);
            *total = total.saturating_add(record.employment);
            report.table_mut(kind).rows_kept += 1;
        }

        totals
            .into_iter()
            .map(|((occupation_code, year), employment)| EmploymentRecord {
                occupation_code,
                year,
                employment,
            })
            .collect()
    }

    fn load_crosswalk(
        &self,
        raw: &RawDataset,
        report: &mut LoadReport,
    ) -> ImportResult<Vec<DegreeOccupationMapping>> {
        let kind = DatasetKind::Crosswalk;
        let mut entries: Vec<CrosswalkEntry> = Vec::with_capacity(raw.crosswalk.len());

        for row in &raw.crosswalk {
            report.table_mut(kind).rows_read += 1;

            let mut entry = match self.dq_validator.validate_crosswalk(row) {
                Ok(entry) => entry,
                Err(e) => {
                    drop_row(report, kind, &e, row.degree_path.clone());
                    continue;
                }
            };

            entry.degree_path = self.normalize_degree(&entry.degree_path, row.row_number, kind, report);
            entry.occupation_code =
                self.normalize_occupation(&entry.occupation_code, row.row_number, kind, report);
            entries.push(entry);
            report.table_mut(kind).rows_kept += 1;
        }

        let outcome = CrosswalkBuilder::new(self.config.weight_tolerance)
            .build(entries)
            .map_err(|e| {
                warn!(error = %e, "对照表权重无法修复，加载中止");
                e
            })?;

        report.renormalized.extend(outcome.renormalized);
        report.violations.extend(outcome.violations);
        Ok(outcome.mappings)
    }

    fn normalize_degree(
        &self,
        raw: &str,
        row_number: usize,
        kind: DatasetKind,
        report: &mut LoadReport,
    ) -> String {
        let normalized = self.normalizer.normalize_degree(raw);
        if normalized.unclassified {
            record_unclassified(report, kind, row_number, raw, "degree_path");
        }
        normalized.code
    }

    fn normalize_occupation(
        &self,
        raw: &str,
        row_number: usize,
        kind: DatasetKind,
        report: &mut LoadReport,
    ) -> String {
        let normalized = self.normalizer.normalize_occupation(raw);
        if normalized.unclassified {
            record_unclassified(report, kind, row_number, raw, "occupation_code");
        }
        normalized.code
    }
}

/// 丢弃一行：计数 + 记录 ERROR + 日志
fn drop_row(report: &mut LoadReport, kind: DatasetKind, error: &ValidationError, key: Option<String>) {
    warn!(dataset = %kind, row = error.row(), error = %error, "行校验失败，已丢弃");
    report.table_mut(kind).rows_dropped += 1;
    report.violations.push(DqViolation {
        dataset: kind,
        row_number: error.row(),
        key,
        level: DqLevel::Error,
        field: error.field().to_string(),
        message: error.to_string(),
    });
}

fn record_unclassified(
    report: &mut LoadReport,
    kind: DatasetKind,
    row_number: usize,
    raw: &str,
    field: &str,
) {
    debug!(dataset = %kind, row = row_number, code = raw, "代码未命中查找表，归入 unclassified");
    report.table_mut(kind).unclassified += 1;
    report.violations.push(DqViolation {
        dataset: kind,
        row_number,
        key: Some(raw.to_string()),
        level: DqLevel::Info,
        field: field.to_string(),
        message: format!("代码 {} 未命中查找表，归入 unclassified", raw),
    });
}
