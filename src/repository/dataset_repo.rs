// ==========================================
// 学位市场饱和度分析 - 源数据集仓储
// ==========================================
// 职责: 已校验源数据与导入批次的持久化（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD；不存派生分数
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::dataset::{
    DegreeOccupationMapping, DegreeRecord, EmploymentRecord, JobRecord, ValidatedDataset,
};
use crate::domain::import::ImportBatch;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// DatasetRepository - 源数据集仓储
// ==========================================
pub struct DatasetRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DatasetRepository {
    /// 创建新的 Repository 实例（并确保 schema 存在）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 使用共享连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 以新批次整体替换源数据（单事务，失败整体回滚）
    ///
    /// # 返回
    /// - Ok(usize): 写入的源数据行数（四张表合计）
    pub fn replace_dataset(
        &self,
        batch: &ImportBatch,
        dataset: &ValidatedDataset,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Self::insert_batch_tx(&tx, batch)?;

        tx.execute_batch(
            r#"
            DELETE FROM degree_record;
            DELETE FROM job_record;
            DELETE FROM crosswalk_entry;
            DELETE FROM employment_record;
            "#,
        )?;

        let mut written = 0;
        written += Self::insert_degrees_tx(&tx, &batch.batch_id, &dataset.degrees)?;
        written += Self::insert_jobs_tx(&tx, &batch.batch_id, &dataset.jobs)?;
        written += Self::insert_mappings_tx(&tx, &batch.batch_id, &dataset.mappings)?;
        written += Self::insert_employment_tx(&tx, &batch.batch_id, &dataset.employment)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(
            batch_id = %batch.batch_id,
            rows = written,
            "源数据集已替换"
        );
        Ok(written)
    }

    fn insert_batch_tx(tx: &Transaction, batch: &ImportBatch) -> RepositoryResult<()> {
        let source_files = serde_json::to_string(&batch.source_files)
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, source_files, rows_read, rows_kept, rows_dropped,
                rows_filtered, renormalized_mappings, imported_at, elapsed_ms, dq_report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                batch.batch_id,
                source_files,
                batch.rows_read as i64,
                batch.rows_kept as i64,
                batch.rows_dropped as i64,
                batch.rows_filtered as i64,
                batch.renormalized_mappings as i64,
                batch.imported_at.to_rfc3339(),
                batch.elapsed_ms,
                batch.dq_report_json,
            ],
        )?;
        Ok(())
    }

    fn insert_degrees_tx(
        tx: &Transaction,
        batch_id: &str,
        records: &[DegreeRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            "INSERT INTO degree_record (degree_path, year, graduate_count, batch_id) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for record in records {
            stmt.execute(params![
                record.degree_path,
                record.year,
                to_sql_count("graduate_count", record.graduate_count)?,
                batch_id
            ])?;
        }
        Ok(records.len())
    }

    fn insert_jobs_tx(
        tx: &Transaction,
        batch_id: &str,
        records: &[JobRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            "INSERT INTO job_record (occupation_code, year, openings, batch_id) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for record in records {
            stmt.execute(params![
                record.occupation_code,
                record.year,
                to_sql_count("openings", record.openings)?,
                batch_id
            ])?;
        }
        Ok(records.len())
    }

    fn insert_mappings_tx(
        tx: &Transaction,
        batch_id: &str,
        mappings: &[DegreeOccupationMapping],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            "INSERT INTO crosswalk_entry (degree_path, occupation_code, weight, batch_id) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for mapping in mappings {
            stmt.execute(params![
                mapping.degree_path,
                mapping.occupation_code,
                mapping.weight,
                batch_id
            ])?;
        }
        Ok(mappings.len())
    }

    fn insert_employment_tx(
        tx: &Transaction,
        batch_id: &str,
        records: &[EmploymentRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            "INSERT INTO employment_record (occupation_code, year, employment, batch_id) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for record in records {
            stmt.execute(params![
                record.occupation_code,
                record.year,
                to_sql_count("employment", record.employment)?,
                batch_id
            ])?;
        }
        Ok(records.len())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 读取完整数据集（同一读事务内，保证四张表来自同一批次）
    pub fn load_dataset(&self) -> RepositoryResult<ValidatedDataset> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let degrees = {
            let mut stmt = tx.prepare(
                "SELECT degree_path, year, graduate_count FROM degree_record ORDER BY degree_path, year",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(DegreeRecord {
                    degree_path: row.get(0)?,
                    year: row.get(1)?,
                    graduate_count: row.get::<_, u64>(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let jobs = {
            let mut stmt = tx.prepare(
                "SELECT occupation_code, year, openings FROM job_record ORDER BY occupation_code, year",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(JobRecord {
                    occupation_code: row.get(0)?,
                    year: row.get(1)?,
                    openings: row.get::<_, u64>(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let mappings = {
            let mut stmt = tx.prepare(
                "SELECT degree_path, occupation_code, weight FROM crosswalk_entry ORDER BY degree_path, occupation_code",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(DegreeOccupationMapping {
                    degree_path: row.get(0)?,
                    occupation_code: row.get(1)?,
                    weight: row.get(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let employment = {
            let mut stmt = tx.prepare(
                "SELECT occupation_code, year, employment FROM employment_record ORDER BY occupation_code, year",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(EmploymentRecord {
                    occupation_code: row.get(0)?,
                    year: row.get(1)?,
                    employment: row.get::<_, u64>(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(ValidatedDataset {
            degrees,
            jobs,
            mappings,
            employment,
        })
    }

    /// 查询导入批次（按导入时间倒序）
    pub fn list_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, source_files, rows_read, rows_kept, rows_dropped,
                   rows_filtered, renormalized_mappings, imported_at, elapsed_ms, dq_report_json
            FROM import_batch
            ORDER BY imported_at DESC, batch_id
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], map_batch_row)?;
        let batches = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }

    /// 最近一次导入批次
    pub fn latest_batch(&self) -> RepositoryResult<Option<ImportBatch>> {
        let conn = self.get_conn()?;
        let batch = conn
            .query_row(
                r#"
                SELECT batch_id, source_files, rows_read, rows_kept, rows_dropped,
                       rows_filtered, renormalized_mappings, imported_at, elapsed_ms, dq_report_json
                FROM import_batch
                ORDER BY imported_at DESC, batch_id
                LIMIT 1
                "#,
                [],
                map_batch_row,
            )
            .optional()?;
        Ok(batch)
    }

    /// 按 ID 查询导入批次
    pub fn find_batch(&self, batch_id: &str) -> RepositoryResult<ImportBatch> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"
            SELECT batch_id, source_files, rows_read, rows_kept, rows_dropped,
                   rows_filtered, renormalized_mappings, imported_at, elapsed_ms, dq_report_json
            FROM import_batch
            WHERE batch_id = ?1
            "#,
            params![batch_id],
            map_batch_row,
        )
        .optional()?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "ImportBatch".to_string(),
            id: batch_id.to_string(),
        })
    }
}

/// 计数列写入 SQLite INTEGER（i64），超出范围时报字段错误
fn to_sql_count(field: &str, value: u64) -> RepositoryResult<i64> {
    i64::try_from(value).map_err(|_| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("{} 超出 INTEGER 范围", value),
    })
}

fn map_batch_row(row: &Row<'_>) -> rusqlite::Result<ImportBatch> {
    let source_files_raw: String = row.get(1)?;
    let source_files: Vec<String> = serde_json::from_str(&source_files_raw).unwrap_or_default();

    let imported_at_raw: String = row.get(7)?;
    let imported_at = DateTime::parse_from_rfc3339(&imported_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ImportBatch {
        batch_id: row.get(0)?,
        source_files,
        rows_read: row.get::<_, i64>(2)? as usize,
        rows_kept: row.get::<_, i64>(3)? as usize,
        rows_dropped: row.get::<_, i64>(4)? as usize,
        rows_filtered: row.get::<_, i64>(5)? as usize,
        renormalized_mappings: row.get::<_, i64>(6)? as usize,
        imported_at,
        elapsed_ms: row.get(8)?,
        dq_report_json: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_batch(batch_id: &str) -> ImportBatch {
        ImportBatch {
            batch_id: batch_id.to_string(),
            source_files: vec!["degrees.csv".to_string()],
            rows_read: 3,
            rows_kept: 3,
            rows_dropped: 0,
            rows_filtered: 0,
            renormalized_mappings: 0,
            imported_at: Utc::now(),
            elapsed_ms: Some(5),
            dq_report_json: None,
        }
    }

    fn sample_dataset() -> ValidatedDataset {
        ValidatedDataset {
            degrees: vec![DegreeRecord {
                degree_path: "11.0101".to_string(),
                year: 2024,
                graduate_count: 100,
            }],
            jobs: vec![JobRecord {
                occupation_code: "15-1252".to_string(),
                year: 2024,
                openings: 80,
            }],
            mappings: vec![DegreeOccupationMapping {
                degree_path: "11.0101".to_string(),
                occupation_code: "15-1252".to_string(),
                weight: 1.0,
            }],
            employment: vec![],
        }
    }

    #[test]
    fn test_replace_and_load_roundtrip() {
        let tmp = NamedTempFile::new().unwrap();
        let repo = DatasetRepository::new(tmp.path().to_str().unwrap()).unwrap();

        let written = repo
            .replace_dataset(&sample_batch("B1"), &sample_dataset())
            .unwrap();
        assert_eq!(written, 3);

        let loaded = repo.load_dataset().unwrap();
        assert_eq!(loaded, sample_dataset());
    }

    #[test]
    fn test_replace_discards_previous_rows() {
        let tmp = NamedTempFile::new().unwrap();
        let repo = DatasetRepository::new(tmp.path().to_str().unwrap()).unwrap();

        repo.replace_dataset(&sample_batch("B1"), &sample_dataset())
            .unwrap();
        repo.replace_dataset(&sample_batch("B2"), &ValidatedDataset::default())
            .unwrap();

        let loaded = repo.load_dataset().unwrap();
        assert!(loaded.is_empty());
        assert_eq!(repo.list_batches(10).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_batch_rolls_back() {
        let tmp = NamedTempFile::new().unwrap();
        let repo = DatasetRepository::new(tmp.path().to_str().unwrap()).unwrap();

        repo.replace_dataset(&sample_batch("B1"), &sample_dataset())
            .unwrap();
        let result = repo.replace_dataset(&sample_batch("B1"), &ValidatedDataset::default());
        assert!(result.is_err());

        // 失败的事务不影响已有数据
        assert_eq!(repo.load_dataset().unwrap(), sample_dataset());
    }

    #[test]
    fn test_find_batch_not_found() {
        let tmp = NamedTempFile::new().unwrap();
        let repo = DatasetRepository::new(tmp.path().to_str().unwrap()).unwrap();

        let result = repo.find_batch("missing");
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
        assert!(repo.latest_batch().unwrap().is_none());
    }

    #[test]
    fn test_count_out_of_range_rejected_and_rolled_back() {
        let tmp = NamedTempFile::new().unwrap();
        let repo = DatasetRepository::new(tmp.path().to_str().unwrap()).unwrap();
        repo.replace_dataset(&sample_batch("B1"), &sample_dataset())
            .unwrap();

        let mut oversized = sample_dataset();
        oversized.degrees[0].graduate_count = u64::MAX;
        let result = repo.replace_dataset(&sample_batch("B2"), &oversized);
        assert!(matches!(
            result,
            Err(RepositoryError::FieldValueError { ref field, .. }) if field == "graduate_count"
        ));

        let mut oversized = sample_dataset();
        oversized.jobs[0].openings = i64::MAX as u64 + 1;
        let result = repo.replace_dataset(&sample_batch("B3"), &oversized);
        assert!(matches!(
            result,
            Err(RepositoryError::FieldValueError { ref field, .. }) if field == "openings"
        ));

        // 事务回滚: 旧数据与批次不变
        assert_eq!(repo.load_dataset().unwrap(), sample_dataset());
        assert_eq!(repo.list_batches(10).unwrap().len(), 1);
    }

    #[test]
    fn test_i64_max_count_roundtrips() {
        let tmp = NamedTempFile::new().unwrap();
        let repo = DatasetRepository::new(tmp.path().to_str().unwrap()).unwrap();

        let mut dataset = sample_dataset();
        dataset.degrees[0].graduate_count = i64::MAX as u64;
        repo.replace_dataset(&sample_batch("B1"), &dataset).unwrap();

        assert_eq!(repo.load_dataset().unwrap(), dataset);
    }
}
