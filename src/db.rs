// ==========================================
// 学位市场饱和度分析 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表（幂等），只存源数据与配置，不存派生分数
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id TEXT PRIMARY KEY,
            source_files TEXT NOT NULL,
            rows_read INTEGER NOT NULL,
            rows_kept INTEGER NOT NULL,
            rows_dropped INTEGER NOT NULL,
            rows_filtered INTEGER NOT NULL,
            renormalized_mappings INTEGER NOT NULL,
            imported_at TEXT NOT NULL,
            elapsed_ms INTEGER,
            dq_report_json TEXT
        );

        CREATE TABLE IF NOT EXISTS degree_record (
            degree_path TEXT NOT NULL,
            year INTEGER NOT NULL,
            graduate_count INTEGER NOT NULL CHECK (graduate_count >= 0),
            batch_id TEXT NOT NULL REFERENCES import_batch(batch_id),
            PRIMARY KEY (degree_path, year)
        );

        CREATE TABLE IF NOT EXISTS job_record (
            occupation_code TEXT NOT NULL,
            year INTEGER NOT NULL,
            openings INTEGER NOT NULL CHECK (openings >= 0),
            batch_id TEXT NOT NULL REFERENCES import_batch(batch_id),
            PRIMARY KEY (occupation_code, year)
        );

        CREATE TABLE IF NOT EXISTS crosswalk_entry (
            degree_path TEXT NOT NULL,
            occupation_code TEXT NOT NULL,
            weight REAL NOT NULL CHECK (weight >= 0.0),
            batch_id TEXT NOT NULL REFERENCES import_batch(batch_id),
            PRIMARY KEY (degree_path, occupation_code)
        );

        CREATE TABLE IF NOT EXISTS employment_record (
            occupation_code TEXT NOT NULL,
            year INTEGER NOT NULL,
            employment INTEGER NOT NULL CHECK (employment >= 0),
            batch_id TEXT NOT NULL REFERENCES import_batch(batch_id),
            PRIMARY KEY (occupation_code, year)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
