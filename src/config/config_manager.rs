// ==========================================
// 学位市场饱和度分析 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::saturation_config::SaturationConfig;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const WEIGHT_TOLERANCE: &str = "weight_tolerance";
    pub const SIMILARITY_THRESHOLD: &str = "similarity_threshold";
    pub const DEFAULT_ALTERNATIVES_K: &str = "default_alternatives_k";
    pub const AWARD_LEVELS: &str = "award_levels";
    pub const HIGH_SATURATION_THRESHOLD: &str = "high_saturation_threshold";
    pub const LOW_SATURATION_THRESHOLD: &str = "low_saturation_threshold";
    pub const SENTIMENT_HIGH_THRESHOLD: &str = "sentiment_high_threshold";
    pub const GROWTH_THRESHOLD: &str = "growth_threshold";
    pub const ONLY_LESS_SATURATED_ALTERNATIVES: &str = "only_less_saturated_alternatives";
    pub const DEGREE_LOOKUP: &str = "degree_lookup";
    pub const OCCUPATION_LOOKUP: &str = "occupation_lookup";
}

// ==========================================
// SaturationConfigReader Trait
// ==========================================
// 用途: 加载器/引擎所需的配置读取接口
// 实现者: ConfigManager（config_kv 表）、SaturationConfig（静态配置）
pub trait SaturationConfigReader: Send + Sync {
    fn saturation_config(&self) -> RepositoryResult<SaturationConfig>;
}

impl SaturationConfigReader for SaturationConfig {
    fn saturation_config(&self) -> RepositoryResult<SaturationConfig> {
        Ok(self.clone())
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;

        tracing::debug!(key = key, "配置已更新");
        Ok(())
    }

    /// 将完整配置逐项写入 config_kv
    pub fn save_saturation_config(&self, config: &SaturationConfig) -> RepositoryResult<()> {
        config
            .validate()
            .map_err(RepositoryError::ValidationError)?;

        let value = serde_json::to_value(config)
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;
        if let serde_json::Value::Object(fields) = value {
            for (key, field_value) in fields {
                self.set_global_config_value(&key, &field_value.to_string())?;
            }
        }
        Ok(())
    }

    /// 读取并解析单个配置项，缺失时返回 None
    fn read_typed<T: DeserializeOwned>(&self, key: &str) -> RepositoryResult<Option<T>> {
        match self.get_global_config_value(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str::<T>(raw.trim())
                .map(Some)
                .map_err(|e| RepositoryError::FieldValueError {
                    field: key.to_string(),
                    message: format!("配置值格式错误 ({}): {}", raw, e),
                }),
        }
    }

    /// 加载饱和度配置（缺失项使用默认值）
    pub fn load_saturation_config(&self) -> RepositoryResult<SaturationConfig> {
        use config_keys::*;

        let mut config = SaturationConfig::default();

        if let Some(v) = self.read_typed(WEIGHT_TOLERANCE)? {
            config.weight_tolerance = v;
        }
        if let Some(v) = self.read_typed(SIMILARITY_THRESHOLD)? {
            config.similarity_threshold = v;
        }
        if let Some(v) = self.read_typed(DEFAULT_ALTERNATIVES_K)? {
            config.default_alternatives_k = v;
        }
        if let Some(v) = self.read_typed(AWARD_LEVELS)? {
            config.award_levels = v;
        }
        if let Some(v) = self.read_typed(HIGH_SATURATION_THRESHOLD)? {
            config.high_saturation_threshold = v;
        }
        if let Some(v) = self.read_typed(LOW_SATURATION_THRESHOLD)? {
            config.low_saturation_threshold = v;
        }
        if let Some(v) = self.read_typed(SENTIMENT_HIGH_THRESHOLD)? {
            config.sentiment_high_threshold = v;
        }
        if let Some(v) = self.read_typed(GROWTH_THRESHOLD)? {
            config.growth_threshold = v;
        }
        if let Some(v) = self.read_typed(ONLY_LESS_SATURATED_ALTERNATIVES)? {
            config.only_less_saturated_alternatives = v;
        }
        if let Some(v) = self.read_typed(DEGREE_LOOKUP)? {
            config.degree_lookup = v;
        }
        if let Some(v) = self.read_typed(OCCUPATION_LOOKUP)? {
            config.occupation_lookup = v;
        }

        config
            .validate()
            .map_err(RepositoryError::ValidationError)?;
        Ok(config)
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let config = self.load_saturation_config()?;
        serde_json::to_string(&config).map_err(|e| RepositoryError::InternalError(e.to_string()))
    }
}

impl SaturationConfigReader for ConfigManager {
    fn saturation_config(&self) -> RepositoryResult<SaturationConfig> {
        self.load_saturation_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();
        let manager = ConfigManager::new(&path).unwrap();
        (temp_file, manager)
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let (_tmp, manager) = create_manager();
        let config = manager.load_saturation_config().unwrap();
        assert_eq!(config, SaturationConfig::default());
    }

    #[test]
    fn test_override_single_key() {
        let (_tmp, manager) = create_manager();
        manager
            .set_global_config_value(config_keys::SIMILARITY_THRESHOLD, "0.45")
            .unwrap();
        manager
            .set_global_config_value(config_keys::AWARD_LEVELS, "[5]")
            .unwrap();

        let config = manager.load_saturation_config().unwrap();
        assert_eq!(config.similarity_threshold, 0.45);
        assert_eq!(config.award_levels, vec![5]);
        assert_eq!(config.weight_tolerance, 0.01);
    }

    #[test]
    fn test_malformed_value_is_reported() {
        let (_tmp, manager) = create_manager();
        manager
            .set_global_config_value(config_keys::WEIGHT_TOLERANCE, "abc")
            .unwrap();

        let result = manager.load_saturation_config();
        assert!(matches!(
            result,
            Err(RepositoryError::FieldValueError { ref field, .. }) if field == "weight_tolerance"
        ));
    }

    #[test]
    fn test_save_and_reload_full_config() {
        let (_tmp, manager) = create_manager();
        let mut config = SaturationConfig::default();
        config.only_less_saturated_alternatives = true;
        config
            .degree_lookup
            .insert("Computer Science".to_string(), "ComputerScience".to_string());

        manager.save_saturation_config(&config).unwrap();
        let loaded = manager.load_saturation_config().unwrap();
        assert_eq!(loaded, config);
    }
}
