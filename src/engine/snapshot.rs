// ==========================================
// 学位市场饱和度分析 - 数据集快照
// ==========================================
// 职责: 已校验数据集的只读索引 + 原子替换
// 红线:
// - 快照构建后不可变，所有查询都显式接收快照
// - 重载只替换 Arc 指针，读者看到的要么是旧快照，要么是新快照
// ==========================================

use crate::domain::dataset::ValidatedDataset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

// ==========================================
// SnapshotInfo - 快照元信息
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub snapshot_id: String,
    pub batch_id: Option<String>,
    pub loaded_at: DateTime<Utc>,
    pub degree_count: usize,
    pub occupation_count: usize,
    pub mapping_count: usize,
    pub years: Vec<i32>,
}

// ==========================================
// DatasetSnapshot - 不可变数据集快照
// ==========================================
// 索引均为 BTreeMap，迭代顺序确定
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    snapshot_id: String,
    batch_id: Option<String>,
    loaded_at: DateTime<Utc>,
    graduates: BTreeMap<String, BTreeMap<i32, u64>>, // degree_path → year → graduates
    openings: BTreeMap<String, BTreeMap<i32, u64>>,  // occupation → year → openings
    employment: BTreeMap<String, BTreeMap<i32, u64>>, // occupation → year → employment
    crosswalk: BTreeMap<String, BTreeMap<String, f64>>, // degree_path → occupation → weight
    occupation_degrees: BTreeMap<String, BTreeSet<String>>, // occupation → degree_paths
    years: BTreeSet<i32>,
}

impl DatasetSnapshot {
    /// 由已校验数据集构建快照
    pub fn from_dataset(dataset: &ValidatedDataset) -> Self {
        let mut graduates: BTreeMap<String, BTreeMap<i32, u64>> = BTreeMap::new();
        let mut years = BTreeSet::new();
        for record in &dataset.degrees {
            let slot = graduates
                .entry(record.degree_path.clone())
                .or_default()
                .entry(record.year)
                .or_insert(0);
            *slot = slot.saturating_add(record.graduate_count);
            years.insert(record.year);
        }

        let mut openings: BTreeMap<String, BTreeMap<i32, u64>> = BTreeMap::new();
        for record in &dataset.jobs {
            let slot = openings
                .entry(record.occupation_code.clone())
                .or_default()
                .entry(record.year)
                .or_insert(0);
            *slot = slot.saturating_add(record.openings);
        }

        let mut employment: BTreeMap<String, BTreeMap<i32, u64>> = BTreeMap::new();
        for record in &dataset.employment {
            let slot = employment
                .entry(record.occupation_code.clone())
                .or_default()
                .entry(record.year)
                .or_insert(0);
            *slot = slot.saturating_add(record.employment);
        }

        let mut crosswalk: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        let mut occupation_degrees: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for mapping in &dataset.mappings {
            *crosswalk
                .entry(mapping.degree_path.clone())
                .or_default()
                .entry(mapping.occupation_code.clone())
                .or_insert(0.0) += mapping.weight;
            occupation_degrees
                .entry(mapping.occupation_code.clone())
                .or_default()
                .insert(mapping.degree_path.clone());
        }

        Self {
            snapshot_id: Uuid::new_v4().to_string(),
            batch_id: None,
            loaded_at: Utc::now(),
            graduates,
            openings,
            employment,
            crosswalk,
            occupation_degrees,
            years,
        }
    }

    /// 空快照（尚未导入任何数据）
    pub fn empty() -> Self {
        Self::from_dataset(&ValidatedDataset::default())
    }

    /// 关联导入批次
    pub fn with_batch(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    pub fn info(&self) -> SnapshotInfo {
        let occupations: BTreeSet<&String> = self
            .openings
            .keys()
            .chain(self.occupation_degrees.keys())
            .collect();

        SnapshotInfo {
            snapshot_id: self.snapshot_id.clone(),
            batch_id: self.batch_id.clone(),
            loaded_at: self.loaded_at,
            degree_count: self.degree_paths().count(),
            occupation_count: occupations.len(),
            mapping_count: self.crosswalk.values().map(|m| m.len()).sum(),
            years: self.years.iter().copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.graduates.is_empty() && self.openings.is_empty() && self.crosswalk.is_empty()
    }

    // ==========================================
    // 学位维度
    // ==========================================

    /// 学位路径是否已知（出现在毕业生记录或对照表中）
    pub fn knows_degree(&self, degree_path: &str) -> bool {
        self.graduates.contains_key(degree_path) || self.crosswalk.contains_key(degree_path)
    }

    /// 所有已知学位路径（升序，去重）
    pub fn degree_paths(&self) -> impl Iterator<Item = &str> {
        let all: BTreeSet<&str> = self
            .graduates
            .keys()
            .chain(self.crosswalk.keys())
            .map(String::as_str)
            .collect();
        all.into_iter()
    }

    pub fn graduates(&self, degree_path: &str, year: i32) -> Option<u64> {
        self.graduates
            .get(degree_path)
            .and_then(|by_year| by_year.get(&year))
            .copied()
    }

    /// 学位历年毕业生人数
    pub fn graduate_history(&self, degree_path: &str) -> Option<&BTreeMap<i32, u64>> {
        self.graduates.get(degree_path)
    }

    /// 某年有毕业生记录的全部学位（按学位路径升序）
    pub fn degrees_in_year(&self, year: i32) -> impl Iterator<Item = (&str, u64)> {
        self.graduates.iter().filter_map(move |(path, by_year)| {
            by_year.get(&year).map(|count| (path.as_str(), *count))
        })
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.years.contains(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.iter().copied()
    }

    // ==========================================
    // 职业维度
    // ==========================================

    /// 学位的职业权重向量
    pub fn occupation_weights(&self, degree_path: &str) -> Option<&BTreeMap<String, f64>> {
        self.crosswalk.get(degree_path)
    }

    /// 岗位空缺数（无记录视为 0）
    pub fn openings(&self, occupation_code: &str, year: i32) -> u64 {
        self.openings
            .get(occupation_code)
            .and_then(|by_year| by_year.get(&year))
            .copied()
            .unwrap_or(0)
    }

    pub fn employment(&self, occupation_code: &str, year: i32) -> Option<u64> {
        self.employment
            .get(occupation_code)
            .and_then(|by_year| by_year.get(&year))
            .copied()
    }

    pub fn has_employment_data(&self) -> bool {
        !self.employment.is_empty()
    }

    /// 有就业人数记录的年份（升序）
    pub fn employment_years(&self) -> BTreeSet<i32> {
        self.employment
            .values()
            .flat_map(|by_year| by_year.keys().copied())
            .collect()
    }

    /// 与给定学位至少共享一个职业的其他学位（不含自身，升序）
    pub fn degrees_sharing_occupation(&self, degree_path: &str) -> BTreeSet<&str> {
        let mut shared = BTreeSet::new();
        if let Some(weights) = self.crosswalk.get(degree_path) {
            for occupation in weights.keys() {
                if let Some(degrees) = self.occupation_degrees.get(occupation) {
                    shared.extend(degrees.iter().map(String::as_str));
                }
            }
        }
        shared.remove(degree_path);
        shared
    }
}

// ==========================================
// SnapshotStore - 快照持有者（原子替换）
// ==========================================
pub struct SnapshotStore {
    current: RwLock<Arc<DatasetSnapshot>>,
}

impl SnapshotStore {
    pub fn new(snapshot: DatasetSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// 获取当前快照（读者持有 Arc，不受后续替换影响）
    pub fn current(&self) -> Arc<DatasetSnapshot> {
        // 锁内只有 Arc 指针，中毒时内部值仍完整
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// 替换快照，返回旧快照
    pub fn replace(&self, snapshot: DatasetSnapshot) -> Arc<DatasetSnapshot> {
        self.install(snapshot).0
    }

    /// 写锁内完成替换，返回 (旧快照, 新装入的快照)
    fn install(&self, snapshot: DatasetSnapshot) -> (Arc<DatasetSnapshot>, Arc<DatasetSnapshot>) {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let previous = std::mem::replace(&mut *guard, Arc::clone(&next));
        tracing::info!(
            previous = %previous.snapshot_id,
            current = %next.snapshot_id,
            "数据集快照已替换"
        );
        (previous, next)
    }

    /// 构建新快照并替换；构建失败则保留旧快照
    pub fn reload<E, F>(&self, build: F) -> Result<Arc<DatasetSnapshot>, E>
    where
        F: FnOnce() -> Result<DatasetSnapshot, E>,
        E: std::fmt::Display,
    {
        match build() {
            Ok(snapshot) => Ok(self.install(snapshot).1),
            Err(e) => {
                tracing::warn!(error = %e, "快照重载失败，继续使用旧快照");
                Err(e)
            }
        }
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(DatasetSnapshot::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{DegreeOccupationMapping, DegreeRecord, JobRecord};

    fn dataset() -> ValidatedDataset {
        ValidatedDataset {
            degrees: vec![
                DegreeRecord {
                    degree_path: "A".to_string(),
                    year: 2024,
                    graduate_count: 10,
                },
                DegreeRecord {
                    degree_path: "B".to_string(),
                    year: 2023,
                    graduate_count: 5,
                },
            ],
            jobs: vec![JobRecord {
                occupation_code: "X".to_string(),
                year: 2024,
                openings: 8,
            }],
            mappings: vec![
                DegreeOccupationMapping {
                    degree_path: "A".to_string(),
                    occupation_code: "X".to_string(),
                    weight: 1.0,
                },
                DegreeOccupationMapping {
                    degree_path: "B".to_string(),
                    occupation_code: "X".to_string(),
                    weight: 1.0,
                },
                DegreeOccupationMapping {
                    degree_path: "C".to_string(),
                    occupation_code: "Y".to_string(),
                    weight: 1.0,
                },
            ],
            employment: vec![],
        }
    }

    #[test]
    fn test_indexes() {
        let snapshot = DatasetSnapshot::from_dataset(&dataset());

        assert!(snapshot.knows_degree("C"));
        assert!(!snapshot.knows_degree("Z"));
        assert_eq!(snapshot.graduates("A", 2024), Some(10));
        assert_eq!(snapshot.graduates("A", 2023), None);
        assert_eq!(snapshot.openings("X", 2024), 8);
        assert_eq!(snapshot.openings("X", 2020), 0);
        assert_eq!(snapshot.degrees_in_year(2024).collect::<Vec<_>>(), vec![("A", 10)]);
        assert_eq!(
            snapshot.degrees_sharing_occupation("A").into_iter().collect::<Vec<_>>(),
            vec!["B"]
        );

        let info = snapshot.info();
        assert_eq!(info.degree_count, 3);
        assert_eq!(info.occupation_count, 2);
        assert_eq!(info.mapping_count, 3);
        assert_eq!(info.years, vec![2023, 2024]);
    }

    #[test]
    fn test_store_replace_keeps_reader_view() {
        let store = SnapshotStore::default();
        let before = store.current();
        assert!(before.is_empty());

        store.replace(DatasetSnapshot::from_dataset(&dataset()));

        // 旧读者持有的快照不变
        assert!(before.is_empty());
        assert!(!store.current().is_empty());
    }

    #[test]
    fn test_store_reload_failure_keeps_previous() {
        let store = SnapshotStore::new(DatasetSnapshot::from_dataset(&dataset()).with_batch("B1"));

        let result: Result<_, String> = store.reload(|| Err("crosswalk broken".to_string()));
        assert!(result.is_err());
        assert_eq!(store.current().info().batch_id.as_deref(), Some("B1"));
    }

    #[test]
    fn test_store_reload_returns_installed_snapshot() {
        let store = SnapshotStore::new(DatasetSnapshot::empty().with_batch("B1"));

        let installed = store
            .reload(|| Ok::<_, String>(DatasetSnapshot::from_dataset(&dataset()).with_batch("B2")))
            .unwrap();
        assert_eq!(installed.info().batch_id.as_deref(), Some("B2"));
        assert!(Arc::ptr_eq(&installed, &store.current()));

        // 之后的替换不影响已返回的快照
        let previous = store.replace(DatasetSnapshot::empty().with_batch("B3"));
        assert!(Arc::ptr_eq(&previous, &installed));
        assert_eq!(installed.info().batch_id.as_deref(), Some("B2"));
        assert_eq!(store.current().info().batch_id.as_deref(), Some("B3"));
    }
}
