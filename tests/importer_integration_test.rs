// ==========================================
// 数据集加载集成测试
// ==========================================
// 覆盖: CSV 解析 → 字段映射 → DQ 校验 → 代码规范化 → 聚合 → 对照表权重
// ==========================================


use degree_saturation::config::SaturationConfig;
use degree_saturation::domain::import::DqLevel;
use degree_saturation::domain::types::DatasetKind;
use degree_saturation::importer::{DatasetFiles, DatasetLoader, ImportError, UNCLASSIFIED};
use test_helpers::*;

#[test]
fn test_load_fixture_files() {
    let loader = DatasetLoader::new(SaturationConfig::default());
    let (dataset, report) = loader.load_files(&fixture_files()).unwrap();

    assert_eq!(dataset, sample_dataset());

    let degrees = report.table(DatasetKind::Degrees);
    assert_eq!(degrees.rows_read, 9);
    assert_eq!(degrees.rows_kept, 7);
    assert_eq!(degrees.rows_dropped, 1);
    assert_eq!(degrees.rows_filtered, 1);

    let jobs = report.table(DatasetKind::Jobs);
    assert_eq!(jobs.rows_read, 4);
    assert_eq!(jobs.rows_kept, 4);

    assert_eq!(report.table(DatasetKind::Employment).rows_kept, 4);
    assert_eq!(report.error_count(), 1);
    assert!(report.renormalized.is_empty());
}

#[test]
fn test_negative_count_reported_with_row_number() {
    let loader = DatasetLoader::new(SaturationConfig::default());
    let (_, report) = loader.load_files(&fixture_files()).unwrap();

    let error = report
        .violations
        .iter()
        .find(|v| v.level == DqLevel::Error)
        .unwrap();
    assert_eq!(error.dataset, DatasetKind::Degrees);
    // 表头占第 1 行
    assert_eq!(error.row_number, 10);
    assert_eq!(error.field, "graduate_count");
}

#[test]
fn test_missing_weight_gets_warning() {
    let loader = DatasetLoader::new(SaturationConfig::default());
    let (dataset, report) = loader.load_files(&fixture_files()).unwrap();

    let biology = dataset
        .mappings
        .iter()
        .find(|m| m.degree_path == BIOLOGY)
        .unwrap();
    assert!(approx_eq(biology.weight, 1.0));

    assert!(report.violations.iter().any(|v| {
        v.level == DqLevel::Warning
            && v.dataset == DatasetKind::Crosswalk
            && v.key.as_deref() == Some(BIOLOGY)
    }));
}

#[test]
fn test_weights_outside_tolerance_are_renormalized() {
    let (_dir, files) = write_dataset(
        "cipcode,year,ctotalt\n11.0701,2024,100\n",
        "soc_code,year,openings\n15-1252,2024,10\n15-1299,2024,10\n",
        "cipcode,soccode,weight\n11.0701,15-1252,0.5\n11.0701,15-1299,0.25\n",
    )
    .unwrap();

    let loader = DatasetLoader::new(SaturationConfig::default());
    let (dataset, report) = loader.load_files(&files).unwrap();

    let total: f64 = dataset.mappings.iter().map(|m| m.weight).sum();
    assert!(approx_eq(total, 1.0));
    assert_eq!(report.renormalized.len(), 1);
    assert_eq!(report.renormalized[0].degree_path, "11.0701");
    assert!(approx_eq(report.renormalized[0].original_total, 0.75));
}

#[test]
fn test_zero_weight_total_fails_whole_load() {
    let (_dir, files) = write_dataset(
        "cipcode,year,ctotalt\n11.0701,2024,100\n",
        "soc_code,year,openings\n15-1252,2024,10\n",
        "cipcode,soccode,weight\n11.0701,15-1252,0\n",
    )
    .unwrap();

    let loader = DatasetLoader::new(SaturationConfig::default());
    let result = loader.load_files(&files);
    assert!(matches!(
        result,
        Err(ImportError::CrosswalkError { ref degree_path, .. }) if degree_path == "11.0701"
    ));
}

#[test]
fn test_lookup_maps_labels_and_unclassified() {
    let (_dir, files) = write_dataset(
        "degree_path,year,graduate_count\nComputer Science,2024,100\nUnderwater Basketry,2024,7\n",
        "occupation_code,year,openings\nSoftware Developers,2024,80\n",
        "degree_path,occupation_code,weight\nComputer Science,Software Developers,1\n",
    )
    .unwrap();

    let mut config = SaturationConfig::default();
    config
        .degree_lookup
        .insert("Computer Science".to_string(), "11.0701".to_string());
    config
        .occupation_lookup
        .insert("Software Developers".to_string(), "15-1252".to_string());

    let (dataset, report) = DatasetLoader::new(config).load_files(&files).unwrap();

    let paths: Vec<&str> = dataset.degrees.iter().map(|d| d.degree_path.as_str()).collect();
    assert_eq!(paths, vec!["11.0701", UNCLASSIFIED]);
    assert_eq!(dataset.jobs[0].occupation_code, "15-1252");
    assert_eq!(report.table(DatasetKind::Degrees).unclassified, 1);
}

#[test]
fn test_missing_file_is_file_not_found() {
    let files = DatasetFiles {
        degrees: fixtures_dir().join("no_such_file.csv"),
        ..fixture_files()
    };
    let loader = DatasetLoader::new(SaturationConfig::default());
    assert!(matches!(
        loader.load_files(&files),
        Err(ImportError::FileNotFound(_))
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let config = SaturationConfig {
        similarity_threshold: 1.5,
        ..SaturationConfig::default()
    };
    let loader = DatasetLoader::new(config);
    assert!(matches!(
        loader.load_files(&fixture_files()),
        Err(ImportError::InvalidConfig(_))
    ));
}
