// ==========================================
// 饱和度引擎集成测试
// ==========================================
// 覆盖: 饱和度 / 排名 / 替代学位 / 展望 / 供给预测 / 确定性
// ==========================================


use degree_saturation::config::SaturationConfig;
use degree_saturation::domain::dataset::ValidatedDataset;
use degree_saturation::domain::types::{MarketSentiment, SaturationTag};
use degree_saturation::engine::{
    AlternativeFinder, Classifier, DatasetSnapshot, EngineError, SaturationEngine,
    SupplyForecaster,
};
use test_helpers::*;

fn snapshot() -> DatasetSnapshot {
    DatasetSnapshot::from_dataset(&sample_dataset())
}

#[test]
fn test_compute_saturation_cs() {
    let record = SaturationEngine::new()
        .compute_saturation(&snapshot(), CS, 2024)
        .unwrap();

    assert_eq!(record.grad_count, 50_000);
    assert!(approx_eq(record.job_count, 40_000.0));
    assert!(approx_eq(record.score, 1.25));
}

#[test]
fn test_compute_saturation_weighted_jobs() {
    let record = SaturationEngine::new()
        .compute_saturation(&snapshot(), DATA_SCIENCE, 2024)
        .unwrap();

    // 0.6 × 12000 + 0.4 × 40000
    assert!((record.job_count - 23_200.0).abs() < 1e-6);
    assert!((record.score - 10_000.0 / 23_200.0).abs() < 1e-9);
}

#[test]
fn test_no_openings_is_infinite() {
    let record = SaturationEngine::new()
        .compute_saturation(&snapshot(), CREATIVE_WRITING, 2024)
        .unwrap();
    assert!(record.score.is_infinite());
    assert_eq!(record.job_count, 0.0);
}

#[test]
fn test_compute_saturation_errors() {
    let engine = SaturationEngine::new();
    let snapshot = snapshot();

    assert_eq!(
        engine.compute_saturation(&snapshot, "99.9999", 2024),
        Err(EngineError::DegreeNotFound("99.9999".to_string()))
    );
    assert_eq!(
        engine.compute_saturation(&snapshot, MATH, 2022),
        Err(EngineError::YearNotFound {
            degree_path: Some(MATH.to_string()),
            year: 2022,
        })
    );
}

#[test]
fn test_rank_degrees_ascending_with_infinity_last() {
    let ranked = SaturationEngine::new().rank_degrees(&snapshot(), 2024).unwrap();

    let order: Vec<&str> = ranked.iter().map(|r| r.degree_path.as_str()).collect();
    assert_eq!(order, vec![BIOLOGY, DATA_SCIENCE, CS, MATH, CREATIVE_WRITING]);
    assert!(ranked.last().unwrap().score.is_infinite());
}

#[test]
fn test_rank_degrees_only_includes_year() {
    let ranked = SaturationEngine::new().rank_degrees(&snapshot(), 2022).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].degree_path, CS);

    assert_eq!(
        SaturationEngine::new().rank_degrees(&snapshot(), 1999),
        Err(EngineError::YearNotFound {
            degree_path: None,
            year: 1999,
        })
    );
}

#[test]
fn test_rank_is_deterministic_across_input_order() {
    let dataset = sample_dataset();
    let mut reversed = ValidatedDataset {
        degrees: dataset.degrees.iter().rev().cloned().collect(),
        jobs: dataset.jobs.iter().rev().cloned().collect(),
        mappings: dataset.mappings.iter().rev().cloned().collect(),
        employment: dataset.employment.iter().rev().cloned().collect(),
    };

    let engine = SaturationEngine::new();
    let first = engine
        .rank_degrees(&DatasetSnapshot::from_dataset(&dataset), 2024)
        .unwrap();
    let second = engine
        .rank_degrees(&DatasetSnapshot::from_dataset(&reversed), 2024)
        .unwrap();
    assert_eq!(first, second);

    reversed.sort();
    assert_eq!(reversed, dataset);
}

#[test]
fn test_alternatives_exclude_query_and_respect_k() {
    let finder = AlternativeFinder::new(0.3);
    let snapshot = snapshot();

    let alternatives = finder.find_alternatives(&snapshot, DATA_SCIENCE, 2024, 3).unwrap();
    let paths: Vec<&str> = alternatives.iter().map(|r| r.degree_path.as_str()).collect();
    assert_eq!(paths, vec![CS, MATH]);

    let top_one = finder.find_alternatives(&snapshot, DATA_SCIENCE, 2024, 1).unwrap();
    assert_eq!(top_one.len(), 1);
    assert_eq!(top_one[0].degree_path, CS);

    assert!(finder
        .find_alternatives(&snapshot, DATA_SCIENCE, 2024, 0)
        .unwrap()
        .is_empty());
}

#[test]
fn test_alternatives_similarity_threshold() {
    let snapshot = snapshot();

    // DataScience↔Math 相似度约 0.328
    let strict = AlternativeFinder::new(0.4);
    let alternatives = strict
        .find_alternatives_scored(&snapshot, DATA_SCIENCE, 2024, 5)
        .unwrap();
    assert_eq!(alternatives.len(), 1);
    assert_eq!(alternatives[0].record.degree_path, CS);
    assert!((alternatives[0].similarity - 0.4 / 0.52_f64.sqrt()).abs() < 1e-9);
}

#[test]
fn test_alternatives_only_less_saturated() {
    let finder = AlternativeFinder::new(0.3).only_less_saturated(true);
    let alternatives = finder.find_alternatives(&snapshot(), CS, 2024, 3).unwrap();

    // DataScience (≈0.43) 低于 CS (1.25)
    assert_eq!(alternatives.len(), 1);
    assert_eq!(alternatives[0].degree_path, DATA_SCIENCE);

    let none = finder.find_alternatives(&snapshot(), DATA_SCIENCE, 2024, 3).unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_alternatives_unknown_degree() {
    let finder = AlternativeFinder::new(0.3);
    assert_eq!(
        finder.find_alternatives(&snapshot(), "99.9999", 2024, 3),
        Err(EngineError::DegreeNotFound("99.9999".to_string()))
    );
}

#[test]
fn test_outlook_with_employment_growth() {
    let outlook = Classifier::default()
        .degree_outlook(&snapshot(), CS, 2024, None)
        .unwrap();

    assert_eq!(outlook.tag, SaturationTag::ModeratelySaturated);
    assert_eq!(outlook.family, "Computer & Information Sciences");
    assert!((outlook.job_growth_rate.unwrap() - 0.125).abs() < 1e-9);
    assert_eq!(outlook.sentiment, Some(MarketSentiment::Oversaturated));
}

#[test]
fn test_outlook_growing_market() {
    let config = SaturationConfig {
        sentiment_high_threshold: 1.3,
        ..SaturationConfig::default()
    };
    let outlook = Classifier::from_config(&config)
        .degree_outlook(&snapshot(), CS, 2024, Some(2022))
        .unwrap();
    assert_eq!(outlook.sentiment, Some(MarketSentiment::NearlySaturatedGrowing));
}

#[test]
fn test_outlook_without_employment_data() {
    let outlook = Classifier::default()
        .degree_outlook(&snapshot(), BIOLOGY, 2024, None)
        .unwrap();
    assert_eq!(outlook.job_growth_rate, None);
    assert_eq!(outlook.tag, SaturationTag::Unsaturated);
    assert_eq!(outlook.sentiment, Some(MarketSentiment::Undersaturated));
}

#[test]
fn test_forecast_supply_linear_trend() {
    let forecast = SupplyForecaster::new()
        .forecast_supply(&snapshot(), CS, 2024, 4)
        .unwrap();

    assert_eq!(forecast.target_year, 2028);
    assert_eq!(forecast.history.len(), 3);
    assert!((forecast.growth_per_year - 2_500.0).abs() < 1e-6);
    assert_eq!(forecast.predicted_graduates, 60_166);
    assert!((forecast.projected_score - 60_166.0 / 40_000.0).abs() < 1e-9);
}

#[test]
fn test_forecast_single_point_is_flat() {
    let forecast = SupplyForecaster::new()
        .forecast_supply(&snapshot(), MATH, 2024, 4)
        .unwrap();
    assert_eq!(forecast.predicted_graduates, 9_000);
    assert_eq!(forecast.growth_per_year, 0.0);

    assert!(matches!(
        SupplyForecaster::new().forecast_supply(&snapshot(), MATH, 2024, -1),
        Err(EngineError::InvalidArgument(_))
    ));
}
