//! Integration test: serving estimates from a trained bundle

mod common;

use common::{core_dataset, engineer_request, fast_config, salary_dataset};
use salary_estimator::inference::SENTINEL_ESTIMATE;
use polars::prelude::*;
use salary_estimator::prelude::*;
use std::sync::{Arc, OnceLock};

fn trained() -> &'static Arc<ModelBundle> {
    static BUNDLE: OnceLock<Arc<ModelBundle>> = OnceLock::new();
    BUNDLE.get_or_init(|| {
        let outcome = ModelBank::new(fast_config().with_seed(42))
            .train(&salary_dataset(600, 42))
            .unwrap();
        assert!(outcome.is_complete());
        outcome.bundle
    })
}

fn predictor() -> Predictor {
    Predictor::new(Arc::clone(trained()))
}

#[test]
fn test_engineer_request_on_core_fields() {
    let outcome = ModelBank::new(TrainingConfig::new().with_seed(42))
        .train(&core_dataset(1000, 42))
        .unwrap();
    let predictor = Predictor::new(outcome.bundle);

    let estimate = predictor.predict(&engineer_request(), None);
    assert!(estimate.is_finite());
    assert!(estimate > 0.0);
}

#[test]
fn test_default_model_is_gradient_boosting() {
    let p = predictor();
    let record = engineer_request();
    assert_eq!(p.select_model(None).unwrap().name(), "Gradient Boosting");
    assert_eq!(p.predict(&record, None), p.predict(&record, Some("Gradient Boosting")));
}

#[test]
fn test_non_negative_for_malformed_inputs() {
    let p = predictor();
    let records = [
        Record::new(),
        Record::new().with("experience", -1000).with("age", 500),
        Record::new().with("experience", "lots").with("education", 42),
        Record::new().with("experience", f64::NAN).with("job_title", ""),
        Record::new().with("unrelated", "field"),
    ];
    for record in &records {
        for model in [None, Some("Linear Regression"), Some("Random Forest"), Some("nope")] {
            let estimate = p.predict(record, model);
            assert!(estimate >= 0.0 && estimate.is_finite(), "{:?} with {:?}", record, model);
            let (point, interval) = p.predict_with_confidence(record, model);
            assert!(point >= 0.0);
            if let Some(ci) = interval {
                assert!(ci.lower >= 0.0 && ci.lower <= ci.upper);
            }
        }
    }
}

#[test]
fn test_unseen_job_title_degrades_gracefully() {
    let p = predictor();
    let record = engineer_request().with("job_title", "Chief Happiness Officer");

    let result = p.predict_detailed(&record, None);
    assert!(result.estimate.is_finite() && result.estimate >= 0.0);
    assert!(!result.degraded);
    assert!(result.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::UnseenCategory { field, value, .. }
            if field == "job_title" && value == "Chief Happiness Officer"
    )));

    let encoded = p.encode_input(&record);
    assert!(encoded.has_substitutions());
}

#[test]
fn test_unknown_model_returns_sentinel_with_diagnostic() {
    let p = predictor();
    assert_eq!(p.predict(&engineer_request(), Some("Neural Network")), SENTINEL_ESTIMATE);

    let result = p.predict_detailed(&engineer_request(), Some("Neural Network"));
    assert!(result.degraded);
    assert!(result.interval.is_none());
    assert!(result
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::InferenceDegraded { .. })));
}

#[test]
fn test_encoding_is_bit_identical() {
    let p = predictor();
    let record = engineer_request().with("age", 31).with("remote_work", "Hybrid");
    let first = p.encode_input(&record);
    let second = p.encode_input(&record);

    let bits = |v: &ndarray::Array1<f64>| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first.encoded), bits(&second.encoded));
    assert_eq!(bits(&first.scaled), bits(&second.scaled));
}

#[test]
fn test_bundle_unchanged_by_serving() {
    let p = predictor();
    let before = trained().as_ref().clone();
    let record = engineer_request().with("job_title", "Astronaut");

    let first: Vec<f64> = ["Linear Regression", "Random Forest", "Gradient Boosting"]
        .iter()
        .map(|m| p.predict(&record, Some(m)))
        .collect();
    let _ = p.predict_detailed(&record, None);
    let _ = p.predict_batch(&[record.clone(), Record::new()], None);
    let second: Vec<f64> = ["Linear Regression", "Random Forest", "Gradient Boosting"]
        .iter()
        .map(|m| p.predict(&record, Some(m)))
        .collect();

    assert_eq!(first, second);
    assert_eq!(&before.encoding(), &p.bundle().encoding());
    assert_eq!(before.model_names(), p.bundle().model_names());
}

#[test]
fn test_confidence_band_per_model() {
    let p = predictor();
    let record = engineer_request();

    let (point, interval) = p.predict_with_confidence(&record, Some("Random Forest"));
    let ci = interval.expect("forest band");
    assert_eq!(ci.n_members, 25);
    assert!(ci.std_dev >= 0.0);
    assert!(ci.lower <= point && point <= ci.upper);
    assert!(((ci.upper - point) - 1.96 * ci.std_dev).abs() < 1e-6 * ci.upper.max(1.0));

    for name in ["Gradient Boosting", "Linear Regression"] {
        let (point, interval) = p.predict_with_confidence(&record, Some(name));
        assert!(point > 0.0);
        assert!(interval.is_none(), "{} should have no band", name);
    }
    assert!(p.predict_detailed(&record, None).interval.is_none());
}

#[test]
fn test_band_on_noise_free_line() {
    let experience: Vec<f64> = (0..200).map(|i| (i % 40) as f64).collect();
    let salary: Vec<f64> = experience.iter().map(|e| 40000.0 + 2500.0 * e).collect();
    let df = df!("experience" => experience, "salary" => salary).unwrap();

    let outcome = ModelBank::new(fast_config().with_seed(3)).train(&df).unwrap();
    let p = Predictor::new(outcome.bundle);

    for exp in [0, 20, 39] {
        let record = Record::new().with("experience", exp);

        let (point, band) = p.predict_with_confidence(&record, Some("Random Forest"));
        let band = band.unwrap();
        assert!(band.lower <= point && point <= band.upper);
        assert!(band.std_dev.is_finite());

        let (gb_point, gb_band) = p.predict_with_confidence(&record, Some("Gradient Boosting"));
        assert!((gb_point - (40000.0 + 2500.0 * exp as f64)).abs() < 10000.0);
        assert!(gb_band.is_none());
    }
}

#[test]
fn test_validate_empty_record_lists_every_required_field() {
    let p = predictor();
    let issues = p.validate_input(&Record::new());
    assert!(!issues.is_empty());
    for field in ["experience", "education", "job_title", "location", "industry"] {
        assert!(
            issues.iter().any(|i| matches!(i, ValidationIssue::MissingField { field: f } if f == field)),
            "missing {}",
            field
        );
    }
    assert!(p.validate_input(&engineer_request()).is_empty());
}

#[test]
fn test_explain_sources_importance_from_model_and_value_from_request() {
    let p = predictor();
    let a = engineer_request();
    let b = engineer_request().with("experience", 30).with("location", "Remote");

    let ea = p.explain(&a, Some("Random Forest")).unwrap();
    let eb = p.explain(&b, Some("Random Forest")).unwrap();

    let weights = |e: &[FeatureImpact]| e.iter().map(|i| (i.feature.clone(), i.importance)).collect::<Vec<_>>();
    assert_eq!(weights(&ea), weights(&eb));

    let experience = eb.iter().find(|i| i.feature == "experience").unwrap();
    assert_eq!(experience.value, Some(FieldValue::Number(30.0)));
    let gender = eb.iter().find(|i| i.feature == "gender").unwrap();
    assert!(gender.value.is_none());

    assert!(p.explain(&a, Some("Linear Regression")).is_none());
}

#[test]
fn test_batch_and_all_models() {
    let p = predictor();
    let records = vec![
        engineer_request(),
        engineer_request().with("experience", 20),
        engineer_request().with("education", "PhD"),
    ];
    let batch = p.predict_batch(&records, None);
    assert_eq!(batch.len(), 3);
    for (record, estimate) in records.iter().zip(&batch) {
        assert_eq!(*estimate, p.predict(record, None));
    }

    let all = p.predict_all_models(&records[0]);
    assert_eq!(all.len(), 3);
    assert!(all.values().all(|v| *v >= 0.0));
}

#[test]
fn test_market_context() {
    let history = salary_dataset(600, 42);
    let market = MarketReference::from_dataset(&history, "salary").unwrap();
    let p = predictor().with_market_reference(market);

    let result = p.predict_detailed(&engineer_request(), None);
    let comparison = result.market.unwrap();
    assert!(comparison.market_mean > 0.0);
    assert!((0.0..=100.0).contains(&comparison.percentile_rank));
    if let Some(bench) = comparison.benchmark {
        assert!(bench.min <= bench.median && bench.median <= bench.max);
        assert!(bench.p25 <= bench.p75 && bench.p75 <= bench.p90);
    }
    assert!(p.model_info().market_reference);
}

#[test]
fn test_model_info() {
    let info = predictor().model_info();
    assert_eq!(info.available_models.len(), 3);
    assert_eq!(info.default_model.as_deref(), Some("Gradient Boosting"));
    assert_eq!(info.feature_order.len(), 9);
    assert!(info.encoded_fields.contains(&"job_title".to_string()));
    assert!(!info.encoded_fields.contains(&"experience".to_string()));
    assert!(info.scaling_available);
}
