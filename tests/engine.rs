mod common;

use std::thread;

use common::{Row, engine};
use crop_price_forecast::{
    CanonicalDataset, MIN_SAMPLES, PredictError, RawCell, SourceLevel, engine::PriceEngine,
    validate::RawQuery,
};

const DELHI_WHEAT: [Row<'static>; 3] = [
    ("wheat", "delhi", Some("delhi"), 3, 2019, 1800.0),
    ("wheat", "delhi", Some("delhi"), 3, 2020, 1900.0),
    ("wheat", "delhi", Some("delhi"), 3, 2021, 2000.0),
];

#[test]
fn linear_district_series_extrapolates_one_year() {
    let engine = engine(&DELHI_WHEAT);
    let result = engine
        .predict(&RawQuery::new("Wheat", "Delhi", 3_i64))
        .expect("prediction");
    assert_eq!(result.source_level, SourceLevel::District);
    assert_eq!(result.sample_size, 3);
    assert_eq!(result.target_year, 2022);
    assert!((result.predicted_price - 2100.0).abs() < 0.005);
    assert_eq!(result.unit, "INR/quintal");
    assert_eq!(result.input.crop, "wheat");
    assert_eq!(result.input.district, "delhi");
    assert_eq!(result.input.month, 3);
}

#[test]
fn case_and_whitespace_variants_give_identical_results() {
    let engine = engine(&DELHI_WHEAT);
    let baseline = engine.predict(&RawQuery::new("wheat", "delhi", 3_i64));
    for (crop, district) in [("WHEAT", "Delhi"), ("  wheat", "delhi  "), ("\tWheAt ", " DELHI")] {
        assert_eq!(
            engine.predict(&RawQuery::new(crop, district, "3")),
            baseline,
            "{crop:?}/{district:?}"
        );
    }
}

#[test]
fn district_tier_is_preferred_even_when_wider_tiers_qualify() {
    let mut rows = DELHI_WHEAT[..2].to_vec();
    rows.extend([
        ("wheat", "new delhi", Some("delhi"), 3, 2018, 1500.0),
        ("wheat", "karnal", Some("haryana"), 3, 2018, 1400.0),
        ("wheat", "karnal", Some("haryana"), 3, 2019, 1450.0),
    ]);
    let result = engine(&rows)
        .predict(&RawQuery::new("wheat", "delhi", 3_i64))
        .unwrap();
    assert_eq!(result.source_level, SourceLevel::District);
    assert_eq!(result.sample_size, 2);
}

#[test]
fn one_district_row_with_two_state_rows_uses_state_tier() {
    let rows = [
        ("rice", "lucknow", Some("uttar pradesh"), 7, 2020, 2400.0),
        ("rice", "kanpur", Some("uttar pradesh"), 7, 2021, 2600.0),
        ("rice", "patna", Some("bihar"), 7, 2021, 9999.0),
    ];
    let result = engine(&rows)
        .predict(&RawQuery::new("rice", "lucknow", 7_i64))
        .unwrap();
    assert_eq!(result.source_level, SourceLevel::State);
    assert_eq!(result.sample_size, 2);
    assert_eq!(result.target_year, 2022);
    assert!((result.predicted_price - 2800.0).abs() < 0.005);
}

#[test]
fn threshold_rejects_one_row_and_accepts_two() {
    let one = [("wheat", "delhi", Some("delhi"), 3, 2020, 1900.0)];
    assert_eq!(
        engine(&one).predict(&RawQuery::new("wheat", "delhi", 3_i64)),
        Err(PredictError::InsufficientData {
            required_min_samples: MIN_SAMPLES,
            found_samples: 1,
        })
    );

    let two = [
        ("wheat", "delhi", Some("delhi"), 3, 2020, 1900.0),
        ("wheat", "delhi", Some("delhi"), 3, 2021, 2000.0),
    ];
    let result = engine(&two)
        .predict(&RawQuery::new("wheat", "delhi", 3_i64))
        .unwrap();
    assert_eq!(result.source_level, SourceLevel::District);
    assert_eq!(result.sample_size, 2);
}

#[test]
fn single_row_state_tier_falls_through_to_global() {
    let rows = [
        ("rice", "lucknow", Some("uttar pradesh"), 7, 2020, 2400.0),
        ("rice", "patna", Some("bihar"), 7, 2021, 2600.0),
    ];
    let result = engine(&rows)
        .predict(&RawQuery::new("rice", "lucknow", 7_i64))
        .unwrap();
    assert_eq!(result.source_level, SourceLevel::Global);
    assert_eq!(result.sample_size, 2);
    assert_eq!(result.target_year, 2022);
    assert!((result.predicted_price - 2800.0).abs() < 0.005);
}

#[test]
fn years_at_the_top_of_the_range_do_not_overflow() {
    let rows = [
        ("wheat", "delhi", Some("delhi"), 3, i64::from(i32::MAX) - 2, 1800.0),
        ("wheat", "delhi", Some("delhi"), 3, i64::from(i32::MAX) - 1, 1900.0),
        ("wheat", "delhi", Some("delhi"), 3, i64::from(i32::MAX), 2000.0),
    ];
    let engine = engine(&rows);
    assert_eq!(engine.dataset().len(), 2);
    let result = engine
        .predict(&RawQuery::new("wheat", "delhi", 3_i64))
        .unwrap();
    assert_eq!(result.sample_size, 2);
    assert_eq!(result.target_year, i32::MAX);
    assert!((result.predicted_price - 2000.0).abs() < 0.005);
}

#[test]
fn global_tier_count_is_reported_when_every_tier_fails() {
    // the district row exists for another month only; globally one march row
    let rows = [
        ("wheat", "delhi", Some("delhi"), 4, 2020, 1900.0),
        ("wheat", "karnal", Some("haryana"), 3, 2020, 1700.0),
        ("rice", "delhi", Some("delhi"), 3, 2020, 2500.0),
    ];
    let err = engine(&rows)
        .predict(&RawQuery::new("wheat", "delhi", 3_i64))
        .unwrap_err();
    assert_eq!(
        err,
        PredictError::InsufficientData {
            required_min_samples: 2,
            found_samples: 1,
        }
    );
    assert_eq!(err.status_code(), 400);
}

#[test]
fn validation_examples() {
    let engine = engine(&DELHI_WHEAT);
    assert_eq!(
        engine.predict(&RawQuery::new("wheat", "delhi", 13_i64)),
        Err(PredictError::validation("month must be between 1 and 12"))
    );
    assert_eq!(
        engine.predict(&RawQuery::new("", "delhi", 3_i64)),
        Err(PredictError::validation("crop is required"))
    );
    assert_eq!(
        engine.predict(&RawQuery::new("wheat", "delhi", "three")),
        Err(PredictError::validation("month must be an integer (1-12)"))
    );
    assert_eq!(
        engine.predict(&RawQuery::new("wheat", RawCell::Missing, 3_i64)),
        Err(PredictError::validation("district is required"))
    );
}

#[test]
fn json_payloads_are_accepted_as_queries() {
    let engine = engine(&DELHI_WHEAT);
    let query: RawQuery =
        serde_json::from_str(r#"{"crop": " WHEAT ", "district": "Delhi", "month": "3"}"#).unwrap();
    let json = serde_json::to_value(engine.predict(&query).unwrap()).unwrap();
    assert_eq!(json["source_level"], "district");
    assert_eq!(json["input"]["crop"], "wheat");
    assert_eq!(json["input"]["month"], 3);
}

#[test]
fn empty_dataset_reports_unavailable() {
    let engine = PriceEngine::new(CanonicalDataset::default());
    assert!(!engine.is_available());
    let err = engine
        .predict(&RawQuery::new("wheat", "delhi", 3_i64))
        .unwrap_err();
    assert_eq!(err, PredictError::DatasetUnavailable);
    assert_eq!(err.status_code(), 500);
}

#[test]
fn shared_engine_answers_concurrent_queries() {
    let engine = engine(&DELHI_WHEAT);
    let expected = engine
        .predict(&RawQuery::new("wheat", "delhi", 3_i64))
        .unwrap();
    thread::scope(|scope| {
        let handles = (0..8)
            .map(|_| {
                let engine: PriceEngine = engine.clone();
                scope.spawn(move || engine.predict(&RawQuery::new("Wheat", " delhi", "3")))
            })
            .collect::<Vec<_>>();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), expected);
        }
    });
}

#[test]
fn falling_prices_can_extrapolate_below_zero() {
    let rows = [
        ("onion", "nashik", Some("maharashtra"), 1, 2020, 300.0),
        ("onion", "nashik", Some("maharashtra"), 1, 2021, 100.0),
    ];
    let result = engine(&rows)
        .predict(&RawQuery::new("onion", "nashik", 1_i64))
        .unwrap();
    assert_eq!(result.predicted_price, -100.0);
}
