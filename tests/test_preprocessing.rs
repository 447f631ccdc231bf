//! Integration test: Preprocessing transforms on realistic frames

use ml_builder::preprocessing::{drop_nulls, numeric_columns, DropAxis, Encoder, EncoderType, Scaler, ScalerType};
use polars::prelude::*;

fn sample_df() -> DataFrame {
    df!(
        "age" => &[Some(25.0), Some(30.0), None, Some(40.0), Some(45.0), Some(50.0), Some(55.0), Some(60.0), Some(65.0), Some(70.0)],
        "income" => &[30000.0, 45000.0, 55000.0, 70000.0, 80000.0, 90000.0, 100000.0, 110000.0, 120000.0, 130000.0],
        "city" => &[Some("paris"), Some("rome"), Some("oslo"), None, Some("rome"), Some("paris"), Some("oslo"), Some("rome"), Some("paris"), Some("oslo")],
        "score" => &[3, 4, 3, 4, 4, 5, 3, 5, 4, 4],
    )
    .unwrap()
}

fn values(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

#[test]
fn test_drop_nulls_rows_is_idempotent() {
    let df = sample_df();
    let once = drop_nulls(&df, DropAxis::Rows).unwrap();
    let twice = drop_nulls(&once, DropAxis::Rows).unwrap();

    assert_eq!(once.shape(), (8, 4));
    assert!(once.equals_missing(&twice));
}

#[test]
fn test_drop_nulls_columns_is_idempotent() {
    let df = sample_df();
    let once = drop_nulls(&df, DropAxis::Columns).unwrap();
    let twice = drop_nulls(&once, DropAxis::Columns).unwrap();

    let names: Vec<&str> = once.get_column_names().iter().map(|s| s.as_str()).collect();
    assert_eq!(names, vec!["income", "score"]);
    assert!(once.equals_missing(&twice));
}

#[test]
fn test_standard_scaler_centers_and_scales() {
    let df = drop_nulls(&sample_df(), DropAxis::Rows).unwrap();
    let numeric = numeric_columns(&df);
    let columns: Vec<&str> = numeric.iter().map(String::as_str).collect();

    let scaled = Scaler::new(ScalerType::Standard).fit_transform(&df, &columns).unwrap();

    for name in &columns {
        let v = values(&scaled, name);
        let n = v.len() as f64;
        let mean = v.iter().sum::<f64>() / n;
        let std = (v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert!(mean.abs() < 1e-9, "{} mean {}", name, mean);
        assert!((std - 1.0).abs() < 1e-9, "{} std {}", name, std);
    }
    // Text columns are left alone
    assert_eq!(scaled.column("city").unwrap().dtype(), &DataType::String);
}

#[test]
fn test_min_max_scaler_unit_range() {
    let df = sample_df();
    let scaled = Scaler::new(ScalerType::unit_min_max())
        .fit_transform(&df, &["age", "income", "score"])
        .unwrap();

    for name in ["age", "income", "score"] {
        let v = values(&scaled, name);
        let min = v.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min.abs() < 1e-12, "{} min {}", name, min);
        assert!((max - 1.0).abs() < 1e-12, "{} max {}", name, max);
    }
    assert_eq!(scaled.column("age").unwrap().null_count(), 1);
}

#[test]
fn test_min_max_scaler_custom_range() {
    let df = sample_df();
    let scaled = Scaler::new(ScalerType::MinMax { lo: -1.0, hi: 1.0 })
        .fit_transform(&df, &["income"])
        .unwrap();

    let v = values(&scaled, "income");
    assert!((v[0] + 1.0).abs() < 1e-12);
    assert!((v[9] - 1.0).abs() < 1e-12);
}

#[test]
fn test_one_hot_drop_first_after_drop_nulls() {
    let df = drop_nulls(&sample_df(), DropAxis::Rows).unwrap();
    let encoded = Encoder::new(EncoderType::OneHot { drop_first: true })
        .fit_transform(&df, &["city"])
        .unwrap();

    let names: Vec<&str> = encoded.get_column_names().iter().map(|s| s.as_str()).collect();
    assert_eq!(names, vec!["age", "income", "score", "city_paris", "city_rome"]);

    let paris = values(&encoded, "city_paris");
    let rome = values(&encoded, "city_rome");
    // oslo rows carry zeros in both indicators
    assert_eq!(paris.iter().zip(&rome).filter(|(p, r)| **p == 0.0 && **r == 0.0).count(), 2);
}
