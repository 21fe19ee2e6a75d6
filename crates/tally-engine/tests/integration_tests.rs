//! Integration tests for the analysis engine.
//!
//! These drive the full pipeline over the CSV fixtures: dirty identifiers,
//! marker-encoded nulls, a duplicated product code, shared receipt ids,
//! unmatched foreign keys, and a malformed monetary value.

use chrono::NaiveDate;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use tally_engine::{
    Analysis, AnalysisConfig, AnalysisReport, load_products, load_transactions, load_users,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
}

fn run_fixtures() -> AnalysisReport {
    let config = AnalysisConfig::builder().as_of(as_of()).build().unwrap();
    Analysis::builder()
        .config(config)
        .build()
        .unwrap()
        .run(
            fixtures_path().join("products.csv"),
            fixtures_path().join("transactions.csv"),
            fixtures_path().join("users.csv"),
        )
        .unwrap()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_fixtures_as_strings() {
    let products = load_products(fixtures_path().join("products.csv")).unwrap();
    assert_eq!(products.height(), 5);
    for column in products.get_columns() {
        assert_eq!(column.dtype(), &DataType::String);
    }

    let transactions = load_transactions(fixtures_path().join("transactions.csv")).unwrap();
    assert_eq!(transactions.height(), 21);

    let users = load_users(fixtures_path().join("users.csv")).unwrap();
    assert_eq!(users.height(), 5);
}

#[test]
fn test_load_missing_file_fails() {
    assert!(load_products(fixtures_path().join("nope.csv")).is_err());
}

// ============================================================================
// Normalization & Profiling
// ============================================================================

#[test]
fn test_marker_nulls_raise_missingness_after_normalization() {
    let report = run_fixtures();

    // two "NONE" manufacturers join the one truly empty field
    let manufacturer = report.products.coercion.column("manufacturer").unwrap();
    assert_eq!(manufacturer.nulls_before, 1);
    assert_eq!(manufacturer.nulls_after, 3);
    assert_eq!(report.products.profile.null_rate("manufacturer"), Some(0.6));

    // no column ever loses nulls
    for table in [&report.products, &report.transactions, &report.users] {
        for column in &table.coercion.columns {
            assert!(column.nulls_after >= column.nulls_before, "{}", column.column);
        }
    }
}

#[test]
fn test_product_code_round_trip() {
    let raw = load_products(fixtures_path().join("products.csv")).unwrap();
    let (normalized, _) =
        tally_engine::normalize_table(&raw, &tally_engine::PRODUCTS).unwrap();

    let codes = normalized.column("product_code").unwrap();
    assert_eq!(codes.dtype(), &DataType::String);
    let codes = codes.str().unwrap();
    for code in codes.into_iter().flatten() {
        assert!(!code.contains('.') && !code.contains('e') && !code.contains('E'));
        code.parse::<i64>().unwrap();
    }
    // the float-rendered barcode keeps its exact digit sequence
    assert_eq!(codes.get(4), Some("15300014978"));
}

#[test]
fn test_malformed_values_counted_not_dropped() {
    let report = run_fixtures();

    // one "oops" in final_sale; the row is retained
    assert_eq!(report.transactions.coercion.column("final_sale").unwrap().malformed, 1);
    assert_eq!(report.transactions.profile.shape.0, 21);
    assert_eq!(report.total_malformed(), 1);
}

#[test]
fn test_duplicate_key_reports() {
    let report = run_fixtures();

    // one duplicated product code, two rows
    assert_eq!(report.products.key_duplicates.duplicate_rows, 2);
    assert_eq!(report.products.key_duplicates.distinct_duplicated_keys, 1);

    // shared receipt ids are expected line-item structure, reported as context
    assert_eq!(report.transactions.key_duplicates.duplicate_rows, 2);
    assert_eq!(report.transactions.key_duplicates.distinct_duplicated_keys, 1);

    // user ids are clean
    assert!(!report.users.key_duplicates.has_duplicates());
}

// ============================================================================
// Join
// ============================================================================

#[test]
fn test_join_is_length_preserving_without_fan_out() {
    let report = run_fixtures();

    // 21 transactions in, 21 view rows out, despite the duplicated
    // dimension code; the second 2222 row was dropped first-seen
    assert_eq!(report.join.transaction_rows, 21);
    assert_eq!(report.join.product_rows_dropped, 1);
    assert_eq!(report.join.user_rows_dropped, 0);

    // r18 references an unknown product; r19 an unknown user; r20 no user
    assert_eq!(report.join.matched_products, 20);
    assert_eq!(report.join.matched_users, 19);
}

// ============================================================================
// Query Catalog
// ============================================================================

#[test]
fn test_top_brands_counts_and_tie_break() {
    let report = run_fixtures();

    // u3 (age 20) is under the threshold, so GammaBrand never appears;
    // BetaBrand and DeltaBrand tie at one receipt and order alphabetically
    let rows: Vec<(&str, u32)> = report
        .top_brands
        .iter()
        .map(|r| (r.brand.as_str(), r.receipts))
        .collect();
    assert_eq!(
        rows,
        vec![("AcmeBrand", 12), ("BetaBrand", 1), ("DeltaBrand", 1)]
    );
}

#[test]
fn test_spend_share_uses_global_denominator() {
    let report = run_fixtures();
    assert_eq!(report.category_spend_share.category, "Health & Wellness");

    // global spend: 11 + 1500 + 10 + 50 + 20 + 5 + 7 = 1603
    let total = 1603.0;
    let cohorts = &report.category_spend_share.cohorts;
    assert_eq!(cohorts.len(), 2);

    assert_eq!(cohorts[0].cohort, "Baby Boomers");
    assert_eq!(cohorts[0].spend, 1500.0);
    assert!((cohorts[0].share_pct - 100.0 * 1500.0 / total).abs() < 1e-9);

    assert_eq!(cohorts[1].cohort, "Gen Z");
    assert_eq!(cohorts[1].spend, 10.0);
    assert!((cohorts[1].share_pct - 100.0 * 10.0 / total).abs() < 1e-9);
}

#[test]
fn test_power_users_default_thresholds() {
    let report = run_fixtures();

    // u1 qualifies on count (11 > 10), u2 on spend (1500 > 1000);
    // everyone else is excluded, ordering is spend descending
    let rows: Vec<(&str, u32, f64)> = report
        .power_users
        .iter()
        .map(|r| (r.user_id.as_str(), r.transactions, r.total_spend))
        .collect();
    assert_eq!(rows, vec![("u2", 2, 1500.0), ("u1", 11, 11.0)]);
}

#[test]
fn test_query_parameters_are_not_hard_coded() {
    let config = AnalysisConfig::builder()
        .as_of(as_of())
        .brand_age_threshold(18)
        .top_brands(2)
        .focus_category("Snacks")
        .power_user_min_transactions(2)
        .power_user_min_spend(40.0)
        .build()
        .unwrap();
    let report = Analysis::builder()
        .config(config)
        .build()
        .unwrap()
        .run(
            fixtures_path().join("products.csv"),
            fixtures_path().join("transactions.csv"),
            fixtures_path().join("users.csv"),
        )
        .unwrap();

    // lowering the age threshold admits u3's GammaBrand receipts, and the
    // top-N cut keeps only two rows
    assert_eq!(report.top_brands.len(), 2);
    assert_eq!(report.top_brands[0].brand, "AcmeBrand");
    assert_eq!(report.top_brands[1].brand, "GammaBrand");
    assert_eq!(report.top_brands[1].receipts, 3);

    assert_eq!(report.category_spend_share.category, "Snacks");

    // looser thresholds now admit u3 (3 > 2 transactions) and u5 (50 > 40)
    let ids: Vec<&str> = report.power_users.iter().map(|r| r.user_id.as_str()).collect();
    assert_eq!(ids, vec!["u2", "u5", "u1", "u3"]);
}

// ============================================================================
// Determinism & Report Output
// ============================================================================

#[test]
fn test_runs_are_deterministic() {
    let a = run_fixtures();
    let b = run_fixtures();

    assert_eq!(
        serde_json::to_value(&a.top_brands).unwrap(),
        serde_json::to_value(&b.top_brands).unwrap()
    );
    assert_eq!(
        serde_json::to_value(&a.category_spend_share).unwrap(),
        serde_json::to_value(&b.category_spend_share).unwrap()
    );
    assert_eq!(
        serde_json::to_value(&a.power_users).unwrap(),
        serde_json::to_value(&b.power_users).unwrap()
    );
    for (pa, pb) in a.products.profile.columns.iter().zip(&b.products.profile.columns) {
        assert_eq!(pa.sample_values, pb.sample_values);
    }
}

#[test]
fn test_report_serializes_to_json() {
    let report = run_fixtures();
    let json = report.to_json().unwrap();
    assert!(json.contains("\"top_brands\""));
    assert!(json.contains("\"AcmeBrand\""));
    assert!(json.contains("\"power_users\""));

    // warnings carry the data-quality findings
    assert!(report.warnings.iter().any(|w| w.contains("product_code")));
    assert!(report.warnings.iter().any(|w| w.contains("malformed")));
}
