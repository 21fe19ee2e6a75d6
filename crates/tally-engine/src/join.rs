//! Join planning: the unified relational view over the three tables.
//!
//! Transactions are the fact table, so both joins are left-outer from the
//! transaction side: every transaction row appears exactly once whether or
//! not its product or user resolves. Duplicate keys on a dimension side are
//! de-duplicated first-seen (stable by original row order) before joining,
//! so a dirty dimension can never fan transaction rows out; the occurrence
//! counts are surfaced in the [`JoinReport`] rather than fixed silently.

use crate::profiler;
use crate::types::JoinReport;
use anyhow::{Result, ensure};
use polars::prelude::*;
use tracing::{info, warn};

const PRODUCT_MARKER: &str = "product_matched";
const USER_MARKER: &str = "user_matched";

/// Prepare a dimension table for joining: drop null-key rows (they can never
/// match an optional foreign key) and keep the first row per key.
fn dedup_dimension(df: &DataFrame, key: &str) -> Result<(DataFrame, usize)> {
    let with_keys = df
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .collect()?;
    let deduped =
        with_keys.unique_stable(Some(&[key.to_string()]), UniqueKeepStrategy::First, None)?;
    let dropped = with_keys.height() - deduped.height();
    Ok((deduped, dropped))
}

/// Build the joined view: Transaction ⋈ Product (on `product_code`), then
/// ⋈ User (on `user_id` = `id`), left-outer from the transaction side.
///
/// Returns the view alongside a [`JoinReport`] carrying dimension duplicate
/// findings and match statistics. The view has exactly as many rows as the
/// transaction table; a height change is an internal defect, not data.
pub fn build_joined_view(
    transactions: &DataFrame,
    products: &DataFrame,
    users: &DataFrame,
    count_null_keys: bool,
) -> Result<(DataFrame, JoinReport)> {
    let product_duplicates = profiler::duplicate_keys(products, "product_code", count_null_keys)?;
    let user_duplicates = profiler::duplicate_keys(users, "id", count_null_keys)?;

    if product_duplicates.has_duplicates() {
        warn!(
            "{} product row(s) share {} duplicated code(s); keeping first-seen rows",
            product_duplicates.duplicate_rows, product_duplicates.distinct_duplicated_keys
        );
    }

    let (product_dim, product_rows_dropped) = dedup_dimension(products, "product_code")?;
    let (user_dim, user_rows_dropped) = dedup_dimension(users, "id")?;

    let view = transactions
        .clone()
        .lazy()
        .join(
            product_dim
                .lazy()
                .with_column(lit(true).alias(PRODUCT_MARKER)),
            [col("product_code")],
            [col("product_code")],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            user_dim.lazy().with_column(lit(true).alias(USER_MARKER)),
            [col("user_id")],
            [col("id")],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    ensure!(
        view.height() == transactions.height(),
        "joined view has {} rows for {} transactions",
        view.height(),
        transactions.height()
    );

    let matched_products = view.height() - view.column(PRODUCT_MARKER)?.null_count();
    let matched_users = view.height() - view.column(USER_MARKER)?.null_count();
    let view = view.drop(PRODUCT_MARKER)?.drop(USER_MARKER)?;

    let report = JoinReport {
        transaction_rows: transactions.height(),
        product_duplicates,
        user_duplicates,
        product_rows_dropped,
        user_rows_dropped,
        matched_products,
        matched_users,
    };
    info!(
        "joined view: {} rows, product match {:.1}%, user match {:.1}%",
        report.transaction_rows,
        report.product_match_rate() * 100.0,
        report.user_match_rate() * 100.0
    );

    Ok((view, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products() -> DataFrame {
        df!(
            "product_code" => [Some("1111"), Some("2222"), Some("2222"), None],
            "manufacturer" => [Some("ACME"), Some("BETA"), Some("BETA DUPE"), Some("ORPHAN")],
            "brand" => ["Acme", "Beta", "BetaDupe", "Orphan"],
            "category_1" => ["Snacks", "Health & Wellness", "Health & Wellness", "Snacks"],
            "category_2" => [None::<&str>, None, None, None],
            "category_3" => [None::<&str>, None, None, None],
            "category_4" => [None::<&str>, None, None, None],
        )
        .unwrap()
    }

    fn users() -> DataFrame {
        df!(
            "id" => ["u1", "u2"],
            "created_date" => ["2020-01-01", "2021-01-01"],
            "birth_date" => [Some("1990-01-01"), None],
            "gender" => [Some("female"), None],
            "state" => [Some("CA"), Some("TX")],
            "language" => [Some("en"), Some("es")],
        )
        .unwrap()
    }

    fn transactions() -> DataFrame {
        df!(
            "receipt_id" => ["r1", "r2", "r3", "r4"],
            "product_code" => [Some("2222"), Some("2222"), Some("9999"), None],
            "user_id" => [Some("u1"), Some("u9"), Some("u2"), None],
            "purchase_date" => ["2024-08-01", "2024-08-02", "2024-08-03", "2024-08-04"],
            "scan_date" => ["2024-08-01", "2024-08-02", "2024-08-03", "2024-08-04"],
            "final_quantity" => [1.0, 2.0, 1.0, 1.0],
            "final_sale" => [10.0, 20.0, 5.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn test_join_is_length_preserving() {
        let txns = transactions();
        let (view, report) = build_joined_view(&txns, &products(), &users(), false).unwrap();
        assert_eq!(view.height(), txns.height());
        assert_eq!(report.transaction_rows, txns.height());
    }

    #[test]
    fn test_duplicate_dimension_key_does_not_fan_out() {
        // two transactions reference the duplicated code 2222; output must
        // stay at two rows with the first-seen product row winning
        let (view, report) = build_joined_view(&transactions(), &products(), &users(), false).unwrap();

        assert_eq!(report.product_duplicates.duplicate_rows, 2);
        assert_eq!(report.product_duplicates.distinct_duplicated_keys, 1);
        assert_eq!(report.product_rows_dropped, 1);

        let brands = view.column("brand").unwrap().str().unwrap();
        assert_eq!(brands.get(0), Some("Beta"));
        assert_eq!(brands.get(1), Some("Beta"));
    }

    #[test]
    fn test_unmatched_keys_null_fill() {
        let (view, report) = build_joined_view(&transactions(), &products(), &users(), false).unwrap();

        // r3 references an unknown product; r4 has no product code at all
        let brands = view.column("brand").unwrap().str().unwrap();
        assert_eq!(brands.get(2), None);
        assert_eq!(brands.get(3), None);
        assert_eq!(report.matched_products, 2);

        // r2 references an unknown user; r4 has no user id
        let states = view.column("state").unwrap().str().unwrap();
        assert_eq!(states.get(0), Some("CA"));
        assert_eq!(states.get(1), None);
        assert_eq!(report.matched_users, 2);
    }

    #[test]
    fn test_marker_columns_are_not_leaked() {
        let (view, _) = build_joined_view(&transactions(), &products(), &users(), false).unwrap();
        assert!(view.column(PRODUCT_MARKER).is_err());
        assert!(view.column(USER_MARKER).is_err());
    }

    #[test]
    fn test_clean_dimensions_report_no_drops() {
        let products = df!(
            "product_code" => ["1111"],
            "manufacturer" => ["ACME"],
            "brand" => ["Acme"],
            "category_1" => ["Snacks"],
            "category_2" => [None::<&str>],
            "category_3" => [None::<&str>],
            "category_4" => [None::<&str>],
        )
        .unwrap();
        let (_, report) = build_joined_view(&transactions(), &products, &users(), false).unwrap();
        assert_eq!(report.product_rows_dropped, 0);
        assert!(!report.product_duplicates.has_duplicates());
    }
}
