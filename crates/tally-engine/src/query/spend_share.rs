//! Category spend share by cohort.

use crate::types::{CategorySpendShare, CohortCategoryShare};
use anyhow::Result;
use polars::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

/// Share of ALL spend attributable to each cohort's purchases in one
/// top-level category.
///
/// The denominator is total `final_sale` across the whole view, any
/// category — not just the focus category — so the shares answer "how much
/// of everything we sold went to this cohort buying this category". Null
/// cohorts (unknown birth date or unmatched user) are excluded from the
/// grouping but their spend still counts toward the denominator. Rows are
/// ordered share descending, cohort ascending.
pub fn category_spend_share(view: &DataFrame, category: &str) -> Result<CategorySpendShare> {
    let total_spend: f64 = view.column("final_sale")?.f64()?.sum().unwrap_or(0.0);
    debug!(
        "category_spend_share: category = {:?}, total spend = {}",
        category, total_spend
    );

    let grouped = view
        .clone()
        .lazy()
        .filter(
            col("category_1")
                .eq(lit(category))
                .and(col("cohort").is_not_null()),
        )
        .group_by([col("cohort")])
        .agg([col("final_sale").sum().alias("spend")])
        .collect()?;

    let cohorts_col = grouped.column("cohort")?.str()?;
    let spends = grouped.column("spend")?.f64()?;
    let mut cohorts: Vec<CohortCategoryShare> = cohorts_col
        .into_iter()
        .zip(spends)
        .filter_map(|(cohort, spend)| {
            let spend = spend.unwrap_or(0.0);
            let share_pct = if total_spend > 0.0 {
                100.0 * spend / total_spend
            } else {
                0.0
            };
            Some(CohortCategoryShare {
                cohort: cohort?.to_string(),
                spend,
                share_pct,
            })
        })
        .collect();

    cohorts.sort_by(|a, b| {
        b.share_pct
            .partial_cmp(&a.share_pct)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cohort.cmp(&b.cohort))
    });

    Ok(CategorySpendShare {
        category: category.to_string(),
        cohorts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> DataFrame {
        // total spend 1000 across all categories; 50 of it is
        // Health & Wellness spend by Baby Boomers
        df!(
            "receipt_id" => ["r1", "r2", "r3", "r4", "r5"],
            "category_1" => [Some("Health & Wellness"), Some("Health & Wellness"), Some("Snacks"), Some("Health & Wellness"), None],
            "cohort" => [Some("Baby Boomers"), Some("Gen Z"), Some("Gen X"), None, Some("Millennials")],
            "final_sale" => [50.0, 30.0, 500.0, 20.0, 400.0],
        )
        .unwrap()
    }

    #[test]
    fn test_share_uses_global_denominator() {
        let result = category_spend_share(&view(), "Health & Wellness").unwrap();
        let boomers = result
            .cohorts
            .iter()
            .find(|c| c.cohort == "Baby Boomers")
            .unwrap();
        assert_eq!(boomers.spend, 50.0);
        // 50 of a 1000 global total, not 50 of the 100 category total
        assert!((boomers.share_pct - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_null_cohort_rows_excluded_from_groups() {
        let result = category_spend_share(&view(), "Health & Wellness").unwrap();
        assert_eq!(result.cohorts.len(), 2);
        assert!(result.cohorts.iter().all(|c| c.cohort != "Millennials"));
    }

    #[test]
    fn test_rows_ordered_share_descending() {
        let result = category_spend_share(&view(), "Health & Wellness").unwrap();
        assert_eq!(result.cohorts[0].cohort, "Baby Boomers");
        assert_eq!(result.cohorts[1].cohort, "Gen Z");
        assert!((result.cohorts[1].share_pct - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_category_without_spend_is_empty() {
        let result = category_spend_share(&view(), "Pantry").unwrap();
        assert_eq!(result.category, "Pantry");
        assert!(result.cohorts.is_empty());
    }

    #[test]
    fn test_zero_total_spend_yields_zero_shares() {
        let view = df!(
            "receipt_id" => ["r1"],
            "category_1" => ["Snacks"],
            "cohort" => ["Gen Z"],
            "final_sale" => [0.0],
        )
        .unwrap();
        let result = category_spend_share(&view, "Snacks").unwrap();
        assert_eq!(result.cohorts[0].share_pct, 0.0);
    }
}
