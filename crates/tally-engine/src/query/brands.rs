//! Top-N brand popularity among users at or above an age threshold.

use crate::types::BrandReceipts;
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Count distinct receipts per brand for users aged `age_threshold` or more.
///
/// Rows without a known age (unmatched user or null birth date) and rows
/// without a brand (unmatched product or null brand) are excluded. Ordering
/// is receipts descending, then brand ascending; the top `n` rows are
/// returned.
pub fn top_brands(view: &DataFrame, age_threshold: i32, n: usize) -> Result<Vec<BrandReceipts>> {
    debug!("top_brands: age >= {}, n = {}", age_threshold, n);

    let out = view
        .clone()
        .lazy()
        .filter(
            col("age")
                .is_not_null()
                .and(col("age").gt_eq(lit(age_threshold)))
                .and(col("brand").is_not_null()),
        )
        .group_by([col("brand")])
        .agg([col("receipt_id").n_unique().alias("receipts")])
        .sort_by_exprs(
            vec![col("receipts"), col("brand")],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(n as IdxSize)
        .collect()?;

    let brands = out.column("brand")?.str()?;
    let receipts = out.column("receipts")?.u32()?;
    let rows = brands
        .into_iter()
        .zip(receipts)
        .filter_map(|(brand, count)| {
            Some(BrandReceipts {
                brand: brand?.to_string(),
                receipts: count?,
            })
        })
        .collect();
    Ok(rows)
}
