//! Power-user selection over raw transactions.

use crate::types::PowerUser;
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Select users whose transaction count or total spend exceeds a threshold.
///
/// Runs over the (normalized, unjoined) transaction table: a user need not
/// resolve in the user dimension to be a power user. Transactions without a
/// user id belong to no one and are excluded. Both thresholds are strict
/// (`count > min_transactions OR spend > min_spend`); ordering is total
/// spend descending, user id ascending.
pub fn power_users(
    transactions: &DataFrame,
    min_transactions: u32,
    min_spend: f64,
) -> Result<Vec<PowerUser>> {
    debug!(
        "power_users: count > {} or spend > {}",
        min_transactions, min_spend
    );

    let out = transactions
        .clone()
        .lazy()
        .filter(col("user_id").is_not_null())
        .group_by([col("user_id")])
        .agg([
            len().alias("transactions"),
            col("final_sale").sum().alias("total_spend"),
        ])
        .filter(
            col("transactions")
                .gt(lit(min_transactions))
                .or(col("total_spend").gt(lit(min_spend))),
        )
        .sort_by_exprs(
            vec![col("total_spend"), col("user_id")],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()?;

    let user_ids = out.column("user_id")?.str()?;
    let counts = out.column("transactions")?.u32()?;
    let spends = out.column("total_spend")?.f64()?;
    let rows = user_ids
        .into_iter()
        .zip(counts)
        .zip(spends)
        .filter_map(|((user_id, count), spend)| {
            Some(PowerUser {
                user_id: user_id?.to_string(),
                transactions: count?,
                total_spend: spend.unwrap_or(0.0),
            })
        })
        .collect();
    Ok(rows)
}
