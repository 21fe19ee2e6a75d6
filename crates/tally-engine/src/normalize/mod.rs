//! Schema normalization: raw string tables into typed canonical tables.
//!
//! Every typing decision lives in the schema's per-column rule table
//! ([`crate::schema`]); this module applies those rules column by column and
//! records what happened. Normalization is pure: the input table is never
//! mutated, and malformed values become nulls in the output instead of
//! dropping rows.

mod coerce;

use crate::schema::{CoercionRule, TableSchema};
use crate::types::{ColumnCoercion, CoercionReport};
use anyhow::Result;
use polars::prelude::*;
use tracing::{debug, warn};

/// Normalize a raw table against its declared schema.
///
/// Produces a new table holding only the declared columns, each coerced to
/// its logical type, plus a [`CoercionReport`] with per-column null counts
/// before/after and the number of malformed tokens nulled. Columns not in
/// the schema are dropped.
pub fn normalize_table(df: &DataFrame, schema: &TableSchema) -> Result<(DataFrame, CoercionReport)> {
    let mut columns: Vec<Column> = Vec::with_capacity(schema.columns.len());
    let mut report = CoercionReport::default();

    for spec in schema.columns {
        let raw = df
            .column(spec.name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let nulls_before = raw.null_count();

        let outcome = match spec.rule {
            CoercionRule::Identifier => coerce::coerce_identifier(&raw)?,
            CoercionRule::OpaqueId => coerce::coerce_opaque_id(&raw)?,
            CoercionRule::Text { null_markers } => coerce::coerce_text(&raw, null_markers)?,
            CoercionRule::Numeric => coerce::coerce_numeric(&raw, false)?,
            CoercionRule::NumericWithZeroSentinel => coerce::coerce_numeric(&raw, true)?,
            CoercionRule::Date => coerce::coerce_date(&raw)?,
        };

        let nulls_after = outcome.series.null_count();
        if outcome.malformed > 0 {
            warn!(
                "{}.{}: nulled {} malformed value(s)",
                schema.name, spec.name, outcome.malformed
            );
        }
        debug!(
            "{}.{}: {} -> {} ({} nulls before, {} after)",
            schema.name,
            spec.name,
            spec.rule.display_name(),
            outcome.series.dtype(),
            nulls_before,
            nulls_after
        );

        report.columns.push(ColumnCoercion {
            column: spec.name.to_string(),
            rule: spec.rule.display_name().to_string(),
            nulls_before,
            nulls_after,
            malformed: outcome.malformed,
        });
        columns.push(outcome.series.into());
    }

    Ok((DataFrame::new(columns)?, report))
}
