//! Integrity profiling: read-only analyses over normalized tables.
//!
//! Two independent reports: per-column null rates (meaningful only after
//! normalization, since raw marker encodings undercount missingness) and
//! duplicate-key detection for a designated key column. The profiler never
//! fails on data content; clean input just yields zeros.

use crate::types::{ColumnProfile, DuplicateKeyReport, TableProfile};
use crate::utils::string_mode;
use anyhow::Result;
use polars::prelude::*;
use rand::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Profile every column of a normalized table.
///
/// `sample_size` bounds the number of representative values collected per
/// column; sampling is seeded so identical inputs always report identical
/// samples.
pub fn profile_table(df: &DataFrame, sample_size: usize) -> Result<TableProfile> {
    let mut columns = Vec::with_capacity(df.width());
    for name in df.get_column_names() {
        columns.push(profile_column(df, name.as_str(), sample_size)?);
    }

    let duplicate_rows = df.height()
        - df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?
            .height();
    debug!(
        "profiled table: {} rows x {} columns, {} fully-duplicated rows",
        df.height(),
        df.width(),
        duplicate_rows
    );

    Ok(TableProfile {
        shape: (df.height(), df.width()),
        duplicate_rows,
        columns,
    })
}

fn profile_column(df: &DataFrame, name: &str, sample_size: usize) -> Result<ColumnProfile> {
    let series = df.column(name)?.as_materialized_series();
    let null_count = series.null_count();
    let null_rate = if df.height() == 0 {
        0.0
    } else {
        null_count as f64 / df.height() as f64
    };

    let non_null = series.drop_nulls();
    let unique_count = non_null.n_unique()?;

    // Fixed-seed sampling keeps report output byte-identical across runs.
    let mut sample_values = Vec::new();
    if !non_null.is_empty() && sample_size > 0 {
        let take = std::cmp::min(sample_size, non_null.len());
        let mut rng = StdRng::seed_from_u64(42);
        let indices: Vec<usize> = (0..non_null.len()).collect();
        let mut sampled: Vec<usize> = indices.choose_multiple(&mut rng, take).copied().collect();
        sampled.sort_unstable();
        for idx in sampled {
            if let Ok(val) = non_null.get(idx) {
                sample_values.push(format!("{}", val));
            }
        }
    }

    Ok(ColumnProfile {
        name: name.to_string(),
        dtype: format!("{:?}", series.dtype()),
        null_count,
        null_rate,
        unique_count,
        sample_values,
        most_frequent: string_mode(series),
    })
}

/// Report duplicate keys in a designated key column.
///
/// Counts rows participating in any duplicate group and distinct key values
/// occurring more than once. Null-key rows are tallied separately and only
/// treated as duplicates of one another when `count_null_keys` is set.
pub fn duplicate_keys(df: &DataFrame, key: &str, count_null_keys: bool) -> Result<DuplicateKeyReport> {
    let series = df
        .column(key)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let values = series.str()?;

    let null_key_rows = series.null_count();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for val in values.into_iter().flatten() {
        *counts.entry(val).or_insert(0) += 1;
    }

    let mut duplicate_rows = 0usize;
    let mut distinct_duplicated_keys = 0usize;
    for &count in counts.values() {
        if count > 1 {
            duplicate_rows += count;
            distinct_duplicated_keys += 1;
        }
    }
    if count_null_keys && null_key_rows > 1 {
        duplicate_rows += null_key_rows;
        distinct_duplicated_keys += 1;
    }

    debug!(
        "duplicate keys on '{}': {} rows in {} group(s), {} null-key row(s)",
        key, duplicate_rows, distinct_duplicated_keys, null_key_rows
    );

    Ok(DuplicateKeyReport {
        key: key.to_string(),
        duplicate_rows,
        distinct_duplicated_keys,
        null_key_rows,
    })
}
