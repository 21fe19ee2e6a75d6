//! Per-rule value coercion functions.
//!
//! Every function takes a raw string series and produces the typed series
//! plus the count of malformed tokens it nulled. Raw values that are
//! recognized null encodings (whitespace-only, NaN tokens, listed markers)
//! become null without counting as malformed; only tokens no rule can make
//! sense of do.

use crate::utils::{
    canonical_identifier, clean_raw, is_nan_token, is_zero_sentinel, parse_date,
    parse_numeric_string,
};
use anyhow::Result;
use chrono::NaiveDate;
use polars::prelude::*;

/// A coerced series and the number of malformed tokens nulled along the way.
pub(crate) struct CoercionOutcome {
    pub series: Series,
    pub malformed: usize,
}

/// Canonicalize a numeric-prone identifier column into digit strings.
pub(crate) fn coerce_identifier(series: &Series) -> Result<CoercionOutcome> {
    let str_series = series.str()?;
    let mut malformed = 0usize;
    let mut result_vec: Vec<Option<String>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        match opt_val.and_then(clean_raw) {
            Some(token) if is_nan_token(token) => result_vec.push(None),
            Some(token) => match canonical_identifier(token) {
                Some(id) => result_vec.push(Some(id)),
                None => {
                    malformed += 1;
                    result_vec.push(None);
                }
            },
            None => result_vec.push(None),
        }
    }

    Ok(CoercionOutcome {
        series: Series::new(series.name().clone(), result_vec),
        malformed,
    })
}

/// Pass an opaque string identifier through, unifying null encodings.
pub(crate) fn coerce_opaque_id(series: &Series) -> Result<CoercionOutcome> {
    let str_series = series.str()?;
    let mut result_vec: Vec<Option<String>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        match opt_val.and_then(clean_raw) {
            Some(token) if is_nan_token(token) => result_vec.push(None),
            Some(token) => result_vec.push(Some(token.to_string())),
            None => result_vec.push(None),
        }
    }

    Ok(CoercionOutcome {
        series: Series::new(series.name().clone(), result_vec),
        malformed: 0,
    })
}

/// Trim free text and collapse marker tokens to null.
pub(crate) fn coerce_text(series: &Series, null_markers: &[&str]) -> Result<CoercionOutcome> {
    let str_series = series.str()?;
    let mut result_vec: Vec<Option<String>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        match opt_val.and_then(clean_raw) {
            Some(token)
                if null_markers
                    .iter()
                    .any(|marker| marker.eq_ignore_ascii_case(token)) =>
            {
                result_vec.push(None)
            }
            Some(token) => result_vec.push(Some(token.to_string())),
            None => result_vec.push(None),
        }
    }

    Ok(CoercionOutcome {
        series: Series::new(series.name().clone(), result_vec),
        malformed: 0,
    })
}

/// Parse a numeric column, optionally mapping the textual zero sentinel.
pub(crate) fn coerce_numeric(series: &Series, accept_zero_sentinel: bool) -> Result<CoercionOutcome> {
    let str_series = series.str()?;
    let mut malformed = 0usize;
    let mut result_vec: Vec<Option<f64>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        match opt_val.and_then(clean_raw) {
            Some(token) if accept_zero_sentinel && is_zero_sentinel(token) => {
                result_vec.push(Some(0.0))
            }
            Some(token) if is_nan_token(token) => result_vec.push(None),
            Some(token) => match parse_numeric_string(token) {
                Some(value) => result_vec.push(Some(value)),
                None => {
                    malformed += 1;
                    result_vec.push(None);
                }
            },
            None => result_vec.push(None),
        }
    }

    Ok(CoercionOutcome {
        series: Series::new(series.name().clone(), result_vec),
        malformed,
    })
}

/// Parse a date column into the logical date type.
pub(crate) fn coerce_date(series: &Series) -> Result<CoercionOutcome> {
    let str_series = series.str()?;
    let mut malformed = 0usize;
    let mut days_vec: Vec<Option<i32>> = Vec::with_capacity(str_series.len());
    let epoch = NaiveDate::default();

    for opt_val in str_series.into_iter() {
        match opt_val.and_then(clean_raw) {
            Some(token) if is_nan_token(token) => days_vec.push(None),
            Some(token) => match parse_date(token) {
                Some(date) => days_vec.push(Some((date - epoch).num_days() as i32)),
                None => {
                    malformed += 1;
                    days_vec.push(None);
                }
            },
            None => days_vec.push(None),
        }
    }

    let series = Series::new(series.name().clone(), days_vec).cast(&DataType::Date)?;
    Ok(CoercionOutcome { series, malformed })
}
