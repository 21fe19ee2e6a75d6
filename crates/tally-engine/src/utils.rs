//! Shared value-level utilities for the analysis engine.
//!
//! This module contains the token parsers used by the normalizer and shared
//! helpers used across multiple modules to ensure consistent coercion
//! behavior.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::cmp::Reverse;

// =============================================================================
// Raw Token Utilities
// =============================================================================

/// Tokens that encode a missing numeric value (case-insensitive).
///
/// `f64::from_str` would happily parse `"nan"` into a float NaN, which then
/// poisons every downstream sum. Treat it as missing instead.
pub const NAN_TOKENS: [&str; 2] = ["nan", "null"];

/// The textual sentinel some quantity feeds use instead of `0`.
pub const ZERO_SENTINEL: &str = "zero";

/// Trim a raw field; an all-whitespace field is missing.
pub fn clean_raw(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Check if a token is a NaN-style missing marker.
pub fn is_nan_token(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    NAN_TOKENS.iter().any(|&t| lower == t)
}

/// Check if a token is the textual sentinel for zero.
pub fn is_zero_sentinel(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case(ZERO_SENTINEL)
}

// =============================================================================
// Numeric Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 3] = [',', '$', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Try to parse a string as a finite numeric value (f64).
///
/// Handles common formatting like currency symbols and thousands separators.
/// Non-finite results (`"nan"`, `"inf"`) yield `None`.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Identifier Utilities
// =============================================================================

// Token shape regexes - compiled once at startup
static INTEGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("Invalid regex: integer"));
static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+$").expect("Invalid regex: decimal"));
static SCIENTIFIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+(\.\d+)?[eE]\+?\d+$").expect("Invalid regex: scientific")
});

/// Canonicalize an identifier token into a plain digit string.
///
/// Identifier columns routinely arrive re-rendered through a float type
/// upstream (`"15300014978.0"`, `"1.53E+10"`). The canonical form is the
/// exact digit sequence with no fractional part and no exponent. Plain digit
/// strings pass through untouched so leading zeros survive. Tokens with a
/// true fractional part or non-digit characters yield `None`.
pub fn canonical_identifier(s: &str) -> Option<String> {
    let token = s.trim();
    if INTEGER_RE.is_match(token) {
        return Some(token.to_string());
    }
    if DECIMAL_RE.is_match(token) || SCIENTIFIC_RE.is_match(token) {
        let value: f64 = token.parse().ok()?;
        if !value.is_finite() || value.fract() != 0.0 {
            return None;
        }
        return Some(format!("{}", value as i128));
    }
    None
}

// =============================================================================
// Date Parsing Utilities
// =============================================================================

// Date shape regexes paired with their chrono format - compiled once at startup
static DATE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("Invalid regex: YYYY-MM-DD"),
            "%Y-%m-%d",
        ),
        (
            Regex::new(r"^\d{4}/\d{1,2}/\d{1,2}$").expect("Invalid regex: YYYY/MM/DD"),
            "%Y/%m/%d",
        ),
        (
            Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("Invalid regex: MM/DD/YYYY"),
            "%m/%d/%Y",
        ),
    ]
});

/// Parse a raw date token into a logical date.
///
/// Datetime-shaped input (`"2024-08-21 14:19:06.539 Z"`, ISO `T` separators)
/// keeps its date component. Unparsable input yields `None`, never an error.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    let head = trimmed
        .split(|c| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);
    for (pattern, format) in DATE_PATTERNS.iter() {
        if pattern.is_match(head) {
            return NaiveDate::parse_from_str(head, format).ok();
        }
    }
    None
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Calculate the mode (most frequent value) of a string Series.
///
/// Ties are broken by value ascending so repeated runs report the same mode.
pub fn string_mode(series: &Series) -> Option<String> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return None;
    }

    let str_series = non_null.cast(&DataType::String).ok()?;
    let str_chunked = str_series.str().ok()?;

    let mut value_counts: std::collections::HashMap<String, usize> =
        std::collections::HashMap::new();
    for val in str_chunked.into_iter().flatten() {
        *value_counts.entry(val.to_string()).or_insert(0) += 1;
    }

    value_counts
        .into_iter()
        .min_by(|(a_val, a_count), (b_val, b_count)| {
            (Reverse(a_count), a_val).cmp(&(Reverse(b_count), b_val))
        })
        .map(|(val, _)| val)
}

// =============================================================================
// Tests
// =============================================================================
