//! Age derivation and cohort classification.
//!
//! Ages are whole years: reference year minus birth year, with no
//! day-of-year adjustment. The cohort table is ordered, exhaustive, and
//! non-overlapping; every age outside the named ranges falls to the oldest
//! label, matching the behavior the business metrics were defined against.
//! Callers that want out-of-range ages kept distinct use
//! [`Cohort::from_age_strict`].

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Age-based user segment, youngest to oldest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cohort {
    GenZ,
    Millennials,
    GenX,
    BabyBoomers,
}

impl Cohort {
    /// Human-readable label used in grouped query results.
    pub fn label(&self) -> &'static str {
        match self {
            Cohort::GenZ => "Gen Z",
            Cohort::Millennials => "Millennials",
            Cohort::GenX => "Gen X",
            Cohort::BabyBoomers => "Baby Boomers",
        }
    }

    /// Classify an age using the threshold table.
    ///
    /// Any age not matching the first three ranges — including negative or
    /// otherwise implausible values — lands in [`Cohort::BabyBoomers`].
    pub fn from_age(age: i32, bounds: &CohortBounds) -> Cohort {
        if age >= bounds.gen_z_min && age <= bounds.gen_z_max {
            Cohort::GenZ
        } else if age > bounds.gen_z_max && age <= bounds.millennials_max {
            Cohort::Millennials
        } else if age > bounds.millennials_max && age <= bounds.gen_x_max {
            Cohort::GenX
        } else {
            Cohort::BabyBoomers
        }
    }

    /// Like [`Cohort::from_age`], but ages below the youngest bound yield no
    /// cohort instead of falling through to the oldest label.
    pub fn from_age_strict(age: i32, bounds: &CohortBounds) -> Option<Cohort> {
        if age < bounds.gen_z_min {
            None
        } else {
            Some(Self::from_age(age, bounds))
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Age boundaries separating the cohorts.
///
/// The three named ranges are `gen_z_min..=gen_z_max`,
/// `gen_z_max+1..=millennials_max`, and `millennials_max+1..=gen_x_max`;
/// everything else is the catch-all oldest cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortBounds {
    /// Youngest age classified as Gen Z. Default: 18
    pub gen_z_min: i32,
    /// Oldest age classified as Gen Z. Default: 24
    pub gen_z_max: i32,
    /// Oldest age classified as Millennials. Default: 40
    pub millennials_max: i32,
    /// Oldest age classified as Gen X. Default: 56
    pub gen_x_max: i32,
}

impl Default for CohortBounds {
    fn default() -> Self {
        Self {
            gen_z_min: 18,
            gen_z_max: 24,
            millennials_max: 40,
            gen_x_max: 56,
        }
    }
}

impl CohortBounds {
    /// Bounds must be strictly increasing for the ranges to stay
    /// non-overlapping and exhaustive.
    pub fn is_ordered(&self) -> bool {
        self.gen_z_min <= self.gen_z_max
            && self.gen_z_max < self.millennials_max
            && self.millennials_max < self.gen_x_max
    }
}

/// Whole-year age at the reference date.
pub fn age_at(birth_date: NaiveDate, as_of: NaiveDate) -> i32 {
    as_of.year() - birth_date.year()
}

/// Expression computing whole-year age from a date column.
///
/// Null birth dates produce a null age.
pub fn age_expr(birth_col: &str, as_of: NaiveDate) -> Expr {
    lit(as_of.year()) - col(birth_col).dt().year()
}

/// Expression mapping a birth-date column to its cohort label.
///
/// A null birth date yields a null label, never the catch-all cohort, so
/// cohort-grouped aggregates exclude users of unknown age.
pub fn cohort_expr(birth_col: &str, as_of: NaiveDate, bounds: &CohortBounds) -> Expr {
    let age = age_expr(birth_col, as_of);
    when(col(birth_col).is_null())
        .then(lit(NULL))
        .when(
            age.clone()
                .gt_eq(lit(bounds.gen_z_min))
                .and(age.clone().lt_eq(lit(bounds.gen_z_max))),
        )
        .then(lit(Cohort::GenZ.label()))
        .when(
            age.clone()
                .gt(lit(bounds.gen_z_max))
                .and(age.clone().lt_eq(lit(bounds.millennials_max))),
        )
        .then(lit(Cohort::Millennials.label()))
        .when(
            age.clone()
                .gt(lit(bounds.millennials_max))
                .and(age.lt_eq(lit(bounds.gen_x_max))),
        )
        .then(lit(Cohort::GenX.label()))
        .otherwise(lit(Cohort::BabyBoomers.label()))
}

/// Annotate a joined view with `age` and `cohort` columns derived from its
/// `birth_date` column.
///
/// Rows without a resolved user (null birth date) get a null age and a null
/// cohort, keeping them out of cohort-grouped aggregates.
pub fn annotate_view(
    view: &DataFrame,
    as_of: NaiveDate,
    bounds: &CohortBounds,
) -> PolarsResult<DataFrame> {
    view.clone()
        .lazy()
        .with_columns([
            age_expr("birth_date", as_of).alias("age"),
            cohort_expr("birth_date", as_of, bounds).alias("cohort"),
        ])
        .collect()
}
