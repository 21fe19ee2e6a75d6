//! Configuration types for the analysis engine.
//!
//! Every analytical threshold is caller-supplied: cohort age boundaries,
//! power-user thresholds, top-N size, the focus category, and the reference
//! date for age computations. Nothing is hard-coded into query logic.

use crate::cohort::CohortBounds;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Configuration for an analysis run.
///
/// Use [`AnalysisConfig::builder()`] for fluent setup.
///
/// # Example
///
/// ```rust,ignore
/// use tally_engine::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .as_of(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap())
///     .top_brands(10)
///     .power_user_min_spend(500.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Reference "as-of" date for all age computations.
    /// Default: the current date. Pass a fixed date for reproducible runs.
    pub as_of: NaiveDate,

    /// Age boundaries separating the four cohorts.
    /// Default: 18-24 / 25-40 / 41-56 / 57+
    pub cohort_bounds: CohortBounds,

    /// Minimum user age for the brand popularity query.
    /// Default: 21
    pub brand_age_threshold: i32,

    /// Number of brands returned by the brand popularity query.
    /// Default: 5
    pub top_brands: usize,

    /// Top-level category measured by the spend-share query.
    /// Default: "Health & Wellness"
    pub focus_category: String,

    /// Users with strictly more transactions than this are power users.
    /// Default: 10
    pub power_user_min_transactions: u32,

    /// Users with strictly more total spend than this are power users.
    /// Default: 1000.0
    pub power_user_min_spend: f64,

    /// Whether rows with a null key participate in duplicate counting.
    /// When false, null-key rows are tallied separately instead.
    /// Default: false
    pub count_null_keys_as_duplicates: bool,

    /// Number of sample values collected per column in table profiles.
    /// Default: 5
    pub profile_sample_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            as_of: chrono::Utc::now().date_naive(),
            cohort_bounds: CohortBounds::default(),
            brand_age_threshold: 21,
            top_brands: 5,
            focus_category: "Health & Wellness".to_string(),
            power_user_min_transactions: 10,
            power_user_min_spend: 1000.0,
            count_null_keys_as_duplicates: false,
            profile_sample_size: 5,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.cohort_bounds.is_ordered() {
            return Err(ConfigValidationError::UnorderedCohortBounds(
                self.cohort_bounds,
            ));
        }

        if !self.power_user_min_spend.is_finite() || self.power_user_min_spend < 0.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "power_user_min_spend".to_string(),
                value: self.power_user_min_spend,
            });
        }

        if self.top_brands == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.top_brands));
        }

        if self.focus_category.trim().is_empty() {
            return Err(ConfigValidationError::EmptyFocusCategory);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Cohort bounds {0:?} are not strictly increasing")]
    UnorderedCohortBounds(CohortBounds),

    #[error("Invalid threshold for '{field}': {value} (must be finite and non-negative)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid top-N size: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("Focus category must not be empty")]
    EmptyFocusCategory,
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    as_of: Option<NaiveDate>,
    cohort_bounds: Option<CohortBounds>,
    brand_age_threshold: Option<i32>,
    top_brands: Option<usize>,
    focus_category: Option<String>,
    power_user_min_transactions: Option<u32>,
    power_user_min_spend: Option<f64>,
    count_null_keys_as_duplicates: Option<bool>,
    profile_sample_size: Option<usize>,
}

impl AnalysisConfigBuilder {
    /// Set the reference date for age computations.
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    /// Set the cohort age boundaries.
    pub fn cohort_bounds(mut self, bounds: CohortBounds) -> Self {
        self.cohort_bounds = Some(bounds);
        self
    }

    /// Set the minimum user age for the brand popularity query.
    pub fn brand_age_threshold(mut self, age: i32) -> Self {
        self.brand_age_threshold = Some(age);
        self
    }

    /// Set how many brands the brand popularity query returns.
    pub fn top_brands(mut self, n: usize) -> Self {
        self.top_brands = Some(n);
        self
    }

    /// Set the top-level category measured by the spend-share query.
    pub fn focus_category(mut self, category: impl Into<String>) -> Self {
        self.focus_category = Some(category.into());
        self
    }

    /// Set the transaction-count threshold for power users (strictly greater).
    pub fn power_user_min_transactions(mut self, count: u32) -> Self {
        self.power_user_min_transactions = Some(count);
        self
    }

    /// Set the total-spend threshold for power users (strictly greater).
    pub fn power_user_min_spend(mut self, spend: f64) -> Self {
        self.power_user_min_spend = Some(spend);
        self
    }

    /// Count rows with a null key as duplicates of one another.
    pub fn count_null_keys_as_duplicates(mut self, count: bool) -> Self {
        self.count_null_keys_as_duplicates = Some(count);
        self
    }

    /// Set the number of sample values collected per column profile.
    pub fn profile_sample_size(mut self, size: usize) -> Self {
        self.profile_sample_size = Some(size);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            as_of: self.as_of.unwrap_or(defaults.as_of),
            cohort_bounds: self.cohort_bounds.unwrap_or_default(),
            brand_age_threshold: self.brand_age_threshold.unwrap_or(21),
            top_brands: self.top_brands.unwrap_or(5),
            focus_category: self
                .focus_category
                .unwrap_or_else(|| defaults.focus_category.clone()),
            power_user_min_transactions: self.power_user_min_transactions.unwrap_or(10),
            power_user_min_spend: self.power_user_min_spend.unwrap_or(1000.0),
            count_null_keys_as_duplicates: self.count_null_keys_as_duplicates.unwrap_or(false),
            profile_sample_size: self.profile_sample_size.unwrap_or(5),
        };

        config.validate()?;
        Ok(config)
    }
}
