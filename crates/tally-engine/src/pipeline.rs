//! The analysis pipeline: load → normalize → profile → join → classify →
//! query, assembled into one [`AnalysisReport`].
//!
//! Each stage is a pure function of the previous stage's tables, so the
//! pipeline holds no mutable state between runs and a single `Analysis` can
//! be reused (or shared across threads) freely.

use crate::cohort;
use crate::config::AnalysisConfig;
use crate::error::{EngineError, Result};
use crate::join;
use crate::loader;
use crate::normalize;
use crate::profiler;
use crate::query;
use crate::schema::{self, TableSchema};
use crate::types::{AnalysisReport, TableReport};
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// The configured analysis engine.
///
/// Use [`Analysis::builder()`] to construct one with a validated
/// configuration, then [`Analysis::run`] over the three input files or
/// [`Analysis::run_frames`] over pre-loaded tables.
///
/// # Example
///
/// ```rust,ignore
/// use tally_engine::{Analysis, AnalysisConfig};
///
/// let report = Analysis::builder()
///     .config(AnalysisConfig::builder().top_brands(10).build()?)
///     .build()?
///     .run("products.csv", "transactions.csv", "users.csv")?;
///
/// println!("{}", report.to_json()?);
/// ```
#[derive(Debug)]
pub struct Analysis {
    config: AnalysisConfig,
}

// Queries are pure functions of the joined view, so a caller may evaluate
// independent runs from multiple threads.
static_assertions::assert_impl_all!(Analysis: Send, Sync);

impl Analysis {
    /// Create a new analysis builder.
    pub fn builder() -> AnalysisBuilder {
        AnalysisBuilder::default()
    }

    /// The configuration this analysis runs with.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the full pipeline over three CSV files.
    pub fn run(
        &self,
        products: impl AsRef<Path>,
        transactions: impl AsRef<Path>,
        users: impl AsRef<Path>,
    ) -> Result<AnalysisReport> {
        let products = loader::load_products(products)?;
        let transactions = loader::load_transactions(transactions)?;
        let users = loader::load_users(users)?;
        self.run_frames(products, transactions, users)
    }

    /// Run the full pipeline over pre-loaded raw tables.
    ///
    /// The tables must carry the declared column sets (every column is
    /// coerced from its string form, so callers may pass frames built with
    /// string data directly). Input frames are never mutated.
    pub fn run_frames(
        &self,
        raw_products: DataFrame,
        raw_transactions: DataFrame,
        raw_users: DataFrame,
    ) -> Result<AnalysisReport> {
        let start = Instant::now();
        info!("Starting analysis run (as of {})", self.config.as_of);

        schema::PRODUCTS.validate(&raw_products)?;
        schema::TRANSACTIONS.validate(&raw_transactions)?;
        schema::USERS.validate(&raw_users)?;

        // Stage 1: normalize
        info!("Stage 1: normalizing tables...");
        let (products, products_report) =
            self.normalize_stage(&raw_products, &schema::PRODUCTS)?;
        let (transactions, transactions_report) =
            self.normalize_stage(&raw_transactions, &schema::TRANSACTIONS)?;
        let (users, users_report) = self.normalize_stage(&raw_users, &schema::USERS)?;

        // Stage 2: join
        info!("Stage 2: building joined view...");
        let (view, join_report) = join::build_joined_view(
            &transactions,
            &products,
            &users,
            self.config.count_null_keys_as_duplicates,
        )
        .map_err(|e| EngineError::JoinFailed(e.to_string()))?;

        // Stage 3: cohort annotation
        info!("Stage 3: annotating cohorts...");
        let view = cohort::annotate_view(&view, self.config.as_of, &self.config.cohort_bounds)?;
        debug!("annotated view: {} rows", view.height());

        // Stage 4: queries
        info!("Stage 4: running query catalog...");
        let top_brands = query::top_brands(
            &view,
            self.config.brand_age_threshold,
            self.config.top_brands,
        )
        .map_err(|e| EngineError::QueryFailed {
            query: "top_brands".to_string(),
            reason: e.to_string(),
        })?;
        let category_spend_share = query::category_spend_share(&view, &self.config.focus_category)
            .map_err(|e| EngineError::QueryFailed {
                query: "category_spend_share".to_string(),
                reason: e.to_string(),
            })?;
        let power_users = query::power_users(
            &transactions,
            self.config.power_user_min_transactions,
            self.config.power_user_min_spend,
        )
        .map_err(|e| EngineError::QueryFailed {
            query: "power_users".to_string(),
            reason: e.to_string(),
        })?;

        let mut report = AnalysisReport {
            as_of: self.config.as_of,
            duration_ms: start.elapsed().as_millis() as u64,
            products: products_report,
            transactions: transactions_report,
            users: users_report,
            join: join_report,
            top_brands,
            category_spend_share,
            power_users,
            warnings: Vec::new(),
        };
        self.collect_warnings(&mut report);

        info!("Analysis complete in {}ms", report.duration_ms);
        Ok(report)
    }

    /// Normalize one table and profile the result.
    fn normalize_stage(&self, raw: &DataFrame, schema: &TableSchema) -> Result<(DataFrame, TableReport)> {
        let (normalized, coercion) = normalize::normalize_table(raw, schema).map_err(|e| {
            EngineError::NormalizationFailed {
                table: schema.name.to_string(),
                reason: e.to_string(),
            }
        })?;
        let profile = profiler::profile_table(&normalized, self.config.profile_sample_size)
            .map_err(|e| EngineError::ProfilingFailed(e.to_string()))?;
        let key_duplicates = profiler::duplicate_keys(
            &normalized,
            schema.key,
            self.config.count_null_keys_as_duplicates,
        )
        .map_err(|e| EngineError::ProfilingFailed(e.to_string()))?;

        let report = TableReport {
            name: schema.name.to_string(),
            profile,
            coercion,
            key_duplicates,
        };
        Ok((normalized, report))
    }

    /// Surface expected-but-notable findings as report warnings.
    fn collect_warnings(&self, report: &mut AnalysisReport) {
        let product_dupes = &report.products.key_duplicates;
        if product_dupes.has_duplicates() {
            report.add_warning(format!(
                "products: {} row(s) share {} duplicated product_code value(s); first-seen rows used for joins",
                product_dupes.duplicate_rows, product_dupes.distinct_duplicated_keys
            ));
        }
        let malformed = report.total_malformed();
        if malformed > 0 {
            report.add_warning(format!(
                "{} malformed value(s) were nulled during normalization",
                malformed
            ));
        }
        if report.join.transaction_rows > 0 && report.join.product_match_rate() < 0.5 {
            report.add_warning(format!(
                "only {:.1}% of transactions resolved to a product",
                report.join.product_match_rate() * 100.0
            ));
        }
    }
}

/// Builder for [`Analysis`].
#[derive(Debug, Default)]
pub struct AnalysisBuilder {
    config: Option<AnalysisConfig>,
}

static_assertions::assert_impl_all!(AnalysisBuilder: Send);

impl AnalysisBuilder {
    /// Set the analysis configuration.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the analysis engine, validating the configuration.
    pub fn build(self) -> Result<Analysis> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        Ok(Analysis { config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_builder_default_config() {
        let analysis = Analysis::builder().build().unwrap();
        assert_eq!(analysis.config().top_brands, 5);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut config = AnalysisConfig::default();
        config.top_brands = 0;
        let result = Analysis::builder().config(config).build();
        assert!(matches!(
            result.unwrap_err(),
            EngineError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_run_frames_rejects_missing_columns() {
        let analysis = Analysis::builder().build().unwrap();
        let bad_products = df!("product_code" => ["1111"]).unwrap();
        let transactions = df!(
            "receipt_id" => ["r1"],
            "product_code" => ["1111"],
            "user_id" => ["u1"],
            "purchase_date" => ["2024-08-01"],
            "scan_date" => ["2024-08-01"],
            "final_quantity" => ["1"],
            "final_sale" => ["1.0"],
        )
        .unwrap();
        let users = df!(
            "id" => ["u1"],
            "created_date" => ["2020-01-01"],
            "birth_date" => ["1990-01-01"],
            "gender" => ["female"],
            "state" => ["CA"],
            "language" => ["en"],
        )
        .unwrap();

        let err = analysis
            .run_frames(bad_products, transactions, users)
            .unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn test_run_frames_end_to_end() {
        let config = AnalysisConfig::builder()
            .as_of(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap())
            .build()
            .unwrap();
        let analysis = Analysis::builder().config(config).build().unwrap();

        let products = df!(
            "product_code" => ["1111", "2222", "2222"],
            "manufacturer" => ["ACME", "NONE", "NONE"],
            "brand" => ["Acme", "Beta", "BetaDupe"],
            "category_1" => ["Snacks", "Health & Wellness", "Health & Wellness"],
            "category_2" => ["", "", ""],
            "category_3" => ["", "", ""],
            "category_4" => ["", "", ""],
        )
        .unwrap();
        let transactions = df!(
            "receipt_id" => ["r1", "r2"],
            "product_code" => ["2222", "2222"],
            "user_id" => ["u1", "u1"],
            "purchase_date" => ["2024-08-01", "2024-08-02"],
            "scan_date" => ["2024-08-01", "2024-08-02"],
            "final_quantity" => ["1", "zero"],
            "final_sale" => ["100.0", "50.0"],
        )
        .unwrap();
        let users = df!(
            "id" => ["u1"],
            "created_date" => ["2020-01-01"],
            "birth_date" => ["1958-03-02"],
            "gender" => ["female"],
            "state" => ["CA"],
            "language" => ["en"],
        )
        .unwrap();

        let report = analysis.run_frames(products, transactions, users).unwrap();

        // duplicated product code surfaced, not silently fixed
        assert_eq!(report.products.key_duplicates.duplicate_rows, 2);
        assert_eq!(report.products.key_duplicates.distinct_duplicated_keys, 1);
        assert!(!report.warnings.is_empty());

        // no fan-out: the joined view kept exactly the two transaction rows
        assert_eq!(report.join.transaction_rows, 2);
        assert_eq!(report.join.matched_products, 2);
        assert_eq!(report.join.product_rows_dropped, 1);

        // the 66-year-old user's two receipts put Beta on top
        assert_eq!(report.top_brands.len(), 1);
        assert_eq!(report.top_brands[0].brand, "Beta");
        assert_eq!(report.top_brands[0].receipts, 2);

        // all spend is Health & Wellness by a Baby Boomer
        let boomers = &report.category_spend_share.cohorts[0];
        assert_eq!(boomers.cohort, "Baby Boomers");
        assert!((boomers.share_pct - 100.0).abs() < 1e-9);
    }
}
