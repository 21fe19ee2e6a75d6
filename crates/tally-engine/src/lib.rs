//! Data-Quality Normalization and Cross-Dataset Query Engine
//!
//! A Polars-based engine for a retail loyalty program's three tabular
//! datasets (products, transactions, users).
//!
//! # Overview
//!
//! The engine provides:
//!
//! - **Schema Normalization**: per-column coercion of inconsistently-encoded
//!   raw fields into typed canonical values, with all null-like encodings
//!   collapsed to a single null representation
//! - **Integrity Profiling**: per-column null rates, duplicate-key reports,
//!   and malformed-value counts over the normalized tables
//! - **Join Planning**: a left-outer relational view from the transaction
//!   side under partial referential integrity, with dimension-side
//!   de-duplication so dirty keys never fan rows out
//! - **Cohort Classification**: age-derived user segments from birth dates
//! - **Query Catalog**: parameterized brand-popularity, category
//!   spend-share, and power-user queries with deterministic ordering
//!
//! Data flows one way: raw tables → normalizer → (profiler in parallel) →
//! join planner → cohort classifier → query catalog. Every stage is a pure
//! function over immutable tables; data-quality findings are data (nulls
//! and report counts), never errors.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tally_engine::{Analysis, AnalysisConfig};
//! use chrono::NaiveDate;
//!
//! let config = AnalysisConfig::builder()
//!     .as_of(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap())
//!     .top_brands(5)
//!     .focus_category("Health & Wellness")
//!     .build()?;
//!
//! let report = Analysis::builder()
//!     .config(config)
//!     .build()?
//!     .run("products.csv", "transactions.csv", "users.csv")?;
//!
//! for brand in &report.top_brands {
//!     println!("{}: {} receipts", brand.brand, brand.receipts);
//! }
//! println!("{}", report.to_json()?);
//! ```
//!
//! The component operations are also exposed directly (`normalize_table`,
//! `profile_table`, `duplicate_keys`, `build_joined_view`, the query
//! functions) for callers composing their own flow.

pub mod cohort;
pub mod config;
pub mod error;
pub mod join;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod profiler;
pub mod query;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cohort::{Cohort, CohortBounds, age_at, annotate_view};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError};
pub use error::{EngineError, Result, ResultExt};
pub use join::build_joined_view;
pub use loader::{load_products, load_transactions, load_users};
pub use normalize::normalize_table;
pub use pipeline::{Analysis, AnalysisBuilder};
pub use profiler::{duplicate_keys, profile_table};
pub use query::{category_spend_share, power_users, top_brands};
pub use schema::{CoercionRule, ColumnSpec, PRODUCTS, TRANSACTIONS, TableSchema, USERS};
pub use types::{
    AnalysisReport, BrandReceipts, CategorySpendShare, CohortCategoryShare, ColumnCoercion,
    ColumnProfile, CoercionReport, DuplicateKeyReport, JoinReport, PowerUser, TableProfile,
    TableReport,
};
