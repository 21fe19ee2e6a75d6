//! Report types produced by the analysis engine.
//!
//! Everything here serializes to JSON so a run's findings can be emitted to
//! stdout or written alongside the query results. Data-quality findings are
//! data, not errors: malformed values, duplicate keys, and unmatched foreign
//! keys all surface through these types.

use serde::{Deserialize, Serialize};

/// Per-column statistics over a normalized table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    /// Fraction of rows that are null, in [0, 1].
    pub null_rate: f64,
    pub unique_count: usize,
    /// Deterministic sample of non-null values (fixed-seed selection).
    pub sample_values: Vec<String>,
    /// Most frequent non-null value; ties broken by value ascending.
    pub most_frequent: Option<String>,
}

/// Statistics over one normalized table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableProfile {
    /// (rows, columns)
    pub shape: (usize, usize),
    /// Rows whose every column equals another row's.
    pub duplicate_rows: usize,
    pub columns: Vec<ColumnProfile>,
}

impl TableProfile {
    /// Null rate for a column, if it exists.
    pub fn null_rate(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.null_rate)
    }
}

/// What normalization did to one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnCoercion {
    pub column: String,
    /// Display name of the coercion rule applied.
    pub rule: String,
    /// Nulls in the raw column (empty fields).
    pub nulls_before: usize,
    /// Nulls after normalization; always >= `nulls_before`.
    pub nulls_after: usize,
    /// Values that matched no rule for the column and were nulled.
    pub malformed: usize,
}

/// Normalization outcome for a whole table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoercionReport {
    pub columns: Vec<ColumnCoercion>,
}

impl CoercionReport {
    /// Total malformed values across all columns.
    pub fn total_malformed(&self) -> usize {
        self.columns.iter().map(|c| c.malformed).sum()
    }

    /// Coercion record for a column, if present.
    pub fn column(&self, name: &str) -> Option<&ColumnCoercion> {
        self.columns.iter().find(|c| c.column == name)
    }
}

/// Duplicate-key findings for one key column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateKeyReport {
    pub key: String,
    /// Rows participating in any duplicate group.
    pub duplicate_rows: usize,
    /// Distinct key values occurring more than once.
    pub distinct_duplicated_keys: usize,
    /// Rows whose key is null; excluded from the counts above unless
    /// configured otherwise.
    pub null_key_rows: usize,
}

impl DuplicateKeyReport {
    pub fn has_duplicates(&self) -> bool {
        self.duplicate_rows > 0
    }
}

/// Everything the profiler and normalizer found about one input table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub name: String,
    pub profile: TableProfile,
    pub coercion: CoercionReport,
    pub key_duplicates: DuplicateKeyReport,
}

/// Outcome of assembling the joined view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinReport {
    /// Height of the transaction table; the joined view has exactly this
    /// many rows.
    pub transaction_rows: usize,
    /// Duplicate product codes found on the dimension side before joining.
    pub product_duplicates: DuplicateKeyReport,
    /// Duplicate user ids found on the dimension side before joining.
    pub user_duplicates: DuplicateKeyReport,
    /// Dimension rows dropped by first-seen de-duplication.
    pub product_rows_dropped: usize,
    pub user_rows_dropped: usize,
    /// Transactions that resolved to a product / user.
    pub matched_products: usize,
    pub matched_users: usize,
}

impl JoinReport {
    /// Fraction of transactions that resolved to a product, in [0, 1].
    pub fn product_match_rate(&self) -> f64 {
        if self.transaction_rows == 0 {
            0.0
        } else {
            self.matched_products as f64 / self.transaction_rows as f64
        }
    }

    /// Fraction of transactions that resolved to a user, in [0, 1].
    pub fn user_match_rate(&self) -> f64 {
        if self.transaction_rows == 0 {
            0.0
        } else {
            self.matched_users as f64 / self.transaction_rows as f64
        }
    }
}

// ============================================================================
// Query Result Rows
// ============================================================================

/// One row of the brand popularity result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandReceipts {
    pub brand: String,
    /// Distinct receipts naming the brand.
    pub receipts: u32,
}

/// One row of the category spend-share result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortCategoryShare {
    pub cohort: String,
    /// Spend in the focus category attributed to this cohort.
    pub spend: f64,
    /// Percent of total spend across ALL transactions, any category.
    pub share_pct: f64,
}

/// The spend-share result with the category it was computed for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpendShare {
    pub category: String,
    pub cohorts: Vec<CohortCategoryShare>,
}

/// One row of the power-user result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUser {
    pub user_id: String,
    pub transactions: u32,
    pub total_spend: f64,
}

// ============================================================================
// Top-Level Report
// ============================================================================

/// Full output of an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Reference date used for all age computations.
    pub as_of: chrono::NaiveDate,
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub products: TableReport,
    pub transactions: TableReport,
    pub users: TableReport,

    pub join: JoinReport,

    pub top_brands: Vec<BrandReceipts>,
    pub category_spend_share: CategorySpendShare,
    pub power_users: Vec<PowerUser>,

    /// Notes generated during the run (expected findings, not failures).
    pub warnings: Vec<String>,
}

impl AnalysisReport {
    /// Add a warning to the report.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Total malformed values across all three tables.
    pub fn total_malformed(&self) -> usize {
        self.products.coercion.total_malformed()
            + self.transactions.coercion.total_malformed()
            + self.users.coercion.total_malformed()
    }

    /// Serialize the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_duplicates(key: &str) -> DuplicateKeyReport {
        DuplicateKeyReport {
            key: key.to_string(),
            duplicate_rows: 4,
            distinct_duplicated_keys: 2,
            null_key_rows: 1,
        }
    }

    #[test]
    fn test_table_profile_null_rate_lookup() {
        let profile = TableProfile {
            shape: (10, 2),
            duplicate_rows: 0,
            columns: vec![
                ColumnProfile {
                    name: "brand".to_string(),
                    dtype: "str".to_string(),
                    null_count: 3,
                    null_rate: 0.3,
                    unique_count: 5,
                    sample_values: vec![],
                    most_frequent: None,
                },
            ],
        };
        assert_eq!(profile.null_rate("brand"), Some(0.3));
        assert_eq!(profile.null_rate("missing"), None);
    }

    #[test]
    fn test_coercion_report_totals() {
        let report = CoercionReport {
            columns: vec![
                ColumnCoercion {
                    column: "final_quantity".to_string(),
                    rule: "numeric (zero sentinel)".to_string(),
                    nulls_before: 1,
                    nulls_after: 3,
                    malformed: 2,
                },
                ColumnCoercion {
                    column: "final_sale".to_string(),
                    rule: "numeric".to_string(),
                    nulls_before: 0,
                    nulls_after: 1,
                    malformed: 1,
                },
            ],
        };
        assert_eq!(report.total_malformed(), 3);
        assert_eq!(report.column("final_sale").unwrap().malformed, 1);
        assert!(report.column("nope").is_none());
    }

    #[test]
    fn test_join_report_match_rates() {
        let report = JoinReport {
            transaction_rows: 100,
            product_duplicates: sample_duplicates("product_code"),
            user_duplicates: sample_duplicates("id"),
            product_rows_dropped: 2,
            user_rows_dropped: 0,
            matched_products: 80,
            matched_users: 50,
        };
        assert!((report.product_match_rate() - 0.8).abs() < 1e-12);
        assert!((report.user_match_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_join_report_empty_table() {
        let report = JoinReport {
            transaction_rows: 0,
            product_duplicates: sample_duplicates("product_code"),
            user_duplicates: sample_duplicates("id"),
            product_rows_dropped: 0,
            user_rows_dropped: 0,
            matched_products: 0,
            matched_users: 0,
        };
        assert_eq!(report.product_match_rate(), 0.0);
    }

    #[test]
    fn test_duplicate_report_serialization() {
        let report = sample_duplicates("product_code");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"duplicate_rows\":4"));
        assert!(json.contains("\"distinct_duplicated_keys\":2"));
        assert!(report.has_duplicates());
    }

    #[test]
    fn test_query_rows_serialize() {
        let row = BrandReceipts {
            brand: "Dove".to_string(),
            receipts: 3,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("Dove"));

        let share = CohortCategoryShare {
            cohort: "Baby Boomers".to_string(),
            spend: 50.0,
            share_pct: 5.0,
        };
        let json = serde_json::to_string(&share).unwrap();
        assert!(json.contains("share_pct"));
    }
}
