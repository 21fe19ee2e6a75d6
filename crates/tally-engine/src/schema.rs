//! Declared schemas for the three input tables.
//!
//! Each table declares its required columns and the coercion rule applied to
//! each column during normalization. Loading validates that every declared
//! column is present; columns not in the schema are dropped during
//! normalization so downstream components see one canonical layout.

use crate::error::{EngineError, Result};
use polars::prelude::*;

/// Null-marker tokens observed in free-text category fields.
pub const TEXT_NULL_MARKERS: &[&str] = &["NONE"];

/// Coercion rule for one column.
///
/// The rule owns every typing decision for its column: which tokens are
/// null encodings, which parse into the declared type, and which are
/// malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionRule {
    /// Numeric-prone identifier: digit sequences pass through verbatim,
    /// float renderings (`"123.0"`, `"1.2e10"`) canonicalize to the digit
    /// string, anything else is malformed.
    Identifier,
    /// Opaque string identifier kept verbatim (receipt ids, user ids).
    OpaqueId,
    /// Free text; empty fields and the listed marker tokens become null.
    Text { null_markers: &'static [&'static str] },
    /// Finite numeric value.
    Numeric,
    /// Numeric that additionally accepts a textual sentinel meaning zero.
    NumericWithZeroSentinel,
    /// Logical date; unparsable input becomes null, never an error.
    Date,
}

impl CoercionRule {
    /// Display name used in coercion reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::OpaqueId => "opaque id",
            Self::Text { .. } => "text",
            Self::Numeric => "numeric",
            Self::NumericWithZeroSentinel => "numeric (zero sentinel)",
            Self::Date => "date",
        }
    }

    /// The dtype a column holds after this rule is applied.
    pub fn dtype(&self) -> DataType {
        match self {
            Self::Identifier | Self::OpaqueId | Self::Text { .. } => DataType::String,
            Self::Numeric | Self::NumericWithZeroSentinel => DataType::Float64,
            Self::Date => DataType::Date,
        }
    }
}

/// One declared column: canonical name plus its coercion rule.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub rule: CoercionRule,
}

/// Declared schema for one input table.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    /// Table name used in logs, reports, and errors.
    pub name: &'static str,
    /// Designated key column for duplicate reporting.
    pub key: &'static str,
    /// Required columns in canonical order.
    pub columns: &'static [ColumnSpec],
}

impl TableSchema {
    /// Canonical column names in declared order.
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// The coercion rule declared for a column.
    pub fn rule_for(&self, column: &str) -> Option<CoercionRule> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.rule)
    }

    /// Check that a raw frame carries every required column.
    ///
    /// A missing column is fatal: downstream joins and queries assume the
    /// full declared schema. Extra columns are tolerated here and dropped
    /// during normalization.
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        let found: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.as_str().to_string())
            .collect();
        let missing: Vec<String> = self
            .columns
            .iter()
            .filter(|spec| !found.iter().any(|name| name == spec.name))
            .map(|spec| spec.name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::MissingColumns {
                table: self.name.to_string(),
                missing,
                found,
            })
        }
    }
}

/// Product dimension: barcode plus manufacturer/brand and a fixed-depth
/// category hierarchy (more specific and more frequently null at higher
/// index).
pub const PRODUCTS: TableSchema = TableSchema {
    name: "products",
    key: "product_code",
    columns: &[
        ColumnSpec {
            name: "product_code",
            rule: CoercionRule::Identifier,
        },
        ColumnSpec {
            name: "manufacturer",
            rule: CoercionRule::Text {
                null_markers: TEXT_NULL_MARKERS,
            },
        },
        ColumnSpec {
            name: "brand",
            rule: CoercionRule::Text {
                null_markers: TEXT_NULL_MARKERS,
            },
        },
        ColumnSpec {
            name: "category_1",
            rule: CoercionRule::Text {
                null_markers: TEXT_NULL_MARKERS,
            },
        },
        ColumnSpec {
            name: "category_2",
            rule: CoercionRule::Text {
                null_markers: TEXT_NULL_MARKERS,
            },
        },
        ColumnSpec {
            name: "category_3",
            rule: CoercionRule::Text {
                null_markers: TEXT_NULL_MARKERS,
            },
        },
        ColumnSpec {
            name: "category_4",
            rule: CoercionRule::Text {
                null_markers: TEXT_NULL_MARKERS,
            },
        },
    ],
};

/// Transaction fact table. `receipt_id` is shared by line items of one
/// receipt; `product_code` and `user_id` are optional foreign keys.
pub const TRANSACTIONS: TableSchema = TableSchema {
    name: "transactions",
    key: "receipt_id",
    columns: &[
        ColumnSpec {
            name: "receipt_id",
            rule: CoercionRule::OpaqueId,
        },
        ColumnSpec {
            name: "product_code",
            rule: CoercionRule::Identifier,
        },
        ColumnSpec {
            name: "user_id",
            rule: CoercionRule::OpaqueId,
        },
        ColumnSpec {
            name: "purchase_date",
            rule: CoercionRule::Date,
        },
        ColumnSpec {
            name: "scan_date",
            rule: CoercionRule::Date,
        },
        ColumnSpec {
            name: "final_quantity",
            rule: CoercionRule::NumericWithZeroSentinel,
        },
        ColumnSpec {
            name: "final_sale",
            rule: CoercionRule::Numeric,
        },
    ],
};

/// User dimension keyed by `id`.
pub const USERS: TableSchema = TableSchema {
    name: "users",
    key: "id",
    columns: &[
        ColumnSpec {
            name: "id",
            rule: CoercionRule::OpaqueId,
        },
        ColumnSpec {
            name: "created_date",
            rule: CoercionRule::Date,
        },
        ColumnSpec {
            name: "birth_date",
            rule: CoercionRule::Date,
        },
        ColumnSpec {
            name: "gender",
            rule: CoercionRule::Text {
                null_markers: TEXT_NULL_MARKERS,
            },
        },
        ColumnSpec {
            name: "state",
            rule: CoercionRule::Text {
                null_markers: TEXT_NULL_MARKERS,
            },
        },
        ColumnSpec {
            name: "language",
            rule: CoercionRule::Text {
                null_markers: TEXT_NULL_MARKERS,
            },
        },
    ],
};
