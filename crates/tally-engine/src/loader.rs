//! CSV ingestion for the three input tables.
//!
//! Ingestion never guesses types: schema inference is disabled so every
//! column arrives as a string and raw digit sequences survive intact. The
//! normalizer owns all typing decisions. Empty fields are null at read time.

use crate::error::{Result, ResultExt};
use crate::schema::{self, TableSchema};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Read a delimited file with every column typed as a string.
fn read_raw_csv(path: &Path) -> Result<DataFrame> {
    // Strategy 1: standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed for {}: {}", path.display(), e);
        }
    }

    // Strategy 2: tolerate unquoted/ragged rows rather than fail ingestion
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(None)
                .with_truncate_ragged_lines(true),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Load one table and validate it against its declared schema.
fn load_table(path: &Path, table: &TableSchema) -> Result<DataFrame> {
    info!("Loading {} from {}", table.name, path.display());
    let df = read_raw_csv(path).context(format!("loading {} table", table.name))?;
    table.validate(&df)?;
    debug!(
        "{} loaded: {} rows x {} columns",
        table.name,
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Load the product table from a CSV file.
pub fn load_products(path: impl AsRef<Path>) -> Result<DataFrame> {
    load_table(path.as_ref(), &schema::PRODUCTS)
}

/// Load the transaction table from a CSV file.
pub fn load_transactions(path: impl AsRef<Path>) -> Result<DataFrame> {
    load_table(path.as_ref(), &schema::TRANSACTIONS)
}

/// Load the user table from a CSV file.
pub fn load_users(path: impl AsRef<Path>) -> Result<DataFrame> {
    load_table(path.as_ref(), &schema::USERS)
}
