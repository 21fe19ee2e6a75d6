//! CLI entry point for the analysis engine.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tally_engine::{Analysis, AnalysisConfig, AnalysisReport, EngineError};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Data-quality normalization and cross-dataset query engine for retail loyalty data",
    long_about = "Ingests the products, transactions, and users tables of a retail loyalty\n\
                  program, normalizes them into a consistent schema, reports data-quality\n\
                  defects, and answers the analytical query catalog.\n\n\
                  EXAMPLES:\n  \
                  # Full run with defaults\n  \
                  tally-engine --products products.csv --transactions transactions.csv --users users.csv\n\n  \
                  # Reproducible run with a fixed reference date, JSON to stdout\n  \
                  tally-engine --products p.csv --transactions t.csv --users u.csv --as-of 2024-09-01 --json\n\n  \
                  # Custom thresholds\n  \
                  tally-engine --products p.csv --transactions t.csv --users u.csv \\\n      \
                  --top-brands 10 --power-user-min-spend 500"
)]
struct Args {
    /// Path to the products CSV file
    #[arg(long)]
    products: PathBuf,

    /// Path to the transactions CSV file
    #[arg(long)]
    transactions: PathBuf,

    /// Path to the users CSV file
    #[arg(long)]
    users: PathBuf,

    /// Reference date (YYYY-MM-DD) for age computations
    ///
    /// Defaults to today; pass a fixed date for reproducible output
    #[arg(long, value_parser = parse_as_of)]
    as_of: Option<NaiveDate>,

    /// Minimum user age for the brand popularity query
    #[arg(long, default_value_t = 21)]
    brand_age_threshold: i32,

    /// Number of brands returned by the brand popularity query
    #[arg(long, default_value_t = 5)]
    top_brands: usize,

    /// Top-level category measured by the spend-share query
    #[arg(long, default_value = "Health & Wellness")]
    focus_category: String,

    /// Users with strictly more transactions than this are power users
    #[arg(long, default_value_t = 10)]
    power_user_min_transactions: u32,

    /// Users with strictly more total spend than this are power users
    #[arg(long, default_value_t = 1000.0)]
    power_user_min_spend: f64,

    /// Treat rows with a null key as duplicates of one another
    #[arg(long)]
    count_null_keys_as_duplicates: bool,

    /// Output the full report as JSON to stdout instead of a summary
    ///
    /// Disables all logging; only the JSON report is written to stdout.
    /// Useful for piping: `... --json | jq .top_brands`
    #[arg(long)]
    json: bool,

    /// Also write the JSON report to this path
    #[arg(long)]
    emit_report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final summary)
    #[arg(short, long)]
    quiet: bool,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long)]
    log_json: bool,
}

fn parse_as_of(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD date: {}", e))
}

/// Initialize the tracing subscriber for logging.
///
/// When `--json` is set, logging is completely disabled so stdout carries
/// only the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool, log_json: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json, args.log_json);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {}", e.error_code(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), EngineError> {
    let mut builder = AnalysisConfig::builder()
        .brand_age_threshold(args.brand_age_threshold)
        .top_brands(args.top_brands)
        .focus_category(&args.focus_category)
        .power_user_min_transactions(args.power_user_min_transactions)
        .power_user_min_spend(args.power_user_min_spend)
        .count_null_keys_as_duplicates(args.count_null_keys_as_duplicates);
    if let Some(as_of) = args.as_of {
        builder = builder.as_of(as_of);
    }
    let config = builder
        .build()
        .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;

    let report = Analysis::builder()
        .config(config)
        .build()?
        .run(&args.products, &args.transactions, &args.users)?;

    if let Some(ref path) = args.emit_report {
        std::fs::write(path, report.to_json()?)?;
        info!("Report written to: {}", path.display());
    }

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    print_summary(&report, args);
    Ok(())
}

/// Print the human-readable run summary.
///
/// This intentionally uses `println!` rather than logging: the summary is
/// the primary output of a default run and should be visible regardless of
/// log level.
fn print_summary(report: &AnalysisReport, args: &Args) {
    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    println!("As of: {}    Duration: {}ms", report.as_of, report.duration_ms);
    println!();

    println!("TABLES");
    println!("{}", "-".repeat(40));
    for table in [&report.products, &report.transactions, &report.users] {
        println!(
            "  {:<14} {} rows x {} columns, {} duplicate '{}' row(s), {} malformed value(s)",
            table.name,
            table.profile.shape.0,
            table.profile.shape.1,
            table.key_duplicates.duplicate_rows,
            table.key_duplicates.key,
            table.coercion.total_malformed()
        );
    }
    println!();

    println!("JOINED VIEW");
    println!("{}", "-".repeat(40));
    println!(
        "  {} transaction rows ({:.1}% matched a product, {:.1}% matched a user)",
        report.join.transaction_rows,
        report.join.product_match_rate() * 100.0,
        report.join.user_match_rate() * 100.0
    );
    if report.join.product_rows_dropped + report.join.user_rows_dropped > 0 {
        println!(
            "  dimension de-duplication dropped {} product and {} user row(s)",
            report.join.product_rows_dropped, report.join.user_rows_dropped
        );
    }
    println!();

    println!("TOP BRANDS (users aged {}+)", args.brand_age_threshold);
    println!("{}", "-".repeat(40));
    if report.top_brands.is_empty() {
        println!("  (no qualifying rows)");
    }
    for brand in &report.top_brands {
        println!("  {:<30} {:>6} receipts", brand.brand, brand.receipts);
    }
    println!();

    println!(
        "SPEND SHARE BY COHORT ({})",
        report.category_spend_share.category
    );
    println!("{}", "-".repeat(40));
    if report.category_spend_share.cohorts.is_empty() {
        println!("  (no qualifying rows)");
    }
    for cohort in &report.category_spend_share.cohorts {
        println!(
            "  {:<14} {:>12.2} spend   {:>6.2}% of all spend",
            cohort.cohort, cohort.spend, cohort.share_pct
        );
    }
    println!();

    println!(
        "POWER USERS (> {} transactions or > {} spend)",
        args.power_user_min_transactions, args.power_user_min_spend
    );
    println!("{}", "-".repeat(40));
    if report.power_users.is_empty() {
        println!("  (none)");
    }
    for user in report.power_users.iter().take(10) {
        println!(
            "  {:<26} {:>5} transactions   {:>12.2} spend",
            user.user_id, user.transactions, user.total_spend
        );
    }
    if report.power_users.len() > 10 {
        println!("  ... and {} more", report.power_users.len() - 10);
    }
    println!();

    if !report.warnings.is_empty() {
        println!("WARNINGS");
        println!("{}", "-".repeat(40));
        for warning in &report.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report <path> to save the JSON report");
    println!("{}", "=".repeat(80));
}
