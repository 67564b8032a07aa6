//! Command-line reconciliation of a direct-debit settlement ledger.

use bigdecimal::BigDecimal;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use settlement_reconciliation::report::export_tables;
use settlement_reconciliation::utils::CsvSource;
use settlement_reconciliation::{
    format_amount, ReconciliationConfig, ReconciliationEngine, ReconciliationResult,
    ReportFormat, TransactionSource, UnclassifiedPolicy,
};

/// Report layouts selectable from the command line.
#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Headline figures and anomalies
    Executive,
    /// Full tables
    Detailed,
    /// Key figures with annexes
    Combined,
    /// All three layouts
    All,
}

impl FormatArg {
    fn formats(self) -> Vec<ReportFormat> {
        match self {
            FormatArg::Executive => vec![ReportFormat::Executive],
            FormatArg::Detailed => vec![ReportFormat::Detailed],
            FormatArg::Combined => vec![ReportFormat::Combined],
            FormatArg::All => ReportFormat::ALL.to_vec(),
        }
    }
}

/// Settlement reconciliation - verifies that PAC income is settled to
/// merchants on the next business day and reports the anomalies found.
#[derive(Parser)]
#[command(name = "settlement-reconcile")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV with date,description,amount columns
    #[arg(long, default_value = "inputs/debito_directo.csv")]
    input: PathBuf,

    /// Output directory (created if missing)
    #[arg(long, default_value = "outputs")]
    output: PathBuf,

    /// Report layout
    #[arg(long, value_enum, default_value = "all")]
    format: FormatArg,

    /// Also export the tables as CSV files
    #[arg(long)]
    csv: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Flow-verification tolerance in minor currency units
    #[arg(long)]
    tolerance_minor_units: Option<i64>,

    /// Amounts strictly below this are flagged as atypical
    #[arg(long)]
    small_amount_cutoff: Option<BigDecimal>,

    /// Abort on any malformed row or unclassified movement
    #[arg(long)]
    strict: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> ReconciliationResult<ReconciliationConfig> {
    let mut config = match &args.config {
        Some(path) => ReconciliationConfig::from_json_file(path)?,
        None => ReconciliationConfig::default(),
    };

    if let Some(tolerance) = args.tolerance_minor_units {
        config = config.with_tolerance_minor_units(tolerance);
    }
    if let Some(cutoff) = &args.small_amount_cutoff {
        config = config.with_small_amount_cutoff(cutoff.clone());
    }
    if args.strict {
        config = config.with_unclassified_policy(UnclassifiedPolicy::Abort);
    }

    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> ReconciliationResult<()> {
    let config = load_config(&args)?;
    let engine = ReconciliationEngine::new(config);

    info!(input = %args.input.display(), "Analyzing");
    let source = CsvSource::new(&args.input);
    let loaded = source.load().await?;

    let transactions = if args.strict {
        loaded.into_strict()?
    } else {
        for rejected in &loaded.rejected {
            warn!("{}", rejected);
        }
        loaded.transactions
    };

    let report = engine.reconcile_transactions(&transactions)?;

    std::fs::create_dir_all(&args.output)?;
    for format in args.format.formats() {
        let path = args.output.join(format.file_name());
        std::fs::write(&path, format.render(&report))?;
        println!("Generated: {}", path.display());
    }

    if args.csv {
        println!("\nExporting CSV tables...");
        for path in export_tables(&report, &args.output)? {
            println!("  - {}", path.display());
        }
    }

    println!("\nSummary:");
    println!("  - Total income: ${}", format_amount(&report.total_income));
    println!(
        "  - Total settlements: ${}",
        format_amount(&report.total_settlements)
    );
    println!("  - Imbalance: ${}", format_amount(&report.difference));
    println!("  - Anomalies: {}", report.anomalies.len());
    if !report.unclassified.is_empty() {
        println!("  - Unclassified movements: {}", report.unclassified.len());
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
