mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::compare::CompareArgs;
use commands::ledger::{ClassifyArgs, LedgerArgs};
use commands::risk::RiskArgs;
use commands::validate::ValidateArgs;

/// Financial risk analysis for health-sector insurers (EPS) and providers (IPS)
#[derive(Parser)]
#[command(
    name = "hra",
    version,
    about = "Financial risk analysis for health-sector entities",
    long_about = "Validates entity identifiers against the health-sector registry, \
                  classifies ledger lines into standard categories, computes liquidity, \
                  leverage and profitability ratios per entity and scores their \
                  financial risk with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Reference data override (JSON or YAML): registry, taxonomy, thresholds
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every identifier in a ledger against the registry
    Validate(ValidateArgs),
    /// Classify ledger lines into financial categories
    Classify(ClassifyArgs),
    /// Compute per-entity financial indicators
    Indicators(LedgerArgs),
    /// Score a single set of ratios
    Risk(RiskArgs),
    /// Run the full pipeline and report risk per entity
    Score(LedgerArgs),
    /// Category totals, validation counts and tier distribution
    Summary(LedgerArgs),
    /// Compare one entity against peers
    Compare(CompareArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let data = match input::config::load_reference_data(cli.config.as_deref()) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Validate(args) => commands::validate::run_validate(args, &data),
        Commands::Classify(args) => commands::ledger::run_classify(args, &data),
        Commands::Indicators(args) => commands::ledger::run_indicators(args, &data),
        Commands::Risk(args) => commands::risk::run_risk(args, &data),
        Commands::Score(args) => commands::ledger::run_score(args, &data),
        Commands::Summary(args) => commands::ledger::run_summary(args, &data),
        Commands::Compare(args) => commands::compare::run_compare(args, &data),
        Commands::Version => {
            println!("hra {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
