//! stmine: frequent pollutant co-occurrence patterns across space and time
//!
//! Reads air-quality readings from CSV, discretizes each pollutant into
//! bands, mines frequent itemsets per (location, month), and prints the
//! concrete, one-star and two-star pattern layers.

mod config;
mod ingest;
mod report;

use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use tracing::info;

use config::{Config, OutputFormat};
use stmine::{Algorithm, MiningConfig, MiningPipeline, MiningReport, Transaction};

#[derive(Parser)]
#[command(name = "stmine")]
#[command(about = "Spatio-temporal frequent pattern mining over pollutant readings")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "stmine.toml")]
    config: PathBuf,

    /// CSV readings file (overrides config file)
    #[arg(short, long, env = "STMINE_INPUT")]
    input: Option<PathBuf>,

    /// Minimum support within a context (overrides config file)
    #[arg(short = 's', long)]
    min_support: Option<u64>,

    /// apriori, hashed-apriori or fp-growth (overrides config file)
    #[arg(short, long)]
    algorithm: Option<Algorithm>,

    /// Emit association rules at this confidence (overrides config file)
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Output format (overrides config file)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Run every algorithm, compare timings and check they agree
    #[arg(long)]
    compare: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stmine=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(config = %cli.config.display(), "Starting stmine");

    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if let Some(input) = cli.input {
        config.input.path = input;
    }
    if let Some(min_support) = cli.min_support {
        config.mining.min_support = min_support;
    }
    if let Some(algorithm) = cli.algorithm {
        config.mining.algorithm = algorithm;
    }
    if let Some(min_confidence) = cli.min_confidence {
        config.mining.min_confidence = Some(min_confidence);
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }

    config.mining.validate()?;
    let transactions = ingest::load_transactions(&config.input)?;

    if cli.compare {
        return compare(&config.mining, &transactions);
    }

    let report = MiningPipeline::new(config.mining.clone())?.run(&transactions)?;
    match config.output.format {
        OutputFormat::Table => report::print_report(&report),
        OutputFormat::Json => println!("{}", report::to_json(&report)?),
    }

    Ok(())
}

/// Run all algorithms on the same input and fail if their concrete results differ.
fn compare(mining: &MiningConfig, transactions: &[Transaction]) -> anyhow::Result<()> {
    let reports = Algorithm::ALL
        .iter()
        .map(|&algorithm| {
            let config = mining.clone().with_algorithm(algorithm);
            MiningPipeline::new(config)?.run(transactions)
        })
        .collect::<Result<Vec<MiningReport>, _>>()?;

    for report in &reports {
        info!(
            algorithm = %report.algorithm,
            elapsed_us = report.elapsed_micros() as u64,
            patterns = report.patterns.zero_star.pattern_count(),
            "Algorithm finished"
        );
    }

    println!("{}", report::comparison_table(&reports));

    let baseline = reports[0].patterns.zero_star.triples();
    for report in &reports[1..] {
        if report.patterns.zero_star.triples() != baseline {
            bail!(
                "{} disagrees with {} on concrete-context patterns",
                report.algorithm,
                reports[0].algorithm
            );
        }
    }

    println!("All {} algorithms agree", reports.len());
    Ok(())
}
