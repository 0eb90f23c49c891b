//! snp-organizer: post-processing for kSNP4 whole-genome SNP runs
//!
//! Normalizes input FASTA names before kSNP4 runs, relabels its trees,
//! sorts its flat work directory into the published output hierarchy, and
//! collects the numbers the HTML report is built from.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

mod aggregate;
mod classify;
mod config;
mod errors;
mod naming;
mod newick;
mod organize;
mod parsers;
mod prep;
mod store;
mod summary;

use crate::config::ServiceConfig;
use crate::errors::is_missing_input;

/// Organize kSNP4 output and aggregate its reports
#[derive(Parser, Debug)]
#[command(name = "snp-organizer")]
#[command(version)]
#[command(about = "Sort kSNP4 output into a structured hierarchy and aggregate its reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy raw FASTA files into the clean directory under tool-safe names
    CleanFastaFilenames(ConfigArgs),

    /// Write relabelled copies of kSNP4 trees into clean_trees
    PrepareTrees(ConfigArgs),

    /// Copy the kSNP4 work directory into the structured output hierarchy
    OrganizeOutput(ConfigArgs),

    /// Print the optimum k from a Kchooser report
    ParseKchooserReport(KchooserArgs),

    /// Parse all reports and write them as JSON
    AggregateReport(AggregateArgs),
}

/// Arguments shared by config-driven subcommands
#[derive(Parser, Debug)]
struct ConfigArgs {
    /// Job configuration (JSON or YAML)
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct KchooserArgs {
    /// Kchooser report file
    report: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct AggregateArgs {
    /// Job configuration (JSON or YAML)
    config: PathBuf,

    /// Output JSON file
    #[arg(short, long, default_value = "report.json")]
    output: PathBuf,

    /// Use compact JSON (no pretty-printing, smaller file size)
    #[arg(long)]
    compact: bool,

    /// Compress output with gzip (.json.gz)
    #[arg(long)]
    gzip: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::CleanFastaFilenames(args) => run_clean_fasta_filenames(args),
        Commands::PrepareTrees(args) => run_prepare_trees(args),
        Commands::OrganizeOutput(args) => run_organize_output(args),
        Commands::ParseKchooserReport(args) => run_parse_kchooser_report(args),
        Commands::AggregateReport(args) => run_aggregate_report(args),
    };

    // A missing input skips the step; later steps of the job still run.
    match result {
        Err(e) if is_missing_input(&e) => {
            error!("{:#}", e);
            Ok(())
        }
        other => other,
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

fn load_config(path: &Path) -> Result<ServiceConfig> {
    info!("Loading configuration: {}", path.display());
    ServiceConfig::from_path(path)
}

fn run_clean_fasta_filenames(args: ConfigArgs) -> Result<()> {
    init_logging(args.verbose);
    let config = load_config(&args.config)?;
    let sanitizer = config.sanitizer()?;

    info!(
        "Cleaning FASTA filenames ({:?} mode): {} -> {}",
        sanitizer.mode,
        config.raw_fasta_dir.display(),
        config.clean_data_dir.display()
    );
    let cleaned =
        prep::clean_fasta_filenames(&config.raw_fasta_dir, &config.clean_data_dir, &sanitizer)?;
    let renamed = cleaned.iter().filter(|c| c.original != c.cleaned).count();
    info!("Copied {} files ({} renamed)", cleaned.len(), renamed);
    Ok(())
}

fn run_prepare_trees(args: ConfigArgs) -> Result<()> {
    init_logging(args.verbose);
    let config = load_config(&args.config)?;

    let written = prep::prepare_trees(&config.work_data_dir, &config.clean_trees_dir())?;
    if written.is_empty() {
        warn!("No tree files found in {}", config.work_data_dir.display());
    } else {
        info!(
            "Wrote {} relabelled trees to {}",
            written.len(),
            config.clean_trees_dir().display()
        );
    }
    Ok(())
}

fn run_organize_output(args: ConfigArgs) -> Result<()> {
    init_logging(args.verbose);
    let config = load_config(&args.config)?;

    let router = organize::OutputRouter::new(&config.work_data_dir, &config.output_data_dir)
        .with_clean_trees_dir(config.clean_trees_dir());
    let summary = router.route()?;

    for failure in &summary.failed {
        warn!("Not copied: {}", failure);
    }
    Ok(())
}

fn run_parse_kchooser_report(args: KchooserArgs) -> Result<()> {
    init_logging(args.verbose);

    if !args.report.is_file() {
        return Err(errors::PipelineError::missing("Kchooser report", &args.report).into());
    }
    let text = std::fs::read_to_string(&args.report)
        .with_context(|| format!("Failed to read report: {}", args.report.display()))?;
    match parsers::parse_optimum_k(&text) {
        Some(k) => println!("{}", k),
        None => println!("Optimum value of k not found"),
    }
    Ok(())
}

fn run_aggregate_report(args: AggregateArgs) -> Result<()> {
    init_logging(args.verbose);
    info!("snp-organizer aggregate-report v{}", env!("CARGO_PKG_VERSION"));
    let config = load_config(&args.config)?;

    let report = aggregate::AggregatedReport::from_inputs(&config.aggregation_inputs());

    // Auto-detect gzip from output extension
    let use_gzip = args.gzip || args.output.extension().map(|e| e == "gz").unwrap_or(false);
    report.save(&args.output, args.compact, use_gzip)?;

    info!(
        "Wrote {} report sources to {}",
        report.records.len(),
        args.output.display()
    );
    Ok(())
}
