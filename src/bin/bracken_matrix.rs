//! bracken-matrix CLI
//!
//! Summarize per-sample bracken reports into taxa × sample matrices.

use bracken_matrix::error::Result;
use bracken_matrix::summarize::{self, SummarizeConfig, DEFAULT_MIN_ABUNDANCE};
use clap::Parser;
use std::path::PathBuf;

/// Summarize taxonomic relative abundance from kraken2/bracken reports for
/// plots and analysis.
#[derive(Parser)]
#[command(name = "bracken-matrix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing bracken output files
    #[arg(short = 'b', long)]
    bracken_dir: PathBuf,

    /// Report file suffix (e.g. ".G.bracken")
    #[arg(short, long)]
    suffix: String,

    /// Output directory for the matrix tables
    #[arg(short, long)]
    output: PathBuf,

    /// Minimum relative abundance a row must strictly exceed to be retained
    #[arg(short, long, default_value_t = DEFAULT_MIN_ABUNDANCE)]
    minimum_abundance: f64,

    /// Also produce the read-count matrix
    #[arg(short, long)]
    reads: bool,

    /// Narrate per-sample progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = SummarizeConfig {
        input_dir: cli.bracken_dir.clone(),
        suffix: cli.suffix.clone(),
        output_dir: cli.output.clone(),
        min_abundance: cli.minimum_abundance,
        with_reads: cli.reads,
    };

    let summary = summarize::run(&config)?;

    eprintln!("{}", summary);
    eprintln!("Output files written to: {}", cli.output.display());

    Ok(())
}
