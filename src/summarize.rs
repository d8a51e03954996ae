//! Batch orchestration: discover reports, parse, assemble, write tables.

use crate::error::Result;
use crate::matrix::{abundance_matrix, reads_matrix};
use crate::report::{discover_reports, parse_reports, ParseStats};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default minimum relative-abundance threshold (strict greater-than).
pub const DEFAULT_MIN_ABUNDANCE: f64 = 0.001;

/// Output file name for the relative-abundance table.
pub const RELAB_MATRIX_FILE: &str = "relab_matrix.tsv";

/// Output file name for the optional read-count table.
pub const READS_MATRIX_FILE: &str = "reads_matrix.tsv";

/// Configuration for one summarize run.
#[derive(Debug, Clone)]
pub struct SummarizeConfig {
    /// Directory containing per-sample report files.
    pub input_dir: PathBuf,
    /// File-name suffix selecting report files (e.g. ".G.bracken").
    pub suffix: String,
    /// Directory the output tables are written to.
    pub output_dir: PathBuf,
    /// Rows are retained only if relative abundance strictly exceeds this.
    pub min_abundance: f64,
    /// Also build and write the read-count matrix.
    pub with_reads: bool,
}

impl SummarizeConfig {
    /// Configuration with the default threshold and no reads matrix.
    pub fn new(input_dir: PathBuf, suffix: &str, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            suffix: suffix.to_string(),
            output_dir,
            min_abundance: DEFAULT_MIN_ABUNDANCE,
            with_reads: false,
        }
    }
}

/// Outcome of a summarize run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeSummary {
    /// Number of unique samples in the universe.
    pub n_samples: usize,
    /// Number of unique taxa across all reports, threshold ignored.
    pub n_taxa: usize,
    /// Number of taxa retained in the abundance matrix.
    pub n_retained_taxa: usize,
    /// Parse-stage counters.
    pub parse: ParseStats,
    /// Tables written, in write order.
    pub outputs: Vec<PathBuf>,
}

impl std::fmt::Display for SummarizeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Summarize Run")?;
        writeln!(f, "  Report files:    {}", self.parse.n_files)?;
        writeln!(f, "  Samples:         {}", self.n_samples)?;
        writeln!(f, "  Taxa (universe): {}", self.n_taxa)?;
        writeln!(f, "  Taxa retained:   {}", self.n_retained_taxa)?;
        for path in &self.outputs {
            writeln!(f, "  Wrote {}", path.display())?;
        }
        Ok(())
    }
}

/// Run the full pipeline: discover report files, parse them into a record
/// set, assemble the matrices, and persist them as tab-separated tables.
///
/// Zero matched files is not an error and produces an empty abundance table.
/// Any parse failure aborts before anything is written.
pub fn run(config: &SummarizeConfig) -> Result<SummarizeSummary> {
    let paths = discover_reports(&config.input_dir, &config.suffix)?;
    let (reports, parse_stats) = parse_reports(&paths, config.min_abundance)?;
    info!(
        "{} samples | {} unique taxa parsed",
        reports.n_samples(),
        reports.n_taxa()
    );

    info!("Generating matrices...");
    let relab = abundance_matrix(&reports)?;
    debug!(
        "Relative abundance matrix: {} taxa x {} samples ({} nonzero)",
        relab.n_taxa(),
        relab.n_samples(),
        relab.nnz()
    );
    let reads = if config.with_reads {
        let matrix = reads_matrix(&reports)?;
        debug!(
            "Read count matrix: {} taxa x {} samples ({} nonzero)",
            matrix.n_taxa(),
            matrix.n_samples(),
            matrix.nnz()
        );
        Some(matrix)
    } else {
        None
    };

    // Assembly of every requested table has succeeded before the first
    // write, so a fatal error never leaves a partial result behind.
    std::fs::create_dir_all(&config.output_dir)?;
    let mut outputs = Vec::new();

    let relab_path = config.output_dir.join(RELAB_MATRIX_FILE);
    relab.to_tsv(&relab_path)?;
    outputs.push(relab_path);

    if let Some(matrix) = &reads {
        let reads_path = config.output_dir.join(READS_MATRIX_FILE);
        matrix.to_tsv(&reads_path)?;
        outputs.push(reads_path);
    }

    Ok(SummarizeSummary {
        n_samples: reports.n_samples(),
        n_taxa: reports.n_taxa(),
        n_retained_taxa: relab.n_taxa(),
        parse: parse_stats,
        outputs,
    })
}
