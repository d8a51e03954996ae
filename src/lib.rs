//! Bracken abundance matrix builder
//!
//! This library turns a directory of per-sample bracken taxonomic reports
//! into analysis-ready wide tables: taxa as rows, samples as columns,
//! relative-abundance fractions as cell values, with an optional parallel
//! table of raw read counts.
//!
//! # Overview
//!
//! The crate is organized into two core stages plus orchestration:
//!
//! - **report**: file discovery, sample-id derivation, per-file parsing with
//!   minimum-abundance filtering ([`report::ParsedReports`])
//! - **matrix**: sorted, zero-filled, zero-row-eliminated taxa × sample
//!   matrices ([`matrix::TaxaMatrix`])
//! - **summarize**: batch runs that write the tables as TSV
//!
//! # Example
//!
//! ```no_run
//! use bracken_matrix::prelude::*;
//! use std::path::PathBuf;
//!
//! let mut config = SummarizeConfig::new(
//!     PathBuf::from("bracken_out"),
//!     ".G.bracken",
//!     PathBuf::from("matrices"),
//! );
//! config.with_reads = true;
//! let summary = summarize(&config).unwrap();
//! println!("{}", summary);
//! ```

pub mod error;
pub mod matrix;
pub mod report;
pub mod summarize;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::error::{BrackenError, Result};
    pub use crate::matrix::{abundance_matrix, assemble, reads_matrix, TaxaMatrix};
    pub use crate::report::{
        discover_reports, parse_reports, sample_id_from_path, Observation, ParseStats,
        ParsedReports,
    };
    pub use crate::summarize::{
        run as summarize, SummarizeConfig, SummarizeSummary, DEFAULT_MIN_ABUNDANCE,
        READS_MATRIX_FILE, RELAB_MATRIX_FILE,
    };
}
