//! Per-sample bracken report discovery and parsing.
//!
//! A bracken report is a tab-separated file with one header line and one row
//! per taxon. This module turns a directory of such files into a normalized
//! record set ([`ParsedReports`]): canonical sample and taxon universes plus
//! the threshold-filtered observations keyed by (sample, taxon).

use crate::error::{BrackenError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Delimiter separating the sample id from the rest of a report file name.
const SAMPLE_DELIMITER: char = '.';

/// Minimum number of tab-separated fields in a report row.
const MIN_FIELDS: usize = 7;

/// Zero-indexed column positions of the bracken report layout. This is a
/// binding contract of the input format, not auto-detected.
const TAXON_FIELD: usize = 0;
const READS_FIELD: usize = 5;
const REL_ABUNDANCE_FIELD: usize = 6;

/// One retained report row: bracken's revised read count and the fraction of
/// total classified reads assigned to the taxon within one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Assigned read count (bracken `new_est_reads`).
    pub reads: u64,
    /// Relative abundance fraction (bracken `fraction_total_reads`).
    pub rel_abundance: f64,
}

/// Normalized record set produced by parsing a batch of report files.
///
/// The sample and taxon universes are deduplicated sequences in
/// first-encounter order. Observations are keyed by (sample, taxon);
/// inserting an existing key overwrites the stored value (last-write-wins,
/// see [`parse_reports`]). The key set doubles as the per-sample
/// present-taxa relation queried by [`is_present`](Self::is_present).
#[derive(Debug, Clone, Default)]
pub struct ParsedReports {
    sample_ids: Vec<String>,
    taxon_ids: Vec<String>,
    sample_seen: HashSet<String>,
    taxon_seen: HashSet<String>,
    observations: HashMap<String, HashMap<String, Observation>>,
}

impl ParsedReports {
    /// Create an empty record set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample universe in first-encounter order.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Taxon universe in first-encounter order.
    #[inline]
    pub fn taxon_ids(&self) -> &[String] {
        &self.taxon_ids
    }

    /// Number of unique samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Number of unique taxa.
    #[inline]
    pub fn n_taxa(&self) -> usize {
        self.taxon_ids.len()
    }

    /// Total number of retained observations.
    pub fn n_observations(&self) -> usize {
        self.observations.values().map(|taxa| taxa.len()).sum()
    }

    /// Look up the retained observation for (sample, taxon).
    pub fn observation(&self, sample: &str, taxon: &str) -> Option<&Observation> {
        self.observations.get(sample).and_then(|taxa| taxa.get(taxon))
    }

    /// Whether the taxon passed the threshold filter in the given sample.
    pub fn is_present(&self, sample: &str, taxon: &str) -> bool {
        self.observation(sample, taxon).is_some()
    }

    /// Add a sample id to the universe if not already present.
    pub fn record_sample(&mut self, id: &str) {
        if self.sample_seen.insert(id.to_string()) {
            self.sample_ids.push(id.to_string());
        }
    }

    /// Add a taxon name to the universe if not already present.
    pub fn record_taxon(&mut self, name: &str) {
        if self.taxon_seen.insert(name.to_string()) {
            self.taxon_ids.push(name.to_string());
        }
    }

    /// Upsert the observation for (sample, taxon). Returns true if an
    /// existing value was overwritten.
    pub fn insert(&mut self, sample: &str, taxon: &str, obs: Observation) -> bool {
        self.observations
            .entry(sample.to_string())
            .or_default()
            .insert(taxon.to_string(), obs)
            .is_some()
    }
}

/// Counters describing one parse pass over a report batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseStats {
    /// Number of report files parsed.
    pub n_files: usize,
    /// Number of data rows read (header lines excluded).
    pub n_rows: usize,
    /// Number of rows retained after threshold filtering.
    pub n_retained: usize,
    /// Number of rows dropped for not exceeding the threshold.
    pub n_below_threshold: usize,
    /// Number of duplicate (sample, taxon) keys overwritten.
    pub n_overwrites: usize,
}

impl std::fmt::Display for ParseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Report Parse Stats")?;
        writeln!(f, "  Files parsed:    {}", self.n_files)?;
        writeln!(f, "  Rows read:       {}", self.n_rows)?;
        writeln!(f, "  Rows retained:   {}", self.n_retained)?;
        writeln!(f, "  Below threshold: {}", self.n_below_threshold)?;
        writeln!(f, "  Keys overwritten: {}", self.n_overwrites)?;
        Ok(())
    }
}

/// List report files in `dir` whose names end with `suffix`.
///
/// Non-matching entries are silently excluded; an empty result is not an
/// error. Paths are sorted so narration and stats are stable across
/// file-system enumeration orders.
pub fn discover_reports<P: AsRef<Path>>(dir: P, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(suffix) {
                paths.push(path);
            }
        }
    }
    paths.sort();
    Ok(paths)
}

/// Derive the sample id from a report path: the base name up to the first
/// `.`. A name without the delimiter violates the naming convention and is
/// fatal.
pub fn sample_id_from_path(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BrackenError::BadFileName {
            name: path.display().to_string(),
        })?;
    match name.split_once(SAMPLE_DELIMITER) {
        Some((id, _)) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(BrackenError::BadFileName {
            name: name.to_string(),
        }),
    }
}

/// Parse a batch of report files into a [`ParsedReports`] record set.
///
/// Every taxon name enters the taxon universe whether or not its row passes
/// the filter; a row is retained only if its relative abundance strictly
/// exceeds `min_abundance`. A duplicate (sample, taxon) key within a file
/// overwrites the earlier value (last-write-wins) and is surfaced as a
/// warning and counted in [`ParseStats::n_overwrites`].
pub fn parse_reports(paths: &[PathBuf], min_abundance: f64) -> Result<(ParsedReports, ParseStats)> {
    info!("Parsing {} report files...", paths.len());

    let mut reports = ParsedReports::new();
    let mut stats = ParseStats::default();

    for path in paths {
        let sample_id = sample_id_from_path(path)?;
        reports.record_sample(&sample_id);
        parse_file(path, &sample_id, min_abundance, &mut reports, &mut stats)?;
        stats.n_files += 1;
    }

    Ok((reports, stats))
}

/// Parse one report file, accumulating into `reports` and `stats`.
fn parse_file(
    path: &Path,
    sample_id: &str,
    min_abundance: f64,
    reports: &mut ParsedReports,
    stats: &mut ParseStats,
) -> Result<()> {
    let file_label = path.display().to_string();
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    // First line is a header and is always skipped. A file with no lines at
    // all contributes nothing but is not an error.
    if lines.next().transpose()?.is_none() {
        debug!("   {} is empty, skipping", file_label);
        return Ok(());
    }

    let mut file_retained = 0usize;
    for (idx, line_result) in lines.enumerate() {
        let line_no = idx + 2;
        let line = line_result?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_FIELDS {
            return Err(BrackenError::RowLayout {
                file: file_label.clone(),
                line: line_no,
                expected: MIN_FIELDS,
                found: fields.len(),
            });
        }
        stats.n_rows += 1;

        // The taxon joins the universe regardless of the threshold outcome;
        // taxa that never pass anywhere are eliminated as all-zero rows
        // during matrix assembly.
        let taxon = fields[TAXON_FIELD];
        reports.record_taxon(taxon);

        let reads: u64 =
            fields[READS_FIELD]
                .parse()
                .map_err(|_| BrackenError::InvalidNumber {
                    field: "reads",
                    value: fields[READS_FIELD].to_string(),
                    file: file_label.clone(),
                    line: line_no,
                })?;
        let rel_abundance: f64 =
            fields[REL_ABUNDANCE_FIELD]
                .parse()
                .map_err(|_| BrackenError::InvalidNumber {
                    field: "relative abundance",
                    value: fields[REL_ABUNDANCE_FIELD].to_string(),
                    file: file_label.clone(),
                    line: line_no,
                })?;

        // Strictly greater than: a value exactly equal to the threshold is
        // dropped.
        if rel_abundance > min_abundance {
            if reports.insert(sample_id, taxon, Observation { reads, rel_abundance }) {
                warn!(
                    "Duplicate taxon '{}' in sample {}; keeping the later row",
                    taxon, sample_id
                );
                stats.n_overwrites += 1;
            }
            stats.n_retained += 1;
            file_retained += 1;
        } else {
            stats.n_below_threshold += 1;
        }
    }

    debug!(
        "   Parsed {} as sample {} ({} rows retained)",
        file_label, sample_id, file_retained
    );
    Ok(())
}
