//! Taxa-by-sample matrix assembly with sparse storage.
//!
//! The assembler consumes a [`ParsedReports`] record set read-only and
//! produces a [`TaxaMatrix`]: rows are taxa with at least one nonzero value,
//! columns are the full sample universe, both sorted lexicographically.
//! Missing (taxon, sample) cells read as zero. The same generic routine
//! builds the relative-abundance matrix (`f64`) and the reads matrix (`u64`).

use crate::error::{BrackenError, Result};
use crate::report::{Observation, ParsedReports};
use num_traits::Zero;
use sprs::{CsMat, TriMat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A dense-semantics matrix of per-sample taxon values backed by CSR
/// sparse storage.
///
/// Row order and column order are sorted ascending by identifier, so the
/// structure is a pure function of its content and independent of file
/// enumeration order.
#[derive(Debug, Clone)]
pub struct TaxaMatrix<N> {
    /// Sparse matrix in CSR format (taxa × samples).
    data: CsMat<N>,
    /// Taxon identifiers (row names), sorted ascending.
    taxon_ids: Vec<String>,
    /// Sample identifiers (column names), sorted ascending.
    sample_ids: Vec<String>,
}

impl<N: Copy + Zero> TaxaMatrix<N> {
    /// Create a new TaxaMatrix from a sparse matrix and identifiers.
    pub fn new(data: CsMat<N>, taxon_ids: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != taxon_ids.len() {
            return Err(BrackenError::DimensionMismatch {
                expected: nrows,
                actual: taxon_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(BrackenError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        Ok(Self {
            data,
            taxon_ids,
            sample_ids,
        })
    }

    /// Get the value at (row, col), returning zero for missing entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> N {
        self.data.get(row, col).copied().unwrap_or_else(N::zero)
    }

    /// Number of taxa (rows).
    #[inline]
    pub fn n_taxa(&self) -> usize {
        self.data.rows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    /// Total number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.nnz()
    }

    /// Taxon identifiers.
    #[inline]
    pub fn taxon_ids(&self) -> &[String] {
        &self.taxon_ids
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get a dense vector for a specific row (taxon).
    pub fn row_dense(&self, row: usize) -> Vec<N> {
        let mut dense = vec![N::zero(); self.n_samples()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }
}

impl<N: Copy + Zero + std::fmt::Display> TaxaMatrix<N> {
    /// Write the matrix as a dense tab-separated table.
    ///
    /// The first header cell is an unlabeled index column holding taxon
    /// identifiers; subsequent columns are one per sample. Absent cells are
    /// materialized as zeros.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        for sample_id in &self.sample_ids {
            write!(writer, "\t{}", sample_id)?;
        }
        writeln!(writer)?;

        for (row, taxon_id) in self.taxon_ids.iter().enumerate() {
            write!(writer, "{}", taxon_id)?;
            for col in 0..self.n_samples() {
                write!(writer, "\t{}", self.get(row, col))?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }
}

/// Assemble a taxa-by-sample matrix from a parsed record set, projecting one
/// field out of each retained observation.
///
/// Columns are the full sample universe sorted ascending; candidate rows are
/// the full taxon universe sorted ascending, membership-tested against the
/// retained observation set and filled with zeros where absent. Rows whose
/// projected values are zero across every sample are dropped, so taxa that
/// only ever existed as below-threshold rows never reach the output.
pub fn assemble<N, F>(reports: &ParsedReports, project: F) -> Result<TaxaMatrix<N>>
where
    N: Copy + PartialEq + Zero,
    F: Fn(&Observation) -> N,
{
    let mut taxa = reports.taxon_ids().to_vec();
    taxa.sort();
    let mut samples = reports.sample_ids().to_vec();
    samples.sort();

    let mut kept_taxa: Vec<String> = Vec::new();
    let mut triplets: Vec<(usize, usize, N)> = Vec::new();

    for taxon in &taxa {
        let row_values: Vec<(usize, N)> = samples
            .iter()
            .enumerate()
            .filter_map(|(col, sample)| {
                reports
                    .observation(sample, taxon)
                    .map(|obs| (col, project(obs)))
            })
            .filter(|(_, value)| *value != N::zero())
            .collect();

        if row_values.is_empty() {
            continue;
        }
        let row = kept_taxa.len();
        kept_taxa.push(taxon.clone());
        for (col, value) in row_values {
            triplets.push((row, col, value));
        }
    }

    let mut tri_mat = TriMat::new((kept_taxa.len(), samples.len()));
    for (row, col, value) in triplets {
        tri_mat.add_triplet(row, col, value);
    }
    let data: CsMat<N> = tri_mat.to_csr();

    TaxaMatrix::new(data, kept_taxa, samples)
}

/// Build the relative-abundance matrix.
pub fn abundance_matrix(reports: &ParsedReports) -> Result<TaxaMatrix<f64>> {
    assemble(reports, |obs| obs.rel_abundance)
}

/// Build the parallel read-count matrix.
pub fn reads_matrix(reports: &ParsedReports) -> Result<TaxaMatrix<u64>> {
    assemble(reports, |obs| obs.reads)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(reads: u64, rel_abundance: f64) -> Observation {
        Observation {
            reads,
            rel_abundance,
        }
    }

    /// Two samples recorded out of order, three taxa, one of them never
    /// retained anywhere.
    fn create_test_reports() -> ParsedReports {
        let mut reports = ParsedReports::new();
        reports.record_sample("B");
        reports.record_sample("A");
        reports.record_taxon("Zymomonas");
        reports.record_taxon("Escherichia");
        reports.record_taxon("Yersinia");

        reports.insert("B", "Zymomonas", obs(30, 0.3));
        reports.insert("B", "Escherichia", obs(20, 0.2));
        reports.insert("A", "Escherichia", obs(50, 0.5));
        // Yersinia stays in the universe with no retained observation.
        reports
    }

    #[test]
    fn test_rows_and_columns_sorted() {
        let reports = create_test_reports();
        let matrix = abundance_matrix(&reports).unwrap();

        assert_eq!(matrix.sample_ids(), &["A", "B"]);
        assert_eq!(matrix.taxon_ids(), &["Escherichia", "Zymomonas"]);
    }

    #[test]
    fn test_zero_fill_for_absent_cells() {
        let reports = create_test_reports();
        let matrix = abundance_matrix(&reports).unwrap();

        assert_eq!(matrix.get(0, 0), 0.5); // (Escherichia, A)
        assert_eq!(matrix.get(0, 1), 0.2); // (Escherichia, B)
        assert_eq!(matrix.get(1, 0), 0.0); // (Zymomonas, A) absent
        assert_eq!(matrix.get(1, 1), 0.3); // (Zymomonas, B)
        assert_eq!(matrix.row_dense(1), vec![0.0, 0.3]);
    }

    #[test]
    fn test_all_zero_row_dropped() {
        let reports = create_test_reports();
        let matrix = abundance_matrix(&reports).unwrap();

        assert!(!matrix.taxon_ids().contains(&"Yersinia".to_string()));
        for row in 0..matrix.n_taxa() {
            assert!(
                matrix.row_dense(row).iter().any(|&v| v != 0.0),
                "row {} is all zeros",
                row
            );
        }
    }

    #[test]
    fn test_column_bijection_with_sample_universe() {
        let reports = create_test_reports();
        let matrix = abundance_matrix(&reports).unwrap();

        // Every sample has exactly one column even if a column ends up all
        // zeros elsewhere.
        assert_eq!(matrix.n_samples(), reports.n_samples());
        let mut expected = reports.sample_ids().to_vec();
        expected.sort();
        assert_eq!(matrix.sample_ids(), expected.as_slice());
    }

    #[test]
    fn test_reads_matrix_parallel_structure() {
        let reports = create_test_reports();
        let matrix = reads_matrix(&reports).unwrap();

        assert_eq!(matrix.taxon_ids(), &["Escherichia", "Zymomonas"]);
        assert_eq!(matrix.get(0, 0), 50);
        assert_eq!(matrix.get(0, 1), 20);
        assert_eq!(matrix.get(1, 0), 0);
        assert_eq!(matrix.get(1, 1), 30);
    }

    #[test]
    fn test_reads_matrix_drops_zero_rows_independently() {
        let mut reports = ParsedReports::new();
        reports.record_sample("A");
        reports.record_taxon("Escherichia");
        reports.record_taxon("Phantom");
        reports.insert("A", "Escherichia", obs(100, 0.5));
        // Retained by abundance, but with zero assigned reads.
        reports.insert("A", "Phantom", obs(0, 0.2));

        let relab = abundance_matrix(&reports).unwrap();
        let reads = reads_matrix(&reports).unwrap();

        assert_eq!(relab.taxon_ids(), &["Escherichia", "Phantom"]);
        assert_eq!(reads.taxon_ids(), &["Escherichia"]);
    }

    #[test]
    fn test_empty_reports_yield_empty_matrix() {
        let reports = ParsedReports::new();
        let matrix = abundance_matrix(&reports).unwrap();
        assert_eq!(matrix.n_taxa(), 0);
        assert_eq!(matrix.n_samples(), 0);
        assert_eq!(matrix.nnz(), 0);
    }

    #[test]
    fn test_sample_with_no_observations_keeps_column() {
        let mut reports = ParsedReports::new();
        reports.record_sample("A");
        reports.record_sample("B");
        reports.record_taxon("Escherichia");
        reports.insert("A", "Escherichia", obs(10, 0.4));

        let matrix = abundance_matrix(&reports).unwrap();
        assert_eq!(matrix.sample_ids(), &["A", "B"]);
        assert_eq!(matrix.get(0, 1), 0.0);
    }

    #[test]
    fn test_to_tsv_dense_output() {
        let reports = create_test_reports();
        let matrix = abundance_matrix(&reports).unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("relab_matrix.tsv");
        matrix.to_tsv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "\tA\tB\nEscherichia\t0.5\t0.2\nZymomonas\t0\t0.3\n"
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let tri_mat: TriMat<f64> = TriMat::new((2, 1));
        let result = TaxaMatrix::new(
            tri_mat.to_csr(),
            vec!["only_one".to_string()],
            vec!["A".to_string()],
        );
        assert!(matches!(
            result,
            Err(BrackenError::DimensionMismatch { .. })
        ));
    }
}
