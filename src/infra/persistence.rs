//! # Matrix Persistence Module / 矩阵持久化模块
//!
//! Serializes the accumulated matrices. [`JsonMatrixStore`] writes each matrix
//! as a JSON document next to its destination first and then renames it into
//! place, so a failed run never leaves a half-written matrix behind.
//!
//! 序列化累积的矩阵。[`JsonMatrixStore`] 先在目标位置旁写入 JSON 文档，
//! 再将其重命名到目标位置，因此失败的运行不会留下写了一半的矩阵。

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::core::matrix::{CoverageMatrix, ResultsMatrix};
use crate::core::models::Outcome;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to serialize matrix: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Destination for the accumulated matrices.
/// 累积矩阵的存储目标。
pub trait MatrixStore {
    fn save_coverage(&self, matrix: &CoverageMatrix, destination: &Path) -> Result<(), PersistError>;
    fn save_results(&self, matrix: &ResultsMatrix, destination: &Path) -> Result<(), PersistError>;
}

/// On-disk form of the coverage matrix. `relations[i]` lists the column
/// indices covered by `test_cases[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageDocument {
    pub test_cases: Vec<String>,
    pub code_elements: Vec<String>,
    pub relations: Vec<Vec<usize>>,
}

impl From<&CoverageMatrix> for CoverageDocument {
    fn from(matrix: &CoverageMatrix) -> Self {
        Self {
            test_cases: matrix.test_cases().to_vec(),
            code_elements: matrix.code_elements().to_vec(),
            relations: (0..matrix.test_cases().len())
                .map(|row| matrix.covered_indices(row))
                .collect(),
        }
    }
}

/// On-disk form of the results matrix. `results[i][j]` is the outcome of
/// `test_cases[i]` at `revisions[j]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub test_cases: Vec<String>,
    pub revisions: Vec<u32>,
    pub results: Vec<Vec<Outcome>>,
}

impl From<&ResultsMatrix> for ResultsDocument {
    fn from(matrix: &ResultsMatrix) -> Self {
        Self {
            test_cases: matrix.test_cases().to_vec(),
            revisions: matrix.revisions().to_vec(),
            results: (0..matrix.test_cases().len())
                .map(|row| matrix.row(row).to_vec())
                .collect(),
        }
    }
}

/// [`MatrixStore`] writing JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMatrixStore {
    pretty: bool,
}

impl JsonMatrixStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn load_coverage(path: &Path) -> Result<CoverageDocument, PersistError> {
        read_document(path)
    }

    pub fn load_results(path: &Path) -> Result<ResultsDocument, PersistError> {
        read_document(path)
    }

    fn write_document<T: Serialize>(&self, document: &T, destination: &Path) -> Result<(), PersistError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(document)?
        } else {
            serde_json::to_vec(document)?
        };
        write_atomically(destination, &bytes).map_err(|source| PersistError::Write {
            path: destination.to_path_buf(),
            source,
        })
    }
}

impl MatrixStore for JsonMatrixStore {
    fn save_coverage(&self, matrix: &CoverageMatrix, destination: &Path) -> Result<(), PersistError> {
        self.write_document(&CoverageDocument::from(matrix), destination)
    }

    fn save_results(&self, matrix: &ResultsMatrix, destination: &Path) -> Result<(), PersistError> {
        self.write_document(&ResultsDocument::from(matrix), destination)
    }
}

fn read_document<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, PersistError> {
    let content = fs::read(path).map_err(|source| PersistError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&content)?)
}

fn write_atomically(destination: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(destination).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn documents_reflect_matrix_contents() {
        let mut coverage = CoverageMatrix::new();
        coverage.add_test_case("t1");
        coverage.add_test_case("t2");
        coverage.add_code_element("a");
        coverage.add_code_element("b");
        coverage.refit();
        coverage.set_relation("t1", "b", true).unwrap();
        coverage.set_relation("t2", "a", true).unwrap();
        coverage.set_relation("t2", "b", true).unwrap();

        let doc = CoverageDocument::from(&coverage);
        assert_eq!(doc.relations, vec![vec![1], vec![0, 1]]);

        let mut results = ResultsMatrix::new();
        results.add_revision(0);
        results.add_test_case("t1");
        results.refit();
        results.set_result(0, "t1", Outcome::Passed).unwrap();
        let doc = ResultsDocument::from(&results);
        assert_eq!(doc.results, vec![vec![Outcome::Passed]]);
    }

    #[test]
    fn saved_documents_can_be_loaded_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("coverage.json");

        let mut coverage = CoverageMatrix::new();
        coverage.add_test_case("t1");
        coverage.add_code_element("a");
        coverage.refit();
        coverage.set_relation("t1", "a", true).unwrap();

        JsonMatrixStore::new()
            .pretty(true)
            .save_coverage(&coverage, &path)
            .unwrap();
        let loaded = JsonMatrixStore::load_coverage(&path).unwrap();
        assert_eq!(loaded, CoverageDocument::from(&coverage));
    }
}
