//! # Matrix Module / 矩阵模块
//!
//! Growable, name-addressed matrices. Rows and columns are registered by name
//! in first-seen order and never removed. Registration only assigns an index;
//! the cell storage follows on [`CoverageMatrix::refit`] /
//! [`ResultsMatrix::refit`], and writing a cell outside the fitted storage is
//! an error.
//!
//! 可增长的、按名称寻址的矩阵。行和列按首次出现的顺序按名称注册，且永不删除。
//! 注册只分配索引；单元格存储在调用 refit 后才会扩展，
//! 在已适配存储之外写入单元格会返回错误。

use crate::core::models::Outcome;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    #[error("unknown test case: {0}")]
    UnknownTestCase(String),
    #[error("unknown code element: {0}")]
    UnknownCodeElement(String),
    #[error("unknown revision: {0}")]
    UnknownRevision(u32),
    #[error("cell ({row}, {column}) lies outside the fitted matrix")]
    OutOfBounds { row: usize, column: usize },
    #[error("session id {0:?} is shorter than its outcome tag")]
    MalformedSessionId(String),
}

/// Names of one matrix dimension with their assigned indices.
#[derive(Debug, Clone)]
struct Axis<K> {
    names: Vec<K>,
    index: HashMap<K, usize>,
}

impl<K> Default for Axis<K> {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone> Axis<K> {
    /// Returns the index of `key`, registering it at the end if it is new.
    fn insert(&mut self, key: K) -> usize {
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.names.len();
        self.names.push(key.clone());
        self.index.insert(key, i);
        i
    }

    fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).copied()
    }

    fn len(&self) -> usize {
        self.names.len()
    }
}

/// Boolean relation between test cases (rows) and code elements (columns).
#[derive(Debug, Clone, Default)]
pub struct CoverageMatrix {
    test_cases: Axis<String>,
    code_elements: Axis<String>,
    cells: Vec<Vec<bool>>,
}

impl CoverageMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a row; idempotent. Returns the row index.
    pub fn add_test_case(&mut self, name: &str) -> usize {
        self.test_cases.insert(name.to_string())
    }

    /// Registers a column; idempotent. Returns the column index.
    pub fn add_code_element(&mut self, name: &str) -> usize {
        self.code_elements.insert(name.to_string())
    }

    /// Grows the cell storage to cover every registered row and column.
    pub fn refit(&mut self) {
        let columns = self.code_elements.len();
        self.cells.resize_with(self.test_cases.len(), Vec::new);
        for row in &mut self.cells {
            row.resize(columns, false);
        }
    }

    /// `true` when every registered row and column has storage.
    pub fn is_fitted(&self) -> bool {
        self.cells.len() == self.test_cases.len()
            && self
                .cells
                .iter()
                .all(|row| row.len() == self.code_elements.len())
    }

    pub fn set_relation(
        &mut self,
        test_case: &str,
        code_element: &str,
        covered: bool,
    ) -> Result<(), MatrixError> {
        let row = self
            .test_cases
            .position(test_case)
            .ok_or_else(|| MatrixError::UnknownTestCase(test_case.to_string()))?;
        let column = self
            .code_elements
            .position(code_element)
            .ok_or_else(|| MatrixError::UnknownCodeElement(code_element.to_string()))?;
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or(MatrixError::OutOfBounds { row, column })?;
        *cell = covered;
        Ok(())
    }

    /// The relation cell; unknown names and unfitted cells read as `false`.
    pub fn relation(&self, test_case: &str, code_element: &str) -> bool {
        let (Some(row), Some(column)) = (
            self.test_cases.position(test_case),
            self.code_elements.position(code_element),
        ) else {
            return false;
        };
        self.cells
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(false)
    }

    pub fn test_cases(&self) -> &[String] {
        &self.test_cases.names
    }

    pub fn code_elements(&self) -> &[String] {
        &self.code_elements.names
    }

    /// Column indices set to `true` in the given row.
    pub fn covered_indices(&self, row: usize) -> Vec<usize> {
        self.cells
            .get(row)
            .map(|cells| {
                cells
                    .iter()
                    .enumerate()
                    .filter_map(|(i, covered)| covered.then_some(i))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Code elements covered by the given test case, in column order.
    pub fn covered_elements(&self, test_case: &str) -> Vec<&str> {
        self.test_cases
            .position(test_case)
            .map(|row| {
                self.covered_indices(row)
                    .into_iter()
                    .map(|i| self.code_elements.names[i].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Outcome per test case (rows) and revision (columns).
#[derive(Debug, Clone, Default)]
pub struct ResultsMatrix {
    test_cases: Axis<String>,
    revisions: Axis<u32>,
    cells: Vec<Vec<Outcome>>,
}

impl ResultsMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_test_case(&mut self, name: &str) -> usize {
        self.test_cases.insert(name.to_string())
    }

    pub fn add_revision(&mut self, revision: u32) -> usize {
        self.revisions.insert(revision)
    }

    /// Grows the cell storage; new cells read as [`Outcome::NotExecuted`].
    pub fn refit(&mut self) {
        let columns = self.revisions.len();
        self.cells.resize_with(self.test_cases.len(), Vec::new);
        for row in &mut self.cells {
            row.resize(columns, Outcome::NotExecuted);
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.cells.len() == self.test_cases.len()
            && self
                .cells
                .iter()
                .all(|row| row.len() == self.revisions.len())
    }

    pub fn set_result(
        &mut self,
        revision: u32,
        test_case: &str,
        outcome: Outcome,
    ) -> Result<(), MatrixError> {
        let row = self
            .test_cases
            .position(test_case)
            .ok_or_else(|| MatrixError::UnknownTestCase(test_case.to_string()))?;
        let column = self
            .revisions
            .position(&revision)
            .ok_or(MatrixError::UnknownRevision(revision))?;
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or(MatrixError::OutOfBounds { row, column })?;
        *cell = outcome;
        Ok(())
    }

    /// The stored outcome, or `None` for unknown names and unfitted cells.
    pub fn result(&self, revision: u32, test_case: &str) -> Option<Outcome> {
        let row = self.test_cases.position(test_case)?;
        let column = self.revisions.position(&revision)?;
        self.cells.get(row)?.get(column).copied()
    }

    pub fn test_cases(&self) -> &[String] {
        &self.test_cases.names
    }

    pub fn revisions(&self) -> &[u32] {
        &self.revisions.names
    }

    /// The full row of outcomes for the test case at `row`, one per revision.
    pub fn row(&self, row: usize) -> &[Outcome] {
        self.cells.get(row).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent_and_ordered() {
        let mut matrix = CoverageMatrix::new();
        assert_eq!(matrix.add_test_case("t1"), 0);
        assert_eq!(matrix.add_test_case("t2"), 1);
        assert_eq!(matrix.add_test_case("t1"), 0);
        assert_eq!(matrix.add_code_element("b"), 0);
        assert_eq!(matrix.add_code_element("a"), 1);
        assert_eq!(matrix.add_code_element("b"), 0);

        assert_eq!(matrix.test_cases(), ["t1", "t2"]);
        assert_eq!(matrix.code_elements(), ["b", "a"]);
    }

    #[test]
    fn writes_before_refit_are_out_of_bounds() {
        let mut matrix = CoverageMatrix::new();
        matrix.add_test_case("t1");
        matrix.add_code_element("e");
        assert!(!matrix.is_fitted());
        assert_eq!(
            matrix.set_relation("t1", "e", true),
            Err(MatrixError::OutOfBounds { row: 0, column: 0 })
        );

        matrix.refit();
        assert!(matrix.is_fitted());
        matrix.set_relation("t1", "e", true).unwrap();
        assert!(matrix.relation("t1", "e"));
    }

    #[test]
    fn unknown_names_are_reported() {
        let mut matrix = CoverageMatrix::new();
        matrix.add_test_case("t1");
        matrix.refit();
        assert_eq!(
            matrix.set_relation("t1", "nope", true),
            Err(MatrixError::UnknownCodeElement("nope".into()))
        );
        assert_eq!(
            matrix.set_relation("nope", "e", true),
            Err(MatrixError::UnknownTestCase("nope".into()))
        );
        assert!(!matrix.relation("nope", "e"));
    }

    #[test]
    fn refit_preserves_existing_cells() {
        let mut matrix = CoverageMatrix::new();
        matrix.add_test_case("t1");
        matrix.add_code_element("e1");
        matrix.refit();
        matrix.set_relation("t1", "e1", true).unwrap();

        matrix.add_test_case("t2");
        matrix.add_code_element("e2");
        matrix.refit();

        assert!(matrix.relation("t1", "e1"));
        assert!(!matrix.relation("t1", "e2"));
        assert!(!matrix.relation("t2", "e1"));
        assert_eq!(matrix.covered_elements("t1"), vec!["e1"]);
    }

    #[test]
    fn results_default_to_not_executed() {
        let mut results = ResultsMatrix::new();
        results.add_revision(0);
        results.add_test_case("t1");
        assert_eq!(results.result(0, "t1"), None);

        results.refit();
        assert_eq!(results.result(0, "t1"), Some(Outcome::NotExecuted));

        results.set_result(0, "t1", Outcome::Failed).unwrap();
        assert_eq!(results.result(0, "t1"), Some(Outcome::Failed));
        assert_eq!(
            results.set_result(3, "t1", Outcome::Passed),
            Err(MatrixError::UnknownRevision(3))
        );
    }
}
