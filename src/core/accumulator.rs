//! # Matrix Accumulator Module / 矩阵累加器模块
//!
//! Folds each session into the coverage and results matrices. The accumulator
//! is created once per run, borrowed mutably by the pipeline for every project,
//! and consumed exactly once by [`MatrixAccumulator::persist`].
//!
//! 将每个会话折叠进覆盖矩阵和结果矩阵。累加器在每次运行时创建一次，
//! 由管道在处理每个项目时可变借用，并由 [`MatrixAccumulator::persist`] 恰好消费一次。

use std::path::Path;

use crate::core::matrix::{CoverageMatrix, MatrixError, ResultsMatrix};
use crate::core::models::{Granularity, MatrixOverview, Outcome, TestCaseOverview};
use crate::infra::persistence::{MatrixStore, PersistError};

/// Characters stripped from a session id to recover the test-case name:
/// a one-character separator followed by a four-letter outcome tag.
/// 从会话 id 中剥离以恢复测试用例名称的字符数：一个分隔符加上四个字母的结果标签。
pub const OUTCOME_TAG_LEN: usize = 5;

/// The only revision this tool records results for.
pub const REVISION: u32 = 0;

const PASS_TAG: &str = "PASS";
const FAIL_TAG: &str = "FAIL";

/// Drops the trailing outcome tag (exactly [`OUTCOME_TAG_LEN`] characters)
/// from a session id. Ids shorter than the tag are rejected.
///
/// 从会话 id 中去掉末尾的结果标签（恰好 [`OUTCOME_TAG_LEN`] 个字符）。
/// 短于标签长度的 id 会被拒绝。
///
/// ```
/// use coverage_matrix::accumulator::test_case_name;
/// assert_eq!(test_case_name("caseA_PASS").unwrap(), "caseA");
/// assert!(test_case_name("PASS").is_err());
/// ```
pub fn test_case_name(session_id: &str) -> Result<&str, MatrixError> {
    match session_id.char_indices().rev().nth(OUTCOME_TAG_LEN - 1) {
        Some((start, _)) => Ok(&session_id[..start]),
        None => Err(MatrixError::MalformedSessionId(session_id.to_string())),
    }
}

/// Reads the outcome from the session id's trailing tag.
/// 从会话 id 的末尾标签读取测试结果。
pub fn outcome_of(session_id: &str) -> Outcome {
    if session_id.ends_with(PASS_TAG) {
        Outcome::Passed
    } else if session_id.ends_with(FAIL_TAG) {
        Outcome::Failed
    } else {
        Outcome::NotExecuted
    }
}

/// The coverage and results matrices of one run.
#[derive(Debug, Clone)]
pub struct MatrixAccumulator {
    coverage: CoverageMatrix,
    results: ResultsMatrix,
}

impl Default for MatrixAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixAccumulator {
    pub fn new() -> Self {
        let mut results = ResultsMatrix::new();
        results.add_revision(REVISION);
        Self {
            coverage: CoverageMatrix::new(),
            results,
        }
    }

    /// Records one session: registers its test case and code elements, grows
    /// both matrices, then sets the outcome and every relation cell.
    ///
    /// Returns the test-case name the session was recorded under. An id
    /// shorter than [`OUTCOME_TAG_LEN`] fails before anything is registered.
    ///
    /// 记录一个会话：注册其测试用例和代码元素，扩展两个矩阵，
    /// 然后设置测试结果和所有关系单元格。
    pub fn accumulate<'a>(
        &mut self,
        session_id: &'a str,
        code_elements: &[String],
    ) -> Result<&'a str, MatrixError> {
        let test_case = test_case_name(session_id)?;
        self.coverage.add_test_case(test_case);
        self.results.add_test_case(test_case);

        for element in code_elements {
            self.coverage.add_code_element(element);
        }

        self.coverage.refit();
        self.results.refit();

        self.results
            .set_result(REVISION, test_case, outcome_of(session_id))?;
        for element in code_elements {
            self.coverage.set_relation(test_case, element, true)?;
        }

        Ok(test_case)
    }

    pub fn coverage(&self) -> &CoverageMatrix {
        &self.coverage
    }

    pub fn results(&self) -> &ResultsMatrix {
        &self.results
    }

    /// Summarizes the matrices for the reporters.
    pub fn overview(&self, granularity: Granularity) -> MatrixOverview {
        let test_cases = self
            .results
            .test_cases()
            .iter()
            .map(|name| TestCaseOverview {
                name: name.clone(),
                outcome: self.results.result(REVISION, name).unwrap_or_default(),
                covered_elements: self.coverage.covered_elements(name).len(),
            })
            .collect();

        MatrixOverview {
            granularity,
            code_elements: self.coverage.code_elements().len(),
            test_cases,
        }
    }

    /// Writes both matrices and releases them.
    /// 写出两个矩阵并释放它们。
    pub fn persist<S: MatrixStore + ?Sized>(
        self,
        store: &S,
        coverage_destination: &Path,
        results_destination: &Path,
    ) -> Result<(), PersistError> {
        store.save_coverage(&self.coverage, coverage_destination)?;
        store.save_results(&self.results, results_destination)?;
        Ok(())
    }
}
