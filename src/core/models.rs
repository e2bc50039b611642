//! # Data Models Module / 数据模型模块
//!
//! This module defines the data structures shared across the pipeline: the
//! reporting granularity, test outcomes, the raw records produced by an
//! execution data source, and the overview handed to the reporters.
//!
//! 此模块定义了整个管道共享的数据结构：报告粒度、测试结果、
//! 执行数据源产生的原始记录，以及交给报告器的概览。

use crate::infra::t;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The level at which covered code elements are reported.
/// 报告已覆盖代码元素的级别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Granularity {
    /// One element per covered source line: `<package>.<file>-<line>`.
    /// 每个已覆盖的源代码行对应一个元素：`<package>.<file>-<line>`。
    Line,
    /// One element per covered method: `<class>.<method><descriptor>`.
    /// 每个已覆盖的方法对应一个元素：`<class>.<method><descriptor>`。
    Method,
    /// One element per covered class.
    /// 每个已覆盖的类对应一个元素。
    Class,
    /// One element per package with at least one covered class.
    /// 每个至少包含一个已覆盖类的包对应一个元素。
    Package,
}

impl Granularity {
    /// All granularities, coarsest first.
    pub const ALL: [Granularity; 4] = [
        Granularity::Package,
        Granularity::Class,
        Granularity::Method,
        Granularity::Line,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Line => "line",
            Granularity::Method => "method",
            Granularity::Class => "class",
            Granularity::Package => "package",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a granularity name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid granularity: {0}. Valid granularities are: package, class, method, line")]
pub struct ParseGranularityError(pub String);

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Granularity::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseGranularityError(s.to_string()))
    }
}

impl TryFrom<String> for Granularity {
    type Error = ParseGranularityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The outcome of a single test case, as encoded in its session identifier.
/// 单个测试用例的结果，编码在其会话标识符中。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    /// The session identifier ends with `PASS`.
    /// 会话标识符以 `PASS` 结尾。
    Passed,
    /// The session identifier ends with `FAIL`.
    /// 会话标识符以 `FAIL` 结尾。
    Failed,
    /// Any other suffix, and the value of every cell that was never set.
    /// 任何其他后缀，以及从未设置过的单元格的值。
    #[default]
    NotExecuted,
}

impl Outcome {
    /// Gets the localized status label for display.
    /// 获取用于显示的本地化状态标签。
    pub fn get_status_str(&self, locale: &str) -> String {
        match self {
            Outcome::Passed => t!("report.status_passed", locale = locale).to_string(),
            Outcome::Failed => t!("report.status_failed", locale = locale).to_string(),
            Outcome::NotExecuted => t!("report.status_not_executed", locale = locale).to_string(),
        }
    }

    /// Gets the CSS class used by the HTML report.
    pub fn get_status_class(&self) -> &'static str {
        match self {
            Outcome::Passed => "status-Passed",
            Outcome::Failed => "status-Failed",
            Outcome::NotExecuted => "status-NotExecuted",
        }
    }
}

/// A session boundary announced by an execution data source.
/// 由执行数据源宣告的会话边界。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// The session identifier, conventionally `<test case>_<PASS|FAIL>`.
    /// 会话标识符，按惯例为 `<test case>_<PASS|FAIL>`。
    pub id: String,
    /// Epoch milliseconds at which the session started.
    /// 会话开始时的纪元毫秒数。
    pub start: i64,
    /// Epoch milliseconds at which the session was dumped.
    /// 会话被转储时的纪元毫秒数。
    pub dump: i64,
}

impl SessionInfo {
    pub fn new(id: impl Into<String>, start: i64, dump: i64) -> Self {
        Self {
            id: id.into(),
            start,
            dump,
        }
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.start).single()
    }

    pub fn dump_time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.dump).single()
    }
}

/// Probe hits recorded for one class.
/// 为一个类记录的探针命中情况。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionData {
    /// The class id, a checksum of the class definition.
    /// 类 id，即类定义的校验和。
    pub id: u64,
    /// The VM name of the class, e.g. `com/acme/Foo`.
    /// 类的 VM 名称，例如 `com/acme/Foo`。
    pub name: String,
    /// One flag per probe, `true` if the probe was executed.
    /// 每个探针一个标志，如果探针被执行则为 `true`。
    pub probes: Vec<bool>,
}

impl ExecutionData {
    pub fn new(id: u64, name: impl Into<String>, probes: Vec<bool>) -> Self {
        Self {
            id,
            name: name.into(),
            probes,
        }
    }

    /// Number of probes that were hit.
    pub fn hit_count(&self) -> usize {
        self.probes.iter().filter(|p| **p).count()
    }
}

/// Per-test-case line of the run overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCaseOverview {
    pub name: String,
    pub outcome: Outcome,
    pub covered_elements: usize,
}

/// A snapshot of the accumulated matrices, taken before they are persisted.
/// 累积矩阵的快照，在持久化之前获取。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixOverview {
    pub granularity: Granularity,
    pub code_elements: usize,
    pub test_cases: Vec<TestCaseOverview>,
}

impl MatrixOverview {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.test_cases
            .iter()
            .filter(|case| case.outcome == outcome)
            .count()
    }
}
