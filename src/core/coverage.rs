//! # Coverage Tree Module / 覆盖树模块
//!
//! The read-only, already-computed coverage tree handed to the granularity
//! projector: bundle → package → class → method, plus per-package source files
//! with per-line counters. Every node carries a [`Counter`] whose
//! [`CoverageStatus`] decides whether the node counts as covered.
//!
//! 交给粒度投影器的只读、已计算好的覆盖树：bundle → package → class → method，
//! 以及每个包的源文件和逐行计数器。每个节点都带有一个 [`Counter`]，
//! 其 [`CoverageStatus`] 决定该节点是否算作已覆盖。

use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Add;

/// Coverage status of a node, derived from its counter.
/// 节点的覆盖状态，由其计数器推导而来。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CoverageStatus {
    /// The node contains no countable items (e.g. a line without code).
    /// 节点不包含可计数项（例如没有代码的行）。
    Empty,
    /// None of the items were executed.
    /// 没有任何项被执行。
    NotCovered,
    /// All items were executed.
    /// 所有项都被执行。
    FullyCovered,
    /// Some, but not all, items were executed.
    /// 部分项被执行。
    PartlyCovered,
}

impl CoverageStatus {
    /// `true` for fully and partly covered nodes.
    pub fn is_covered(self) -> bool {
        matches!(self, CoverageStatus::FullyCovered | CoverageStatus::PartlyCovered)
    }
}

/// Missed/covered item counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counter {
    pub missed: u32,
    pub covered: u32,
}

impl Counter {
    pub const EMPTY: Counter = Counter::new(0, 0);
    pub const MISSED_ONE: Counter = Counter::new(1, 0);
    pub const COVERED_ONE: Counter = Counter::new(0, 1);

    pub const fn new(missed: u32, covered: u32) -> Self {
        Self { missed, covered }
    }

    pub fn status(&self) -> CoverageStatus {
        match (self.missed, self.covered) {
            (0, 0) => CoverageStatus::Empty,
            (_, 0) => CoverageStatus::NotCovered,
            (0, _) => CoverageStatus::FullyCovered,
            _ => CoverageStatus::PartlyCovered,
        }
    }
}

impl Add for Counter {
    type Output = Counter;

    fn add(self, rhs: Counter) -> Counter {
        Counter::new(self.missed + rhs.missed, self.covered + rhs.covered)
    }
}

impl std::iter::Sum for Counter {
    fn sum<I: Iterator<Item = Counter>>(iter: I) -> Counter {
        iter.fold(Counter::EMPTY, Add::add)
    }
}

/// Coverage of one analysis run, named after the session it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BundleCoverage {
    pub name: String,
    pub packages: Vec<PackageCoverage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageCoverage {
    pub name: String,
    pub classes: Vec<ClassCoverage>,
    pub source_files: Vec<SourceFileCoverage>,
}

impl PackageCoverage {
    /// Aggregate of the class counters of every class in the package.
    /// 包中所有类的类计数器之和。
    pub fn class_counter(&self) -> Counter {
        self.classes.iter().map(|class| class.class_counter).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassCoverage {
    /// The VM name of the class, e.g. `com/acme/Foo`.
    pub name: String,
    /// One item: covered if any method of the class was executed.
    pub class_counter: Counter,
    pub methods: Vec<MethodCoverage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodCoverage {
    pub name: String,
    /// The JVM method descriptor, e.g. `(I)V`.
    pub desc: String,
    /// One item: covered if any probe of the method was executed.
    pub method_counter: Counter,
}

/// Line counters of one source file. Lines are 1-based; lines that carry no
/// code report [`Counter::EMPTY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceFileCoverage {
    pub name: String,
    pub package_name: String,
    lines: BTreeMap<u32, Counter>,
}

impl SourceFileCoverage {
    pub fn new(name: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_name: package_name.into(),
            lines: BTreeMap::new(),
        }
    }

    /// Adds `counter` to the given line. Line `0` means "unknown" and is ignored.
    pub fn increment_line(&mut self, line: u32, counter: Counter) {
        if line == 0 {
            return;
        }
        let entry = self.lines.entry(line).or_default();
        *entry = *entry + counter;
    }

    /// The last line carrying a counter, or `0` for a file without lines.
    pub fn last_line(&self) -> u32 {
        self.lines.keys().next_back().copied().unwrap_or(0)
    }

    pub fn line(&self, line: u32) -> Counter {
        self.lines.get(&line).copied().unwrap_or(Counter::EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_status_follows_missed_and_covered() {
        assert_eq!(Counter::new(0, 0).status(), CoverageStatus::Empty);
        assert_eq!(Counter::new(3, 0).status(), CoverageStatus::NotCovered);
        assert_eq!(Counter::new(0, 2).status(), CoverageStatus::FullyCovered);
        assert_eq!(Counter::new(1, 2).status(), CoverageStatus::PartlyCovered);
    }

    #[test]
    fn only_fully_and_partly_covered_count_as_covered() {
        assert!(CoverageStatus::FullyCovered.is_covered());
        assert!(CoverageStatus::PartlyCovered.is_covered());
        assert!(!CoverageStatus::NotCovered.is_covered());
        assert!(!CoverageStatus::Empty.is_covered());
    }

    #[test]
    fn package_class_counter_sums_classes() {
        let package = PackageCoverage {
            name: "com/acme".into(),
            classes: vec![
                ClassCoverage {
                    name: "com/acme/A".into(),
                    class_counter: Counter::COVERED_ONE,
                    methods: vec![],
                },
                ClassCoverage {
                    name: "com/acme/B".into(),
                    class_counter: Counter::MISSED_ONE,
                    methods: vec![],
                },
            ],
            source_files: vec![],
        };
        assert_eq!(package.class_counter(), Counter::new(1, 1));
        assert_eq!(package.class_counter().status(), CoverageStatus::PartlyCovered);
    }

    #[test]
    fn source_file_lines_merge_and_bound() {
        let mut file = SourceFileCoverage::new("Foo.java", "com/acme");
        assert_eq!(file.last_line(), 0);

        file.increment_line(12, Counter::new(1, 0));
        file.increment_line(5, Counter::new(0, 1));
        file.increment_line(12, Counter::new(0, 1));
        file.increment_line(0, Counter::new(0, 9));

        assert_eq!(file.last_line(), 12);
        assert_eq!(file.line(12), Counter::new(1, 1));
        assert_eq!(file.line(7), Counter::EMPTY);
        assert_eq!(file.line(0), Counter::EMPTY);
    }
}
