//! # Granularity Projection Module / 粒度投影模块
//!
//! Flattens a [`BundleCoverage`] into the ordered list of covered code-element
//! identifiers for one [`Granularity`]. The list keeps the tree's native order
//! and is not deduplicated; the matrix registers columns idempotently.
//!
//! 将 [`BundleCoverage`] 展平为某一 [`Granularity`] 下已覆盖代码元素标识符的有序列表。
//! 列表保持树的原生顺序且不去重；矩阵以幂等方式注册列。

use crate::core::coverage::{BundleCoverage, ClassCoverage, PackageCoverage};
use crate::core::models::Granularity;

const PATH_SEPARATOR: char = '.';
const LINE_INFO_SEPARATOR: char = '-';

/// Projects the coverage tree down to covered code-element identifiers.
///
/// - package: the package name, if its aggregate class counter is covered
/// - class: the class name, if its class counter is covered
/// - method: `<class>.<method><desc>`, if the method counter is covered; every
///   class is visited regardless of its own status
/// - line: `<package>.<file>-<n>` for each covered line `n` in `1..=last_line`
pub fn project(bundle: &BundleCoverage, granularity: Granularity) -> Vec<String> {
    let mut elements = Vec::new();

    for package in &bundle.packages {
        match granularity {
            Granularity::Package => {
                if package.class_counter().status().is_covered() {
                    elements.push(package.name.clone());
                }
            }
            Granularity::Class => project_classes(package, &mut elements),
            Granularity::Method => {
                for class in &package.classes {
                    project_methods(class, &mut elements);
                }
            }
            Granularity::Line => project_lines(package, &mut elements),
        }
    }

    elements
}

fn project_classes(package: &PackageCoverage, elements: &mut Vec<String>) {
    elements.extend(
        package
            .classes
            .iter()
            .filter(|class| class.class_counter.status().is_covered())
            .map(|class| class.name.clone()),
    );
}

fn project_methods(class: &ClassCoverage, elements: &mut Vec<String>) {
    elements.extend(
        class
            .methods
            .iter()
            .filter(|method| method.method_counter.status().is_covered())
            .map(|method| {
                format!(
                    "{}{}{}{}",
                    class.name, PATH_SEPARATOR, method.name, method.desc
                )
            }),
    );
}

fn project_lines(package: &PackageCoverage, elements: &mut Vec<String>) {
    for file in &package.source_files {
        for line in 1..=file.last_line() {
            if file.line(line).status().is_covered() {
                elements.push(format!(
                    "{}{}{}{}{}",
                    file.package_name, PATH_SEPARATOR, file.name, LINE_INFO_SEPARATOR, line
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coverage::{Counter, MethodCoverage, SourceFileCoverage};

    fn method(name: &str, counter: Counter) -> MethodCoverage {
        MethodCoverage {
            name: name.into(),
            desc: "()V".into(),
            method_counter: counter,
        }
    }

    #[test]
    fn method_projection_visits_uncovered_classes() {
        // A class counter can lag behind its methods in a hand-built tree; the
        // method status alone decides.
        let bundle = BundleCoverage {
            name: "t".into(),
            packages: vec![PackageCoverage {
                name: "p".into(),
                classes: vec![ClassCoverage {
                    name: "p/A".into(),
                    class_counter: Counter::MISSED_ONE,
                    methods: vec![
                        method("run", Counter::COVERED_ONE),
                        method("stop", Counter::MISSED_ONE),
                    ],
                }],
                source_files: vec![],
            }],
        };

        assert_eq!(project(&bundle, Granularity::Method), vec!["p/A.run()V"]);
        assert!(project(&bundle, Granularity::Class).is_empty());
    }

    #[test]
    fn empty_bundle_projects_to_nothing() {
        let bundle = BundleCoverage::default();
        for granularity in Granularity::ALL {
            assert!(project(&bundle, granularity).is_empty());
        }
    }

    #[test]
    fn line_projection_skips_empty_lines() {
        let mut file = SourceFileCoverage::new("A.java", "p");
        file.increment_line(3, Counter::new(0, 1));
        file.increment_line(4, Counter::new(2, 0));
        file.increment_line(6, Counter::new(1, 1));

        let bundle = BundleCoverage {
            name: "t".into(),
            packages: vec![PackageCoverage {
                name: "p".into(),
                classes: vec![],
                source_files: vec![file],
            }],
        };

        assert_eq!(
            project(&bundle, Granularity::Line),
            vec!["p.A.java-3", "p.A.java-6"]
        );
    }
}
