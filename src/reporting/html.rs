//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders a standalone HTML report of the accumulated matrices:
//! outcome totals followed by one row per test case with its outcome and the
//! number of code elements it covers.
//!
//! 此模块渲染累积矩阵的独立 HTML 报告：先是结果总计，
//! 然后每个测试用例一行，包含其结果和覆盖的代码元素数量。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;

use crate::core::models::{MatrixOverview, Outcome};
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Renders the report markup.
/// 渲染报告标记。
pub fn render_html_report(overview: &MatrixOverview, locale: &str) -> Markup {
    let summary_items = [
        (
            overview.test_cases.len(),
            "",
            t!("html_report.summary.total", locale = locale),
        ),
        (
            overview.count(Outcome::Passed),
            "passed-text",
            t!("html_report.summary.passed", locale = locale),
        ),
        (
            overview.count(Outcome::Failed),
            "failed-text",
            t!("html_report.summary.failed", locale = locale),
        ),
        (
            overview.count(Outcome::NotExecuted),
            "skipped-text",
            t!("html_report.summary.not_executed", locale = locale),
        ),
    ];

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale)) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.main_header", locale = locale)) }
                p class="subtitle" {
                    (t!(
                        "html_report.subtitle",
                        locale = locale,
                        granularity = overview.granularity.as_str(),
                        count = overview.code_elements
                    ))
                }
                div class="summary-container" {
                    @for (count, css, label) in &summary_items {
                        div class="summary-item" {
                            span class={ "count " (css) } { (count) }
                            span class="label" { (label) }
                        }
                    }
                }
                table {
                    thead {
                        tr {
                            th { (t!("html_report.table.header.name", locale = locale)) }
                            th { (t!("html_report.table.header.status", locale = locale)) }
                            th class="count-col" { (t!("html_report.table.header.covered", locale = locale)) }
                        }
                    }
                    tbody {
                        @for case in &overview.test_cases {
                            tr {
                                td { (case.name) }
                                td {
                                    div class={ "status-cell " (case.outcome.get_status_class()) } {
                                        (case.outcome.get_status_str(locale))
                                    }
                                }
                                td class="count-col" { (case.covered_elements) }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Writes the HTML report to `output_path`.
///
/// # Errors / 错误
/// Fails if the report file cannot be written.
/// 如果无法写入报告文件则失败。
pub fn generate_html_report(overview: &MatrixOverview, output_path: &Path, locale: &str) -> Result<()> {
    let markup = render_html_report(overview, locale);
    fs::write(output_path, markup.into_string()).with_context(|| {
        t!("html_report.write_failed", locale = locale, path = output_path.display()).to_string()
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Granularity, TestCaseOverview};

    #[test]
    fn report_lists_every_test_case_escaped() {
        let overview = MatrixOverview {
            granularity: Granularity::Class,
            code_elements: 4,
            test_cases: vec![
                TestCaseOverview {
                    name: "ok<1>".to_string(),
                    outcome: Outcome::Passed,
                    covered_elements: 3,
                },
                TestCaseOverview {
                    name: "broken".to_string(),
                    outcome: Outcome::Failed,
                    covered_elements: 1,
                },
            ],
        };

        let page = render_html_report(&overview, "en").into_string();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("ok&lt;1&gt;"));
        assert!(page.contains("status-Failed"));
        assert!(page.contains(">broken<"));
    }
}
