//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the run summary to the console with color coding and
//! internationalization support.
//!
//! 此模块以彩色编码和国际化支持将运行摘要打印到控制台。

use colored::*;
use std::path::Path;

use crate::core::models::{MatrixOverview, Outcome};
use crate::core::pipeline::RunSummary;
use crate::infra::t;

/// Prints a formatted summary of a run to the console.
/// Lists the session counts of every project, then the matrix totals.
///
/// 在控制台打印格式化的运行摘要。
/// 先列出每个项目的会话计数，再列出矩阵总计。
///
/// # Arguments / 参数
/// * `summary` - Session counts per project
///               每个项目的会话计数
/// * `overview` - Snapshot of the accumulated matrices
///                累积矩阵的快照
/// * `locale` - The language locale to use for messages
///              用于消息的语言区域设置
///
/// # Output Format / 输出格式
/// ```text
/// --- Coverage Matrix Summary ---
///   - Project                                  | Sessions | Recorded | Skipped
///   - core                                     |        3 |        3 |       0
///
///   Granularity:    class
///   Test cases:     3
///   Code elements:  12
///   Passed: 2  Failed: 1  Not executed: 0
/// ```
pub fn print_summary(summary: &RunSummary, overview: &MatrixOverview, locale: &str) {
    println!("\n{}", t!("summary.banner", locale = locale).bold());
    println!(
        "  - {:<40} | {:>8} | {:>8} | {:>8}",
        t!("summary.project", locale = locale),
        t!("summary.sessions", locale = locale),
        t!("summary.recorded", locale = locale),
        t!("summary.skipped", locale = locale),
    );

    for project in &summary.projects {
        let skipped = if project.skipped_empty > 0 {
            project.skipped_empty.to_string().yellow()
        } else {
            project.skipped_empty.to_string().normal()
        };
        println!(
            "  - {:<40} | {:>8} | {:>8} | {:>8}",
            project.project.display(),
            project.sessions_seen,
            project.accumulated,
            skipped
        );
    }

    println!();
    println!(
        "  {:<16}{}",
        t!("summary.granularity", locale = locale),
        overview.granularity.as_str().cyan()
    );
    println!(
        "  {:<16}{}",
        t!("summary.test_cases", locale = locale),
        overview.test_cases.len()
    );
    println!(
        "  {:<16}{}",
        t!("summary.code_elements", locale = locale),
        overview.code_elements
    );
    println!(
        "  {}: {}  {}: {}  {}: {}",
        Outcome::Passed.get_status_str(locale),
        overview.count(Outcome::Passed).to_string().green(),
        Outcome::Failed.get_status_str(locale),
        overview.count(Outcome::Failed).to_string().red(),
        Outcome::NotExecuted.get_status_str(locale),
        overview.count(Outcome::NotExecuted).to_string().dimmed(),
    );
}

/// Prints where the matrices were written.
/// 打印矩阵的写入位置。
pub fn print_outputs(coverage: &Path, results: &Path, locale: &str) {
    println!(
        "\n{}",
        t!("summary.coverage_written", locale = locale, path = coverage.display()).green()
    );
    println!(
        "{}",
        t!("summary.results_written", locale = locale, path = results.display()).green()
    );
}
