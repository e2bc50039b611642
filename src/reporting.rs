//! # Reporting Module / 报告模块
//!
//! This module presents the outcome of a run: a colored summary printed to the
//! console and an optional standalone HTML report.
//!
//! 此模块展示一次运行的结果：打印到控制台的彩色摘要，以及可选的独立 HTML 报告。

pub mod console;
pub mod html;

// Re-export common reporting functions
pub use console::{print_outputs, print_summary};
pub use html::{generate_html_report, render_html_report};
