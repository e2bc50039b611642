//! # Coverage Matrix Library / Coverage Matrix 库
//!
//! This library turns per-test JaCoCo execution data into the two matrices used
//! by test-suite reduction and prioritization tools: a test-by-code-element
//! coverage relation and a per-test results record.
//!
//! 此库将每个测试的 JaCoCo 执行数据转换为测试集约简和优先级排序工具使用的两个矩阵：
//! 测试与代码元素之间的覆盖关系矩阵，以及每个测试的结果矩阵。
//!
//! ## Modules / 模块
//!
//! - `core` - Session grouping, granularity projection and matrix accumulation
//! - `infra` - Execution data decoding, probe-map analysis, persistence and logging
//! - `reporting` - Console summary and HTML report
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 会话分组、粒度投影和矩阵累积
//! - `infra` - 执行数据解码、探针映射分析、持久化和日志
//! - `reporting` - 控制台摘要和 HTML 报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use self::core::accumulator;
pub use self::core::config;
pub use self::core::models;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// It attempts to match the full locale (e.g., "zh-CN"), then just the language
/// code (e.g., "en"), and finally falls back to "en". Returns the locale in use.
pub fn init() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let resolved = resolve_locale(&locale).to_string();
    rust_i18n::set_locale(&resolved);
    resolved
}

/// Maps a requested locale onto one of the bundled translations.
pub fn resolve_locale(requested: &str) -> &str {
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&requested) {
        requested
    } else {
        requested
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    }
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
