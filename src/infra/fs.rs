//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides path helpers for the CLI: expanding user-supplied
//! paths, naming the output matrices, and checking project directories.
//!
//! 此模块为 CLI 提供路径辅助功能：展开用户提供的路径、
//! 命名输出矩阵文件，以及检查项目目录。

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::infra::t;

/// File extension of a persisted matrix.
pub const MATRIX_EXTENSION: &str = ".json";
/// Default coverage matrix file name.
pub const DEFAULT_COVERAGE_FILE: &str = "coverageMatrix.json";
/// Default results matrix file name.
pub const DEFAULT_RESULTS_FILE: &str = "resultsMatrix.json";

/// Expands `~` and environment variables in a user-supplied path.
///
/// # Arguments
/// * `raw` - The path as written on the command line or in the config file
///
/// # Returns
/// The expanded path, or an error naming the undefined variable
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| t!("fs.expand_failed", path = raw).to_string())?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Resolves the destination of a matrix file.
///
/// An absent or empty name falls back to `default`; a name without the
/// `.json` extension gets it appended.
///
/// # Arguments
/// * `name` - The requested file name, if any
/// * `default` - The file name used when none is requested
pub fn output_file_name(name: Option<&str>, default: &str) -> Result<PathBuf> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        None => Ok(PathBuf::from(default)),
        Some(n) if n.ends_with(MATRIX_EXTENSION) => expand_path(n),
        Some(n) => expand_path(&format!("{}{}", n, MATRIX_EXTENSION)),
    }
}

/// Checks if a path exists and is a directory.
///
/// # Arguments
/// * `path` - Path to check
///
/// # Returns
/// `true` if the path exists and is a directory, `false` otherwise
pub fn is_directory(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_get_the_matrix_extension() {
        assert_eq!(
            output_file_name(None, DEFAULT_COVERAGE_FILE).unwrap(),
            PathBuf::from("coverageMatrix.json")
        );
        assert_eq!(
            output_file_name(Some(""), DEFAULT_RESULTS_FILE).unwrap(),
            PathBuf::from("resultsMatrix.json")
        );
        assert_eq!(
            output_file_name(Some("out/cov"), DEFAULT_COVERAGE_FILE).unwrap(),
            PathBuf::from("out/cov.json")
        );
        assert_eq!(
            output_file_name(Some("cov.json"), DEFAULT_COVERAGE_FILE).unwrap(),
            PathBuf::from("cov.json")
        );
    }

    #[test]
    fn undefined_variable_is_reported_with_the_path() {
        let err = expand_path("$COVERAGE_MATRIX_UNSET_VAR/out").unwrap_err();
        assert!(err.to_string().contains("$COVERAGE_MATRIX_UNSET_VAR/out"));
        assert!(format!("{:#}", err).contains("COVERAGE_MATRIX_UNSET_VAR"));
    }

    #[test]
    fn home_directory_is_expanded() {
        if let Some(home) = std::env::var_os("HOME") {
            let expanded = expand_path("~/projects").unwrap();
            assert_eq!(expanded, PathBuf::from(home).join("projects"));
        }
    }
}
