//! # Configuration Initialization Module / 配置初始化模块
//!
//! This module creates a `CoverageMatrix.toml` file through an interactive
//! command-line wizard, or with defaults when run non-interactively.
//!
//! 此模块通过交互式命令行向导创建 `CoverageMatrix.toml` 文件，
//! 或在非交互模式下使用默认值创建。
//!
//! ## Features / 功能特性
//!
//! - **Interactive Wizard**: Step-by-step choice of granularity and input projects
//! - **Project Detection**: Directories that already contain execution data are suggested
//! - **Overwrite Protection**: An existing file is only replaced after confirmation
//!
//! - **交互式向导**: 逐步选择粒度和输入项目
//! - **项目检测**: 建议已包含执行数据的目录
//! - **覆盖保护**: 仅在确认后替换现有文件

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::{LayoutConfig, MatrixConfig, load_config, split_inputs};
use crate::core::models::Granularity;
use crate::infra::t;

/// Header written above the generated configuration.
const CONFIG_HEADER: &str = "# Coverage Matrix Configuration / 覆盖矩阵配置\n\
# Command-line flags override every value below. / 命令行参数会覆盖以下所有取值。\n\n";

/// Runs the interactive wizard to generate a `CoverageMatrix.toml` file.
///
/// In non-interactive mode the defaults are written directly and an existing
/// file is left untouched.
///
/// 运行交互式向导以生成 `CoverageMatrix.toml` 文件。
///
/// 在非交互模式下直接写入默认值，且不会改动已存在的文件。
pub fn run_init_wizard(language: &str, non_interactive: bool, config_path: &Path) -> Result<()> {
    let theme = ColorfulTheme::default();

    if !non_interactive {
        println!("\n{}", t!("init_wizard_welcome", locale = language).cyan().bold());
        println!("{}", t!("init_wizard_description", locale = language));
    }

    if config_path.exists() {
        if non_interactive {
            println!(
                "{}",
                t!("init_file_exists", locale = language, path = config_path.display()).yellow()
            );
            return Ok(());
        }
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init_overwrite_prompt", locale = language, path = config_path.display()))
            .default(false)
            .interact()
            .context(t!("init_user_confirmation_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init_aborted", locale = language));
            return Ok(());
        }
    }

    let mut matrix_config = default_config(language);

    if non_interactive {
        return write_config(config_path, &matrix_config, language);
    }

    // Interactive part starts here
    if let Ok(existing) = load_config(config_path) {
        matrix_config.layout = existing.layout;
    }
    let detected = detect_projects(Path::new("."), &matrix_config.layout);
    if !detected.is_empty() {
        println!(
            "{}",
            t!(
                "init_detected_projects",
                locale = language,
                projects = detected.join(", ").green()
            )
        );
    }

    let granularity_items: Vec<&str> = Granularity::ALL.iter().map(|g| g.as_str()).collect();
    let selection = Select::with_theme(&theme)
        .with_prompt(t!("init_granularity_prompt", locale = language))
        .items(&granularity_items)
        .default(1)
        .interact()
        .context(t!("init_user_confirmation_failed", locale = language).to_string())?;
    matrix_config.granularity = Granularity::ALL.get(selection).copied();

    let default_inputs = if detected.is_empty() {
        ".".to_string()
    } else {
        detected.join(",")
    };
    let inputs: String = Input::with_theme(&theme)
        .with_prompt(t!("init_inputs_prompt", locale = language))
        .default(default_inputs)
        .interact_text()
        .context(t!("init_user_confirmation_failed", locale = language).to_string())?;
    matrix_config.inputs = split_inputs([inputs.as_str()]);

    if matrix_config.inputs.is_empty() {
        println!("{}", t!("init_no_inputs", locale = language).yellow());
    }

    write_config(config_path, &matrix_config, language)
}

fn default_config(language: &str) -> MatrixConfig {
    MatrixConfig {
        language: language.to_string(),
        granularity: Some(Granularity::Class),
        inputs: vec![".".to_string()],
        ..MatrixConfig::default()
    }
}

fn write_config(path: &Path, matrix_config: &MatrixConfig, language: &str) -> Result<()> {
    let toml_string = toml::to_string_pretty(matrix_config)
        .context(t!("init_serialize_failed", locale = language).to_string())?;

    fs::write(path, format!("{}{}", CONFIG_HEADER, toml_string)).with_context(|| {
        t!("init_write_failed", locale = language, path = path.display()).to_string()
    })?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init_success_created", locale = language, path = path.display()).bold()
    );
    println!("{}", t!("init_usage_hint", locale = language));

    Ok(())
}

/// Lists `root` and its immediate subdirectories that already hold an
/// execution data file under `layout`, as paths relative to `root`.
fn detect_projects(root: &Path, layout: &LayoutConfig) -> Vec<String> {
    let mut found = Vec::new();

    if layout.exec_file_in(root).is_file() {
        found.push(".".to_string());
    }

    let Ok(entries) = fs::read_dir(root) else {
        return found;
    };
    let mut children: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir() && layout.exec_file_in(path).is_file())
        .collect();
    children.sort();
    found.extend(
        children
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned()),
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn non_interactive_writes_a_loadable_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("CoverageMatrix.toml");
        run_init_wizard("en", true, &path).unwrap();

        let config = crate::core::config::load_config(&path).unwrap();
        assert_eq!(config.granularity, Some(Granularity::Class));
        assert_eq!(config.inputs, vec!["."]);
    }

    #[test]
    fn non_interactive_keeps_an_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("CoverageMatrix.toml");
        fs::write(&path, "granularity = \"line\"\n").unwrap();
        run_init_wizard("en", true, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "granularity = \"line\"\n");
    }

    #[test]
    fn projects_with_execution_data_are_detected() {
        let dir = tempdir().unwrap();
        for name in ["web", "core", "docs"] {
            fs::create_dir_all(dir.path().join(name).join("target")).unwrap();
        }
        fs::write(dir.path().join("core/target/jacoco.exec"), b"").unwrap();
        fs::write(dir.path().join("web/target/jacoco.exec"), b"").unwrap();

        assert_eq!(
            detect_projects(dir.path(), &LayoutConfig::default()),
            vec!["core", "web"]
        );
    }

    #[test]
    fn detection_follows_the_configured_layout() {
        let dir = tempdir().unwrap();
        for name in ["maven", "gradle"] {
            fs::create_dir_all(dir.path().join(name).join("target")).unwrap();
        }
        fs::create_dir_all(dir.path().join("gradle/build/jacoco")).unwrap();
        fs::write(dir.path().join("maven/target/jacoco.exec"), b"").unwrap();
        fs::write(dir.path().join("gradle/build/jacoco/test.exec"), b"").unwrap();

        let layout = LayoutConfig {
            exec_file: PathBuf::from("build/jacoco/test.exec"),
            classes_dir: PathBuf::from("build/classes/java/main"),
        };
        assert_eq!(detect_projects(dir.path(), &layout), vec!["gradle"]);
    }
}
