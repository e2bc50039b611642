//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command, which reads the execution data of
//! every input project, accumulates the coverage and results matrices, and
//! writes them once all projects have been processed.
//!
//! 此模块实现了 `run` 命令：读取每个输入项目的执行数据，累积覆盖矩阵和结果矩阵，
//! 并在所有项目处理完毕后将它们写出。

use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};

use crate::{
    core::{
        accumulator::MatrixAccumulator,
        config::{self, DEFAULT_CONFIG_FILE, MatrixConfig, RunOverrides},
        models::MatrixOverview,
        pipeline::{Pipeline, RunSummary},
    },
    infra::{
        analysis::ProbeMapAnalyzer,
        exec::ExecFileReader,
        fs::{self, DEFAULT_COVERAGE_FILE, DEFAULT_RESULTS_FILE},
        logging::{LogError, init_logging},
        persistence::JsonMatrixStore,
        t,
    },
    reporting::{generate_html_report, print_outputs, print_summary},
};

/// Arguments of the `run` command as collected by the CLI.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Explicit `--config` path. When absent, `CoverageMatrix.toml` is used if present.
    pub config: Option<PathBuf>,
    pub overrides: RunOverrides,
    pub html: Option<PathBuf>,
    /// Explicit `--lang`; takes precedence over the config file's `language`.
    pub language: Option<String>,
}

/// Executes the run command with the provided arguments.
///
/// Nothing is written unless every project was processed successfully.
///
/// # Returns
/// A Result indicating success or failure of the command execution
pub async fn execute(args: RunArgs) -> Result<()> {
    let (matrix_config, config_path) = load_run_config(args.config.as_deref()).await?;
    let locale = crate::resolve_locale(
        args.language.as_deref().unwrap_or(&matrix_config.language),
    )
    .to_string();
    rust_i18n::set_locale(&locale);
    let locale = locale.as_str();

    match init_logging(&matrix_config.log) {
        Ok(()) | Err(LogError::AlreadyInitialized) => {}
        Err(e) => return Err(e).context(t!("run.logging_failed", locale = locale).to_string()),
    }

    if let Some(path) = &config_path {
        println!(
            "{}",
            t!("run.loading_config", locale = locale, path = path.display())
        );
    }

    let settings = matrix_config
        .resolve(args.overrides)
        .with_context(|| t!("run.invalid_settings", locale = locale).to_string())?;

    let projects = settings
        .inputs
        .iter()
        .map(|raw| fs::expand_path(raw))
        .collect::<Result<Vec<_>>>()?;
    let coverage_path =
        fs::output_file_name(settings.coverage_output.as_deref(), DEFAULT_COVERAGE_FILE)?;
    let results_path =
        fs::output_file_name(settings.results_output.as_deref(), DEFAULT_RESULTS_FILE)?;

    println!(
        "{}",
        t!(
            "run.granularity",
            locale = locale,
            granularity = settings.granularity.as_str().yellow()
        )
    );
    for project in &projects {
        let marker = if fs::is_directory(project) {
            "-".normal()
        } else {
            "?".yellow()
        };
        println!(
            "  {} {}",
            marker,
            t!("run.project", locale = locale, path = project.display())
        );
    }

    let granularity = settings.granularity;
    let layout = settings.layout;
    let (summary, overview) = {
        let coverage_path = coverage_path.clone();
        let results_path = results_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(RunSummary, MatrixOverview)> {
            let mut pipeline = Pipeline::new(
                ExecFileReader,
                ProbeMapAnalyzer::new(),
                granularity,
                layout,
            );
            let mut accumulator = MatrixAccumulator::new();
            let summary = pipeline.run(&projects, &mut accumulator)?;
            let overview = accumulator.overview(granularity);
            accumulator
                .persist(&JsonMatrixStore::new().pretty(true), &coverage_path, &results_path)
                .context(t!("run.persist_failed").to_string())?;
            Ok((summary, overview))
        })
        .await
        .context(t!("run.worker_failed", locale = locale).to_string())??
    };

    print_summary(&summary, &overview, locale);
    print_outputs(&coverage_path, &results_path, locale);

    if let Some(report_path) = &args.html {
        println!(
            "\n{}",
            t!("run.generating_html", locale = locale, path = report_path.display())
        );
        if let Err(e) = generate_html_report(&overview, report_path, locale) {
            eprintln!("{} {:#}", t!("run.html_failed", locale = locale).red(), e);
        }
    }

    println!("\n{}", t!("run.done", locale = locale).green().bold());
    Ok(())
}

/// Loads the configuration file.
///
/// An explicit path must exist. Without one, `CoverageMatrix.toml` in the
/// working directory is read if present and defaults are used otherwise.
async fn load_run_config(explicit: Option<&Path>) -> Result<(MatrixConfig, Option<PathBuf>)> {
    // For config parsing, we don't have the locale yet.
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !tokio::fs::try_exists(&default).await.unwrap_or(false) {
                return Ok((MatrixConfig::default(), None));
            }
            default
        }
    };

    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| t!("config_read_failed_path", path = path.display()).to_string())?;
    let matrix_config = config::parse_config(&content)
        .with_context(|| t!("config_parse_failed", path = path.display()).to_string())?;
    Ok((matrix_config, Some(path)))
}
