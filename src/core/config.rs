//! # Configuration Module / 配置模块
//!
//! This module defines the `CoverageMatrix.toml` file and the merge of its
//! values with command-line flags. Flags always win over the file; the file
//! only fills in what the command line leaves out.
//!
//! 此模块定义 `CoverageMatrix.toml` 文件，以及其取值与命令行参数的合并规则。
//! 命令行参数总是优先于文件；文件只补充命令行未提供的部分。

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::models::{Granularity, ParseGranularityError};
use crate::infra::logging::LogConfig;

/// Default configuration file name, looked up in the working directory.
/// 默认配置文件名，在工作目录中查找。
pub const DEFAULT_CONFIG_FILE: &str = "CoverageMatrix.toml";

/// Default execution data file, relative to a project directory.
pub const DEFAULT_EXEC_FILE: &str = "target/jacoco.exec";
/// Default compiled classes directory, relative to a project directory.
pub const DEFAULT_CLASSES_DIR: &str = "target/classes";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    InvalidGranularity(#[from] ParseGranularityError),
    #[error("no granularity given: pass --granularity or set `granularity` in the config file")]
    MissingGranularity,
    #[error("no input projects given: pass --input or set `inputs` in the config file")]
    MissingInputs,
}

/// Where execution data and compiled classes live inside a project.
/// 项目内执行数据和已编译类的位置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub exec_file: PathBuf,
    pub classes_dir: PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            exec_file: PathBuf::from(DEFAULT_EXEC_FILE),
            classes_dir: PathBuf::from(DEFAULT_CLASSES_DIR),
        }
    }
}

impl LayoutConfig {
    /// Execution data file of `project`.
    pub fn exec_file_in(&self, project: &Path) -> PathBuf {
        project.join(&self.exec_file)
    }

    /// Compiled classes directory of `project`.
    pub fn classes_dir_in(&self, project: &Path) -> PathBuf {
        project.join(&self.classes_dir)
    }
}

/// Contents of `CoverageMatrix.toml`.
/// `CoverageMatrix.toml` 的内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Language for console messages / 控制台消息的语言
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
    /// Project directories, processed in order / 按顺序处理的项目目录
    pub inputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_output: Option<String>,
    pub layout: LayoutConfig,
    pub log: LogConfig,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            granularity: None,
            inputs: Vec::new(),
            coverage_output: None,
            results_output: None,
            layout: LayoutConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Values given on the command line for `run`.
/// `run` 命令行上给出的取值。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    pub granularity: Option<String>,
    /// Raw `--input` occurrences, each possibly comma-separated.
    pub inputs: Vec<String>,
    pub coverage_output: Option<String>,
    pub results_output: Option<String>,
}

/// The merged settings a run executes with.
/// 一次运行所使用的合并后设置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub granularity: Granularity,
    pub inputs: Vec<String>,
    pub coverage_output: Option<String>,
    pub results_output: Option<String>,
    pub layout: LayoutConfig,
}

impl MatrixConfig {
    /// Merges command-line values over this configuration.
    ///
    /// 将命令行取值合并到此配置之上。
    pub fn resolve(&self, overrides: RunOverrides) -> Result<RunSettings, ConfigError> {
        let granularity = match overrides.granularity.as_deref() {
            Some(raw) => raw.parse::<Granularity>()?,
            None => self.granularity.ok_or(ConfigError::MissingGranularity)?,
        };

        let inputs = if overrides.inputs.is_empty() {
            split_inputs(self.inputs.iter().map(String::as_str))
        } else {
            split_inputs(overrides.inputs.iter().map(String::as_str))
        };
        if inputs.is_empty() {
            return Err(ConfigError::MissingInputs);
        }

        Ok(RunSettings {
            granularity,
            inputs,
            coverage_output: overrides.coverage_output.or_else(|| self.coverage_output.clone()),
            results_output: overrides.results_output.or_else(|| self.results_output.clone()),
            layout: self.layout.clone(),
        })
    }
}

/// Splits comma-separated project lists, dropping blank entries.
///
/// ```
/// use coverage_matrix::config::split_inputs;
/// assert_eq!(split_inputs(["a, b", "c"]), vec!["a", "b", "c"]);
/// ```
pub fn split_inputs<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    values
        .into_iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses configuration file contents.
pub fn parse_config(content: &str) -> Result<MatrixConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Reads and parses a configuration file.
///
/// # Arguments
/// * `path` - Path of the `CoverageMatrix.toml` file
pub fn load_config(path: &Path) -> Result<MatrixConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
