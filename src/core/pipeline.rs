//! # Run Pipeline Module / 运行管道模块
//!
//! Drives one run over a list of project directories. For every project the
//! execution data file is read completely into a [`SessionVisitor`], then each
//! named session is analyzed, projected to the requested granularity and
//! folded into the caller's [`MatrixAccumulator`].
//!
//! 驱动对一组项目目录的一次运行。对于每个项目，先将执行数据文件完整读入
//! [`SessionVisitor`]，然后对每个具名会话进行分析、投影到所请求的粒度，
//! 并折叠进调用者的 [`MatrixAccumulator`]。
//!
//! The pipeline never persists anything; the caller does that once, after the
//! last project, through [`MatrixAccumulator::persist`].
//!
//! 管道本身从不持久化任何内容；调用者在最后一个项目之后通过
//! [`MatrixAccumulator::persist`] 执行一次持久化。

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::accumulator::MatrixAccumulator;
use crate::core::config::LayoutConfig;
use crate::core::models::Granularity;
use crate::core::projection::project;
use crate::core::session::{SessionVisitor, Sessions};
use crate::infra::analysis::CoverageAnalyzer;
use crate::infra::exec::ExecutionRecordSource;
use crate::infra::t;

/// Session counts of one project.
/// 单个项目的会话计数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub project: PathBuf,
    /// Distinct session ids in the execution data, the empty id included.
    pub sessions_seen: usize,
    pub accumulated: usize,
    pub skipped_empty: usize,
}

/// Session counts of a whole run, one entry per project in processing order.
/// 整次运行的会话计数，按处理顺序每个项目一项。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub projects: Vec<ProjectSummary>,
}

impl RunSummary {
    pub fn sessions_seen(&self) -> usize {
        self.projects.iter().map(|p| p.sessions_seen).sum()
    }

    pub fn accumulated(&self) -> usize {
        self.projects.iter().map(|p| p.accumulated).sum()
    }

    pub fn skipped_empty(&self) -> usize {
        self.projects.iter().map(|p| p.skipped_empty).sum()
    }
}

/// Reads, analyzes and projects the sessions of each project.
pub struct Pipeline<S, A> {
    source: S,
    analyzer: A,
    granularity: Granularity,
    layout: LayoutConfig,
}

impl<S, A> Pipeline<S, A>
where
    S: ExecutionRecordSource,
    A: CoverageAnalyzer,
{
    pub fn new(source: S, analyzer: A, granularity: Granularity, layout: LayoutConfig) -> Self {
        Self {
            source,
            analyzer,
            granularity,
            layout,
        }
    }

    /// Processes `projects` in order. The first failing project aborts the
    /// run; sessions already folded into `accumulator` stay there, but the
    /// caller is expected to discard it.
    ///
    /// 按顺序处理 `projects`。第一个失败的项目会中止运行。
    pub fn run(
        &mut self,
        projects: &[PathBuf],
        accumulator: &mut MatrixAccumulator,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for project in projects {
            let project_summary = self.process_project(project, accumulator)?;
            summary.projects.push(project_summary);
        }
        Ok(summary)
    }

    /// Processes a single project directory.
    pub fn process_project(
        &mut self,
        project_dir: &Path,
        accumulator: &mut MatrixAccumulator,
    ) -> Result<ProjectSummary> {
        let exec_file = self.layout.exec_file_in(project_dir);
        let classes_dir = self.layout.classes_dir_in(project_dir);
        debug!(
            project = %project_dir.display(),
            exec_file = %exec_file.display(),
            classes_dir = %classes_dir.display(),
            "processing project"
        );

        let sessions = self.read_sessions(&exec_file)?;

        let mut accumulated = 0;
        for session in sessions.non_empty() {
            let bundle = self
                .analyzer
                .analyze(&session.store, &classes_dir, session.id())
                .with_context(|| {
                    t!(
                        "pipeline.analysis_failed",
                        session = session.id(),
                        path = classes_dir.display()
                    )
                    .to_string()
                })?;
            let elements = project(&bundle, self.granularity);
            accumulator.accumulate(session.id(), &elements)?;

            accumulated += 1;
            info!("{}. Test Case Done: {}", accumulated, session.id());
        }

        Ok(ProjectSummary {
            project: project_dir.to_path_buf(),
            sessions_seen: sessions.len(),
            accumulated,
            skipped_empty: sessions.len() - accumulated,
        })
    }

    /// Decodes an execution data file into its sessions. The file is closed
    /// before this returns.
    fn read_sessions(&self, exec_file: &Path) -> Result<Sessions> {
        let mut visitor = SessionVisitor::new();
        self.source
            .read_records(exec_file, &mut visitor)
            .with_context(|| t!("pipeline.read_failed", path = exec_file.display()).to_string())?;
        Ok(visitor.into_sessions())
    }
}
