// Shared test helpers for integration tests
#![allow(dead_code)]

use coverage_matrix::core::models::{ExecutionData, SessionInfo};
use coverage_matrix::infra::analysis::{LineProbes, MethodProbes, ProbeMap};
use coverage_matrix::infra::exec::ExecDataWriter;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// A project directory laid out the way a Maven build leaves it:
/// `target/jacoco.exec` next to `target/classes`.
pub struct ProjectFixture {
    pub root: PathBuf,
}

impl ProjectFixture {
    pub fn new(parent: &Path, name: &str) -> Self {
        let root = parent.join(name);
        fs::create_dir_all(root.join("target").join("classes"))
            .expect("Failed to create classes directory");
        Self { root }
    }

    pub fn exec_file(&self) -> PathBuf {
        self.root.join("target").join("jacoco.exec")
    }

    pub fn classes_dir(&self) -> PathBuf {
        self.root.join("target").join("classes")
    }

    pub fn with_class(self, map: &ProbeMap) -> Self {
        write_probe_map(&self.classes_dir(), map);
        self
    }

    pub fn with_sessions(self, sessions: &[(&str, Vec<ExecutionData>)]) -> Self {
        write_exec_file(&self.exec_file(), sessions);
        self
    }
}

/// Creates a temporary workspace directory.
pub fn workspace() -> TempDir {
    tempdir().expect("Failed to create temporary directory")
}

/// Probe layout of a class whose methods each own consecutive probes, one
/// probe per listed line.
///
/// `methods` holds `(method name, first line, line count)`.
pub fn class_map(id: u64, name: &str, methods: &[(&str, u32, usize)]) -> ProbeMap {
    let (package, simple) = match name.rsplit_once('/') {
        Some((package, simple)) => (package.to_string(), simple.to_string()),
        None => (String::new(), name.to_string()),
    };

    let mut next_probe = 0;
    let methods = methods
        .iter()
        .map(|&(method, first_line, lines)| MethodProbes {
            name: method.to_string(),
            desc: "()V".to_string(),
            lines: (0..lines)
                .map(|offset| {
                    let probe = next_probe;
                    next_probe += 1;
                    LineProbes {
                        line: first_line + offset as u32,
                        probes: vec![probe],
                    }
                })
                .collect(),
        })
        .collect();

    ProbeMap {
        id,
        name: name.to_string(),
        package,
        source_file: Some(format!("{}.java", simple)),
        probe_count: next_probe,
        methods,
    }
}

/// Probe record of `map` with the given probes hit.
pub fn hits(map: &ProbeMap, hit: &[usize]) -> ExecutionData {
    let mut probes = vec![false; map.probe_count];
    for &index in hit {
        probes[index] = true;
    }
    ExecutionData::new(map.id, map.name.clone(), probes)
}

pub fn write_probe_map(classes_dir: &Path, map: &ProbeMap) {
    let path = classes_dir.join(format!("{}.probemap.json", map.name));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create package directory");
    }
    let content = serde_json::to_string_pretty(map).expect("Failed to serialize probe map");
    fs::write(path, content).expect("Failed to write probe map");
}

pub fn write_exec_file(path: &Path, sessions: &[(&str, Vec<ExecutionData>)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create target directory");
    }
    let file = File::create(path).expect("Failed to create exec file");
    let mut writer = ExecDataWriter::new(file).expect("Failed to write header");
    for (id, records) in sessions {
        writer
            .write_session_info(&SessionInfo::new(*id, 1_700_000_000_000, 1_700_000_000_500))
            .expect("Failed to write session info");
        for record in records {
            writer
                .write_execution_data(record)
                .expect("Failed to write execution data");
        }
    }
    writer.finish().expect("Failed to flush exec file");
}
