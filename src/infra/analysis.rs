//! # Coverage Analysis Module / 覆盖分析模块
//!
//! Combines a session's probe hits with the structure of the compiled classes
//! to produce a [`BundleCoverage`]. The structure comes from probe maps, one
//! JSON file per class (`*.probemap.json`) anywhere below the classes
//! directory, that tell which probes belong to which method and line. No
//! bytecode is inspected here.
//!
//! 将会话的探针命中情况与已编译类的结构结合，生成 [`BundleCoverage`]。
//! 结构来自探针映射文件：类目录下任意位置的每个类一个 JSON 文件（`*.probemap.json`），
//! 描述哪些探针属于哪个方法和行。此处不检查任何字节码。

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::coverage::{
    BundleCoverage, ClassCoverage, Counter, MethodCoverage, PackageCoverage, SourceFileCoverage,
};
use crate::core::session::ProbeStore;

/// File name suffix of a probe map.
pub const PROBE_MAP_SUFFIX: &str = ".probemap.json";

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("classes directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed probe map {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("probe map for {class} references probe {index} but declares only {count} probes")]
    ProbeIndexOutOfRange {
        class: String,
        index: usize,
        count: usize,
    },
    #[error("execution data for {class} has {found} probes, the probe map declares {expected}")]
    ProbeCountMismatch {
        class: String,
        found: usize,
        expected: usize,
    },
}

/// Produces the coverage tree of one session.
/// 生成一个会话的覆盖树。
pub trait CoverageAnalyzer {
    fn analyze(
        &mut self,
        store: &ProbeStore,
        classes_dir: &Path,
        bundle_name: &str,
    ) -> Result<BundleCoverage, AnalysisError>;
}

/// Probe layout of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeMap {
    /// Class id, matching [`ExecutionData::id`](crate::core::models::ExecutionData).
    pub id: u64,
    /// VM class name, e.g. `com/acme/Foo`.
    pub name: String,
    /// VM package name, e.g. `com/acme`; empty for the default package.
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub source_file: Option<String>,
    pub probe_count: usize,
    #[serde(default)]
    pub methods: Vec<MethodProbes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodProbes {
    pub name: String,
    pub desc: String,
    #[serde(default)]
    pub lines: Vec<LineProbes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineProbes {
    pub line: u32,
    pub probes: Vec<usize>,
}

impl ProbeMap {
    fn validate(&self) -> Result<(), AnalysisError> {
        let out_of_range = self
            .methods
            .iter()
            .flat_map(|m| &m.lines)
            .flat_map(|l| &l.probes)
            .find(|&&index| index >= self.probe_count);
        match out_of_range {
            Some(&index) => Err(AnalysisError::ProbeIndexOutOfRange {
                class: self.name.clone(),
                index,
                count: self.probe_count,
            }),
            None => Ok(()),
        }
    }
}

/// [`CoverageAnalyzer`] backed by probe maps. Maps are loaded once per
/// classes directory and reused for every session.
#[derive(Debug, Default)]
pub struct ProbeMapAnalyzer {
    cache: HashMap<PathBuf, Vec<ProbeMap>>,
}

impl ProbeMapAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn probe_maps(&mut self, classes_dir: &Path) -> Result<&[ProbeMap], AnalysisError> {
        if !self.cache.contains_key(classes_dir) {
            let maps = load_probe_maps(classes_dir)?;
            debug!(dir = %classes_dir.display(), classes = maps.len(), "loaded probe maps");
            self.cache.insert(classes_dir.to_path_buf(), maps);
        }
        Ok(self
            .cache
            .get(classes_dir)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }
}

impl CoverageAnalyzer for ProbeMapAnalyzer {
    fn analyze(
        &mut self,
        store: &ProbeStore,
        classes_dir: &Path,
        bundle_name: &str,
    ) -> Result<BundleCoverage, AnalysisError> {
        let maps = self.probe_maps(classes_dir)?;
        build_bundle(maps, store, bundle_name)
    }
}

#[derive(Default)]
struct PackageBuilder {
    classes: Vec<ClassCoverage>,
    source_files: BTreeMap<String, SourceFileCoverage>,
}

/// Builds the coverage tree for `store` over the given class layouts.
/// Packages, classes and source files are sorted by name; methods and lines
/// keep probe-map order.
pub fn build_bundle(
    maps: &[ProbeMap],
    store: &ProbeStore,
    bundle_name: &str,
) -> Result<BundleCoverage, AnalysisError> {
    let mut packages: BTreeMap<&str, PackageBuilder> = BTreeMap::new();

    for map in maps {
        map.validate()?;
        let probes = resolve_probes(map, store)?;
        let package = packages.entry(map.package.as_str()).or_default();

        let methods: Vec<MethodCoverage> = map
            .methods
            .iter()
            .map(|method| {
                let indices = method.lines.iter().flat_map(|l| &l.probes);
                let mut any = false;
                let mut hit = false;
                for &i in indices {
                    any = true;
                    hit |= probes[i];
                }
                MethodCoverage {
                    name: method.name.clone(),
                    desc: method.desc.clone(),
                    method_counter: match (any, hit) {
                        (false, _) => Counter::EMPTY,
                        (true, true) => Counter::COVERED_ONE,
                        (true, false) => Counter::MISSED_ONE,
                    },
                }
            })
            .collect();

        let class_counter = if methods
            .iter()
            .any(|m| m.method_counter.status().is_covered())
        {
            Counter::COVERED_ONE
        } else {
            Counter::MISSED_ONE
        };

        if let Some(file_name) = &map.source_file {
            let file = package
                .source_files
                .entry(file_name.clone())
                .or_insert_with(|| SourceFileCoverage::new(file_name.clone(), map.package.clone()));
            for line in map.methods.iter().flat_map(|m| &m.lines) {
                let covered = line.probes.iter().filter(|&&i| probes[i]).count() as u32;
                let missed = line.probes.len() as u32 - covered;
                file.increment_line(line.line, Counter::new(missed, covered));
            }
        }

        package.classes.push(ClassCoverage {
            name: map.name.clone(),
            class_counter,
            methods,
        });
    }

    let packages = packages
        .into_iter()
        .map(|(name, mut builder)| {
            builder.classes.sort_by(|a, b| a.name.cmp(&b.name));
            PackageCoverage {
                name: name.to_string(),
                classes: builder.classes,
                source_files: builder.source_files.into_values().collect(),
            }
        })
        .collect();

    Ok(BundleCoverage {
        name: bundle_name.to_string(),
        packages,
    })
}

/// The probe vector recorded for the class, or all-unhit if the session never
/// loaded it. Records whose name differs from the map are a different class
/// that happens to share the id and are ignored.
fn resolve_probes(map: &ProbeMap, store: &ProbeStore) -> Result<Vec<bool>, AnalysisError> {
    match store.get(map.id) {
        Some(data) if data.name == map.name => {
            if data.probes.len() != map.probe_count {
                return Err(AnalysisError::ProbeCountMismatch {
                    class: map.name.clone(),
                    found: data.probes.len(),
                    expected: map.probe_count,
                });
            }
            Ok(data.probes.clone())
        }
        _ => Ok(vec![false; map.probe_count]),
    }
}

/// Recursively loads every probe map below `classes_dir`, sorted by path.
pub fn load_probe_maps(classes_dir: &Path) -> Result<Vec<ProbeMap>, AnalysisError> {
    if !classes_dir.is_dir() {
        return Err(AnalysisError::MissingDirectory(classes_dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    collect_probe_map_paths(classes_dir, &mut paths)?;
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path).map_err(|source| AnalysisError::Read {
                path: path.clone(),
                source,
            })?;
            let map: ProbeMap = serde_json::from_str(&content)
                .map_err(|source| AnalysisError::Malformed { path, source })?;
            map.validate()?;
            Ok(map)
        })
        .collect()
}

fn collect_probe_map_paths(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), AnalysisError> {
    let read_err = |source: io::Error| AnalysisError::Read {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        if entry.file_type().map_err(read_err)?.is_dir() {
            collect_probe_map_paths(&path, paths)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(PROBE_MAP_SUFFIX))
        {
            paths.push(path);
        }
    }
    Ok(())
}
