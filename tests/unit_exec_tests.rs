//! # Execution Data Reader Tests / 执行数据读取器测试
//!
//! Tests for decoding `jacoco.exec` files through the public reader API.
//!
//! 通过公共读取器 API 解码 `jacoco.exec` 文件的测试。

mod common;

use common::{class_map, hits, workspace, write_exec_file};
use coverage_matrix::core::session::SessionVisitor;
use coverage_matrix::infra::exec::{DecodeError, ExecFileReader, ExecutionRecordSource};
use std::fs::{self, OpenOptions};
use std::io::Write;

#[test]
fn missing_file_is_an_open_error() {
    let dir = workspace();
    let mut visitor = SessionVisitor::new();
    let err = ExecFileReader
        .read_records(&dir.path().join("jacoco.exec"), &mut visitor)
        .unwrap_err();
    assert!(matches!(err, DecodeError::Open { .. }));
}

#[test]
fn appended_dumps_are_read_as_one_stream() {
    let dir = workspace();
    let path = dir.path().join("jacoco.exec");
    let map = class_map(7, "p/A", &[("m", 1, 3)]);

    write_exec_file(&path, &[("t1_PASS", vec![hits(&map, &[0])])]);
    let first = fs::read(&path).unwrap();

    let second_path = dir.path().join("second.exec");
    write_exec_file(
        &second_path,
        &[
            ("t1_PASS", vec![hits(&map, &[2])]),
            ("t2_FAIL", vec![hits(&map, &[1])]),
        ],
    );
    let second = fs::read(&second_path).unwrap();
    OpenOptions::new()
        .append(true)
        .open(&path)
        .unwrap()
        .write_all(&second)
        .unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len() as usize, first.len() + second.len());

    let mut visitor = SessionVisitor::new();
    ExecFileReader.read_records(&path, &mut visitor).unwrap();
    let sessions = visitor.into_sessions();

    assert_eq!(sessions.len(), 2);
    let t1 = sessions.get("t1_PASS").unwrap();
    assert_eq!(t1.store.get(7).unwrap().probes, vec![true, false, true]);
    let t2 = sessions.get("t2_FAIL").unwrap();
    assert_eq!(t2.store.get(7).unwrap().probes, vec![false, true, false]);
}

#[test]
fn truncated_file_is_rejected() {
    let dir = workspace();
    let path = dir.path().join("jacoco.exec");
    let map = class_map(7, "p/A", &[("m", 1, 3)]);
    write_exec_file(&path, &[("t1_PASS", vec![hits(&map, &[0])])]);

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

    let mut visitor = SessionVisitor::new();
    let err = ExecFileReader.read_records(&path, &mut visitor).unwrap_err();
    assert!(matches!(err, DecodeError::Truncated));
}

#[test]
fn non_exec_file_is_rejected() {
    let dir = workspace();
    let path = dir.path().join("jacoco.exec");
    fs::write(&path, b"<html>not coverage</html>").unwrap();

    let mut visitor = SessionVisitor::new();
    let err = ExecFileReader.read_records(&path, &mut visitor).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidFormat));
}
