//! # Internationalization Integration Tests / 国际化集成测试
//!
//! These tests check that the console output follows the language chosen on
//! the command line or in the configuration file.
//!
//! 这些测试检查控制台输出是否遵循命令行或配置文件中选择的语言。

mod common;

use assert_cmd::prelude::*;
use common::{ProjectFixture, class_map, hits, workspace};
use predicates::prelude::*;
use std::fs;
use std::process::Command;

fn setup(root: &std::path::Path) {
    let foo = class_map(1, "demo/Foo", &[("run", 1, 2)]);
    ProjectFixture::new(root, "demo")
        .with_class(&foo)
        .with_sessions(&[("smoke_PASS", vec![hits(&foo, &[1])])]);
}

#[test]
fn test_chinese_from_config_file() {
    let dir = workspace();
    setup(dir.path());
    fs::write(
        dir.path().join("CoverageMatrix.toml"),
        "language = \"zh-CN\"\ngranularity = \"class\"\ninputs = [\"demo\"]\n",
    )
    .unwrap();

    Command::cargo_bin("coverage-matrix")
        .unwrap()
        .current_dir(dir.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("覆盖矩阵摘要"))
        .stdout(predicate::str::contains("覆盖矩阵已写入 coverageMatrix.json"));
}

#[test]
fn test_lang_flag_overrides_config_language() {
    let dir = workspace();
    setup(dir.path());
    fs::write(
        dir.path().join("CoverageMatrix.toml"),
        "language = \"zh-CN\"\ngranularity = \"class\"\ninputs = [\"demo\"]\n",
    )
    .unwrap();

    Command::cargo_bin("coverage-matrix")
        .unwrap()
        .current_dir(dir.path())
        .args(["--lang", "en", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Coverage Matrix Summary"));
}
