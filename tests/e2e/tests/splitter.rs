//! E2E тесты для CLI инструмента `splitter`.
//!
//! Проверяем разрезание CSV на чанки: нумерацию файлов, повтор
//! заголовка, чтение из stdin и обработку ошибок аргументов.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

/// Получить путь к фикстуре.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

/// Создать команду для запуска splitter.
///
/// `cargo_bin` deprecated из-за edge case с custom build directories,
/// но это единственный способ для кросс-крейтовых бинарников.
#[expect(deprecated)]
fn splitter() -> Command {
    Command::cargo_bin("splitter").unwrap()
}

fn chunk(prefix: &Path, index: usize) -> String {
    fs::read_to_string(format!("{}.{index:04}.csv", prefix.display())).unwrap()
}

#[test]
fn test_split_file_into_chunks() {
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("part");

    splitter()
        .args([
            "--input",
            fixture("accounts_example.csv").to_str().unwrap(),
            "--rows",
            "2",
            "--output-prefix",
            prefix.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Split 5 row(s) into 3 chunk(s)"));

    // Заголовок повторяется в каждом чанке
    let first = chunk(&prefix, 1);
    assert!(first.starts_with("id,name,balance,note"));
    assert!(first.contains("alice"));
    // Закавыченное поле с разделителем переживает разрезание
    assert!(first.contains("\"opened, not funded\""));

    let second = chunk(&prefix, 2);
    assert!(second.starts_with("id,name,balance,note"));
    assert!(second.contains("\"said \"\"later\"\"\""));

    let third = chunk(&prefix, 3);
    assert!(third.contains("erin"));
}

#[test]
fn test_split_from_stdin() {
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("part");

    splitter()
        .args(["--rows", "1", "--output-prefix", prefix.to_str().unwrap()])
        .write_stdin("id,name\n1,a\n2,b\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Split 2 row(s) into 2 chunk(s)"));

    assert!(chunk(&prefix, 1).contains("1,a"));
    assert!(chunk(&prefix, 2).contains("2,b"));
}

#[test]
fn test_split_without_header_flag() {
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("part");

    splitter()
        .args([
            "--rows",
            "1",
            "--no-header",
            "--output-prefix",
            prefix.to_str().unwrap(),
        ])
        .write_stdin("1,a\n2,b\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Split 2 row(s) into 2 chunk(s)"));

    // Без заголовка первая строка — данные
    assert_eq!(chunk(&prefix, 1).lines().count(), 1);
}

#[test]
fn test_custom_delimiter() {
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("part");

    splitter()
        .args([
            "--rows",
            "10",
            "--delimiter",
            ";",
            "--output-prefix",
            prefix.to_str().unwrap(),
        ])
        .write_stdin("id;name\n1;a\n")
        .assert()
        .success();

    assert!(chunk(&prefix, 1).contains("id;name"));
}

#[test]
fn test_zero_rows_is_rejected() {
    splitter()
        .args(["--rows", "0"])
        .write_stdin("id\n1\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--rows must be at least 1"));
}

#[test]
fn test_missing_input_file() {
    splitter()
        .args(["--input", "no_such_file.csv", "--rows", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open input file"));
}

#[test]
fn test_mismatched_row_fails() {
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("part");

    splitter()
        .args(["--rows", "10", "--output-prefix", prefix.to_str().unwrap()])
        .write_stdin("a,b\n1,2\n3\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read row #2"));
}

#[test]
fn test_mismatched_row_tolerated_with_ignore_errors() {
    let dir = tempdir().unwrap();
    let prefix = dir.path().join("part");

    splitter()
        .args([
            "--rows",
            "10",
            "--ignore-errors",
            "--output-prefix",
            prefix.to_str().unwrap(),
        ])
        .write_stdin("a,b\n1,2\n3\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Split 2 row(s) into 1 chunk(s)"));
}
