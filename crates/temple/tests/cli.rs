//! Integration tests for the `temple` binary.

#![allow(deprecated)] // Command::cargo_bin

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn temple() -> Command {
    let mut cmd = Command::cargo_bin("temple").unwrap();
    for var in ["TEMPLE_CONTENT", "TEMPLE_TEMPLATES", "TEMPLE_OUT", "TEMPLE_STATIC", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

fn project(content: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "content.yml", content);
    write(temp.path(), "templates/page.html", "<h1><%= title %></h1>");
    temp
}

fn build(root: &Path) -> Command {
    let mut cmd = temple();
    cmd.arg("--content")
        .arg(root.join("content.yml"))
        .arg("--templates")
        .arg(root.join("templates"))
        .arg("--out")
        .arg(root.join("out"));
    cmd
}

#[test]
fn test_missing_flags_print_usage() {
    temple()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--content"));
}

#[test]
fn test_build_writes_output() {
    let temp = project("- {$t: page, title: Hi, $path: index.html}\n");

    build(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 file(s)"));

    let index = fs::read_to_string(temp.path().join("out/index.html")).unwrap();
    assert_eq!(index, "<h1>Hi</h1>");
}

#[test]
fn test_flags_from_environment() {
    let temp = project("- {$t: page, title: Env, $path: index.html}\n");
    let root = temp.path();

    temple()
        .env("TEMPLE_CONTENT", root.join("content.yml"))
        .env("TEMPLE_TEMPLATES", root.join("templates"))
        .env("TEMPLE_OUT", root.join("out"))
        .assert()
        .success();

    assert!(root.join("out/index.html").exists());
}

#[test]
fn test_static_files_are_copied() {
    let temp = project("- {$t: page, title: Hi, $path: index.html}\n");
    let root = temp.path();
    write(root, "static/img/logo.svg", "<svg/>");

    build(root)
        .arg("--static")
        .arg(root.join("static"))
        .assert()
        .success();

    assert_eq!(fs::read_to_string(root.join("out/img/logo.svg")).unwrap(), "<svg/>");
}

#[test]
fn test_node_errors_do_not_fail_by_default() {
    let temp = project("- {$t: nope, $path: a.html}\n- {$t: page, title: Ok, $path: b.html}\n");

    build(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("1 node(s) failed to render"));

    assert!(temp.path().join("out/b.html").exists());
}

#[test]
fn test_strict_fails_on_node_errors() {
    let temp = project("- {$t: nope, $path: a.html}\n");

    build(temp.path()).arg("--strict").assert().code(1);
}

#[test]
fn test_missing_content_is_fatal() {
    let temp = project("");
    fs::remove_file(temp.path().join("content.yml")).unwrap();

    build(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("content file not found"));
}

#[test]
fn test_unparsable_content_is_fatal() {
    let temp = project("- {$t: page\n");

    build(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("content error"));
}

#[test]
fn test_quiet_suppresses_summary() {
    let temp = project("- {$t: page, title: Hi, $path: index.html}\n");

    build(temp.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
