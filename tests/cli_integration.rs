//! CLI integration tests for smelter.
//!
//! These tests drive the binary against declarations written to a
//! temporary directory, the way a packager would use it.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the smelter binary command.
fn smelter() -> Command {
    Command::cargo_bin("smelter").unwrap()
}

/// Write a file into the test directory and return its path.
fn write(tmp: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = tmp.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

const ZLIB: &str = r#"
[package]
name = "zlib"
version = "1.3.1"
build = "autotools"
url = "https://zlib.net/zlib-1.3.1.tar.xz"
sha256 = "38ef96b8dfe510d42707d9c781877914792541133e1870841463bfa73f883e32"
iuse = ["static", "ima"]
use_defaults = ["static"]
transforms = ["strip", "stamp"]

[use_args]
static = ["--static"]
"-static" = ["--shared"]

[[use_transforms]]
flag = "ima"
transform = "sign"
"#;

// ============================================================================
// smelter flags
// ============================================================================

#[test]
fn test_flags_defaults_only() {
    let tmp = TempDir::new().unwrap();
    let pkg = write(&tmp, "package.toml", ZLIB);

    smelter()
        .arg("flags")
        .arg(&pkg)
        .assert()
        .success()
        .stdout(predicate::str::contains("static"))
        .stdout(predicate::str::contains("ima").not());
}

#[test]
fn test_flags_profile_overrides() {
    let tmp = TempDir::new().unwrap();
    let pkg = write(&tmp, "package.toml", ZLIB);
    let profile = write(
        &tmp,
        "profile.toml",
        "[use]\nima = true\n\n[use.zlib]\nstatic = false\n",
    );

    smelter()
        .arg("flags")
        .arg(&pkg)
        .arg("--profile")
        .arg(&profile)
        .assert()
        .success()
        .stdout(predicate::str::contains("ima"))
        .stdout(predicate::str::contains("static").not());
}

// ============================================================================
// smelter chain
// ============================================================================

#[test]
fn test_chain_without_ima_aliases_stamp() {
    let tmp = TempDir::new().unwrap();
    let pkg = write(&tmp, "package.toml", ZLIB);

    smelter()
        .arg("chain")
        .arg(&pkg)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"alias\": \"stamp\""))
        .stdout(predicate::str::contains("sign").not());
}

#[test]
fn test_chain_with_ima_appends_sign() {
    let tmp = TempDir::new().unwrap();
    let pkg = write(&tmp, "package.toml", ZLIB);
    let profile = write(&tmp, "profile.toml", "[use]\nima = true\n");

    smelter()
        .arg("chain")
        .arg(&pkg)
        .arg("--profile")
        .arg(&profile)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"alias\": \"sign\""))
        .stdout(predicate::str::contains("\"input\": \"stamp\""));
}

// ============================================================================
// smelter resolve
// ============================================================================

#[test]
fn test_resolve_emits_snapshot_json() {
    let tmp = TempDir::new().unwrap();
    let pkg = write(&tmp, "package.toml", ZLIB);

    smelter()
        .args(["resolve"])
        .arg(&pkg)
        .args(["--set", "bootstrap=seed", "--set", "arch=x86_64"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"identity\""))
        .stdout(predicate::str::contains("\"bootstrap\": \"seed\""))
        .stdout(predicate::str::contains("--enable-static"));
}

#[test]
fn test_resolve_applies_transition() {
    let tmp = TempDir::new().unwrap();
    let pkg = write(&tmp, "package.toml", ZLIB);

    smelter()
        .args(["resolve"])
        .arg(&pkg)
        .args(["--set", "bootstrap=stage2", "--transition", "default"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bootstrap\": \"seed\""));
}

#[test]
fn test_resolve_rejects_conflicting_set() {
    let tmp = TempDir::new().unwrap();
    let pkg = write(&tmp, "package.toml", ZLIB);

    smelter()
        .args(["resolve"])
        .arg(&pkg)
        .args(["--set", "bootstrap=seed", "--set", "bootstrap=stage3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("conflicting"));
}

#[test]
fn test_resolve_rejects_unknown_transition() {
    let tmp = TempDir::new().unwrap();
    let pkg = write(&tmp, "package.toml", ZLIB);

    smelter()
        .args(["resolve"])
        .arg(&pkg)
        .args(["--transition", "warp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown transition"));
}

// ============================================================================
// declaration validation
// ============================================================================

#[test]
fn test_incomplete_declaration_rejected() {
    let tmp = TempDir::new().unwrap();
    let pkg = write(
        &tmp,
        "package.toml",
        r#"
[package]
name = "curl"
version = "8.9.0"
build = "autotools"
url = "https://curl.se/download/curl-8.9.0.tar.xz"
"#,
    );

    smelter()
        .arg("flags")
        .arg(&pkg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("sha256"));
}

#[test]
fn test_undeclared_flag_in_map_rejected() {
    let tmp = TempDir::new().unwrap();
    let pkg = write(
        &tmp,
        "package.toml",
        r#"
[package]
name = "curl"
version = "8.9.0"
build = "autotools"
local_only = true

[use_deps]
http3 = ["quiche"]
"#,
    );

    smelter()
        .args(["resolve"])
        .arg(&pkg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("http3"));
}
