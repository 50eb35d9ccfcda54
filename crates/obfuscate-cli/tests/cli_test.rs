use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

const MANIFEST: &str = r#"[package]
name = "sample"
version = "0.1.0"
edition = "2021"
"#;

const LIB: &str = r#"mod secrets;

pub use secrets::Token;

pub struct Count(pub u64);
"#;

const SECRETS: &str = r#"pub struct Token(pub String);
"#;

/// Lay out a small library crate in a fresh directory
fn sample_crate() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Cargo.toml"), MANIFEST).unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/lib.rs"), LIB).unwrap();
    fs::write(dir.path().join("src/secrets.rs"), SECRETS).unwrap();
    dir
}

/// Helper to run obfuscate in `dir` with a no-op formatter
fn run_obfuscate(dir: &Path, formatter: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_obfuscate"))
        .args(args)
        .current_dir(dir)
        .env("OBFUSCATE_FORMATTER", formatter)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run obfuscate")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_textual_type_masks_each_character() {
    let dir = sample_crate();
    let output = run_obfuscate(dir.path(), "true", &["Token"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let code = fs::read_to_string(dir.path().join("gen_token_obfuscated.rs")).unwrap();
    assert!(code.starts_with("// Code generated by obfuscate. DO NOT EDIT."));
    assert!(code.contains("use crate::secrets::Token;"));
    assert!(code.contains("impl fmt::Display for Token"));
    assert!(code.contains("impl fmt::Debug for Token"));
    assert_eq!(code.matches("let Token(t) = self;").count(), 2);
    assert!(code.contains(r#"formatter.write_str(&"*".repeat(t.chars().count()))"#));
}

#[test]
fn test_other_type_uses_fixed_mask() {
    let dir = sample_crate();
    let output = run_obfuscate(dir.path(), "true", &["Count"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let code = fs::read_to_string(dir.path().join("gen_count_obfuscated.rs")).unwrap();
    assert_eq!(code.matches("let _c = self;").count(), 2);
    assert_eq!(code.matches(r#"formatter.write_str(&"*".repeat(10))"#).count(), 2);
    assert!(!code.contains("chars()"));
}

#[test]
fn test_qualified_name_resolves() {
    let dir = sample_crate();
    let output = run_obfuscate(dir.path(), "true", &["secrets::Token"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("gen_token_obfuscated.rs").is_file());
}

#[test]
fn test_missing_type_fails_without_artifact() {
    let dir = sample_crate();
    let output = run_obfuscate(dir.path(), "true", &["Missing"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("could not find type `Missing` in crate `sample`"));
    assert!(!dir.path().join("gen_missing_obfuscated.rs").exists());
}

#[test]
fn test_missing_argument_is_usage_error() {
    let dir = sample_crate();
    let output = run_obfuscate(dir.path(), "true", &[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_extra_argument_is_usage_error() {
    let dir = sample_crate();
    let output = run_obfuscate(dir.path(), "true", &["Token", "Count"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(!dir.path().join("gen_token_obfuscated.rs").exists());
}

#[test]
fn test_directory_without_crate_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_obfuscate(dir.path(), "true", &["Token"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("could not load the compilation unit"));
}

#[test]
fn test_rerun_overwrites_artifact() {
    let dir = sample_crate();
    let artifact = dir.path().join("gen_token_obfuscated.rs");
    fs::write(&artifact, "stale").unwrap();

    let output = run_obfuscate(dir.path(), "true", &["Token"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let first = fs::read_to_string(&artifact).unwrap();
    assert!(!first.contains("stale"));

    let output = run_obfuscate(dir.path(), "true", &["Token"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(fs::read_to_string(&artifact).unwrap(), first);
}

#[test]
fn test_regenerates_artifact_declared_as_module() {
    let dir = sample_crate();
    let lib = format!(
        "#[path = \"../gen_token_obfuscated.rs\"]\nmod token_fmt;\n{}",
        LIB
    );
    fs::write(dir.path().join("src/lib.rs"), lib).unwrap();
    let artifact = dir.path().join("gen_token_obfuscated.rs");

    let output = run_obfuscate(dir.path(), "true", &["Token"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("does not exist yet"));
    let first = fs::read_to_string(&artifact).unwrap();

    let output = run_obfuscate(dir.path(), "true", &["Token"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(fs::read_to_string(&artifact).unwrap(), first);
}

#[test]
fn test_formatter_failure_keeps_artifact() {
    let dir = sample_crate();
    let output = run_obfuscate(dir.path(), "false", &["Token"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("could not run `false --emit files --edition 2021"));
    assert!(dir.path().join("gen_token_obfuscated.rs").is_file());
}

#[test]
fn test_unknown_formatter_fails() {
    let dir = sample_crate();
    let output = run_obfuscate(dir.path(), "no-such-formatter-binary", &["Token"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("no-such-formatter-binary"));
}

#[test]
#[ignore = "Requires rustfmt binary"]
fn test_rustfmt_output_is_stable() {
    let dir = sample_crate();
    let output = run_obfuscate(dir.path(), "rustfmt", &["Token"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let artifact = dir.path().join("gen_token_obfuscated.rs");
    let formatted = fs::read_to_string(&artifact).unwrap();
    let status = Command::new("rustfmt")
        .args(["--emit", "files", "--edition", "2021"])
        .arg(&artifact)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(fs::read_to_string(&artifact).unwrap(), formatted);
}
