//! rustfmt wrapper
//!
//! Runs the formatter in place on a generated file, which also sorts and
//! merges its `use` declarations.

use std::ffi::OsString;
use std::path::Path;

use tokio::process::Command;
use tokio::time::Instant;
use tracing::debug;

use crate::error::FormatError;

pub const DEFAULT_FORMATTER: &str = "rustfmt";

#[derive(Debug, Clone)]
pub struct RustFormatter {
    binary: String,
    edition: Option<String>,
}

impl RustFormatter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            edition: None,
        }
    }

    /// Edition to format with, as declared by the unit's manifest
    pub fn with_edition(mut self, edition: Option<String>) -> Self {
        self.edition = edition;
        self
    }

    fn args(&self, file: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--emit".into(), "files".into()];
        if let Some(edition) = &self.edition {
            args.push("--edition".into());
            args.push(edition.into());
        }
        args.push(file.as_os_str().to_os_string());
        args
    }

    /// Command line as shown in diagnostics
    pub fn command_line(&self, file: &Path) -> String {
        std::iter::once(self.binary.clone())
            .chain(
                self.args(file)
                    .iter()
                    .map(|a| a.to_string_lossy().into_owned()),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Format `file` in place, giving up at `deadline`
    pub async fn format(&self, file: &Path, deadline: Instant) -> Result<(), FormatError> {
        let command = self.command_line(file);
        let binary = which::which(&self.binary).map_err(|_| FormatError::NotFound {
            binary: self.binary.clone(),
        })?;
        debug!("running {}", command);

        let run = Command::new(&binary)
            .args(self.args(file))
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout_at(deadline, run).await {
            Ok(result) => result.map_err(|source| FormatError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => return Err(FormatError::Timeout { command }),
        };

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(FormatError::Failed {
                command,
                status: output.status,
                output: combined,
            });
        }

        Ok(())
    }
}

impl Default for RustFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_FORMATTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[test]
    fn test_command_line() {
        let formatter = RustFormatter::default().with_edition(Some("2021".to_string()));
        assert_eq!(
            formatter.command_line(Path::new("gen_token_obfuscated.rs")),
            "rustfmt --emit files --edition 2021 gen_token_obfuscated.rs"
        );
        assert_eq!(
            RustFormatter::default().command_line(Path::new("a.rs")),
            "rustfmt --emit files a.rs"
        );
    }

    #[tokio::test]
    async fn test_missing_formatter() {
        let formatter = RustFormatter::new("definitely-not-a-formatter-binary");
        let err = formatter
            .format(Path::new("a.rs"), deadline())
            .await
            .unwrap_err();
        assert!(matches!(err, FormatError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failing_formatter_reports_command() {
        let formatter = RustFormatter::new("false");
        let err = formatter
            .format(Path::new("a.rs"), deadline())
            .await
            .unwrap_err();
        match err {
            FormatError::Failed { command, status, .. } => {
                assert_eq!(command, "false --emit files a.rs");
                assert!(!status.success());
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_formatter_is_killed_at_deadline() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("finished");
        let script = dir.path().join("slow-formatter");
        fs::write(
            &script,
            format!("#!/bin/sh\nsleep 1\ntouch '{}'\n", marker.display()),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let formatter = RustFormatter::new(script.to_string_lossy());
        let started = Instant::now();
        let err = formatter
            .format(Path::new("a.rs"), started + Duration::from_millis(100))
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_millis(900));
        match err {
            FormatError::Timeout { command } => {
                assert!(command.ends_with("slow-formatter --emit files a.rs"))
            }
            other => panic!("expected Timeout, got {:?}", other),
        }

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    #[ignore = "Requires rustfmt binary"]
    async fn test_rustfmt_sorts_imports() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gen_token_obfuscated.rs");
        fs::write(&file, "use std::fmt;\nuse crate::Token;\nimpl fmt::Display for Token{fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(\"*\") }}\n").unwrap();

        RustFormatter::default()
            .with_edition(Some("2021".to_string()))
            .format(&file, deadline())
            .await
            .unwrap();

        let formatted = fs::read_to_string(&file).unwrap();
        assert!(formatted.contains("use crate::Token;\n"));
        assert!(formatted.contains("use std::fmt;\n"));
        assert!(formatted.contains("impl fmt::Display for Token {\n"));
    }
}
