use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use obfuscate_core::naming::{artifact_file_name, type_name_of};
use tracing::debug;

use crate::CodegenError;

/// A generated file that has been written and closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
}

/// Writes generated code next to the compilation unit
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the artifact for a bare or module-qualified type name
    pub fn artifact_path(&self, type_name: &str) -> PathBuf {
        self.dir.join(artifact_file_name(type_name_of(type_name)))
    }

    /// Create (or truncate) the artifact for `type_name` and write `code` into it
    pub fn write(&self, type_name: &str, code: &str) -> Result<Artifact, CodegenError> {
        let path = self.artifact_path(type_name);
        let io_err = |source| CodegenError::Write {
            path: path.clone(),
            source,
        };

        let mut file = File::create(&path).map_err(io_err)?;
        debug!("created {}", path.display());

        file.write_all(code.as_bytes()).map_err(io_err)?;
        close(file).map_err(io_err)?;

        Ok(Artifact { path })
    }
}

/// Close `file`, reporting flush and sync failures
fn close(mut file: File) -> std::io::Result<()> {
    file.flush()?;
    file.sync_all()
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }
}
