use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no Cargo.toml found in {0}")]
    ManifestNotFound(PathBuf),

    #[error("invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("expecting exactly one compilation unit, found {found}: [{}]", .units.join(", "))]
    UnitCount { found: usize, units: Vec<String> },

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {}:{line}:{column}: {message}", .file.display())]
    Parse {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("file for module `{module}` not found, tried {}", .tried.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    ModuleNotFound { module: String, tried: Vec<PathBuf> },

    #[error("could not find type `{name}` in crate `{unit}`")]
    NotFound { name: String, unit: String },

    #[error("type `{name}` is ambiguous in crate `{unit}`, candidates: {}", .candidates.join(", "))]
    Ambiguous {
        name: String,
        unit: String,
        candidates: Vec<String>,
    },

    #[error("`{path}` is a type alias; formatting traits can only be implemented for structs, enums and unions")]
    NotNominal { path: String },

    #[error("loading the compilation unit did not finish within {0:?}")]
    Timeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}
