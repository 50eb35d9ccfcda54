//! Error types for rendering, writing and formatting generated code

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("could not render template for `{type_name}`: {source}")]
    Render {
        type_name: String,
        #[source]
        source: std::fmt::Error,
    },

    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("formatter `{binary}` not found on PATH")]
    NotFound { binary: String },

    #[error("could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not run `{command}`: {status}\n{output}")]
    Failed {
        command: String,
        status: ExitStatus,
        output: String,
    },

    #[error("`{command}` did not finish before the run deadline")]
    Timeout { command: String },
}
