//! Generators for redacting `Display` and `Debug` implementations

pub mod error;
pub mod rustfmt;
pub mod template;
pub mod writer;

use obfuscate_core::Shape;

pub use error::{CodegenError, FormatError};
pub use rustfmt::RustFormatter;
pub use template::{RedactCodegen, TemplateVars};
pub use writer::{Artifact, OutputWriter};

/// Common trait for code generators driven by a classified symbol
pub trait Codegen {
    fn generate(&mut self, shape: Shape, vars: &TemplateVars) -> Result<String, CodegenError>;
}
