//! Compilation unit loading and type shape analysis for obfuscate

pub mod error;
pub mod manifest;
pub mod naming;
pub mod shape;
pub mod symbol;
pub mod unit;

pub use error::ResolveError;
pub use manifest::{UnitKind, UnitTarget};
pub use shape::{classify, Shape};
pub use symbol::{ImplGenerics, Representation, Symbol, SymbolKind, Underlying};
pub use unit::{CargoUnitLoader, CompilationUnit, UnitLoader};
