//! Resolved type symbols

use std::fmt;

use quote::ToTokens;

/// Kind of type item a symbol was declared as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Struct with named fields, several unnamed fields, or no field
    Struct,
    /// Tuple struct with exactly one field
    Newtype,
    Enum,
    Union,
    Alias,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Struct => write!(f, "struct"),
            SymbolKind::Newtype => write!(f, "newtype"),
            SymbolKind::Enum => write!(f, "enum"),
            SymbolKind::Union => write!(f, "union"),
            SymbolKind::Alias => write!(f, "type alias"),
        }
    }
}

/// Fully resolved primitive shape under newtype wrapping and aliases
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Underlying {
    /// A string primitive (`String`, `&str`, `Box<str>`, ...)
    Textual,
    /// Anything else, carrying a printable form of the type
    Opaque(String),
}

/// Where the underlying value sits relative to the symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    /// Number of single-field tuple hops from the symbol to the value
    pub depth: usize,
    pub underlying: Underlying,
}

/// Generic parameters of a symbol, rendered for an `impl` header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImplGenerics {
    /// Parameters with bounds, defaults removed, e.g. `<'a, T: Copy>`
    pub params: String,
    /// Arguments applied to the type, e.g. `<'a, T>`
    pub args: String,
    pub where_clause: String,
}

impl ImplGenerics {
    pub fn from_generics(generics: &syn::Generics) -> Self {
        let (params, args, where_clause) = generics.split_for_impl();
        Self {
            params: params.to_token_stream().to_string(),
            args: args.to_token_stream().to_string(),
            where_clause: where_clause
                .map(|w| w.to_token_stream().to_string())
                .unwrap_or_default(),
        }
    }
}

/// A named type item of a compilation unit
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    /// Identifier as written in source, raw prefix included
    pub ident: String,
    /// Module segments below the crate root
    pub module: Vec<String>,
    pub kind: SymbolKind,
    pub generics: ImplGenerics,
    pub derives_debug: bool,
    pub representation: Representation,
}

impl Symbol {
    /// Module path, e.g. `crate::auth`
    pub fn module_path(&self) -> String {
        std::iter::once("crate")
            .chain(self.module.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("::")
    }

    /// Fully qualified path, e.g. `crate::auth::Token`
    pub fn path(&self) -> String {
        format!("{}::{}", self.module_path(), self.name)
    }
}
