//! Redacting formatter code generator
//!
//! Generates a module implementing `fmt::Display` and `fmt::Debug` for one
//! type of a compilation unit. Both impls print a run of the mask character
//! instead of the value:
//! - textual newtypes mask with one character per `char` of the value
//! - every other type masks with a fixed-length run

use std::fmt::Write;

use obfuscate_core::naming::receiver_name;
use obfuscate_core::{Shape, Symbol};
use tracing::debug;

use crate::{Codegen, CodegenError};

/// Character repeated in place of the redacted value
pub const REPLACE_BY: char = '*';

/// Mask length used when the value has no textual form to measure
pub const FIXED_MASK_LEN: usize = 10;

/// Parameter name of the generated `fmt` methods
///
/// Longer than any receiver identifier, so the two never collide.
const FORMATTER_ARG: &str = "formatter";

/// Variables substituted into the templates, built once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars {
    /// Crate the type is declared in
    pub unit_name: String,
    /// Module path of the declaration, e.g. `crate::auth`
    pub module_path: String,
    pub type_name: String,
    /// Identifier as written in source, raw prefix included
    pub type_ident: String,
    pub impl_generics: String,
    pub ty_generics: String,
    pub where_clause: String,
    pub receiver_name: String,
    pub replace_by: char,
    pub fixed_mask_len: usize,
}

impl TemplateVars {
    pub fn new(unit_name: &str, symbol: &Symbol) -> Self {
        Self {
            unit_name: unit_name.to_string(),
            module_path: symbol.module_path(),
            type_name: symbol.name.clone(),
            type_ident: symbol.ident.clone(),
            impl_generics: symbol.generics.params.clone(),
            ty_generics: symbol.generics.args.clone(),
            where_clause: symbol.generics.where_clause.clone(),
            receiver_name: receiver_name(&symbol.name),
            replace_by: REPLACE_BY,
            fixed_mask_len: FIXED_MASK_LEN,
        }
    }

    /// String literal of the mask character
    fn mask_literal(&self) -> String {
        format!("{:?}", self.replace_by.to_string())
    }
}

/// Generator for the redacting `Display` and `Debug` impls
#[derive(Debug, Default)]
pub struct RedactCodegen;

impl RedactCodegen {
    pub fn new() -> Self {
        Self
    }

    fn render(&self, shape: Shape, vars: &TemplateVars, out: &mut String) -> std::fmt::Result {
        writeln!(out, "// Code generated by obfuscate. DO NOT EDIT.")?;
        writeln!(
            out,
            "// Source: crate `{}`, module `{}`.",
            vars.unit_name, vars.module_path
        )?;
        writeln!(out)?;
        writeln!(out, "use std::fmt;")?;
        writeln!(out, "use {}::{};", vars.module_path, vars.type_ident)?;

        // Each impl gets its own copy of the masking body.
        writeln!(out)?;
        self.render_impl("Display", shape, vars, out)?;
        writeln!(out)?;
        self.render_impl("Debug", shape, vars, out)?;
        Ok(())
    }

    fn render_impl(
        &self,
        trait_name: &str,
        shape: Shape,
        vars: &TemplateVars,
        out: &mut String,
    ) -> std::fmt::Result {
        let where_clause = if vars.where_clause.is_empty() {
            String::new()
        } else {
            format!(" {}", vars.where_clause)
        };
        writeln!(
            out,
            "impl{} fmt::{} for {}{}{} {{",
            vars.impl_generics, trait_name, vars.type_ident, vars.ty_generics, where_clause
        )?;
        writeln!(
            out,
            "    fn fmt(&self, {}: &mut fmt::Formatter<'_>) -> fmt::Result {{",
            FORMATTER_ARG
        )?;
        self.render_body(shape, vars, out)?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")
    }

    fn render_body(&self, shape: Shape, vars: &TemplateVars, out: &mut String) -> std::fmt::Result {
        match shape {
            Shape::Textual { depth } => {
                let receiver = &vars.receiver_name;
                writeln!(out, "        let {}({}) = self;", vars.type_ident, receiver)?;
                writeln!(
                    out,
                    "        {}.write_str(&{}.repeat({}{}.chars().count()))",
                    FORMATTER_ARG,
                    vars.mask_literal(),
                    receiver,
                    ".0".repeat(depth.saturating_sub(1))
                )
            }
            Shape::Other => {
                // Never read.
                writeln!(out, "        let _{} = self;", vars.receiver_name)?;
                writeln!(
                    out,
                    "        {}.write_str(&{}.repeat({}))",
                    FORMATTER_ARG,
                    vars.mask_literal(),
                    vars.fixed_mask_len
                )
            }
        }
    }
}

impl Codegen for RedactCodegen {
    fn generate(&mut self, shape: Shape, vars: &TemplateVars) -> Result<String, CodegenError> {
        debug!("rendering {:?} template for `{}`", shape, vars.type_name);
        let mut out = String::new();
        self.render(shape, vars, &mut out).map_err(|source| CodegenError::Render {
            type_name: vars.type_name.clone(),
            source,
        })?;
        Ok(out)
    }
}
