use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use quote::ToTokens;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{Attribute, Fields, Item, Token, Type};
use tracing::{debug, trace, warn};

use crate::error::ResolveError;
use crate::manifest::{discover_units, UnitKind, UnitTarget};
use crate::naming::is_artifact_file_name;
use crate::shape::is_textual_type;
use crate::symbol::{ImplGenerics, Representation, Symbol, SymbolKind, Underlying};

/// Limit on alias and newtype hops followed while resolving a representation
const MAX_RESOLVE_DEPTH: usize = 32;

/// Capability that produces the compilation unit of the ambient context
pub trait UnitLoader: Send + Sync {
    fn load(&self) -> Result<CompilationUnit, ResolveError>;
}

/// Loads the single Cargo target of the package in a directory
#[derive(Debug, Clone)]
pub struct CargoUnitLoader {
    dir: PathBuf,
}

impl CargoUnitLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl UnitLoader for CargoUnitLoader {
    fn load(&self) -> Result<CompilationUnit, ResolveError> {
        let mut units = discover_units(&self.dir)?;
        if units.len() != 1 {
            return Err(ResolveError::UnitCount {
                found: units.len(),
                units: units.iter().map(|u| u.to_string()).collect(),
            });
        }
        let target = units.remove(0);
        CompilationUnit::load(target)
    }
}

/// A loaded compilation unit with its symbol table
///
/// This is built in two phases: every type item reachable from the crate
/// root is registered first, then the representation of each symbol is
/// resolved against the complete table.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub target: UnitTarget,
    symbols: Vec<Symbol>,
}

/// How a symbol was declared, kept until representations are resolved
#[derive(Debug, Clone)]
enum Definition {
    Newtype(Type),
    Alias(Type),
    Opaque,
}

#[derive(Debug, Clone)]
struct RawSymbol {
    symbol: Symbol,
    definition: Definition,
}

/// Directories a module body resolves its children against
#[derive(Debug, Clone)]
struct ModuleScope {
    module: Vec<String>,
    /// Where `mod child;` looks for `child.rs` and `child/mod.rs`
    child_dir: PathBuf,
    /// Base of `#[path = "..."]` attributes
    path_base: PathBuf,
}

impl CompilationUnit {
    /// Load a target by parsing its root and every reachable module file
    pub fn load(target: UnitTarget) -> Result<Self, ResolveError> {
        debug!("loading {} from {}", target, target.root.display());

        let parent = target
            .root
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let scope = ModuleScope {
            module: Vec::new(),
            child_dir: parent.clone(),
            path_base: parent,
        };

        let mut collector = Collector::default();
        collector.load_file(&target.root, scope)?;
        Ok(Self::from_raw(target, collector.symbols))
    }

    /// Build a unit from a single in-memory crate root
    ///
    /// Out-of-line `mod name;` declarations are not followed.
    pub fn from_source(name: &str, source: &str) -> Result<Self, ResolveError> {
        let target = UnitTarget {
            name: name.to_string(),
            kind: UnitKind::Lib,
            root: PathBuf::from("lib.rs"),
            edition: None,
        };
        let file = parse_source(&target.root, source)?;

        let mut collector = Collector {
            follow_files: false,
            ..Collector::default()
        };
        collector.walk_items(
            &file.items,
            &ModuleScope {
                module: Vec::new(),
                child_dir: PathBuf::new(),
                path_base: PathBuf::new(),
            },
        )?;
        Ok(Self::from_raw(target, collector.symbols))
    }

    fn from_raw(target: UnitTarget, raw: Vec<RawSymbol>) -> Self {
        let representations: Vec<Representation> = raw
            .iter()
            .map(|entry| resolve_representation(&raw, entry))
            .collect();

        let symbols: Vec<Symbol> = raw
            .into_iter()
            .zip(representations)
            .map(|(entry, representation)| Symbol {
                representation,
                ..entry.symbol
            })
            .collect();

        debug!("crate `{}` declares {} type(s)", target.name, symbols.len());
        Self { target, symbols }
    }

    pub fn name(&self) -> &str {
        &self.target.name
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Look up a type by bare name or module-qualified path
    ///
    /// Accepted forms are `Token`, `auth::Token` and `crate::auth::Token`.
    pub fn lookup(&self, name: &str) -> Result<&Symbol, ResolveError> {
        let mut segments: Vec<&str> = name.split("::").map(str::trim).collect();
        if segments.first() == Some(&"crate") {
            segments.remove(0);
        }
        let Some((type_name, module)) = segments.split_last() else {
            return Err(self.not_found(name));
        };

        let qualified = name.contains("::");
        let matches: Vec<&Symbol> = self
            .symbols
            .iter()
            .filter(|s| s.name == *type_name)
            .filter(|s| !qualified || s.module == module)
            .collect();

        match matches.as_slice() {
            [] => Err(self.not_found(name)),
            [symbol] => Ok(*symbol),
            candidates => Err(ResolveError::Ambiguous {
                name: name.to_string(),
                unit: self.target.name.clone(),
                candidates: candidates.iter().map(|s| s.path()).collect(),
            }),
        }
    }

    /// Look up a type that generated trait impls can target
    pub fn resolve(&self, name: &str) -> Result<&Symbol, ResolveError> {
        let symbol = self.lookup(name)?;
        if symbol.kind == SymbolKind::Alias {
            return Err(ResolveError::NotNominal {
                path: symbol.path(),
            });
        }
        if symbol.derives_debug {
            warn!(
                "`{}` already derives Debug; the generated impl will conflict with it",
                symbol.path()
            );
        }
        debug!(
            "resolved `{}` as {} with representation {:?}",
            symbol.path(),
            symbol.kind,
            symbol.representation
        );
        Ok(symbol)
    }

    fn not_found(&self, name: &str) -> ResolveError {
        ResolveError::NotFound {
            name: name.to_string(),
            unit: self.target.name.clone(),
        }
    }
}

#[derive(Debug)]
struct Collector {
    symbols: Vec<RawSymbol>,
    visited: HashSet<PathBuf>,
    follow_files: bool,
}

impl Default for Collector {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            visited: HashSet::new(),
            follow_files: true,
        }
    }
}

impl Collector {
    fn load_file(&mut self, path: &Path, scope: ModuleScope) -> Result<(), ResolveError> {
        if !self.visited.insert(path.to_path_buf()) {
            trace!("{} already loaded", path.display());
            return Ok(());
        }

        let source = fs::read_to_string(path).map_err(|source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = parse_source(path, &source)?;
        trace!("parsed {} ({} items)", path.display(), file.items.len());

        self.walk_items(&file.items, &scope)
    }

    fn walk_items(&mut self, items: &[Item], scope: &ModuleScope) -> Result<(), ResolveError> {
        for item in items {
            match item {
                Item::Struct(item) => {
                    let (kind, definition) = match &item.fields {
                        Fields::Unnamed(fields) if fields.unnamed.len() == 1 => (
                            SymbolKind::Newtype,
                            Definition::Newtype(fields.unnamed[0].ty.clone()),
                        ),
                        _ => (SymbolKind::Struct, Definition::Opaque),
                    };
                    self.register(
                        &item.ident,
                        &item.attrs,
                        &item.generics,
                        kind,
                        definition,
                        scope,
                    );
                }
                Item::Enum(item) => self.register(
                    &item.ident,
                    &item.attrs,
                    &item.generics,
                    SymbolKind::Enum,
                    Definition::Opaque,
                    scope,
                ),
                Item::Union(item) => self.register(
                    &item.ident,
                    &item.attrs,
                    &item.generics,
                    SymbolKind::Union,
                    Definition::Opaque,
                    scope,
                ),
                Item::Type(item) => self.register(
                    &item.ident,
                    &item.attrs,
                    &item.generics,
                    SymbolKind::Alias,
                    Definition::Alias((*item.ty).clone()),
                    scope,
                ),
                Item::Mod(item) => self.walk_module(item, scope)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn walk_module(&mut self, item: &syn::ItemMod, scope: &ModuleScope) -> Result<(), ResolveError> {
        let name = item.ident.unraw().to_string();
        let mut module = scope.module.clone();
        module.push(name.clone());

        if let Some((_, items)) = &item.content {
            let dir = scope.child_dir.join(&name);
            return self.walk_items(
                items,
                &ModuleScope {
                    module,
                    child_dir: dir.clone(),
                    path_base: dir,
                },
            );
        }

        if !self.follow_files {
            debug!("not following out-of-line module `{}`", module.join("::"));
            return Ok(());
        }

        let candidates = match path_attribute(&item.attrs) {
            Some(path) => vec![scope.path_base.join(path)],
            None => vec![
                scope.child_dir.join(format!("{}.rs", name)),
                scope.child_dir.join(&name).join("mod.rs"),
            ],
        };

        let Some(found) = candidates.iter().find(|p| p.is_file()) else {
            if is_cfg_gated(&item.attrs) {
                debug!(
                    "skipping cfg-gated module `{}` without a file",
                    module.join("::")
                );
                return Ok(());
            }
            if candidates.iter().any(|p| is_artifact_path(p)) {
                warn!(
                    "skipping module `{}`: generated file {} does not exist yet",
                    module.join("::"),
                    candidates[0].display()
                );
                return Ok(());
            }
            return Err(ResolveError::ModuleNotFound {
                module: module.join("::"),
                tried: candidates,
            });
        };

        let parent = found.parent().map(Path::to_path_buf).unwrap_or_default();
        let is_mod_rs = found.file_name().is_some_and(|f| f == "mod.rs");
        let child_dir = if is_mod_rs || path_attribute(&item.attrs).is_some() {
            parent.clone()
        } else {
            parent.join(&name)
        };

        self.load_file(
            found,
            ModuleScope {
                module,
                child_dir,
                path_base: parent,
            },
        )
    }

    fn register(
        &mut self,
        ident: &syn::Ident,
        attrs: &[Attribute],
        generics: &syn::Generics,
        kind: SymbolKind,
        definition: Definition,
        scope: &ModuleScope,
    ) {
        let symbol = Symbol {
            name: ident.unraw().to_string(),
            ident: ident.to_string(),
            module: scope.module.clone(),
            kind,
            generics: ImplGenerics::from_generics(generics),
            derives_debug: derives(attrs, "Debug"),
            representation: Representation {
                depth: 0,
                underlying: Underlying::Opaque(kind.to_string()),
            },
        };
        trace!("registered {} `{}`", kind, symbol.path());
        self.symbols.push(RawSymbol { symbol, definition });
    }
}

fn parse_source(path: &Path, source: &str) -> Result<syn::File, ResolveError> {
    syn::parse_file(source).map_err(|e| {
        let start = e.span().start();
        ResolveError::Parse {
            file: path.to_path_buf(),
            line: start.line,
            column: start.column + 1,
            message: e.to_string(),
        }
    })
}

fn path_attribute(attrs: &[Attribute]) -> Option<String> {
    attrs.iter().find_map(|attr| {
        if !attr.path().is_ident("path") {
            return None;
        }
        match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        }
    })
}

fn is_artifact_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(is_artifact_file_name)
}

fn is_cfg_gated(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("cfg"))
}

fn derives(attrs: &[Attribute], trait_name: &str) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("derive"))
        .filter_map(|attr| {
            attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
                .ok()
        })
        .flatten()
        .any(|path| {
            path.segments
                .last()
                .is_some_and(|segment| segment.ident == trait_name)
        })
}

fn resolve_representation(table: &[RawSymbol], entry: &RawSymbol) -> Representation {
    let module = &entry.symbol.module;
    match &entry.definition {
        Definition::Newtype(ty) => resolve_type(table, ty, module, 1, MAX_RESOLVE_DEPTH),
        Definition::Alias(ty) => resolve_type(table, ty, module, 0, MAX_RESOLVE_DEPTH),
        Definition::Opaque => entry.symbol.representation.clone(),
    }
}

fn resolve_type(
    table: &[RawSymbol],
    ty: &Type,
    module: &[String],
    depth: usize,
    budget: usize,
) -> Representation {
    let opaque = |ty: &Type| Representation {
        depth,
        underlying: Underlying::Opaque(ty.to_token_stream().to_string()),
    };

    if budget == 0 {
        return opaque(ty);
    }
    if is_textual_type(ty) {
        return Representation {
            depth,
            underlying: Underlying::Textual,
        };
    }

    match ty {
        Type::Paren(paren) => resolve_type(table, &paren.elem, module, depth, budget - 1),
        Type::Group(group) => resolve_type(table, &group.elem, module, depth, budget - 1),
        Type::Path(type_path) if type_path.qself.is_none() => {
            let Some(referenced) = find_referenced(table, &type_path.path, module) else {
                return opaque(ty);
            };
            let next_module = &referenced.symbol.module;
            match &referenced.definition {
                Definition::Alias(inner) => {
                    resolve_type(table, inner, next_module, depth, budget - 1)
                }
                Definition::Newtype(inner) => {
                    resolve_type(table, inner, next_module, depth + 1, budget - 1)
                }
                Definition::Opaque => opaque(ty),
            }
        }
        _ => opaque(ty),
    }
}

/// Find the unit symbol a path in `module` refers to
///
/// Relative single-segment names prefer the current module and otherwise
/// fall back to a unique declaration anywhere in the unit, which covers
/// names brought in by `use` without resolving imports.
fn find_referenced<'a>(
    table: &'a [RawSymbol],
    path: &syn::Path,
    module: &[String],
) -> Option<&'a RawSymbol> {
    let segments: Vec<String> = path
        .segments
        .iter()
        .map(|s| s.ident.unraw().to_string())
        .collect();
    let (name, prefix) = segments.split_last()?;

    let target_module: Vec<String> = match prefix.first().map(String::as_str) {
        Some("crate") => prefix[1..].to_vec(),
        Some("self") => module.iter().chain(&prefix[1..]).cloned().collect(),
        Some("super") => {
            let ups = prefix.iter().take_while(|s| *s == "super").count();
            let mut base = module[..module.len().saturating_sub(ups)].to_vec();
            base.extend(prefix[ups..].iter().cloned());
            base
        }
        Some(_) => module.iter().chain(prefix).cloned().collect(),
        None => module.to_vec(),
    };

    let exact = table
        .iter()
        .find(|entry| entry.symbol.name == *name && entry.symbol.module == target_module);
    if exact.is_some() || !prefix.is_empty() {
        return exact;
    }

    let mut by_name = table.iter().filter(|entry| entry.symbol.name == *name);
    match (by_name.next(), by_name.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}
