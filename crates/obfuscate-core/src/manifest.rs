//! Cargo manifest discovery
//!
//! Reads the `Cargo.toml` of a directory and lists the compilation units
//! (library and binary targets) it declares, including the ones Cargo
//! discovers automatically from the conventional `src/` layout.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ResolveError;
use crate::naming::crate_ident;

pub const MANIFEST_FILE: &str = "Cargo.toml";

#[derive(Debug, Deserialize)]
struct CargoManifest {
    package: Option<PackageSection>,
    lib: Option<TargetSection>,
    #[serde(default)]
    bin: Vec<TargetSection>,
}

#[derive(Debug, Deserialize)]
struct PackageSection {
    name: String,
    /// Either a literal edition or `{ workspace = true }`
    edition: Option<toml::Value>,
    autobins: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct TargetSection {
    name: Option<String>,
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Lib,
    Bin,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Lib => write!(f, "lib"),
            UnitKind::Bin => write!(f, "bin"),
        }
    }
}

/// A compilation unit declared by a manifest, before it is loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTarget {
    /// Crate identifier (`-` replaced by `_`)
    pub name: String,
    pub kind: UnitKind,
    /// Absolute path of the crate root file
    pub root: PathBuf,
    /// Edition when the manifest spells it out literally
    pub edition: Option<String>,
}

impl fmt::Display for UnitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// List every compilation unit the manifest in `dir` declares
///
/// A manifest without a `[package]` section (a virtual workspace root)
/// declares no unit.
pub fn discover_units(dir: &Path) -> Result<Vec<UnitTarget>, ResolveError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Err(ResolveError::ManifestNotFound(dir.to_path_buf()));
    }

    let content = fs::read_to_string(&manifest_path).map_err(|source| ResolveError::Io {
        path: manifest_path.clone(),
        source,
    })?;
    let manifest: CargoManifest =
        toml::from_str(&content).map_err(|e| ResolveError::Manifest {
            path: manifest_path.clone(),
            message: e.to_string(),
        })?;

    let Some(package) = manifest.package else {
        debug!("{} has no [package] section", manifest_path.display());
        return Ok(Vec::new());
    };

    let edition = match &package.edition {
        Some(toml::Value::String(edition)) => Some(edition.clone()),
        _ => None,
    };

    let mut units = Vec::new();
    let mut seen = BTreeSet::new();
    let mut push = |name: &str, kind: UnitKind, root: PathBuf| {
        if seen.insert(root.clone()) {
            units.push(UnitTarget {
                name: crate_ident(name),
                kind,
                root,
                edition: edition.clone(),
            });
        }
    };

    match manifest.lib {
        Some(lib) => {
            let root = dir.join(lib.path.unwrap_or_else(|| PathBuf::from("src/lib.rs")));
            push(lib.name.as_deref().unwrap_or(&package.name), UnitKind::Lib, root);
        }
        None => {
            let root = dir.join("src/lib.rs");
            if root.is_file() {
                push(&package.name, UnitKind::Lib, root);
            }
        }
    }

    let main_rs = dir.join("src/main.rs");
    for bin in manifest.bin {
        let name = bin.name.unwrap_or_else(|| package.name.clone());
        let root = match bin.path {
            Some(path) => dir.join(path),
            None if name == package.name && main_rs.is_file() => main_rs.clone(),
            None => dir.join("src/bin").join(format!("{}.rs", name)),
        };
        push(&name, UnitKind::Bin, root);
    }

    if package.autobins.unwrap_or(true) {
        if main_rs.is_file() {
            push(&package.name, UnitKind::Bin, main_rs);
        }
        for (name, root) in auto_bins(&dir.join("src/bin"))? {
            push(&name, UnitKind::Bin, root);
        }
    }

    debug!(
        "{} declares {} unit(s)",
        manifest_path.display(),
        units.len()
    );
    Ok(units)
}

/// Binaries under `src/bin`: `name.rs` files and `name/main.rs` directories
fn auto_bins(bin_dir: &Path) -> Result<Vec<(String, PathBuf)>, ResolveError> {
    if !bin_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(bin_dir).map_err(|source| ResolveError::Io {
        path: bin_dir.to_path_buf(),
        source,
    })?;

    let mut bins = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "rs") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                bins.push((stem.to_string(), path.clone()));
            }
        } else if path.join("main.rs").is_file() {
            if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                bins.push((name.to_string(), path.join("main.rs")));
            }
        }
    }
    bins.sort();
    Ok(bins)
}
