//! Module format classification.
//!
//! Decides whether a file must be treated as legacy CommonJS. `.cjs` always
//! is; `.js` is ambiguous and is decided by the nearest enclosing
//! package.json, found by walking parent directories. The walk stops early at
//! a `node_modules` boundary (installed dependencies default to CommonJS) and
//! treats unreadable or malformed manifests as absent. The default is
//! deliberately conservative: CommonJS unless a manifest proves otherwise,
//! trading an unnecessary reparse of the odd ES `.js` file for never
//! misloading the far more common legacy case.

use crate::manifest::{read_manifest, ManifestError, ManifestLookup, PackageManifest};
use std::path::Path;
use tracing::trace;

/// The two module formats the host distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    /// Legacy format: exports assigned imperatively at run time
    CommonJs,
    /// Static format: exports declared syntactically
    EsModule,
}

/// Outcome of the ancestor walk for a file's package boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageBoundary {
    /// Nearest readable manifest
    Found(PackageManifest),
    /// Walk hit a `node_modules` directory before any manifest
    BoundaryReached,
    /// Walk ran out of ancestors without finding a manifest
    WalkExhausted,
}

/// Find the package boundary governing `file` by walking its ancestor
/// directories from the innermost outward.
pub fn package_boundary(file: &Path) -> Result<PackageBoundary, ManifestError> {
    let mut dir = file.parent();
    while let Some(current) = dir {
        if current.file_name().is_some_and(|name| name == "node_modules") {
            trace!(dir = %current.display(), "package walk reached dependency boundary");
            return Ok(PackageBoundary::BoundaryReached);
        }
        match read_manifest(current)? {
            ManifestLookup::Found(manifest) => return Ok(PackageBoundary::Found(manifest)),
            ManifestLookup::NotFound => {}
        }
        dir = current.parent();
    }
    Ok(PackageBoundary::WalkExhausted)
}

/// Classify a file path as CommonJS or ES module.
///
/// Only `.cjs` and `.js` files can be legacy; `.js` consults the package
/// boundary and defaults to CommonJS when no manifest claims otherwise.
/// Every other extension is already statically loadable (or not a module at
/// all) and is never proxied.
pub fn classify(path: &Path) -> Result<ModuleFormat, ManifestError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("cjs") => Ok(ModuleFormat::CommonJs),
        Some("js") => match package_boundary(path)? {
            PackageBoundary::Found(manifest) if manifest.declares_es_modules() => {
                Ok(ModuleFormat::EsModule)
            }
            _ => Ok(ModuleFormat::CommonJs),
        },
        _ => Ok(ModuleFormat::EsModule),
    }
}

/// Gating rule for re-export recursion: may a resolved re-export target
/// contribute names to the aggregate export set?
///
/// Targets that are definitively non-legacy (`.mjs`) or non-analyzable
/// (`.json` data, `.node` native addons) never propagate names. Anything
/// else, including extensionless files, is fair game for further
/// aggregation.
pub fn is_analyzable_reexport_target(path: &Path) -> bool {
    !matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("mjs") | Some("json") | Some("node")
    )
}
