//! cjsbridge core: static named-export inference for CommonJS modules.
//!
//! Lets an ES module consumer import named bindings from a CommonJS module
//! without executing it. The export set of a CommonJS file is recovered by
//! static analysis ([`ExportResolver`]), following re-export chains
//! transitively with cycle tolerance and per-path memoization, and is then
//! turned into replacement ES module source ([`synth::synthesize`]) exposing
//! one immutable binding per discovered name plus a default binding for the
//! whole exports object.
//!
//! Pieces:
//! - [`manifest`] - package.json lookup (module-format declaration, `main`)
//! - [`classify`] - legacy-vs-ES-module decision per file path
//! - [`specifier`] - `require`-style specifier to file path resolution
//! - [`exports`] - the memoized transitive export-set resolver
//! - [`synth`] - ES module source synthesis
//! - [`loader`] - adapter for a host loader's resolve/format/source hooks

pub mod classify;
pub mod exports;
pub mod loader;
pub mod manifest;
pub mod specifier;
pub mod synth;

pub use classify::{classify, is_analyzable_reexport_target, ModuleFormat, PackageBoundary};
pub use exports::{ExportResolver, ModuleRecord};
pub use loader::{Loader, LoaderError, EXPORT_PROXY_MARKER, ORIGINAL_MARKER};
pub use manifest::{read_manifest, ManifestError, ManifestLookup, PackageManifest};
pub use specifier::{resolve_specifier, SpecifierError};
pub use synth::synthesize;
