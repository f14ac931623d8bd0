//! The export-set resolver.
//!
//! Computes, for a CommonJS file, the transitive closure of export names
//! reachable through its re-export chain. Results are memoized per absolute
//! path for the lifetime of the resolver (module source is assumed stable
//! within one host process). Cycle safety comes from inserting the partial
//! record into the cache *before* recursing: a chain that loops back observes
//! the names discovered so far instead of recursing forever.
//!
//! Every expected failure degrades to "contributes no names": an unreadable
//! file, unparseable source, or unresolvable specifier never aborts
//! resolution of the rest of the graph. The affected module simply appears to
//! export nothing beyond its default binding.

use crate::classify::is_analyzable_reexport_target;
use crate::specifier::resolve_specifier;
use cjsbridge_lexer::{parse_exports, ModuleExports};
use dashmap::DashMap;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Cached analysis result for one module file.
///
/// Written once per path and never evicted; even a degraded empty record
/// (unreadable file) is kept so the read is never retried.
#[derive(Debug, Clone, Default)]
pub struct ModuleRecord {
    /// Raw source text, absent if the file could not be read
    pub source: Option<String>,
    /// Discovered export names, in discovery order
    pub exports: IndexSet<String>,
}

/// Memoizing transitive export-name resolver.
///
/// One instance per host process; shared by reference across concurrent
/// loads. The cache is a concurrent map so unrelated paths populate without
/// contention. Two racing resolutions of the same fresh path may both do the
/// extraction work; extraction is a pure read, so the duplicate result is
/// identical and the last write wins.
#[derive(Debug, Default)]
pub struct ExportResolver {
    cache: DashMap<PathBuf, ModuleRecord>,
}

impl ExportResolver {
    /// Create a resolver with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the complete export-name set for the module at `path`,
    /// following re-export chains transitively.
    pub fn resolve(&self, path: &Path) -> IndexSet<String> {
        // Cache keys are canonical so every spelling of a path (and every
        // cycle back-edge) lands on the same record.
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if let Some(record) = self.cache.get(&path) {
            trace!(path = %path.display(), "export set cache hit");
            return record.exports.clone();
        }

        let source = match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(err) => {
                debug!(path = %path.display(), %err, "unreadable module exports nothing");
                None
            }
        };

        let facts = match source.as_deref().map(parse_exports) {
            Some(Ok(facts)) => facts,
            Some(Err(err)) => {
                debug!(path = %path.display(), %err, "unparseable module exports nothing");
                ModuleExports::default()
            }
            None => ModuleExports::default(),
        };

        let mut names: IndexSet<String> = facts.exports.into_iter().collect();

        // Cache the partial record before recursing into re-exports. This is
        // the cycle-breaking step: a chain looping back to this path hits the
        // cache above and sees at least the direct names. Names a peer adds
        // after that read are not propagated back to it; no fixed-point pass.
        self.cache.insert(
            path.clone(),
            ModuleRecord {
                source,
                exports: names.clone(),
            },
        );

        for specifier in &facts.reexports {
            let target = match resolve_specifier(specifier, &path) {
                Ok(target) => target,
                Err(err) => {
                    debug!(%err, "skipping unresolvable re-export");
                    continue;
                }
            };
            if !is_analyzable_reexport_target(&target) {
                trace!(target = %target.display(), "re-export target not aggregatable");
                continue;
            }
            for name in self.resolve(&target) {
                names.insert(name);
            }
            // Grow the cached record as each branch lands so later arrivals
            // (including cycle back-edges) see everything known so far.
            if let Some(mut entry) = self.cache.get_mut(&path) {
                entry.exports = names.clone();
            }
        }

        names
    }

    /// Cached record for `path`, if one exists.
    pub fn cached(&self, path: &Path) -> Option<ModuleRecord> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.cache.get(&path).map(|record| record.clone())
    }

    /// Number of modules analyzed so far.
    pub fn analyzed_count(&self) -> usize {
        self.cache.len()
    }
}
