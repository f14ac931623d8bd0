//! `require`-style specifier resolution.
//!
//! Maps a re-export specifier string to a concrete file on disk the way the
//! legacy module system does: relative and absolute specifiers resolve
//! against the importing file's directory, bare specifiers probe
//! `node_modules` directories walking the ancestor chain. File candidates are
//! probed as-is, then with the legacy extensions appended, then as a
//! directory through its manifest `main` and `index.*` files.
//!
//! Resolution failure is a soft outcome ([`SpecifierError::NotFound`]);
//! callers aggregating exports skip the branch and move on.

use crate::manifest::{read_manifest, ManifestLookup};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

/// Extensions probed when a candidate path does not name a file directly.
const PROBE_EXTENSIONS: [&str; 3] = ["js", "cjs", "json"];

/// Index files probed when a candidate path names a directory.
const INDEX_FILES: [&str; 3] = ["index.js", "index.cjs", "index.json"];

/// Errors from specifier resolution.
#[derive(Debug, Error)]
pub enum SpecifierError {
    /// The specifier does not resolve to any file
    #[error("cannot resolve '{specifier}' from {from}")]
    NotFound {
        /// The specifier that failed to resolve
        specifier: String,
        /// The importing file it was resolved from
        from: PathBuf,
    },
}

/// Resolve `specifier` as required from `from_file`.
///
/// Returns the canonicalized target path on success.
pub fn resolve_specifier(specifier: &str, from_file: &Path) -> Result<PathBuf, SpecifierError> {
    let base = from_file.parent().unwrap_or_else(|| Path::new("."));

    let resolved = if is_path_specifier(specifier) {
        resolve_candidate(&base.join(specifier))
    } else {
        resolve_bare(specifier, base)
    };

    match resolved {
        Some(path) => Ok(path.canonicalize().unwrap_or(path)),
        None => Err(SpecifierError::NotFound {
            specifier: specifier.to_owned(),
            from: from_file.to_path_buf(),
        }),
    }
}

/// Relative and absolute specifiers bypass the `node_modules` walk.
fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || Path::new(specifier).is_absolute()
}

/// Probe ancestor `node_modules` directories for a bare specifier.
fn resolve_bare(specifier: &str, base: &Path) -> Option<PathBuf> {
    let mut dir = Some(base);
    while let Some(current) = dir {
        // node_modules/node_modules never exists; skip straight past
        if current.file_name().is_none_or(|name| name != "node_modules") {
            let candidate = current.join("node_modules").join(specifier);
            if let Some(found) = resolve_candidate(&candidate) {
                trace!(specifier, found = %found.display(), "resolved bare specifier");
                return Some(found);
            }
        }
        dir = current.parent();
    }
    None
}

/// Probe one candidate path: exact file, appended extensions, then directory.
fn resolve_candidate(candidate: &Path) -> Option<PathBuf> {
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    if let Some(found) = probe_extensions(candidate) {
        return Some(found);
    }
    if candidate.is_dir() {
        return resolve_directory(candidate);
    }
    None
}

/// Try `candidate` with each legacy extension appended.
fn probe_extensions(candidate: &Path) -> Option<PathBuf> {
    for ext in PROBE_EXTENSIONS {
        let mut name = OsString::from(candidate.as_os_str());
        name.push(".");
        name.push(ext);
        let probed = PathBuf::from(name);
        if probed.is_file() {
            return Some(probed);
        }
    }
    None
}

/// Resolve a directory candidate via its manifest `main`, falling back to
/// `index.*`.
fn resolve_directory(dir: &Path) -> Option<PathBuf> {
    if let Ok(ManifestLookup::Found(manifest)) = read_manifest(dir) {
        if let Some(main) = manifest.main.as_deref() {
            let entry = dir.join(main);
            if entry.is_file() {
                return Some(entry);
            }
            if let Some(found) = probe_extensions(&entry) {
                return Some(found);
            }
            // `main` may itself name a directory holding an index file
            if entry.is_dir() {
                if let Some(found) = probe_index(&entry) {
                    return Some(found);
                }
            }
        }
    }
    probe_index(dir)
}

fn probe_index(dir: &Path) -> Option<PathBuf> {
    INDEX_FILES
        .into_iter()
        .map(|index| dir.join(index))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn relative_exact_file() {
        let dir = tempfile::tempdir().unwrap();
        let from = write(dir.path(), "src/a.js", "");
        let target = write(dir.path(), "src/b.js", "");
        let resolved = resolve_specifier("./b.js", &from).unwrap();
        assert_eq!(resolved, target.canonicalize().unwrap());
    }

    #[test]
    fn relative_extension_probing() {
        let dir = tempfile::tempdir().unwrap();
        let from = write(dir.path(), "a.js", "");
        write(dir.path(), "b.cjs", "");
        let resolved = resolve_specifier("./b", &from).unwrap();
        assert!(resolved.ends_with("b.cjs"));
    }

    #[test]
    fn parent_relative_specifier() {
        let dir = tempfile::tempdir().unwrap();
        let from = write(dir.path(), "nested/a.js", "");
        write(dir.path(), "up.js", "");
        let resolved = resolve_specifier("../up", &from).unwrap();
        assert!(resolved.ends_with("up.js"));
    }

    #[test]
    fn directory_with_index() {
        let dir = tempfile::tempdir().unwrap();
        let from = write(dir.path(), "a.js", "");
        write(dir.path(), "lib/index.js", "");
        let resolved = resolve_specifier("./lib", &from).unwrap();
        assert!(resolved.ends_with("lib/index.js"));
    }

    #[test]
    fn directory_with_manifest_main() {
        let dir = tempfile::tempdir().unwrap();
        let from = write(dir.path(), "a.js", "");
        write(dir.path(), "lib/package.json", r#"{ "main": "./entry.js" }"#);
        write(dir.path(), "lib/entry.js", "");
        write(dir.path(), "lib/index.js", "");
        let resolved = resolve_specifier("./lib", &from).unwrap();
        assert!(resolved.ends_with("lib/entry.js"));
    }

    #[test]
    fn manifest_main_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let from = write(dir.path(), "a.js", "");
        write(dir.path(), "lib/package.json", r#"{ "main": "entry" }"#);
        write(dir.path(), "lib/entry.js", "");
        let resolved = resolve_specifier("./lib", &from).unwrap();
        assert!(resolved.ends_with("lib/entry.js"));
    }

    #[test]
    fn bare_specifier_walks_node_modules() {
        let dir = tempfile::tempdir().unwrap();
        let from = write(dir.path(), "app/src/deep/a.js", "");
        write(
            dir.path(),
            "app/node_modules/dep/package.json",
            r#"{ "main": "main.js" }"#,
        );
        write(dir.path(), "app/node_modules/dep/main.js", "");
        let resolved = resolve_specifier("dep", &from).unwrap();
        assert!(resolved.ends_with("node_modules/dep/main.js"));
    }

    #[test]
    fn scoped_bare_specifier() {
        let dir = tempfile::tempdir().unwrap();
        let from = write(dir.path(), "a.js", "");
        write(dir.path(), "node_modules/@scope/pkg/index.js", "");
        let resolved = resolve_specifier("@scope/pkg", &from).unwrap();
        assert!(resolved.ends_with("@scope/pkg/index.js"));
    }

    #[test]
    fn bare_specifier_subpath() {
        let dir = tempfile::tempdir().unwrap();
        let from = write(dir.path(), "a.js", "");
        write(dir.path(), "node_modules/dep/lib/util.js", "");
        let resolved = resolve_specifier("dep/lib/util", &from).unwrap();
        assert!(resolved.ends_with("dep/lib/util.js"));
    }

    #[test]
    fn unresolvable_specifier_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let from = write(dir.path(), "a.js", "");
        let err = resolve_specifier("missing-pkg", &from).unwrap_err();
        assert!(matches!(err, SpecifierError::NotFound { .. }));
        let err = resolve_specifier("./missing", &from).unwrap_err();
        assert!(err.to_string().contains("./missing"));
    }
}
