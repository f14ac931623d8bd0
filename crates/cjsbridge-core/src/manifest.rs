//! package.json lookup.
//!
//! Only the fields the bridge consumes are modeled: the module-format
//! declaration (`type`) used by classification and the entry point (`main`)
//! used by specifier resolution. Everything else in the manifest is ignored.

use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during manifest lookup.
///
/// A missing or malformed package.json is not an error (it is the
/// [`ManifestLookup::NotFound`] outcome); only unexpected I/O failures
/// surface, since those indicate a broken environment rather than an
/// unmanifested directory.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read an existing manifest file
    #[error("failed to read {path}: {source}")]
    Io {
        /// Manifest path that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// The slice of package.json the bridge cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,

    /// Module format declaration: `"module"` or `"commonjs"` (absent means
    /// commonjs in the legacy ecosystem)
    #[serde(default, rename = "type")]
    pub module_type: Option<String>,

    /// Entry point used when a specifier resolves to the package directory
    #[serde(default)]
    pub main: Option<String>,
}

impl PackageManifest {
    /// Parse a manifest from JSON text.
    pub fn from_str(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Whether this manifest declares its `.js` files to be ES modules.
    pub fn declares_es_modules(&self) -> bool {
        self.module_type.as_deref() == Some("module")
    }
}

/// Outcome of looking for a manifest in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestLookup {
    /// A readable, parseable package.json was found
    Found(PackageManifest),
    /// No package.json here, or one too malformed to use
    NotFound,
}

/// Look for `package.json` in `dir`.
///
/// Absence and JSON parse failures both yield [`ManifestLookup::NotFound`];
/// any other read failure propagates.
pub fn read_manifest(dir: &Path) -> Result<ManifestLookup, ManifestError> {
    let path = dir.join("package.json");
    match std::fs::read_to_string(&path) {
        Ok(contents) => match PackageManifest::from_str(&contents) {
            Ok(manifest) => Ok(ManifestLookup::Found(manifest)),
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "ignoring malformed package.json");
                Ok(ManifestLookup::NotFound)
            }
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(ManifestLookup::NotFound),
        Err(source) => Err(ManifestError::Io { path, source }),
    }
}
