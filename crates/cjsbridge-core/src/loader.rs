//! Host loader-hook adapter.
//!
//! The host loader exposes three per-load extension points: specifier
//! resolution, format declaration, and source substitution. This adapter
//! implements all three over `file:` URLs. A resolved CommonJS target is
//! marked with the reserved `?cjsexportproxy` query so the later hooks know
//! to declare it an ES module and hand back synthesized source; the
//! synthesized source in turn imports the real exports object through the
//! `?cjsoriginal` marker, which routes straight back to the untouched file.
//!
//! Three request shapes, distinguished by marker: plain (fall through to the
//! host default), "render as proxy", and "fetch original untouched".

use crate::classify::{classify, ModuleFormat};
use crate::exports::ExportResolver;
use crate::manifest::ManifestError;
use crate::specifier::{resolve_specifier, SpecifierError};
use crate::synth::synthesize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Query marker for "render this CommonJS file as a synthesized ES module".
pub const EXPORT_PROXY_MARKER: &str = "?cjsexportproxy";

/// Query marker for "load the original file, bypassing the proxy".
pub const ORIGINAL_MARKER: &str = "?cjsoriginal";

const EXPORT_PROXY_QUERY: &str = "cjsexportproxy";

/// Errors surfaced to the host from the loader hooks.
///
/// Soft per-module failures (unreadable files, broken re-exports) never land
/// here; these are the assumption-violation cases the host should see.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Classification could not complete
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The requested specifier does not resolve
    #[error(transparent)]
    Specifier(#[from] SpecifierError),

    /// A URL could not be parsed or converted to a file path
    #[error("invalid module url '{0}'")]
    InvalidUrl(String),
}

/// Per-process loader state: the export resolver and its cache.
#[derive(Debug, Default)]
pub struct Loader {
    resolver: ExportResolver,
}

impl Loader {
    /// Create a loader with a fresh resolver cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying export resolver (shared cache).
    pub fn resolver(&self) -> &ExportResolver {
        &self.resolver
    }

    /// Resolution hook.
    ///
    /// `?cjsoriginal` requests have the marker stripped and pass through
    /// untouched. Everything else is default-resolved; a `file:` result
    /// classified as CommonJS comes back with the `?cjsexportproxy` marker so
    /// the format and source hooks take over.
    pub fn resolve_request(
        &self,
        specifier: &str,
        parent: Option<&Url>,
    ) -> Result<Url, LoaderError> {
        if let Some(original) = specifier.strip_suffix(ORIGINAL_MARKER) {
            return Url::parse(original)
                .map_err(|_| LoaderError::InvalidUrl(specifier.to_owned()));
        }

        let resolved = self.default_resolve(specifier, parent)?;
        if resolved.scheme() == "file" {
            let path = resolved
                .to_file_path()
                .map_err(|_| LoaderError::InvalidUrl(resolved.to_string()))?;
            if classify(&path)? == ModuleFormat::CommonJs {
                debug!(url = %resolved, "proxying commonjs module");
                let mut proxied = resolved;
                proxied.set_query(Some(EXPORT_PROXY_QUERY));
                return Ok(proxied);
            }
        }
        Ok(resolved)
    }

    /// Format hook: proxy-marked requests are ES modules, everything else
    /// falls through to the host default (`None`).
    pub fn request_format(&self, url: &Url) -> Option<ModuleFormat> {
        is_proxy_request(url).then_some(ModuleFormat::EsModule)
    }

    /// Source hook: proxy-marked requests get synthesized source; everything
    /// else falls through to the host default (`None`).
    pub fn request_source(&self, url: &Url) -> Result<Option<String>, LoaderError> {
        if !is_proxy_request(url) {
            return Ok(None);
        }

        let mut original = url.clone();
        original.set_query(None);
        let path = original
            .to_file_path()
            .map_err(|_| LoaderError::InvalidUrl(url.to_string()))?;

        let names = self.resolver.resolve(&path);
        Ok(Some(synthesize(original.as_str(), &names)))
    }

    /// The host's default resolution, approximated: full URLs pass through,
    /// everything else resolves like a `require` from the parent module (or
    /// from the working directory for a top-level request).
    fn default_resolve(&self, specifier: &str, parent: Option<&Url>) -> Result<Url, LoaderError> {
        if let Ok(url) = Url::parse(specifier) {
            return Ok(url);
        }

        let from = match parent.and_then(|url| url.to_file_path().ok()) {
            Some(path) => path,
            // Anchor top-level requests at a phantom entry in the cwd.
            None => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("__host_entry__.js"),
        };

        let path = resolve_specifier(specifier, &from)?;
        Url::from_file_path(&path).map_err(|_| LoaderError::InvalidUrl(specifier.to_owned()))
    }
}

fn is_proxy_request(url: &Url) -> bool {
    url.query() == Some(EXPORT_PROXY_QUERY)
}
