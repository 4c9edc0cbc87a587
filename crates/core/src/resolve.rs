//! URL resolution for consistent cache identities.
//!
//! Manifest entries and intercepted URLs may be absolute or root-relative;
//! both are resolved against the site origin so the same resource always
//! produces the same key.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<ResolveError> for crate::Error {
    fn from(err: ResolveError) -> Self {
        crate::Error::InvalidUrl(err.to_string())
    }
}

/// Resolve `input` against `origin`.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join relative references onto the origin
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(origin: &Url, input: &str) -> Result<Url, ResolveError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(ResolveError::Empty);
    }

    let mut parsed = origin.join(trimmed).map_err(|e| ResolveError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(ResolveError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| ResolveError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}
