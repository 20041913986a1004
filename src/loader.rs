//! Asset loading and data URI encoding

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;

use crate::error::BundleError;

/// MIME type used when the extension is not recognised
pub const DEFAULT_MIME: &str = "image/png";

/// A base64 `data:` URI built from a file's bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// MIME type declared in the URI
    pub mime: &'static str,
    /// Base64 payload (standard alphabet, padded)
    pub payload: String,
}

impl DataUri {
    /// Encode raw bytes with the given MIME type
    pub fn encode(mime: &'static str, data: &[u8]) -> Self {
        Self {
            mime,
            payload: base64::engine::general_purpose::STANDARD.encode(data),
        }
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, self.payload)
    }
}

/// Pick a MIME type from a path's extension
pub fn mime_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",
        Some("bmp") => "image/bmp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        _ => DEFAULT_MIME,
    }
}

/// Normalise an asset reference as written in HTML, CSS or JS
///
/// Strips surrounding whitespace and quotes, then a leading `./` or `/`.
pub fn clean_reference(reference: &str) -> &str {
    let trimmed = reference.trim().trim_matches(|c| c == '\'' || c == '"').trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    trimmed.trim_start_matches('/')
}

/// Reads assets relative to a source root
#[derive(Debug, Clone)]
pub struct Loader {
    root: PathBuf,
}

impl Loader {
    /// Create a loader for the given source root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a reference to a path under the source root
    pub fn resolve(&self, reference: &str) -> PathBuf {
        self.root.join(clean_reference(reference))
    }

    /// Read a referenced file as raw bytes
    pub fn read_bytes(&self, reference: &str) -> Result<Vec<u8>, BundleError> {
        let path = self.resolve(reference);
        std::fs::read(&path).map_err(|source| BundleError::Io { path, source })
    }

    /// Read a referenced file as UTF-8 text
    pub fn read_text(&self, reference: &str) -> Result<String, BundleError> {
        let bytes = self.read_bytes(reference)?;
        String::from_utf8(bytes).map_err(|_| BundleError::InvalidUtf8 {
            path: self.resolve(reference),
        })
    }

    /// Read a referenced file and encode it as a data URI
    pub fn data_uri(&self, reference: &str) -> Result<DataUri, BundleError> {
        let bytes = self.read_bytes(reference)?;
        Ok(DataUri::encode(mime_for(clean_reference(reference)), &bytes))
    }
}
