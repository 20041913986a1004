//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while bundling a site
#[derive(Debug, Error)]
pub enum BundleError {
    /// A referenced file is missing or unreadable
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A text asset (HTML, JS, CSS) is not valid UTF-8
    #[error("{} is not valid UTF-8", path.display())]
    InvalidUtf8 { path: PathBuf },

    /// The configured timezone name is not in the tz database
    #[error("unknown timezone: '{0}'")]
    InvalidTimezone(String),

    /// The minifier produced output that is not valid UTF-8
    #[error("minification failed: {0}")]
    Minify(String),

    /// The output file could not be written
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
