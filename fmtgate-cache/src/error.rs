//! Error types for fmtgate-cache.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while acquiring a pinned artifact.
///
/// Every variant is fatal for the tool that needed the artifact: there is no
/// fallback version.
#[derive(Debug, Error)]
pub enum CacheError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The download itself failed (DNS, TLS, HTTP status, truncated body).
    #[error("failed to download {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Content hash does not match the pin, after a fresh download.
    #[error("sha256 mismatch for {name} at {path}: expected {expected}, got {actual}")]
    HashMismatch {
        name: String,
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The gzip/tar archive could not be unpacked.
    #[error("failed to extract {path}: {source}")]
    Extract {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive verified and unpacked but did not contain the executable.
    #[error("{name}: executable {path} not found after acquisition")]
    MissingExecutable { name: String, path: PathBuf },
}

/// Convenience constructor for [`CacheError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.into(),
        source,
    }
}
