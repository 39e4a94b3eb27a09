//! # fmtgate-cache
//!
//! Content-hash pinned download cache for external tool binaries.
//!
//! Call [`ArtifactCache::ensure`] to verify, (re-)download and unpack an
//! artifact; [`pins`] holds the pinned tool versions.

pub mod artifact;
pub mod error;
pub mod fetch;
pub mod pins;

pub use artifact::{sha256_bytes, ArtifactCache, CachedArtifact};
pub use error::CacheError;
pub use fetch::{Fetch, HttpFetcher};
