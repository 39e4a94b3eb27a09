//! Network seam for the artifact cache.

use std::io::Read;

use crate::error::CacheError;

/// Maximum number of redirects followed; release assets redirect to a CDN.
const MAX_REDIRECTS: u32 = 8;

/// Something that can turn a URL into bytes.
///
/// The cache only ever calls this when a local file is missing or fails
/// verification, so tests can count calls to observe network I/O.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CacheError>;
}

/// Blocking HTTPS fetcher backed by `ureq`. Follows redirects.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new().redirects(MAX_REDIRECTS).build();
        Self { agent }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CacheError> {
        let fetch_err = |source: Box<dyn std::error::Error + Send + Sync>| CacheError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| fetch_err(Box::new(e)))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| fetch_err(Box::new(e)))?;

        tracing::debug!("fetched {} bytes from {url}", bytes.len());
        Ok(bytes)
    }
}
