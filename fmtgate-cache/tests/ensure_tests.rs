//! Acquisition tests: idempotency, self-healing, pin enforcement, unpacking.
//!
//! No test touches the network; a counting in-memory fetcher stands in.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use flate2::{write::GzEncoder, Compression};
use fmtgate_cache::{sha256_bytes, ArtifactCache, CacheError, CachedArtifact, Fetch};
use tempfile::TempDir;

const URL: &str = "https://example.invalid/tool";

struct MemoryFetcher {
    body: Vec<u8>,
    calls: AtomicUsize,
}

impl MemoryFetcher {
    fn new(body: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            body: body.into(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetch for MemoryFetcher {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

struct FailingFetcher;

impl Fetch for FailingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CacheError> {
        Err(CacheError::Fetch {
            url: url.to_string(),
            source: "connection refused".into(),
        })
    }
}

fn tar_gz(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, path, data.as_bytes())
            .expect("append");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).expect("metadata").permissions().mode() & 0o111 == 0o111
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ---------------------------------------------------------------------------
// 1. Plain binaries
// ---------------------------------------------------------------------------

#[test]
fn first_ensure_downloads_and_marks_runnable() {
    let root = TempDir::new().expect("root");
    let body = b"#!/bin/sh\necho formatter\n".to_vec();
    let artifact = CachedArtifact::binary("fmt", "bin/fmt", URL, &sha256_bytes(&body));
    let fetcher = MemoryFetcher::new(body.clone());
    let cache = ArtifactCache::with_fetcher(root.path().join("cache"), fetcher.clone());

    let updated = cache.ensure(&artifact).expect("ensure");

    assert!(updated);
    assert_eq!(fetcher.calls(), 1);
    let path = cache.local_path(&artifact);
    assert_eq!(fs::read(&path).expect("read"), body);
    assert!(is_executable(&path));
}

#[test]
fn ensure_is_idempotent_without_network() {
    let root = TempDir::new().expect("root");
    let body = b"binary-v1".to_vec();
    let artifact = CachedArtifact::binary("fmt", "fmt", URL, &sha256_bytes(&body));
    let fetcher = MemoryFetcher::new(body);
    let cache = ArtifactCache::with_fetcher(root.path(), fetcher.clone());

    assert!(cache.ensure(&artifact).expect("first"));
    assert!(!cache.ensure(&artifact).expect("second"));
    assert_eq!(fetcher.calls(), 1, "second ensure must not fetch");
}

#[test]
fn corrupted_file_is_refetched_and_restored() {
    let root = TempDir::new().expect("root");
    let body = b"binary-v1".to_vec();
    let artifact = CachedArtifact::binary("fmt", "fmt", URL, &sha256_bytes(&body));
    let fetcher = MemoryFetcher::new(body.clone());
    let cache = ArtifactCache::with_fetcher(root.path(), fetcher.clone());

    cache.ensure(&artifact).expect("first");
    fs::write(cache.local_path(&artifact), b"tampered").expect("corrupt");

    assert!(cache.ensure(&artifact).expect("heal"));
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(fs::read(cache.local_path(&artifact)).expect("read"), body);
}

#[test]
fn download_not_matching_pin_is_fatal_and_not_written() {
    let root = TempDir::new().expect("root");
    let artifact = CachedArtifact::binary("fmt", "fmt", URL, &sha256_bytes(b"expected"));
    let cache = ArtifactCache::with_fetcher(root.path(), MemoryFetcher::new(b"something else".to_vec()));

    let err = cache.ensure(&artifact).unwrap_err();
    assert!(matches!(err, CacheError::HashMismatch { .. }), "got: {err}");
    assert!(err.to_string().contains("fmt"));
    assert!(!cache.local_path(&artifact).exists(), "bad bytes must not land");
}

#[test]
fn wrong_download_does_not_replace_existing_file() {
    let root = TempDir::new().expect("root");
    let artifact = CachedArtifact::binary("fmt", "fmt", URL, &sha256_bytes(b"expected"));
    let cache = ArtifactCache::with_fetcher(root.path(), MemoryFetcher::new(b"wrong".to_vec()));
    fs::write(cache.local_path(&artifact), b"stale but present").expect("seed");

    cache.ensure(&artifact).unwrap_err();
    assert_eq!(
        fs::read(cache.local_path(&artifact)).expect("read"),
        b"stale but present"
    );
}

#[test]
fn fetch_failure_propagates() {
    let root = TempDir::new().expect("root");
    let artifact = CachedArtifact::binary("fmt", "fmt", URL, &sha256_bytes(b"x"));
    let cache = ArtifactCache::with_fetcher(root.path(), Arc::new(FailingFetcher));

    let err = cache.ensure(&artifact).unwrap_err();
    assert!(matches!(err, CacheError::Fetch { .. }), "got: {err}");
    assert!(err.to_string().contains(URL));
}

// ---------------------------------------------------------------------------
// 2. Archives
// ---------------------------------------------------------------------------

#[test]
fn archive_is_unpacked_next_to_itself() {
    let root = TempDir::new().expect("root");
    let archive = tar_gz(&[("tool-linux/tool", "#!/bin/sh\nexit 0\n"), ("tool-linux/README", "docs")]);
    let artifact = CachedArtifact::tar_gz(
        "tool",
        "tool-linux.tar.gz",
        URL,
        &sha256_bytes(&archive),
        "tool-linux/tool",
    );
    let fetcher = MemoryFetcher::new(archive);
    let cache = ArtifactCache::with_fetcher(root.path(), fetcher.clone());

    let exe = cache.acquire(&artifact).expect("acquire");

    assert_eq!(exe, root.path().join("tool-linux").join("tool"));
    assert!(is_executable(&exe));
    assert!(root.path().join("tool-linux").join("README").exists());
    assert!(!cache.ensure(&artifact).expect("second"));
    assert_eq!(fetcher.calls(), 1);
}

#[test]
fn missing_executable_is_reextracted_without_fetch() {
    let root = TempDir::new().expect("root");
    let archive = tar_gz(&[("tool-linux/tool", "#!/bin/sh\n")]);
    let artifact = CachedArtifact::tar_gz(
        "tool",
        "tool-linux.tar.gz",
        URL,
        &sha256_bytes(&archive),
        "tool-linux/tool",
    );
    let fetcher = MemoryFetcher::new(archive);
    let cache = ArtifactCache::with_fetcher(root.path(), fetcher.clone());

    let exe = cache.acquire(&artifact).expect("first");
    fs::remove_file(&exe).expect("delete executable");

    assert!(!cache.ensure(&artifact).expect("second"));
    assert!(exe.exists(), "executable restored from cached archive");
    assert_eq!(fetcher.calls(), 1);
}

#[test]
fn archive_without_declared_executable_is_fatal() {
    let root = TempDir::new().expect("root");
    let archive = tar_gz(&[("other/binary", "data")]);
    let artifact = CachedArtifact::tar_gz(
        "tool",
        "tool.tar.gz",
        URL,
        &sha256_bytes(&archive),
        "tool-linux/tool",
    );
    let cache = ArtifactCache::with_fetcher(root.path(), MemoryFetcher::new(archive));

    let err = cache.ensure(&artifact).unwrap_err();
    assert!(matches!(err, CacheError::MissingExecutable { .. }), "got: {err}");
}

#[test]
fn corrupt_archive_fails_extraction() {
    let root = TempDir::new().expect("root");
    let garbage = b"not a gzip stream".to_vec();
    let artifact = CachedArtifact::tar_gz(
        "tool",
        "tool.tar.gz",
        URL,
        &sha256_bytes(&garbage),
        "tool-linux/tool",
    );
    let cache = ArtifactCache::with_fetcher(root.path(), MemoryFetcher::new(garbage));

    let err = cache.ensure(&artifact).unwrap_err();
    assert!(matches!(err, CacheError::Extract { .. }), "got: {err}");
}
