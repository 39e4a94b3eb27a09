//! Hash-verified artifact cache.
//!
//! ## `ensure` protocol
//!
//! 1. SHA-256 hash the local file, if present.
//! 2. Compare with the pinned hash → done if identical (no network).
//! 3. Fetch the bytes and verify them against the pin before touching disk.
//! 4. Write to `<path>.fmtgate.tmp`, rename to final path (atomic on POSIX).
//! 5. Re-hash the file on disk and assert it matches the pin.
//! 6. If archived: unpack next to the archive when it was just written or the
//!    executable is missing.
//! 7. Grant execute permission on the executable.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};

use crate::error::{io_err, CacheError};
use crate::fetch::{Fetch, HttpFetcher};

// ---------------------------------------------------------------------------
// CachedArtifact
// ---------------------------------------------------------------------------

/// A pinned, downloadable tool artifact.
///
/// `local_path` and `executable` are relative to the cache root so the same
/// pin works for any injected root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    /// Logical name used in logs and errors (e.g. `"ruff"`).
    pub name: String,
    /// Where the downloaded bytes live, relative to the cache root.
    pub local_path: PathBuf,
    /// Download location; redirects are followed.
    pub url: String,
    /// Lowercase hex SHA-256 of the downloaded bytes.
    pub sha256: String,
    /// Whether `local_path` is a gzip-compressed tar to unpack next to itself.
    pub archive: bool,
    /// Runnable file, relative to the cache root. Equals `local_path` for
    /// plain binaries.
    pub executable: PathBuf,
}

impl CachedArtifact {
    /// A single-file executable download.
    pub fn binary(name: &str, local_path: &str, url: &str, sha256: &str) -> Self {
        Self {
            name: name.to_string(),
            local_path: PathBuf::from(local_path),
            url: url.to_string(),
            sha256: sha256.to_ascii_lowercase(),
            archive: false,
            executable: PathBuf::from(local_path),
        }
    }

    /// A `.tar.gz` download containing `executable`.
    pub fn tar_gz(name: &str, local_path: &str, url: &str, sha256: &str, executable: &str) -> Self {
        Self {
            name: name.to_string(),
            local_path: PathBuf::from(local_path),
            url: url.to_string(),
            sha256: sha256.to_ascii_lowercase(),
            archive: true,
            executable: PathBuf::from(executable),
        }
    }
}

// ---------------------------------------------------------------------------
// ArtifactCache
// ---------------------------------------------------------------------------

/// Cache of pinned artifacts rooted at an explicit directory.
///
/// Entries are never deleted; they are only overwritten when their hash no
/// longer matches the pin.
#[derive(Clone)]
pub struct ArtifactCache {
    root: PathBuf,
    fetcher: Arc<dyn Fetch>,
}

impl std::fmt::Debug for ArtifactCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactCache")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl ArtifactCache {
    /// Cache rooted at `root`, downloading over HTTPS.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_fetcher(root, Arc::new(HttpFetcher::new()))
    }

    /// Cache rooted at `root` with a custom fetcher.
    ///
    /// A relative `root` is resolved against the current directory now, so
    /// executables stay runnable from tools started in another directory.
    pub fn with_fetcher(root: impl Into<PathBuf>, fetcher: Arc<dyn Fetch>) -> Self {
        let root = root.into();
        Self {
            root: std::path::absolute(&root).unwrap_or(root),
            fetcher,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the downloaded file for `artifact`.
    pub fn local_path(&self, artifact: &CachedArtifact) -> PathBuf {
        self.root.join(&artifact.local_path)
    }

    /// Absolute path of the runnable file for `artifact`.
    pub fn executable_path(&self, artifact: &CachedArtifact) -> PathBuf {
        self.root.join(&artifact.executable)
    }

    /// Make sure `artifact` is present, hash-verified, unpacked and runnable.
    ///
    /// Returns `true` when a download actually happened.
    pub fn ensure(&self, artifact: &CachedArtifact) -> Result<bool, CacheError> {
        let path = self.local_path(artifact);
        let Some(dir) = path.parent() else {
            return Err(io_err(
                path,
                std::io::Error::other("invalid artifact path"),
            ));
        };
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let updated = match sha256_file(&path)? {
            Some(actual) if actual == artifact.sha256 => {
                tracing::debug!("cache hit: {} ({})", artifact.name, path.display());
                false
            }
            stale => {
                if stale.is_some() {
                    tracing::info!("{}: cached file hash mismatch, re-fetching", artifact.name);
                }
                self.fetch_verified(artifact, &path)?;
                true
            }
        };

        // Whatever happened above, the bytes on disk must match the pin.
        let actual = sha256_file(&path)?.unwrap_or_default();
        if actual != artifact.sha256 {
            return Err(hash_mismatch(artifact, &path, actual));
        }

        let executable = self.executable_path(artifact);
        if artifact.archive && (updated || !executable.exists()) {
            tracing::info!("{}: extracting {}", artifact.name, path.display());
            extract_tar_gz(&path, dir)?;
        }

        if !executable.is_file() {
            return Err(CacheError::MissingExecutable {
                name: artifact.name.clone(),
                path: executable,
            });
        }
        make_runnable(&executable)?;

        Ok(updated)
    }

    /// [`ensure`](Self::ensure) then return the executable's path.
    pub fn acquire(&self, artifact: &CachedArtifact) -> Result<PathBuf, CacheError> {
        self.ensure(artifact)?;
        Ok(self.executable_path(artifact))
    }

    fn fetch_verified(&self, artifact: &CachedArtifact, path: &Path) -> Result<(), CacheError> {
        tracing::info!("{}: downloading {}", artifact.name, artifact.url);
        let bytes = self.fetcher.fetch(&artifact.url)?;

        // Refuse to replace the cached file with unverified bytes.
        let actual = sha256_bytes(&bytes);
        if actual != artifact.sha256 {
            return Err(hash_mismatch(artifact, path, actual));
        }

        atomic_write(path, &bytes)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn hash_mismatch(artifact: &CachedArtifact, path: &Path, actual: String) -> CacheError {
    CacheError::HashMismatch {
        name: artifact.name.clone(),
        path: path.to_path_buf(),
        expected: artifact.sha256.clone(),
        actual,
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Hash of the file at `path`, or `None` if it does not exist.
pub fn sha256_file(path: &Path) -> Result<Option<String>, CacheError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(sha256_bytes(&bytes))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let tmp = PathBuf::from(format!("{}.fmtgate.tmp", path.display()));
    std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<(), CacheError> {
    let file = File::open(archive).map_err(|e| io_err(archive, e))?;
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    tar.unpack(dest).map_err(|source| CacheError::Extract {
        path: archive.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn make_runnable(path: &Path) -> Result<(), CacheError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(|e| io_err(path, e))?
        .permissions();
    let mode = perms.mode();
    if mode & 0o111 != 0o111 {
        perms.set_mode(mode | 0o111);
        std::fs::set_permissions(path, perms).map_err(|e| io_err(path, e))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn make_runnable(_path: &Path) -> Result<(), CacheError> {
    Ok(())
}
