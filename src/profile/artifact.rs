//! Single-use artifact files for profile delivery.
//!
//! Each delivery gets its own uniquely named directory under the configured root and a
//! uniquely named file inside it (created with mode 0600). The file is written, flushed,
//! closed, read back for the response body and removed again before `deliver` returns.
//! Both paths are held by `tempfile` guards, so every early return removes them too.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::{TempDir, TempPath};
use tracing::{debug, warn};

use super::RenderedProfile;
use crate::errors::{Error, Result};

const DIR_PREFIX: &str = "authd-";
const FILE_PREFIX: &str = "profile-";
const FILE_SUFFIX: &str = ".ovpn";

/// Creates transient profile files under a root directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

/// A profile written to disk and not yet delivered. Dropping it removes the file and its
/// directory.
#[derive(Debug)]
pub struct StagedArtifact {
    // Field order matters: the file is removed before its directory.
    file: TempPath,
    dir: TempDir,
}

/// Response body read back from a removed artifact.
#[derive(Debug, Clone)]
pub struct DeliveredArtifact {
    /// Where the artifact lived; it no longer exists.
    pub path: PathBuf,
    pub contents: Bytes,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `profile` into a fresh directory and file. Blocking.
    pub fn stage(&self, profile: &RenderedProfile) -> Result<StagedArtifact> {
        let dir = tempfile::Builder::new().prefix(DIR_PREFIX).tempdir_in(&self.root).map_err(|e| {
            Error::storage_io(format!("create artifact directory in {}", self.root.display()), e)
        })?;

        let mut file = tempfile::Builder::new()
            .prefix(FILE_PREFIX)
            .suffix(FILE_SUFFIX)
            .tempfile_in(dir.path())
            .map_err(|e| Error::storage_io("create artifact file", e))?;

        file.write_all(profile.contents.expose_secret().as_bytes())
            .map_err(|e| Error::storage_io("write artifact file", e))?;
        file.flush().map_err(|e| Error::storage_io("flush artifact file", e))?;
        file.as_file().sync_all().map_err(|e| Error::storage_io("sync artifact file", e))?;

        // Closes the handle; the path stays owned by the guard.
        let file = file.into_temp_path();

        debug!(path = %file.display(), bytes = profile.contents.len(), "Staged profile artifact");
        Ok(StagedArtifact { file, dir })
    }

    /// Stage `profile`, read it back and remove it, on the blocking thread pool.
    pub async fn deliver(&self, profile: RenderedProfile) -> Result<DeliveredArtifact> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.stage(&profile)?.into_contents())
            .await
            .map_err(|e| Error::storage(format!("artifact delivery task failed: {}", e)))?
    }
}

impl StagedArtifact {
    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Read the artifact back and remove it. Removal failures are errors.
    pub fn into_contents(self) -> Result<DeliveredArtifact> {
        let contents = std::fs::read(&self.file).map_err(|e| {
            warn!(error = %e, path = %self.file.display(), "Failed to read back profile artifact");
            Error::storage_io("read artifact file", e)
        })?;

        let StagedArtifact { file, dir } = self;
        let path = file.to_path_buf();

        file.close().map_err(|e| Error::storage_io("remove artifact file", e))?;
        dir.close().map_err(|e| Error::storage_io("remove artifact directory", e))?;

        debug!(path = %path.display(), bytes = contents.len(), "Delivered and removed profile artifact");
        Ok(DeliveredArtifact { path, contents: Bytes::from(contents) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SecretString;
    use chrono::Utc;
    use std::collections::HashSet;

    fn profile(text: &str) -> RenderedProfile {
        RenderedProfile { contents: SecretString::new(text), expires_at: Utc::now() }
    }

    fn entries(root: &Path) -> usize {
        std::fs::read_dir(root).unwrap().count()
    }

    #[tokio::test]
    async fn test_deliver_returns_contents_and_leaves_nothing_behind() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path());

        let delivered = store.deliver(profile("client\n<key>KEY</key>\n")).await.unwrap();

        assert_eq!(&delivered.contents[..], b"client\n<key>KEY</key>\n");
        assert!(delivered.path.starts_with(root.path()));
        assert!(!delivered.path.exists());
        assert_eq!(entries(root.path()), 0);
    }

    #[test]
    fn test_dropping_staged_artifact_removes_it() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path());

        let staged = store.stage(&profile("client")).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "client");

        drop(staged);
        assert!(!path.exists());
        assert_eq!(entries(root.path()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_staged_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let staged = ArtifactStore::new(root.path()).stage(&profile("client")).unwrap();
        let mode = std::fs::metadata(staged.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_read_failure_still_removes_artifact() {
        let root = tempfile::tempdir().unwrap();
        let staged = ArtifactStore::new(root.path()).stage(&profile("client")).unwrap();

        // Swap the file for a directory so the read-back fails.
        std::fs::remove_file(staged.path()).unwrap();
        std::fs::create_dir(staged.path()).unwrap();

        let err = staged.into_contents().unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
        assert_eq!(entries(root.path()), 0);
    }

    #[test]
    fn test_missing_root_is_a_storage_error() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path().join("does-not-exist"));
        assert!(matches!(store.stage(&profile("client")), Err(Error::Storage { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_stages_never_share_a_path() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(root.path());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::task::spawn_blocking(move || {
                    let staged = store.stage(&profile(&format!("profile-{i}"))).unwrap();
                    (i, staged)
                })
            })
            .collect();

        let mut staged = Vec::new();
        for handle in handles {
            staged.push(handle.await.unwrap());
        }

        let paths: HashSet<PathBuf> = staged.iter().map(|(_, s)| s.path().to_path_buf()).collect();
        assert_eq!(paths.len(), 16);
        for (i, artifact) in &staged {
            assert_eq!(std::fs::read_to_string(artifact.path()).unwrap(), format!("profile-{i}"));
        }

        drop(staged);
        assert_eq!(entries(root.path()), 0);
    }
}
