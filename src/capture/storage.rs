//! Temporary storage for captured stills.
//!
//! Images land in an app-private cache directory under a random name. Each
//! write goes to a temp file in the target directory and is renamed into
//! place, so a partially-written image is never visible.

use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Directory component that scopes captures to this crate.
const STORAGE_NAMESPACE: &str = "camera-kit";

/// Errors that can occur while persisting a capture.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no cache directory available on this platform")]
    NoCacheDir,
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Write(#[from] std::io::Error),
    #[error("failed to move image into place: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("cannot express {0} as a file URL")]
    InvalidPath(PathBuf),
}

/// A persisted image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub name: String,
    pub uri: String,
}

/// Writes captured images into a private directory.
#[derive(Debug, Clone)]
pub struct CaptureStorage {
    directory: PathBuf,
}

impl CaptureStorage {
    /// Uses `directory` as-is.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Resolves `<root>/<bundle_id>/camera-kit`, where `root` defaults to the
    /// platform cache directory.
    pub fn in_cache_dir(root: Option<&Path>, bundle_id: Option<&str>) -> Result<Self, StorageError> {
        let mut directory = match root {
            Some(root) => root.to_path_buf(),
            None => dirs::cache_dir().ok_or(StorageError::NoCacheDir)?,
        };
        if let Some(bundle_id) = bundle_id {
            directory.push(bundle_id);
        }
        directory.push(STORAGE_NAMESPACE);
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Atomically writes `bytes` to a new uniquely-named `.jpg` file.
    pub fn persist(&self, bytes: &[u8]) -> Result<StoredImage, StorageError> {
        self.persist_as(format!("{}.jpg", Uuid::new_v4()), bytes)
    }

    fn persist_as(&self, name: String, bytes: &[u8]) -> Result<StoredImage, StorageError> {
        std::fs::create_dir_all(&self.directory).map_err(|source| StorageError::CreateDir {
            path: self.directory.clone(),
            source,
        })?;

        let path = self.directory.join(&name);
        let uri = file_uri(&path)?;

        // A failed persist hands the temp file back inside the error, which
        // deletes it on drop.
        let mut temp = tempfile::NamedTempFile::new_in(&self.directory)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;
        temp.persist_noclobber(&path)?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Capture persisted");

        Ok(StoredImage { path, name, uri })
    }
}

fn file_uri(path: &Path) -> Result<String, StorageError> {
    let absolute = std::path::absolute(path)?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| StorageError::InvalidPath(absolute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_writes_unique_jpgs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CaptureStorage::new(dir.path().join("captures"));

        let first = storage.persist(b"first image").unwrap();
        let second = storage.persist(b"second").unwrap();

        assert_ne!(first.name, second.name);
        assert!(first.name.ends_with(".jpg"));
        assert_eq!(std::fs::read(&first.path).unwrap(), b"first image");
        assert_eq!(first.uri, format!("file://{}", first.path.display()));
        assert_eq!(Url::parse(&first.uri).unwrap().to_file_path().unwrap(), first.path);

        // Only the two images, no stray temp files.
        let entries = std::fs::read_dir(storage.directory()).unwrap().count();
        assert_eq!(entries, 2);
    }

    #[test]
    fn test_uri_is_percent_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CaptureStorage::new(dir.path().join("my captures").join("caméra"));

        let stored = storage.persist(b"jpeg").unwrap();
        assert!(stored.uri.starts_with("file:///"));
        assert!(stored.uri.contains("/my%20captures/cam%C3%A9ra/"));
        assert!(!stored.uri.contains(' '));
        assert_eq!(Url::parse(&stored.uri).unwrap().to_file_path().unwrap(), stored.path);
    }

    #[test]
    fn test_failed_rename_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CaptureStorage::new(dir.path());
        std::fs::write(dir.path().join("taken.jpg"), b"earlier capture").unwrap();

        let err = storage
            .persist_as("taken.jpg".to_string(), b"new image data")
            .unwrap_err();
        assert!(matches!(err, StorageError::Persist(_)));
        drop(err);

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["taken.jpg".to_string()]);
        assert_eq!(
            std::fs::read(dir.path().join("taken.jpg")).unwrap(),
            b"earlier capture"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_directory_leaves_nothing_behind() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("captures");
        std::fs::create_dir(&target).unwrap();
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits do not bind root
        if std::fs::write(target.join("write-check"), b"").is_ok() {
            std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let err = CaptureStorage::new(&target).persist(b"image").unwrap_err();
        assert!(matches!(err, StorageError::Write(_)));
        assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_cache_dir_layout() {
        let storage =
            CaptureStorage::in_cache_dir(Some(Path::new("/var/cache")), Some("com.example.app"))
                .unwrap();
        assert_eq!(
            storage.directory(),
            Path::new("/var/cache/com.example.app/camera-kit")
        );
    }

    #[test]
    fn test_unwritable_directory_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let storage = CaptureStorage::new(blocker.join("captures"));
        let err = storage.persist(b"image").unwrap_err();
        assert!(matches!(err, StorageError::CreateDir { .. }));
    }
}
