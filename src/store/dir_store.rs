//! This module provides a backing store that maps locations to files in a real directory on
//! the host system.
//!
//! ### Key Features:
//! - **Isolated root**: Every lookup is confined to a designated root directory (self.root).
//! - **Path normalization**: `.` and `..` in bases, namespaces and paths are collapsed before
//!   they touch the host, so no location can escape the root.
//! - **Read only**: The store never creates, changes or removes anything on the host.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::core::{Blob, BlobStore, Location, Lookup, utils};

/// A [`BlobStore`] backed by a directory on the host.
///
/// The location `{base}/{namespace}/{path}` is served from `{root}/{base}/{namespace}/{path}`,
/// where `base` is taken as a path inside the root (an optional `file:` scheme is
/// dropped). With a base of `file:///releases`, namespace `ns1` and path `Build/app.wasm`
/// the store reads `{root}/releases/ns1/Build/app.wasm`.
///
/// The store does not report media types; the resolver guesses them from the file name.
///
/// ### Example:
/// ```no_run
/// use vfs_gate::DirStore;
///
/// let store = DirStore::new("/srv/builds").unwrap();
/// assert_eq!(store.root(), std::path::Path::new("/srv/builds"));
/// ```
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf, // host-related absolute path
}

impl DirStore {
    /// Creates a new DirStore serving files below `root`.
    /// * `root` is an absolute host path of an existing directory.
    /// If `root` is empty, relative, missing or not a directory, error returns.
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref();

        if root.as_os_str().is_empty() {
            return Err(anyhow!("invalid root path: empty"));
        }
        if root.is_relative() {
            return Err(anyhow!("the root path must be absolute"));
        }
        if !root.is_dir() {
            return Err(anyhow!("{:?} is not a directory", root));
        }

        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Returns root path related to the host file system.
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Returns the host path a location is served from, or `None` if the location has no
    /// namespace or no file path left after normalization.
    pub fn to_host(&self, location: &Location) -> Option<PathBuf> {
        let base = location
            .base
            .strip_prefix("file:")
            .unwrap_or(&location.base);
        let namespace = utils::normalize(&location.namespace);
        let path = utils::normalize(&location.path);
        if namespace.is_empty() || path.is_empty() {
            return None;
        }

        let mut host = self.root.clone();
        for part in [utils::normalize(base), namespace, path] {
            for segment in utils::segments(&part) {
                host.push(segment);
            }
        }
        Some(host)
    }
}

#[async_trait]
impl BlobStore for DirStore {
    async fn fetch(&self, location: &Location) -> anyhow::Result<Lookup> {
        let Some(host) = self.to_host(location) else {
            return Ok(Lookup::Missing);
        };

        match tokio::fs::metadata(&host).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(Lookup::Missing),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Lookup::Missing),
            Err(e) => return Err(anyhow!("unable to stat {}: {e}", location.path)),
        }

        match tokio::fs::read(&host).await {
            Ok(bytes) => Ok(Lookup::Found(Blob::new(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Lookup::Missing),
            Err(e) => Err(anyhow!("unable to read {}: {e}", location.path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    mod creations {
        use super::*;

        #[test]
        fn test_new_existing_dir() {
            let temp_dir = setup_test_env();
            let store = DirStore::new(temp_dir.path()).unwrap();
            assert_eq!(store.root(), temp_dir.path());
        }

        #[test]
        fn test_new_empty_path() {
            assert!(DirStore::new("").is_err());
        }

        #[test]
        fn test_new_relative_path() {
            assert!(DirStore::new("relative/root").is_err());
        }

        #[test]
        fn test_new_missing_dir() {
            let temp_dir = setup_test_env();
            assert!(DirStore::new(temp_dir.path().join("missing")).is_err());
        }

        #[test]
        fn test_new_root_is_file() {
            let temp_dir = setup_test_env();
            let file_path = temp_dir.path().join("file.txt");
            std::fs::write(&file_path, "content").unwrap();
            assert!(DirStore::new(&file_path).is_err());
        }
    }

    mod to_host {
        use super::*;

        #[test]
        fn test_base_is_inside_root() {
            let temp_dir = setup_test_env();
            let store = DirStore::new(temp_dir.path()).unwrap();
            let loc = Location::new("file:///releases", "ns1", "Build/app.wasm");
            assert_eq!(
                store.to_host(&loc).unwrap(),
                temp_dir.path().join("releases/ns1/Build/app.wasm")
            );
        }

        #[test]
        fn test_cannot_escape_root() {
            let temp_dir = setup_test_env();
            let store = DirStore::new(temp_dir.path()).unwrap();
            let loc = Location::new("file://../..", "ns1", "../../../etc/passwd");
            assert_eq!(
                store.to_host(&loc).unwrap(),
                temp_dir.path().join("ns1/etc/passwd")
            );
        }

        #[test]
        fn test_empty_parts() {
            let temp_dir = setup_test_env();
            let store = DirStore::new(temp_dir.path()).unwrap();
            assert!(store.to_host(&Location::new("file://", "..", "a.txt")).is_none());
            assert!(store.to_host(&Location::new("file://", "ns1", "./")).is_none());
        }
    }

    mod fetch {
        use super::*;

        #[tokio::test]
        async fn test_fetch_file() {
            let temp_dir = setup_test_env();
            let dir = temp_dir.path().join("ns1/Build");
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("app.js"), b"let a = 1;").unwrap();

            let store = DirStore::new(temp_dir.path()).unwrap();
            let hit = store
                .fetch(&Location::new("file://", "ns1", "Build/app.js"))
                .await
                .unwrap();
            assert_eq!(hit, Lookup::Found(Blob::new("let a = 1;")));
        }

        #[tokio::test]
        async fn test_fetch_missing_file() {
            let temp_dir = setup_test_env();
            let store = DirStore::new(temp_dir.path()).unwrap();
            let miss = store
                .fetch(&Location::new("file://", "ns1", "nothing.js"))
                .await
                .unwrap();
            assert_eq!(miss, Lookup::Missing);
        }

        #[tokio::test]
        async fn test_fetch_directory_is_missing() {
            let temp_dir = setup_test_env();
            std::fs::create_dir_all(temp_dir.path().join("ns1/Build")).unwrap();

            let store = DirStore::new(temp_dir.path()).unwrap();
            let miss = store
                .fetch(&Location::new("file://", "ns1", "Build"))
                .await
                .unwrap();
            assert_eq!(miss, Lookup::Missing);
        }
    }

    fn setup_test_env() -> TempDir {
        TempDir::new("dirstore_test").unwrap()
    }
}
