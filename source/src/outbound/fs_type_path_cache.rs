//! Registry snapshots persisted as JSON files.
//!
//! One file per cache key, so the declaration phase of a cold build and a
//! webhook handler in a long-running server can share the registry through
//! a directory. Writes replace files atomically; a reader never sees a
//! half-written snapshot.

use std::io;

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::atomic_io::write_atomic;
use crate::domain::RegistrySnapshot;
use crate::domain::ports::{TypePathCache, TypePathCacheError};

/// File-backed [`TypePathCache`].
#[derive(Debug)]
pub struct FsTypePathCache {
    dir: Dir,
}

impl FsTypePathCache {
    /// Open `path` as the cache directory, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`TypePathCacheError::Write`] when the directory cannot be
    /// created or opened.
    pub fn open(path: &Utf8Path) -> Result<Self, TypePathCacheError> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(path, ambient_authority()))
            .map(Self::from_dir)
            .map_err(|err| TypePathCacheError::write(format!("{path}: {err}")))
    }

    /// Use an already opened directory.
    pub fn from_dir(dir: Dir) -> Self {
        Self { dir }
    }

    /// File name for `key`.
    ///
    /// Keys contain `:` and repository names; characters outside
    /// `[A-Za-z0-9_-]` are replaced and a short hash of the original key
    /// keeps replaced names distinct.
    ///
    /// # Examples
    /// ```
    /// use prismic_source::outbound::FsTypePathCache;
    ///
    /// let name = FsTypePathCache::file_name("blog:master");
    /// assert!(name.starts_with("blog_master-"));
    /// assert!(name.ends_with(".json"));
    /// assert_ne!(name, FsTypePathCache::file_name("blog_master"));
    /// ```
    pub fn file_name(key: &str) -> String {
        let readable: String = key
            .chars()
            .map(|character| {
                if character.is_ascii_alphanumeric() || character == '-' || character == '_' {
                    character
                } else {
                    '_'
                }
            })
            .collect();
        let hash = Sha256::digest(key.as_bytes());
        format!("{readable}-{}.json", hex::encode(hash.get(..6).unwrap_or_default()))
    }
}

#[async_trait]
impl TypePathCache for FsTypePathCache {
    async fn load(&self, key: &str) -> Result<Option<RegistrySnapshot>, TypePathCacheError> {
        let file_name = Self::file_name(key);
        let contents = match self.dir.read_to_string(&file_name) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(TypePathCacheError::read(format!("{file_name}: {err}"))),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|err| TypePathCacheError::decode(format!("{file_name}: {err}")))
    }

    async fn store(&self, key: &str, snapshot: &RegistrySnapshot) -> Result<(), TypePathCacheError> {
        let file_name = Self::file_name(key);
        let contents = serde_json::to_vec_pretty(snapshot)
            .map_err(|err| TypePathCacheError::write(format!("{file_name}: {err}")))?;
        write_atomic(&self.dir, &file_name, &contents)
            .map_err(|err| TypePathCacheError::write(format!("{file_name}: {err}")))?;
        debug!(%key, file = %file_name, entries = snapshot.entries.len(), "stored type path registry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Filesystem behaviour of the registry cache.

    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use crate::domain::{FieldKind, REGISTRY_SNAPSHOT_VERSION, TypePath, TypePathEntry, TypePathRegistry};

    struct CacheDir {
        _temp: TempDir,
        path: Utf8PathBuf,
        cache: FsTypePathCache,
    }

    #[fixture]
    fn cache_dir() -> CacheDir {
        let temp = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(temp.path().join("registry")).expect("utf-8 temp path");
        let cache = FsTypePathCache::open(&path).expect("open cache");
        CacheDir {
            _temp: temp,
            path,
            cache,
        }
    }

    fn snapshot() -> RegistrySnapshot {
        let mut registry = TypePathRegistry::new();
        registry
            .set(
                TypePath::root("page").child("title"),
                TypePathEntry::leaf(FieldKind::Text, "String"),
            )
            .expect("declare title");
        registry.to_snapshot()
    }

    #[rstest]
    #[tokio::test]
    async fn missing_key_loads_none(cache_dir: CacheDir) {
        assert!(cache_dir.cache.load("blog:master").await.expect("load").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn stored_snapshot_is_visible_to_a_second_instance(cache_dir: CacheDir) {
        cache_dir.cache.store("blog:master", &snapshot()).await.expect("store");

        let reopened = FsTypePathCache::open(&cache_dir.path).expect("reopen");
        let loaded = reopened.load("blog:master").await.expect("load");
        assert_eq!(loaded, Some(snapshot()));
        assert!(reopened.load("blog:R1").await.expect("load").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn store_replaces_without_leaving_temp_files(cache_dir: CacheDir) {
        let empty = RegistrySnapshot {
            version: REGISTRY_SNAPSHOT_VERSION,
            entries: Vec::new(),
        };
        cache_dir.cache.store("blog:master", &empty).await.expect("first store");
        cache_dir.cache.store("blog:master", &snapshot()).await.expect("second store");

        let names: Vec<String> = std::fs::read_dir(&cache_dir.path)
            .expect("list cache dir")
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![FsTypePathCache::file_name("blog:master")]);
        assert_eq!(
            cache_dir.cache.load("blog:master").await.expect("load"),
            Some(snapshot())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn corrupt_snapshot_is_a_decode_error(cache_dir: CacheDir) {
        std::fs::write(
            cache_dir.path.join(FsTypePathCache::file_name("blog:master")),
            "{ not json",
        )
        .expect("write corrupt file");

        let error = cache_dir.cache.load("blog:master").await.expect_err("decode fails");
        assert!(matches!(error, TypePathCacheError::Decode { .. }));
    }
}
