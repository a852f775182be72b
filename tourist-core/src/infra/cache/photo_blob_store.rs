use std::{
    fmt,
    path::{Path, PathBuf},
};

use cacache::Integrity;

use crate::store::StoreError;

/// Root directory for the photo blob store.
///
/// `cacache` manages this directory internally (index + content-addressed
/// blobs). Photo bytes are stored hash-only; the store manifest is the single
/// keyed entry.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PhotoCacheRoot(PathBuf);

impl PhotoCacheRoot {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Debug for PhotoCacheRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PhotoCacheRoot").field(&self.0).finish()
    }
}

/// Minimal metadata returned from a successful store write.
#[derive(Debug, Clone)]
pub struct StoredPhotoBlob {
    pub integrity: Integrity,
    pub byte_len: usize,
}

fn describe(err: cacache::Error, subject: &str) -> String {
    match err {
        cacache::Error::EntryNotFound(_, _) => {
            format!("cache entry not found: {subject}")
        }
        cacache::Error::IntegrityError(err) => {
            format!("cache entry failed integrity check: {subject} ({err})")
        }
        cacache::Error::SizeMismatch(wanted, actual) => format!(
            "cache entry size mismatch: {subject}, wanted={wanted}, \
             actual={actual}"
        ),
        cacache::Error::IoError(_, msg) => {
            format!("cacache I/O error on {subject}: {msg}")
        }
        cacache::Error::SerdeError(_, msg) => {
            format!("cacache serde error on {subject}: {msg}")
        }
    }
}

/// A thin typed wrapper over `cacache` for photo bytes and the store manifest.
#[derive(Clone, Debug)]
pub struct PhotoBlobStore {
    root: PhotoCacheRoot,
}

impl PhotoBlobStore {
    pub fn new(root: PhotoCacheRoot) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &PhotoCacheRoot {
        &self.root
    }

    pub async fn read_hash(
        &self,
        hash: &Integrity,
    ) -> Result<Vec<u8>, StoreError> {
        cacache::read_hash(self.root.as_path(), hash)
            .await
            .map_err(|e| StoreError::Load(describe(e, &hash.to_string())))
    }

    pub async fn write_hash(
        &self,
        bytes: &[u8],
    ) -> Result<StoredPhotoBlob, StoreError> {
        let integrity = cacache::write_hash(self.root.as_path(), bytes)
            .await
            .map_err(|e| StoreError::Save(describe(e, "photo blob")))?;

        Ok(StoredPhotoBlob {
            integrity,
            byte_len: bytes.len(),
        })
    }

    pub async fn remove_hash(
        &self,
        hash: &Integrity,
    ) -> Result<(), StoreError> {
        cacache::remove_hash(self.root.as_path(), hash)
            .await
            .map_err(|e| StoreError::Save(describe(e, &hash.to_string())))
    }

    /// Read a keyed entry; a missing key is `Ok(None)`.
    pub async fn read_entry(
        &self,
        key: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        match cacache::read(self.root.as_path(), key).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(e) => Err(StoreError::Load(describe(e, key))),
        }
    }

    pub async fn write_entry(
        &self,
        key: &str,
        bytes: &[u8],
    ) -> Result<StoredPhotoBlob, StoreError> {
        let integrity = cacache::write(self.root.as_path(), key, bytes)
            .await
            .map_err(|e| StoreError::Save(describe(e, key)))?;

        Ok(StoredPhotoBlob {
            integrity,
            byte_len: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_blobs_round_trip_and_remove() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let store =
            PhotoBlobStore::new(PhotoCacheRoot::new(dir.path().to_path_buf()));

        let stored = store.write_hash(b"jpeg bytes").await.expect("write");
        assert_eq!(stored.byte_len, 10);
        assert_eq!(
            store.read_hash(&stored.integrity).await.expect("read"),
            b"jpeg bytes"
        );

        store.remove_hash(&stored.integrity).await.expect("remove");
        assert!(matches!(
            store.read_hash(&stored.integrity).await,
            Err(StoreError::Load(_))
        ));
    }

    #[tokio::test]
    async fn missing_entry_reads_as_none() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let store =
            PhotoBlobStore::new(PhotoCacheRoot::new(dir.path().to_path_buf()));
        let missing = store.read_entry("nothing/here").await.expect("read");
        assert!(missing.is_none());
    }
}
