//! Image persistence.
//!
//! # Responsibilities
//! - Create the output directory once, before any worker starts
//! - Map descriptor names to file names inside that directory
//! - Write images atomically (temporary file, then rename)
//!
//! # Design Decisions
//! - Path separators in names become underscores so every image lands
//!   directly in the output directory
//! - Collisions follow the configured policy; overwrite is logged
//! - Every save gets its own temporary name, so concurrent overwrites of one
//!   image never share a partial file

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use thiserror::Error;

use crate::config::CollisionPolicy;

const IMAGE_EXTENSION: &str = "png";

/// Errors raised by the image store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Output directory for rendered images.
#[derive(Debug)]
pub struct ImageStore {
    dir: PathBuf,
    policy: CollisionPolicy,
    issued: Mutex<HashSet<String>>,
    temp_seq: AtomicU64,
}

impl ImageStore {
    /// Open the store, creating `dir` if it does not exist.
    pub fn create(dir: impl Into<PathBuf>, policy: CollisionPolicy) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        tracing::debug!(dir = %dir.display(), "Output directory ready");

        Ok(Self {
            dir,
            policy,
            issued: Mutex::new(HashSet::new()),
            temp_seq: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` as `<name>.png` and return the final path.
    pub async fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let stem = self.reserve(name);
        let path = self.dir.join(format!("{}.{}", stem, IMAGE_EXTENSION));
        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        let partial = self
            .dir
            .join(format!(".{}.{}.{}.part", stem, IMAGE_EXTENSION, seq));

        let write_err = |source: std::io::Error| StoreError::Write {
            path: path.clone(),
            source,
        };

        if let Err(e) = tokio::fs::write(&partial, bytes).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(write_err(e));
        }
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(write_err(e));
        }
        Ok(path)
    }

    /// Resolve the file stem for `name` under the collision policy.
    fn reserve(&self, name: &str) -> String {
        let stem = file_stem(name);
        let mut issued = self
            .issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if issued.insert(stem.clone()) {
            return stem;
        }

        match self.policy {
            CollisionPolicy::Overwrite => {
                tracing::warn!(name = %stem, "Image name already written in this run, overwriting");
                stem
            }
            CollisionPolicy::Suffix => {
                let unique = (1..)
                    .map(|i| format!("{}_{}", stem, i))
                    .find(|candidate| !issued.contains(candidate))
                    .unwrap_or_else(|| stem.clone());
                issued.insert(unique.clone());
                tracing::info!(name = %stem, renamed = %unique, "Image name collision, using suffix");
                unique
            }
        }
    }
}

/// File-system safe stem for a descriptor name.
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    if stem.is_empty() || stem == "." || stem == ".." {
        format!("_{}", stem)
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Read/Write_Ops_A"), "Read_Write_Ops_A");
        assert_eq!(file_stem("a\\b"), "a_b");
        assert_eq!(file_stem(".."), "_..");
        assert_eq!(file_stem(""), "_");
        assert_eq!(file_stem("QPS_A"), "QPS_A");
    }

    #[test]
    fn test_create_makes_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("PngDir");
        let store = ImageStore::create(&dir, CollisionPolicy::Overwrite).unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_create_fails_on_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            ImageStore::create(&file, CollisionPolicy::Overwrite),
            Err(StoreError::CreateDir { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_writes_final_file_only() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::create(tmp.path(), CollisionPolicy::Overwrite).unwrap();

        let path = store.save("QPS_A", b"png-bytes").await.unwrap();

        assert_eq!(path, tmp.path().join("QPS_A.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_policy() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::create(tmp.path(), CollisionPolicy::Overwrite).unwrap();

        let first = store.save("dup_A", b"first").await.unwrap();
        let second = store.save("dup_A", b"second").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overwrites_of_one_name() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::create(tmp.path(), CollisionPolicy::Overwrite).unwrap();
        let big_a = vec![b'a'; 256 * 1024];
        let big_b = vec![b'b'; 256 * 1024];

        for _ in 0..20 {
            let (a, b) = tokio::join!(store.save("same_A", &big_a), store.save("same_A", &big_b));
            assert_eq!(a.unwrap(), tmp.path().join("same_A.png"));
            assert_eq!(b.unwrap(), tmp.path().join("same_A.png"));

            let written = std::fs::read(tmp.path().join("same_A.png")).unwrap();
            assert!(written == big_a || written == big_b);
        }

        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["same_A.png".to_string()]);
    }

    #[tokio::test]
    async fn test_suffix_policy() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::create(tmp.path(), CollisionPolicy::Suffix).unwrap();

        store.save("dup_A", b"0").await.unwrap();
        store.save("dup_A_1", b"explicit").await.unwrap();
        let second = store.save("dup_A", b"1").await.unwrap();

        assert_eq!(second, tmp.path().join("dup_A_2.png"));
        assert_eq!(std::fs::read(tmp.path().join("dup_A_1.png")).unwrap(), b"explicit");
    }
}
