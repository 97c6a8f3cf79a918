//! Local filesystem capability store

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{StoreError, StoreResult};
use crate::traits::{CapabilityStore, check_key};

const RECORDS_DIR: &str = "capabilities";
const RECORD_EXT: &str = "json";

/// On-disk envelope; keeps the original key so `keys()` can list it
#[derive(Serialize, Deserialize)]
struct Record {
    key: String,
    value: String,
}

/// One JSON file per key
///
/// Structure: `{root}/capabilities/{blake3(key)}.json`. Keys contain `:`
/// and `0x` addresses, so file names are derived from the key hash rather
/// than the key itself.
pub struct LocalFileCapabilityStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl LocalFileCapabilityStore {
    /// Open (or create) a store rooted at `root`
    pub async fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(RECORDS_DIR)).await?;
        Ok(Self {
            root,
            tmp_counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn records_dir(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }

    fn record_path(&self, key: &str) -> PathBuf {
        let name = blake3::hash(key.as_bytes()).to_hex();
        self.records_dir().join(format!("{name}.{RECORD_EXT}"))
    }

    fn tmp_path(&self, key: &str) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let name = blake3::hash(key.as_bytes()).to_hex();
        self.records_dir()
            .join(format!(".{name}.{}.{n}.tmp", std::process::id()))
    }

    async fn read_record(&self, path: &Path) -> StoreResult<Option<Record>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl CapabilityStore for LocalFileCapabilityStore {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.record_path(key);
        match self.read_record(&path).await? {
            Some(record) if record.key == key => Ok(Some(record.value)),
            Some(record) => {
                tracing::warn!(path = %path.display(), stored_key = %record.key, "record key does not match lookup key");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        check_key(key)?;
        let record = Record {
            key: key.to_string(),
            value: value.to_string(),
        };
        let bytes = serde_json::to_vec_pretty(&record)?;

        let tmp = self.tmp_path(key);
        fs::write(&tmp, &bytes).await?;
        if let Err(e) = fs::rename(&tmp, self.record_path(key)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(key, bytes = bytes.len(), "capability record written");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.record_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();

        let mut entries = fs::read_dir(self.records_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.') && n.ends_with(RECORD_EXT));
            if !is_record {
                continue;
            }

            match self.read_record(&path).await {
                Ok(Some(record)) => keys.push(record.key),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "skipping unreadable capability record"),
            }
        }

        Ok(keys)
    }
}
