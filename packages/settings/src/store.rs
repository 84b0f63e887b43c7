//! # Settings Storage
//!
//! [`SettingsStore`] is the persistence seam. Two implementations ship with the
//! crate:
//!
//! - [`MemorySettingsStore`]: records every operation in an ordered log, so
//!   callers can assert how often a partition was actually read
//! - [`JsonFileSettingsStore`]: one JSON object keyed by partition key

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::{Settings, SettingsError, SettingsKey};

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a record; `None` if it was never written
    async fn read(&self, key: &SettingsKey) -> Result<Option<Settings>, SettingsError>;

    async fn write(&self, key: &SettingsKey, settings: &Settings) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
}

/// One entry of the memory store's operation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOp {
    /// Monotonic, usable as a cursor into the log
    pub id: u64,
    pub operation: Operation,
    pub partition_key: String,
    pub at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryInner {
    records: HashMap<String, Settings>,
    log: Vec<StoreOp>,
}

#[derive(Default)]
pub struct MemorySettingsStore {
    inner: Mutex<MemoryInner>,
    latency: Option<Duration>,
    fail_reads: AtomicBool,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every read, so concurrent callers actually overlap
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make reads fail until switched off again
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub async fn logs(&self) -> Vec<StoreOp> {
        self.inner.lock().await.log.clone()
    }

    /// Id of the newest log entry (0 when empty)
    pub async fn last_op_id(&self) -> u64 {
        self.inner.lock().await.log.last().map(|op| op.id).unwrap_or(0)
    }

    /// Reads of `key` logged after the entry with id `after`
    pub async fn reads_since(&self, key: &SettingsKey, after: u64) -> usize {
        let partition_key = key.partition_key();
        self.inner
            .lock()
            .await
            .log
            .iter()
            .filter(|op| {
                op.id > after
                    && op.operation == Operation::Read
                    && op.partition_key == partition_key
            })
            .count()
    }

    fn record(inner: &mut MemoryInner, operation: Operation, partition_key: String) {
        let id = inner.log.len() as u64 + 1;
        trace!(id, ?operation, %partition_key, "store op");
        inner.log.push(StoreOp {
            id,
            operation,
            partition_key,
            at: Utc::now(),
        });
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn read(&self, key: &SettingsKey) -> Result<Option<Settings>, SettingsError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let partition_key = key.partition_key();
        let mut inner = self.inner.lock().await;
        Self::record(&mut inner, Operation::Read, partition_key.clone());

        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SettingsError::Store(format!(
                "read of {} failed",
                partition_key
            )));
        }
        Ok(inner.records.get(&partition_key).cloned())
    }

    async fn write(&self, key: &SettingsKey, settings: &Settings) -> Result<(), SettingsError> {
        let partition_key = key.partition_key();
        let mut inner = self.inner.lock().await;
        Self::record(&mut inner, Operation::Write, partition_key.clone());
        inner.records.insert(partition_key, settings.clone());
        Ok(())
    }
}

/// All records in one pretty-printed JSON file
pub struct JsonFileSettingsStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, Settings>, SettingsError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(source) if source.trim().is_empty() => Ok(HashMap::new()),
            Ok(source) => Ok(serde_json::from_str(&source)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn read(&self, key: &SettingsKey) -> Result<Option<Settings>, SettingsError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        Ok(records.remove(&key.partition_key()))
    }

    async fn write(&self, key: &SettingsKey, settings: &Settings) -> Result<(), SettingsError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        records.insert(key.partition_key(), settings.clone());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(&records)?;
        tokio::fs::write(&self.path, json).await?;

        debug!(path = %self.path.display(), key = %key, "settings written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SettingsKey {
        SettingsKey::new("root", "en-US", "PB")
    }

    #[tokio::test]
    async fn test_memory_store_logs_operations() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.read(&key()).await.unwrap(), None);

        let settings = Settings {
            name: Some("Site".to_string()),
            ..Default::default()
        };
        store.write(&key(), &settings).await.unwrap();
        assert_eq!(store.read(&key()).await.unwrap(), Some(settings));

        let ops: Vec<Operation> = store.logs().await.iter().map(|op| op.operation).collect();
        assert_eq!(ops, vec![Operation::Read, Operation::Write, Operation::Read]);
        assert_eq!(store.reads_since(&key(), 1).await, 1);
        assert_eq!(store.last_op_id().await, 3);
    }

    #[tokio::test]
    async fn test_memory_store_failing_reads() {
        let store = MemorySettingsStore::new();
        store.set_fail_reads(true);
        assert!(matches!(store.read(&key()).await, Err(SettingsError::Store(_))));

        store.set_fail_reads(false);
        assert!(store.read(&key()).await.is_ok());
    }

    #[tokio::test]
    async fn test_json_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSettingsStore::new(dir.path().join("nested").join("settings.json"));

        assert_eq!(store.read(&key()).await.unwrap(), None);

        let settings = Settings {
            website_url: Some("https://www.test.com".to_string()),
            ..Default::default()
        };
        store.write(&key(), &settings).await.unwrap();

        let other = SettingsKey::new("root", "de-DE", "PB");
        assert_eq!(store.read(&other).await.unwrap(), None);
        assert_eq!(store.read(&key()).await.unwrap(), Some(settings));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("T#root#L#en-US#PB#SETTINGS"));
    }
}
