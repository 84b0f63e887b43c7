//! # Request-scoped Settings Cache
//!
//! One cell per partition key. The first `get` for a key runs the store read;
//! every other `get` for that key, concurrent or later, waits on the same cell
//! and gets the same value.
//!
//! ```text
//! get(key) ─┐
//! get(key) ─┼→ OnceCell(key) ──(first caller only)──→ SettingsStore::read
//! get(key) ─┘
//!
//! update(key, patch) → merge + normalize → SettingsStore::write → cell replaced
//! ```
//!
//! A failed read leaves the cell empty, so the next `get` tries again.
//!
//! Updates for the same key run one at a time: each one merges into the
//! record the previous update left behind.
//!
//! The cache lives exactly as long as its [`RequestContext`](crate::RequestContext).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OnceCell};
use tracing::debug;

use crate::{Settings, SettingsError, SettingsKey, SettingsStore};

type Cell = Arc<OnceCell<Option<Settings>>>;

pub struct SettingsCache {
    store: Arc<dyn SettingsStore>,
    cells: Mutex<HashMap<String, Cell>>,
    writers: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SettingsCache {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            cells: Mutex::new(HashMap::new()),
            writers: Mutex::new(HashMap::new()),
        }
    }

    fn cell(&self, key: &SettingsKey) -> Cell {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.entry(key.partition_key()).or_default().clone()
    }

    fn writer(&self, key: &SettingsKey) -> Arc<AsyncMutex<()>> {
        let mut writers = self.writers.lock().unwrap_or_else(PoisonError::into_inner);
        writers.entry(key.partition_key()).or_default().clone()
    }

    /// Read settings, hitting the store at most once per key
    pub async fn get(&self, key: &SettingsKey) -> Result<Option<Settings>, SettingsError> {
        let cell = self.cell(key);
        let settings = cell
            .get_or_try_init(|| async {
                debug!(key = %key, "settings cache miss");
                self.store.read(key).await
            })
            .await?;
        Ok(settings.clone())
    }

    /// Merge `patch` into the current record, normalize, persist, and make the
    /// result what every following `get` returns.
    pub async fn update(&self, key: &SettingsKey, patch: Settings) -> Result<Settings, SettingsError> {
        let writer = self.writer(key);
        let _guard = writer.lock().await;

        let current = self.get(key).await?.unwrap_or_default();
        let settings = current.merge(patch).normalized();

        self.store.write(key, &settings).await?;
        self.prime(key, settings.clone());

        debug!(key = %key, "settings updated");
        Ok(settings)
    }

    fn prime(&self, key: &SettingsKey, settings: Settings) {
        let cell = Arc::new(OnceCell::new_with(Some(Some(settings))));
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.insert(key.partition_key(), cell);
    }

    /// Whether a value for `key` is already held
    pub fn is_cached(&self, key: &SettingsKey) -> bool {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells
            .get(&key.partition_key())
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }
}
