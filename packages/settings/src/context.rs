use std::sync::Arc;

use crate::{SettingsCache, SettingsKey, SettingsStore};

/// State for one request.
///
/// Everything resolved while handling the request shares this context, and
/// with it one [`SettingsCache`]. Build a fresh context per request; dropping
/// it discards whatever the cache held.
pub struct RequestContext {
    key: SettingsKey,
    settings: SettingsCache,
}

impl RequestContext {
    pub fn new(key: SettingsKey, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            key,
            settings: SettingsCache::new(store),
        }
    }

    /// Settings key of the tenant and locale this request runs for
    pub fn key(&self) -> &SettingsKey {
        &self.key
    }

    pub fn settings(&self) -> &SettingsCache {
        &self.settings
    }
}
