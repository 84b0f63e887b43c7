//! Settings read/update entry points.
//!
//! Both operations answer with a [`SettingsResponse`] envelope rather than a
//! `Result`: store failures land in `error`, a record that was never written is
//! `data: None` with no error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::{RequestContext, Settings, SettingsConfig, SettingsError, SettingsKey, SettingsStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&SettingsError> for ErrorResponse {
    fn from(error: &SettingsError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub data: Option<Settings>,
    pub error: Option<ErrorResponse>,
    /// Partition key of the record
    pub id: String,
}

impl SettingsResponse {
    fn from_result(key: &SettingsKey, result: Result<Option<Settings>, SettingsError>) -> Self {
        let id = key.partition_key();
        match result {
            Ok(data) => Self { data, error: None, id },
            Err(e) => {
                warn!(key = %key, error = %e, "settings request failed");
                Self {
                    data: None,
                    error: Some(ErrorResponse::from(&e)),
                    id,
                }
            }
        }
    }
}

pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    config: SettingsConfig,
}

impl SettingsService {
    pub fn new(store: Arc<dyn SettingsStore>, config: SettingsConfig) -> Self {
        Self { store, config }
    }

    /// Start a request for the configured tenant and locale
    pub fn begin_request(&self) -> RequestContext {
        RequestContext::new(self.config.key(), self.store.clone())
    }

    /// Start a request for an explicit key
    pub fn begin_request_for(&self, key: SettingsKey) -> RequestContext {
        RequestContext::new(key, self.store.clone())
    }

    #[instrument(level = "debug", skip_all, fields(key = %ctx.key()))]
    pub async fn get_settings(&self, ctx: &RequestContext) -> SettingsResponse {
        let result = ctx.settings().get(ctx.key()).await;
        SettingsResponse::from_result(ctx.key(), result)
    }

    #[instrument(level = "debug", skip_all, fields(key = %ctx.key()))]
    pub async fn update_settings(&self, ctx: &RequestContext, data: Settings) -> SettingsResponse {
        let result = ctx.settings().update(ctx.key(), data).await.map(Some);
        SettingsResponse::from_result(ctx.key(), result)
    }
}
