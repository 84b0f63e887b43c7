//! Error types for the editor

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Action error: {0}")]
    Action(#[from] crate::actions::ActionError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] crate::plugins::PluginError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document is not file-backed")]
    NotFileBacked,
}
