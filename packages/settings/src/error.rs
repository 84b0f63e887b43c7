use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SettingsError {
    /// Stable code reported in error responses
    pub fn code(&self) -> &'static str {
        match self {
            SettingsError::Store(_) => "SETTINGS_STORE_ERROR",
            SettingsError::Io(_) => "SETTINGS_IO_ERROR",
            SettingsError::Json(_) => "SETTINGS_INVALID_DATA",
        }
    }
}
