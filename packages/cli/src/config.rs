use pagebuilder_editor::EditorConfig;
use pagebuilder_settings::SettingsConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "pagebuilder.config.json";

/// Page builder project configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// History limit and key bindings
    #[serde(flatten)]
    pub editor: EditorConfig,

    /// Tenant, locale and namespace of the settings record
    #[serde(flatten)]
    pub settings: SettingsConfig,

    /// Settings store file, relative to the project directory
    #[serde(default = "default_settings_store")]
    pub settings_store: String,
}

fn default_settings_store() -> String {
    ".pagebuilder/settings.json".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to the settings store
    pub fn get_settings_store(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.settings_store)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor: EditorConfig::default(),
            settings: SettingsConfig::default(),
            settings_store: default_settings_store(),
        }
    }
}
