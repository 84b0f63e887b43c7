use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::keys::{EditorCommand, KeyBindings};

/// Editor settings, usually read from the `editor` section of the project config
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    #[serde(default)]
    pub history: HistoryConfig,

    /// Extra shortcuts on top of the defaults (combo → command)
    #[serde(default)]
    pub key_bindings: BTreeMap<String, EditorCommand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Maximum number of undo levels (0 = unlimited)
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
}

fn default_max_levels() -> usize {
    100
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_levels: default_max_levels(),
        }
    }
}

impl EditorConfig {
    /// Default bindings with the configured overrides applied
    pub fn key_bindings(&self) -> KeyBindings {
        let mut bindings = KeyBindings::default();
        for (combo, command) in &self.key_bindings {
            bindings.bind(combo, *command);
        }
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "history": { "maxLevels": 20 },
            "keyBindings": { "mod+y": "redo" }
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.history.max_levels, 20);

        let bindings = config.key_bindings();
        assert_eq!(bindings.get("ctrl+y"), Some(EditorCommand::Redo));
        assert_eq!(bindings.get("ctrl+z"), Some(EditorCommand::Undo));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: EditorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.history.max_levels, 100);
    }
}
