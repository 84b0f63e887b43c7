use serde::{Deserialize, Serialize};

use crate::SettingsKey;

/// Which settings record a deployment serves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsConfig {
    #[serde(default = "default_tenant")]
    pub tenant: String,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_tenant() -> String {
    "root".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_namespace() -> String {
    "PB".to_string()
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            tenant: default_tenant(),
            locale: default_locale(),
            namespace: default_namespace(),
        }
    }
}

impl SettingsConfig {
    pub fn key(&self) -> SettingsKey {
        SettingsKey::new(&self.tenant, &self.locale, &self.namespace)
    }
}
