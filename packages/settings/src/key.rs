use std::fmt;

use serde::{Deserialize, Serialize};

/// Composite identifier of a settings record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettingsKey {
    pub tenant: String,
    pub locale: String,
    pub namespace: String,
}

impl SettingsKey {
    pub fn new(
        tenant: impl Into<String>,
        locale: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            locale: locale.into(),
            namespace: namespace.into(),
        }
    }

    /// Storage partition key, e.g. `T#root#L#en-US#PB#SETTINGS`
    pub fn partition_key(&self) -> String {
        format!(
            "T#{}#L#{}#{}#SETTINGS",
            self.tenant, self.locale, self.namespace
        )
    }
}

impl fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.partition_key())
    }
}
