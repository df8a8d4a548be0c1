//! Manager settings
//!
//! [`ManagerSettings`] is the programmatic configuration. The declarative
//! part of it can also be loaded from JSON through [`SettingsConfig`].

use crate::error::PlumeResult;
use crate::priority::Priority;
use crate::schema::IdentifierSchemaAttributes;
use plume_model::{Plugin, Schema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Capabilities to skip, globally (settings) or per extension (`exclude`
/// option)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Exclude {
    pub attributes: bool,
    pub plugins: bool,
    pub tags: bool,
    pub node_views: bool,
}

#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Priority overrides by extension name
    pub priority: BTreeMap<String, Priority>,
    pub exclude: Exclude,
    /// Attribute groups injected into matching node and mark types
    pub extra_attributes: Vec<IdentifierSchemaAttributes>,
    pub disable_extra_attributes: bool,
    /// Full schema override. Skips attribute merging entirely.
    pub schema: Option<Rc<Schema>>,
    /// Plugins placed before every extension plugin
    pub plugins: Vec<Plugin>,
    pub editable: bool,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            priority: BTreeMap::new(),
            exclude: Exclude::default(),
            extra_attributes: Vec::new(),
            disable_extra_attributes: false,
            schema: None,
            plugins: Vec::new(),
            editable: true,
        }
    }
}

/// JSON form of the declarative settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsConfig {
    #[serde(default)]
    pub priority: BTreeMap<String, Priority>,

    #[serde(default)]
    pub exclude: Exclude,

    #[serde(default)]
    pub disable_extra_attributes: bool,

    #[serde(default = "default_editable")]
    pub editable: bool,
}

fn default_editable() -> bool {
    true
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            priority: BTreeMap::new(),
            exclude: Exclude::default(),
            disable_extra_attributes: false,
            editable: default_editable(),
        }
    }
}

impl SettingsConfig {
    pub fn from_json(json: &str) -> PlumeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_settings(self) -> ManagerSettings {
        ManagerSettings {
            priority: self.priority,
            exclude: self.exclude,
            disable_extra_attributes: self.disable_extra_attributes,
            editable: self.editable,
            ..ManagerSettings::default()
        }
    }
}

impl From<SettingsConfig> for ManagerSettings {
    fn from(config: SettingsConfig) -> Self {
        config.into_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let json = r#"{
            "priority": { "bold": 1000, "paragraph": 5 },
            "exclude": { "nodeViews": true, "plugins": true },
            "disableExtraAttributes": true
        }"#;

        let config = SettingsConfig::from_json(json).unwrap();
        assert_eq!(config.priority["bold"], Priority::MEDIUM);
        assert!(config.exclude.node_views);
        assert!(config.exclude.plugins);
        assert!(!config.exclude.tags);
        assert!(config.editable);

        let settings = config.into_settings();
        assert!(settings.disable_extra_attributes);
        assert!(settings.schema.is_none());
    }

    #[test]
    fn test_default_settings() {
        let settings = ManagerSettings::default();
        assert!(settings.editable);
        assert!(settings.priority.is_empty());
        assert_eq!(settings.exclude, Exclude::default());
    }

    #[test]
    fn test_invalid_settings() {
        assert!(SettingsConfig::from_json(r#"{ "editable": "yes" }"#).is_err());
    }
}
