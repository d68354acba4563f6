//! Named configuration profiles
//!
//! A document may hold several role-specific questionnaires under
//! `profiles`, one of which is selected at load time.

use super::document::TriageConfig;
use super::error::{ConfigError, ConfigResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Profile map plus the default selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileCatalog {
    /// Profiles by name, in declared order
    pub profiles: IndexMap<String, TriageConfig>,
    /// Profile used when none is requested; the first one otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ProfileCatalog {
    /// Pick a profile by name, or the default
    pub fn select(&self, name: Option<&str>) -> ConfigResult<(&str, &TriageConfig)> {
        let wanted = name.or(self.default.as_deref());
        match wanted {
            Some(name) => self
                .profiles
                .get_key_value(name)
                .map(|(key, config)| (key.as_str(), config))
                .ok_or_else(|| ConfigError::UnknownProfile(name.to_string())),
            None => self
                .profiles
                .first()
                .map(|(key, config)| (key.as_str(), config))
                .ok_or_else(|| ConfigError::UnknownProfile("<default>".to_string())),
        }
    }

    /// Profile names in declared order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

/// A parsed document: a single configuration or a profile catalog
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigDocument {
    /// Top-level `triageRules` / `assessmentFlow`
    Single(TriageConfig),
    /// Top-level `profiles`
    Profiles(ProfileCatalog),
}

impl ConfigDocument {
    /// Resolve the configuration to build
    ///
    /// Asking a single-configuration document for a named profile fails.
    pub fn select(&self, profile: Option<&str>) -> ConfigResult<(Option<&str>, &TriageConfig)> {
        match (self, profile) {
            (ConfigDocument::Single(config), None) => Ok((None, config)),
            (ConfigDocument::Single(_), Some(name)) => Err(ConfigError::UnknownProfile(name.to_string())),
            (ConfigDocument::Profiles(catalog), name) => {
                let (name, config) = catalog.select(name)?;
                Ok((Some(name), config))
            }
        }
    }
}
