// Copyright 2024 Shifa Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration loading
//!
//! The declarative document ([`TriageConfig`], optionally wrapped in a
//! [`ProfileCatalog`]) is parsed from YAML or JSON, validated and compiled
//! into a [`TriageEngine`](crate::engine::TriageEngine) by the
//! [`ConfigLoader`]. [`EngineConfig`] holds the knobs for that compilation.

pub mod document;
pub mod error;
pub mod loader;
pub mod profiles;

pub use document::{RuleDefinition, StepDefinition, TriageConfig};
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, DocumentFormat, REFERENCE_CONFIG};
pub use profiles::{ConfigDocument, ProfileCatalog};

use crate::flow::{DEFAULT_SCALE_MAX, DEFAULT_SCALE_MIN};
use crate::parser::DEFAULT_MAX_DEPTH;

/// Options for compiling a configuration into an engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Reject unparsable conditions instead of loading them as never-matching
    pub strict_conditions: bool,

    /// Maximum condition nesting depth
    pub max_condition_depth: usize,

    /// Bounds used by scale steps that declare none
    pub default_scale_range: (i64, i64),

    /// Log condition failures with `log::warn!`
    pub log_diagnostics: bool,

    /// Profile to select from a multi-profile document
    pub profile: Option<String>,
}

impl EngineConfig {
    /// Start a builder from the defaults
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Configuration that rejects any invalid condition
    pub fn strict() -> Self {
        Self {
            strict_conditions: true,
            ..Self::default()
        }
    }

    /// Configuration for tests: lenient and quiet
    pub fn testing() -> Self {
        Self {
            log_diagnostics: false,
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_conditions: false,
            max_condition_depth: DEFAULT_MAX_DEPTH,
            default_scale_range: (DEFAULT_SCALE_MIN, DEFAULT_SCALE_MAX),
            log_diagnostics: true,
            profile: None,
        }
    }
}

/// Fluent builder for [`EngineConfig`]
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Reject unparsable conditions
    pub fn strict_conditions(mut self, strict: bool) -> Self {
        self.config.strict_conditions = strict;
        self
    }

    /// Set the maximum condition nesting depth
    pub fn max_condition_depth(mut self, depth: usize) -> Self {
        self.config.max_condition_depth = depth;
        self
    }

    /// Set the bounds for scale steps without explicit ones
    pub fn default_scale_range(mut self, min: i64, max: i64) -> Self {
        self.config.default_scale_range = (min, max);
        self
    }

    /// Toggle warning logs for condition failures
    pub fn log_diagnostics(mut self, enabled: bool) -> Self {
        self.config.log_diagnostics = enabled;
        self
    }

    /// Select a named profile
    pub fn profile(mut self, name: impl Into<String>) -> Self {
        self.config.profile = Some(name.into());
        self
    }

    /// Finish
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert!(!config.strict_conditions);
        assert_eq!(config.max_condition_depth, 64);
        assert_eq!(config.default_scale_range, (1, 10));
        assert!(config.log_diagnostics);
        assert_eq!(config.profile, None);
    }

    #[test]
    fn test_engine_config_builder() {
        let config = EngineConfig::builder()
            .strict_conditions(true)
            .max_condition_depth(16)
            .default_scale_range(0, 5)
            .log_diagnostics(false)
            .profile("field")
            .build();
        assert!(config.strict_conditions);
        assert_eq!(config.max_condition_depth, 16);
        assert_eq!(config.default_scale_range, (0, 5));
        assert!(!config.log_diagnostics);
        assert_eq!(config.profile.as_deref(), Some("field"));
    }

    #[test]
    fn test_engine_config_presets() {
        assert!(EngineConfig::strict().strict_conditions);
        assert!(!EngineConfig::testing().log_diagnostics);
    }
}
