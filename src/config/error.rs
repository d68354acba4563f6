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

//! Configuration load errors

use crate::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticCode};
use crate::parser::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures that prevent an engine from being built
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the document failed
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid YAML/JSON or does not have the expected shape
    #[error("Malformed {format} document: {message}")]
    Malformed {
        /// `yaml` or `json`
        format: &'static str,
        /// Deserializer message
        message: String,
    },

    /// File extension is neither YAML nor JSON
    #[error("Unsupported configuration format: {}", path.display())]
    UnsupportedFormat {
        /// Offending file
        path: PathBuf,
    },

    /// Two rules share an id
    #[error("Duplicate rule id '{0}'")]
    DuplicateRuleId(String),

    /// Two steps share an id
    #[error("Duplicate step id '{0}'")]
    DuplicateStepId(String),

    /// Rule confidence outside [0, 1]
    #[error("Rule '{rule}' has confidence {value} outside [0, 1]")]
    InvalidConfidence {
        /// Rule id
        rule: String,
        /// Declared confidence
        value: f64,
    },

    /// Step definition that cannot be answered
    #[error("Step '{step}' is invalid: {reason}")]
    InvalidStep {
        /// Step id
        step: String,
        /// What is wrong
        reason: String,
    },

    /// Requested profile is not in the document
    #[error("Unknown profile '{0}'")]
    UnknownProfile(String),

    /// Unparsable condition in strict mode
    #[error("Invalid condition in '{origin}': {error}")]
    InvalidCondition {
        /// Rule or step id
        origin: String,
        /// Condition text
        source_text: String,
        /// Parser failure
        error: ParseError,
    },

    /// A profile of a multi-profile document failed validation
    #[error("Profile '{profile}': {source}")]
    InProfile {
        /// Profile name
        profile: String,
        /// Validation failure inside the profile
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    pub(crate) fn malformed(format: &'static str, message: impl ToString) -> Self {
        ConfigError::Malformed {
            format,
            message: message.to_string(),
        }
    }

    pub(crate) fn invalid_step(step: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidStep {
            step: step.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn in_profile(self, profile: &str) -> Self {
        ConfigError::InProfile {
            profile: profile.to_string(),
            source: Box::new(self),
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = self.to_string();
        match self {
            ConfigError::Io { path, .. } | ConfigError::UnsupportedFormat { path } => {
                DiagnosticBuilder::error(DiagnosticCode::Io)
                    .with_message(message)
                    .with_origin(path.display().to_string())
                    .build()
            }
            ConfigError::Malformed { .. } => DiagnosticBuilder::error(DiagnosticCode::MalformedDocument)
                .with_message(message)
                .build(),
            ConfigError::DuplicateRuleId(id) | ConfigError::DuplicateStepId(id) => {
                DiagnosticBuilder::error(DiagnosticCode::DuplicateId)
                    .with_message(message)
                    .with_origin(id.as_str())
                    .build()
            }
            ConfigError::InvalidConfidence { rule, .. } => {
                DiagnosticBuilder::error(DiagnosticCode::InvalidConfidence)
                    .with_message(message)
                    .with_origin(rule.as_str())
                    .build()
            }
            ConfigError::InvalidStep { step, .. } => DiagnosticBuilder::error(DiagnosticCode::InvalidStep)
                .with_message(message)
                .with_origin(step.as_str())
                .build(),
            ConfigError::UnknownProfile(_) => DiagnosticBuilder::error(DiagnosticCode::UnknownProfile)
                .with_message(message)
                .build(),
            ConfigError::InvalidCondition {
                origin,
                source_text,
                error,
            } => {
                let mut diagnostic = error.to_diagnostic();
                diagnostic.location.source_text = Some(source_text.clone());
                diagnostic.with_origin(origin.as_str())
            }
            ConfigError::InProfile { source, .. } => {
                let mut diagnostic = source.to_diagnostic();
                diagnostic.message = message;
                diagnostic
            }
        }
    }
}
