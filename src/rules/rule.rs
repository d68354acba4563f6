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

//! Triage rules and priority tiers

use crate::evaluator::Condition;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Severity tier of a triage outcome
///
/// Lower weight means more urgent handling. `Black` sorts ahead of `Red`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    /// Expectant / deceased
    Black,
    /// Immediate
    Red,
    /// Delayed
    Yellow,
    /// Minor
    #[default]
    Green,
    /// Unrecognised tier, kept as written
    Unknown(String),
}

impl Priority {
    /// Sort weight (BLACK=0 .. GREEN=3, unknown=4)
    pub fn weight(&self) -> u8 {
        match self {
            Priority::Black => 0,
            Priority::Red => 1,
            Priority::Yellow => 2,
            Priority::Green => 3,
            Priority::Unknown(_) => 4,
        }
    }

    /// Parse a tier name, case-insensitively
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "BLACK" => Priority::Black,
            "RED" => Priority::Red,
            "YELLOW" => Priority::Yellow,
            "GREEN" => Priority::Green,
            _ => Priority::Unknown(name.to_string()),
        }
    }

    /// Canonical name
    pub fn as_str(&self) -> &str {
        match self {
            Priority::Black => "BLACK",
            Priority::Red => "RED",
            Priority::Yellow => "YELLOW",
            Priority::Green => "GREEN",
            Priority::Unknown(name) => name,
        }
    }

    /// Whether the name was recognised
    pub fn is_known(&self) -> bool {
        !matches!(self, Priority::Unknown(_))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Priority::parse(&name))
    }
}

/// A loaded triage rule
///
/// Immutable once the engine is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Compiled match predicate
    pub condition: Condition,
    /// Tier assigned when this rule is primary
    pub priority: Priority,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Recommended actions, in order
    pub actions: Vec<String>,
    /// Minutes until reassessment
    pub reassess_time: Option<u32>,
    /// Checked after every answer
    pub is_critical: bool,
}

impl Rule {
    /// Create a non-critical rule
    pub fn new(id: impl Into<String>, condition: Condition, priority: Priority) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            condition,
            priority,
            confidence: 1.0,
            actions: Vec::new(),
            reassess_time: None,
            is_critical: false,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the confidence, clamped to [0, 1]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    /// Append recommended actions
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.extend(actions.into_iter().map(Into::into));
        self
    }

    /// Set the reassessment interval in minutes
    pub fn with_reassess_time(mut self, minutes: u32) -> Self {
        self.reassess_time = Some(minutes);
        self
    }

    /// Mark as critical
    pub fn critical(mut self) -> Self {
        self.is_critical = true;
        self
    }
}

/// Clamp into [0, 1]; NaN becomes 0
pub(crate) fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
