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

//! Assessment steps

use crate::evaluator::Condition;
use crate::model::FieldValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default lower bound of a scale step
pub const DEFAULT_SCALE_MIN: i64 = 1;
/// Default upper bound of a scale step
pub const DEFAULT_SCALE_MAX: i64 = 10;

/// How a step collects its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    /// One option
    Single,
    /// One integer in a range
    Scale,
    /// Any number of options
    Multi,
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepType::Single => write!(f, "single"),
            StepType::Scale => write!(f, "scale"),
            StepType::Multi => write!(f, "multi"),
        }
    }
}

/// Display colour of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    /// Green
    Green,
    /// Yellow
    Yellow,
    /// Orange
    Orange,
    /// Red
    Red,
    /// Gray
    #[default]
    Gray,
    /// Blue
    Blue,
}

/// One selectable answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOption {
    /// Value stored in the record
    pub value: FieldValue,
    /// Display label
    pub label: String,
    /// Display colour
    #[serde(default)]
    pub color: ColorTag,
    /// Highlighted as a critical finding
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub critical: bool,
    /// Longer explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StepOption {
    /// Create an option with the default colour
    pub fn new(value: impl Into<FieldValue>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            color: ColorTag::default(),
            critical: false,
            description: None,
        }
    }

    /// Set the colour
    pub fn with_color(mut self, color: ColorTag) -> Self {
        self.color = color;
        self
    }

    /// Mark as critical
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }
}

/// A question in the assessment flow
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentStep {
    /// Unique identifier
    pub id: String,
    /// Prompt shown to the assessor
    pub question: String,
    /// Answer kind
    pub step_type: StepType,
    /// Record field written by this step (dotted for nested groups)
    pub field: String,
    /// Selectable answers
    pub options: Vec<StepOption>,
    /// Whether the flow waits for this step
    pub required: bool,
    /// Step is skipped while this holds
    pub skip_if: Option<Condition>,
    /// Longer explanation
    pub description: Option<String>,
    /// Assessor hint
    pub help_text: Option<String>,
    /// Scale lower bound
    pub min: Option<i64>,
    /// Scale upper bound
    pub max: Option<i64>,
}

impl AssessmentStep {
    /// Create a required step without options
    pub fn new(
        id: impl Into<String>,
        step_type: StepType,
        field: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            step_type,
            field: field.into(),
            options: Vec::new(),
            required: true,
            skip_if: None,
            description: None,
            help_text: None,
            min: None,
            max: None,
        }
    }

    /// Append options
    pub fn with_options(mut self, options: impl IntoIterator<Item = StepOption>) -> Self {
        self.options.extend(options);
        self
    }

    /// Set the skip predicate
    pub fn with_skip_if(mut self, condition: Condition) -> Self {
        self.skip_if = Some(condition);
        self
    }

    /// Set the scale bounds
    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Mark as optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Inclusive scale bounds
    pub fn scale_range(&self) -> (i64, i64) {
        (
            self.min.unwrap_or(DEFAULT_SCALE_MIN),
            self.max.unwrap_or(DEFAULT_SCALE_MAX),
        )
    }

    /// Option whose value equals `value`
    pub fn option(&self, value: &FieldValue) -> Option<&StepOption> {
        self.options.iter().find(|option| option.value.loose_eq(value))
    }

    fn is_option_value(&self, value: &FieldValue) -> bool {
        if self.options.is_empty() {
            value.is_scalar()
        } else {
            self.option(value).is_some()
        }
    }

    /// Whether `value` is a valid answer for this step
    ///
    /// Multi steps take either the whole selection as a list or one option
    /// value to toggle.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match self.step_type {
            StepType::Single => value.is_scalar() && self.is_option_value(value),
            StepType::Scale => {
                let (min, max) = self.scale_range();
                value.as_integer().is_some_and(|n| (min..=max).contains(&n))
            }
            StepType::Multi => match value {
                FieldValue::List(items) => items.iter().all(|item| self.is_option_value(item)),
                other => self.is_option_value(other),
            },
        }
    }
}
