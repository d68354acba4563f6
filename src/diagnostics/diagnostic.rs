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

//! Core diagnostic types

use super::location::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity levels
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Hint - subtle suggestion for improvement
    Hint,
    /// Information - provides helpful information
    #[default]
    Info,
    /// Warning - something was ignored or treated as false
    Warning,
    /// Error - prevents successful loading
    Error,
}

/// Diagnostic error codes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticCode {
    // Parsing errors
    /// Unexpected token in expression
    UnexpectedToken,
    /// Expected a specific token
    ExpectedToken {
        /// Token that was expected
        token: String,
    },
    /// Input ended in the middle of an expression
    UnexpectedEof,
    /// Unclosed string literal
    UnclosedString,
    /// Invalid number format
    InvalidNumber,
    /// Unknown function
    UnknownFunction,
    /// Expression nested deeper than allowed
    NestingTooDeep,

    // Evaluation errors
    /// Type mismatch
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type found
        actual: String,
    },
    /// Division by zero
    DivisionByZero,
    /// Condition failed to compile and is treated as false
    InvalidCondition,

    // Configuration
    /// Malformed document
    MalformedDocument,
    /// Identifier used twice
    DuplicateId,
    /// Confidence outside [0, 1]
    InvalidConfidence,
    /// Step definition cannot be answered
    InvalidStep,
    /// Priority string not recognised
    UnknownPriority,
    /// Condition references a field no step collects
    UncollectedField,
    /// Profile name not in the catalog
    UnknownProfile,
    /// File could not be read or has an unsupported format
    Io,

    // Session
    /// Answer for a field no step collects
    UnknownField,
    /// Answer rejected by the step type
    InvalidAnswer,
}

/// A diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the diagnostic
    pub severity: Severity,
    /// Error code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// Source location
    pub location: SourceLocation,
    /// Simple contextual help message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(
        code: DiagnosticCode,
        severity: Severity,
        message: String,
        location: SourceLocation,
    ) -> Self {
        let help = Self::generate_help(&code);
        Self {
            severity,
            code,
            message,
            location,
            help,
        }
    }

    /// Generate simple contextual help based on diagnostic code
    fn generate_help(code: &DiagnosticCode) -> Option<String> {
        match code {
            DiagnosticCode::UnknownFunction => {
                Some("Only exists(field) and count(field) are available".to_string())
            }
            DiagnosticCode::ExpectedToken { .. } => {
                Some("Check expression syntax for missing or incorrect tokens".to_string())
            }
            DiagnosticCode::TypeMismatch { .. } => {
                Some("Compare numbers with numbers and text with text".to_string())
            }
            DiagnosticCode::UnclosedString => {
                Some("Close the string with the same quote it was opened with".to_string())
            }
            DiagnosticCode::DivisionByZero => {
                Some("Ensure divisor is not zero before performing division".to_string())
            }
            DiagnosticCode::UncollectedField => {
                Some("Check the field name against the assessment steps".to_string())
            }
            _ => None,
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        matches!(self.severity, Severity::Warning)
    }

    /// Get the diagnostic code as a string
    pub fn code_string(&self) -> String {
        match &self.code {
            DiagnosticCode::UnexpectedToken => "E001".to_string(),
            DiagnosticCode::ExpectedToken { .. } => "E002".to_string(),
            DiagnosticCode::UnexpectedEof => "E003".to_string(),
            DiagnosticCode::UnclosedString => "E004".to_string(),
            DiagnosticCode::InvalidNumber => "E005".to_string(),
            DiagnosticCode::UnknownFunction => "E006".to_string(),
            DiagnosticCode::NestingTooDeep => "E007".to_string(),
            DiagnosticCode::TypeMismatch { .. } => "E100".to_string(),
            DiagnosticCode::DivisionByZero => "E101".to_string(),
            DiagnosticCode::InvalidCondition => "E102".to_string(),
            DiagnosticCode::MalformedDocument => "C001".to_string(),
            DiagnosticCode::DuplicateId => "C002".to_string(),
            DiagnosticCode::InvalidConfidence => "C003".to_string(),
            DiagnosticCode::InvalidStep => "C004".to_string(),
            DiagnosticCode::UnknownPriority => "C005".to_string(),
            DiagnosticCode::UncollectedField => "C006".to_string(),
            DiagnosticCode::UnknownProfile => "C007".to_string(),
            DiagnosticCode::Io => "C008".to_string(),
            DiagnosticCode::UnknownField => "S001".to_string(),
            DiagnosticCode::InvalidAnswer => "S002".to_string(),
        }
    }

    /// Attach the owning rule or step
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.location.origin = Some(origin.into());
        self
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            match self.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARN",
                Severity::Info => "INFO",
                Severity::Hint => "HINT",
            },
            self.code,
            self.message
        )
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCode::UnexpectedToken => write!(f, "unexpected token"),
            DiagnosticCode::ExpectedToken { token } => write!(f, "expected '{token}'"),
            DiagnosticCode::UnexpectedEof => write!(f, "unexpected end of expression"),
            DiagnosticCode::UnclosedString => write!(f, "unclosed string literal"),
            DiagnosticCode::InvalidNumber => write!(f, "invalid number format"),
            DiagnosticCode::UnknownFunction => write!(f, "unknown function"),
            DiagnosticCode::NestingTooDeep => write!(f, "expression nested too deeply"),
            DiagnosticCode::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {expected}, found {actual}")
            }
            DiagnosticCode::DivisionByZero => write!(f, "division by zero"),
            DiagnosticCode::InvalidCondition => write!(f, "invalid condition"),
            DiagnosticCode::MalformedDocument => write!(f, "malformed document"),
            DiagnosticCode::DuplicateId => write!(f, "duplicate id"),
            DiagnosticCode::InvalidConfidence => write!(f, "invalid confidence"),
            DiagnosticCode::InvalidStep => write!(f, "invalid step"),
            DiagnosticCode::UnknownPriority => write!(f, "unknown priority"),
            DiagnosticCode::UncollectedField => write!(f, "field not collected by any step"),
            DiagnosticCode::UnknownProfile => write!(f, "unknown profile"),
            DiagnosticCode::Io => write!(f, "i/o failure"),
            DiagnosticCode::UnknownField => write!(f, "unknown field"),
            DiagnosticCode::InvalidAnswer => write!(f, "invalid answer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::location::Span;

    #[test]
    fn test_diagnostic_creation() {
        let location = SourceLocation {
            span: Some(Span::new(0, 5)),
            source_text: Some("foo()".to_string()),
            origin: None,
        };

        let diagnostic = Diagnostic::new(
            DiagnosticCode::UnknownFunction,
            Severity::Error,
            "Unknown function 'foo'".to_string(),
            location,
        );

        assert!(diagnostic.is_error());
        assert!(!diagnostic.is_warning());
        assert_eq!(diagnostic.code_string(), "E006");
        assert!(diagnostic.help.is_some());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert!(Severity::Info > Severity::Hint);
    }

    #[test]
    fn test_origin_attached() {
        let diagnostic = Diagnostic::new(
            DiagnosticCode::DivisionByZero,
            Severity::Warning,
            "Division by zero".to_string(),
            SourceLocation::default(),
        )
        .with_origin("rule:shock");

        assert_eq!(diagnostic.location.origin.as_deref(), Some("rule:shock"));
        assert_eq!(
            diagnostic.to_string(),
            "[WARN] division by zero: Division by zero"
        );
    }
}
