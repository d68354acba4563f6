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

//! Parser error types

use crate::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticCode};
use std::borrow::Cow;
use thiserror::Error;

/// Pre-allocated common error messages
pub mod common_messages {
    /// Integer literal type name
    pub const INTEGER: &str = "integer";
    /// Decimal literal type name
    pub const DECIMAL: &str = "decimal";

    /// Expected expression error message
    pub const EXPECTED_EXPRESSION: &str = "expression";
    /// Expected identifier error message
    pub const EXPECTED_IDENTIFIER: &str = "identifier";
    /// Expected field path error message
    pub const EXPECTED_FIELD_PATH: &str = "field path";
    /// Expected left parenthesis error message
    pub const EXPECTED_LEFT_PAREN: &str = "'('";
    /// Expected right parenthesis error message
    pub const EXPECTED_RIGHT_PAREN: &str = "')'";
    /// Expected right bracket error message
    pub const EXPECTED_RIGHT_BRACKET: &str = "']'";
    /// Expected `and` inside a `between` test
    pub const EXPECTED_BETWEEN_AND: &str = "'and'";
    /// Expected end of input
    pub const EXPECTED_END: &str = "end of expression";
}

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse error with byte position information
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Unexpected token
    #[error("Unexpected token '{token}' at position {position}")]
    UnexpectedToken {
        /// The unexpected token that was found
        token: Cow<'static, str>,
        /// Position where the token was found
        position: usize,
    },

    /// Expected token
    #[error("Expected {expected} at position {position}")]
    ExpectedToken {
        /// The expected token description
        expected: Cow<'static, str>,
        /// Position where the token was expected
        position: usize,
    },

    /// Unexpected end of input
    #[error("Unexpected end of input at position {position}")]
    UnexpectedEof {
        /// Position where more input was expected
        position: usize,
    },

    /// Invalid literal value
    #[error("Invalid {literal_type} literal at position {position}: {value}")]
    InvalidLiteral {
        /// Type of literal that failed to parse
        literal_type: Cow<'static, str>,
        /// The invalid value that was encountered
        value: Cow<'static, str>,
        /// Position where the invalid literal was found
        position: usize,
    },

    /// Invalid escape sequence
    #[error("Invalid escape sequence at position {position}: {sequence}")]
    InvalidEscape {
        /// The invalid escape sequence
        sequence: Cow<'static, str>,
        /// Position where the escape sequence was found
        position: usize,
    },

    /// Unclosed string literal
    #[error("Unclosed string literal starting at position {position}")]
    UnclosedString {
        /// Position where the unclosed string started
        position: usize,
    },

    /// Call to a function that is not a builtin
    #[error("Unknown function '{name}' at position {position}")]
    UnknownFunction {
        /// Function name as written
        name: Cow<'static, str>,
        /// Position of the function name
        position: usize,
    },

    /// Nesting deeper than the configured limit
    #[error("Expression nested deeper than {max_depth} levels at position {position}")]
    NestingTooDeep {
        /// Configured limit
        max_depth: usize,
        /// Position where the limit was exceeded
        position: usize,
    },

    /// Blank condition text
    #[error("Empty expression")]
    EmptyExpression,
}

impl ParseError {
    /// Byte offset the error points to
    pub fn position(&self) -> usize {
        match self {
            Self::UnexpectedToken { position, .. }
            | Self::ExpectedToken { position, .. }
            | Self::UnexpectedEof { position }
            | Self::InvalidLiteral { position, .. }
            | Self::InvalidEscape { position, .. }
            | Self::UnclosedString { position }
            | Self::UnknownFunction { position, .. }
            | Self::NestingTooDeep { position, .. } => *position,
            Self::EmptyExpression => 0,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ParseError::UnexpectedToken { token, position } => {
                DiagnosticBuilder::error(DiagnosticCode::UnexpectedToken)
                    .with_message(format!("Unexpected token '{token}'"))
                    .with_offsets(*position, position + token.len())
                    .build()
            }
            ParseError::ExpectedToken { expected, position } => {
                DiagnosticBuilder::error(DiagnosticCode::ExpectedToken {
                    token: expected.to_string(),
                })
                .with_message(format!("Expected {expected}"))
                .with_offsets(*position, *position)
                .build()
            }
            ParseError::UnexpectedEof { position } => {
                DiagnosticBuilder::error(DiagnosticCode::UnexpectedEof)
                    .with_message("Unexpected end of input")
                    .with_offsets(*position, *position)
                    .build()
            }
            ParseError::InvalidLiteral {
                literal_type,
                value,
                position,
            } => DiagnosticBuilder::error(DiagnosticCode::InvalidNumber)
                .with_message(format!("Invalid {literal_type} literal: {value}"))
                .with_offsets(*position, position + value.len())
                .build(),
            ParseError::InvalidEscape { sequence, position } => {
                DiagnosticBuilder::error(DiagnosticCode::UnexpectedToken)
                    .with_message(format!("Invalid escape sequence: {sequence}"))
                    .with_offsets(*position, position + sequence.len())
                    .build()
            }
            ParseError::UnclosedString { position } => {
                DiagnosticBuilder::error(DiagnosticCode::UnclosedString)
                    .with_message("Unclosed string literal")
                    .with_offsets(*position, *position + 1)
                    .build()
            }
            ParseError::UnknownFunction { name, position } => {
                DiagnosticBuilder::unknown_function(name)
                    .with_offsets(*position, position + name.len())
                    .build()
            }
            ParseError::NestingTooDeep {
                max_depth,
                position,
            } => DiagnosticBuilder::error(DiagnosticCode::NestingTooDeep)
                .with_message(format!("Expression nested deeper than {max_depth} levels"))
                .with_offsets(*position, *position + 1)
                .build(),
            ParseError::EmptyExpression => {
                DiagnosticBuilder::error(DiagnosticCode::UnexpectedEof)
                    .with_message("Empty expression")
                    .build()
            }
        }
    }

    /// Create an expected token error with pre-allocated token type
    pub fn expected_token_prealloc(expected: &'static str, position: usize) -> Self {
        ParseError::ExpectedToken {
            expected: Cow::Borrowed(expected),
            position,
        }
    }

    /// Create an unexpected token error with a dynamically allocated token string
    pub fn unexpected_token_dynamic(token: String, position: usize) -> Self {
        ParseError::UnexpectedToken {
            token: Cow::Owned(token),
            position,
        }
    }

    /// Create an error for when an expression was expected but not found
    pub fn expected_expression(position: usize) -> Self {
        Self::expected_token_prealloc(common_messages::EXPECTED_EXPRESSION, position)
    }

    /// Create an error for when an identifier was expected but not found
    pub fn expected_identifier(position: usize) -> Self {
        Self::expected_token_prealloc(common_messages::EXPECTED_IDENTIFIER, position)
    }

    /// Create an error for when a right parenthesis ')' was expected but not found
    pub fn expected_right_paren(position: usize) -> Self {
        Self::expected_token_prealloc(common_messages::EXPECTED_RIGHT_PAREN, position)
    }

    /// Create an error for an invalid integer literal
    pub fn invalid_integer_literal(value: String, position: usize) -> Self {
        ParseError::InvalidLiteral {
            literal_type: Cow::Borrowed(common_messages::INTEGER),
            value: Cow::Owned(value),
            position,
        }
    }

    /// Create an error for an invalid decimal literal
    pub fn invalid_decimal_literal(value: String, position: usize) -> Self {
        ParseError::InvalidLiteral {
            literal_type: Cow::Borrowed(common_messages::DECIMAL),
            value: Cow::Owned(value),
            position,
        }
    }
}
