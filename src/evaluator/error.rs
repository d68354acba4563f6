// Error types for condition evaluation

use crate::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticCode};
use thiserror::Error;

/// Result type for evaluation operations
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors that can occur while evaluating a condition
///
/// None of these escape the evaluator's public `evaluate` contract: they are
/// turned into a `false` outcome plus a [`Diagnostic`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Operands of the wrong kind for an operator
    #[error("Type mismatch in '{operation}': cannot apply to {left} and {right}")]
    TypeMismatch {
        /// Operator or function symbol
        operation: &'static str,
        /// Type name of the left operand
        left: &'static str,
        /// Type name of the right operand
        right: &'static str,
    },

    /// Division with a zero divisor
    #[error("Division by zero")]
    DivisionByZero,

    /// Arithmetic result outside the representable range
    #[error("Arithmetic overflow in '{operation}'")]
    Overflow {
        /// Operator symbol
        operation: &'static str,
    },

    /// Condition text that never parsed
    #[error("Invalid condition: {message}")]
    InvalidCondition {
        /// Parser message
        message: String,
    },
}

impl EvaluationError {
    /// Type mismatch between two operands
    pub(crate) fn mismatch(operation: &'static str, left: &'static str, right: &'static str) -> Self {
        EvaluationError::TypeMismatch {
            operation,
            left,
            right,
        }
    }

    /// Convert to a diagnostic
    ///
    /// Runtime failures are warnings: the condition is treated as `false`.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            EvaluationError::TypeMismatch { left, right, .. } => {
                DiagnosticBuilder::warning(DiagnosticCode::TypeMismatch {
                    expected: (*left).to_string(),
                    actual: (*right).to_string(),
                })
                .with_message(self.to_string())
                .build()
            }
            EvaluationError::DivisionByZero => {
                DiagnosticBuilder::warning(DiagnosticCode::DivisionByZero)
                    .with_message(self.to_string())
                    .build()
            }
            EvaluationError::Overflow { .. } => {
                DiagnosticBuilder::warning(DiagnosticCode::InvalidNumber)
                    .with_message(self.to_string())
                    .build()
            }
            EvaluationError::InvalidCondition { .. } => {
                DiagnosticBuilder::warning(DiagnosticCode::InvalidCondition)
                    .with_message(self.to_string())
                    .build()
            }
        }
    }
}
