//! Condition evaluation
//!
//! Conditions are compiled once at configuration load into [`Condition`]
//! values and evaluated against a [`PatientRecord`](crate::model::PatientRecord)
//! by the [`ConditionEvaluator`]. Evaluation is side-effect free.

#[warn(missing_docs)]
mod condition;
mod error;
mod interpreter;

pub use condition::Condition;
pub use error::{EvaluationError, EvaluationResult};
pub use interpreter::ConditionEvaluator;
