//! Assessment flow
//!
//! Declared steps are walked in order by the [`FlowController`]; a step is
//! pending while it is required, not skipped and its field is unset.

pub mod controller;
pub mod step;

pub use controller::FlowController;
pub use step::{AssessmentStep, ColorTag, DEFAULT_SCALE_MAX, DEFAULT_SCALE_MIN, StepOption, StepType};
