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

//! Rule-driven medical triage core
//!
//! Turns a sequence of patient observations into a priority tier (BLACK,
//! RED, YELLOW, GREEN) with recommended actions:
//!
//! - conditions are written in a small expression language
//!   ([`parser`], [`ast`]) and interpreted against a [`PatientRecord`]
//!   ([`evaluator`]);
//! - a [`RuleEngine`] resolves matching rules into a [`TriageResult`];
//! - a [`FlowController`] picks the next question, and a [`TriageSession`]
//!   drives the questionnaire, halting early on critical findings.
//!
//! ```no_run
//! use std::sync::Arc;
//! use shifa_triage::{AnswerOutcome, TriageEngine};
//!
//! let engine = Arc::new(TriageEngine::reference()?);
//! let mut session = engine.session();
//! session.start();
//! if session.answer("consciousness", "alert") == AnswerOutcome::CriticalHalt {
//!     println!("{:?}", session.result());
//! }
//! # Ok::<(), shifa_triage::ConfigError>(())
//! ```

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod evaluator;
pub mod flow;
pub mod model;
pub mod parser;
pub mod report;
pub mod rules;
pub mod session;

// Re-export main types
pub use config::{ConfigError, ConfigLoader, EngineConfig, TriageConfig};
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity};
pub use engine::TriageEngine;
pub use evaluator::{Condition, ConditionEvaluator, EvaluationError};
pub use flow::{AssessmentStep, FlowController, StepType};
pub use model::{FieldPath, FieldValue, PatientRecord};
pub use parser::{ParseError, parse_condition as parse};
pub use report::AssessmentReport;
pub use rules::{Priority, Rule, RuleEngine, TriageResult};
pub use session::{AnswerOutcome, IgnoreReason, SessionState, TriageSession};
