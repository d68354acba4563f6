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

//! Assessment session state machine
//!
//! ```text
//! NotStarted --start--> InProgress --critical rule--> CriticalHalt
//!                           |
//!                           +--flow exhausted-----> Completed
//! ```
//!
//! `start()` is accepted in every state and begins a fresh record;
//! `restart()` returns to `NotStarted`.

use crate::diagnostics::{DiagnosticBuilder, DiagnosticCode, DiagnosticReporter};
use crate::engine::TriageEngine;
use crate::flow::{AssessmentStep, StepType};
use crate::model::{FieldValue, PatientRecord};
use crate::report::AssessmentReport;
use crate::rules::TriageResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionState {
    /// Created or restarted, no record yet
    NotStarted,
    /// Collecting answers
    InProgress,
    /// Stopped early by a critical rule
    CriticalHalt,
    /// Flow exhausted and evaluated
    Completed,
}

impl SessionState {
    /// Whether a result is available
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::CriticalHalt | SessionState::Completed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NotStarted => write!(f, "not started"),
            SessionState::InProgress => write!(f, "in progress"),
            SessionState::CriticalHalt => write!(f, "critical halt"),
            SessionState::Completed => write!(f, "completed"),
        }
    }
}

/// Why an answer had no effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// The session is not collecting answers
    NotInProgress,
    /// No step collects this field
    UnknownField,
    /// The step type rejects the value
    InvalidValue,
}

/// What happened after an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Nothing changed
    Ignored(IgnoreReason),
    /// A multi-select step stays open until `complete_step()`
    AwaitingCompletion,
    /// The step with this id is now current
    Next(String),
    /// A critical rule matched; the result is available
    CriticalHalt,
    /// The flow is exhausted; the result is available
    Completed,
}

impl AnswerOutcome {
    /// Whether the session reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnswerOutcome::CriticalHalt | AnswerOutcome::Completed)
    }
}

/// One patient assessment
///
/// Owns its record; the engine is shared. Not meant to be shared between
/// threads while answering.
#[derive(Debug, Clone)]
pub struct TriageSession {
    engine: Arc<TriageEngine>,
    state: SessionState,
    record: PatientRecord,
    current: Option<usize>,
    result: Option<TriageResult>,
    finished_at: Option<DateTime<Utc>>,
    diagnostics: DiagnosticReporter,
}

impl TriageSession {
    /// Create a session in `NotStarted`
    pub fn new(engine: Arc<TriageEngine>) -> Self {
        Self {
            engine,
            state: SessionState::NotStarted,
            record: PatientRecord::new(),
            current: None,
            result: None,
            finished_at: None,
            diagnostics: DiagnosticReporter::new(),
        }
    }

    /// Begin collecting answers into a fresh record
    ///
    /// Completes immediately when the flow has no pending step.
    pub fn start(&mut self) -> AnswerOutcome {
        self.reset();
        self.state = SessionState::InProgress;
        log::debug!("Session started");
        self.advance()
    }

    /// Discard the record and result
    pub fn restart(&mut self) {
        self.reset();
        log::debug!("Session restarted");
    }

    fn reset(&mut self) {
        self.state = SessionState::NotStarted;
        self.record = PatientRecord::new();
        self.current = None;
        self.result = None;
        self.finished_at = None;
        self.diagnostics.clear();
    }

    /// Record an answer and move the session forward
    pub fn answer(&mut self, field: &str, value: impl Into<FieldValue>) -> AnswerOutcome {
        if self.state != SessionState::InProgress {
            log::debug!("Ignoring answer for '{field}': session is {}", self.state);
            return AnswerOutcome::Ignored(IgnoreReason::NotInProgress);
        }

        let engine = Arc::clone(&self.engine);
        let Some(step) = engine.flow().step_for_field(field) else {
            log::debug!("Ignoring answer for unknown field '{field}'");
            self.diagnostics.add_diagnostic(
                DiagnosticBuilder::info(DiagnosticCode::UnknownField)
                    .with_message(format!("No step collects field '{field}'"))
                    .build(),
            );
            return AnswerOutcome::Ignored(IgnoreReason::UnknownField);
        };

        let value = value.into();
        if !step.accepts(&value) {
            log::warn!("Step '{}' rejects value {value} for '{field}'", step.id);
            self.diagnostics.add_diagnostic(
                DiagnosticBuilder::warning(DiagnosticCode::InvalidAnswer)
                    .with_message(format!("Value {value} is not a valid {} answer", step.step_type))
                    .with_origin(step.id.as_str())
                    .build(),
            );
            return AnswerOutcome::Ignored(IgnoreReason::InvalidValue);
        }

        if step.option(&value).is_some_and(|option| option.critical) {
            log::debug!("Critical option {value} selected for '{}'", step.id);
        }

        match (step.step_type, value) {
            (StepType::Multi, FieldValue::List(items)) => self.record.set(field, FieldValue::List(items)),
            (StepType::Multi, item) => self.record.toggle_in_list(field, item),
            (_, value) => self.record.set(field, value),
        }

        if let Some(outcome) = self.check_critical() {
            return outcome;
        }

        if step.step_type == StepType::Multi && self.current == engine.flow().step_index(&step.id) {
            return AnswerOutcome::AwaitingCompletion;
        }

        self.advance()
    }

    /// Close the current step and move on
    ///
    /// An untouched multi-select step records an empty selection. A
    /// single or scale step without an answer stays current.
    pub fn complete_step(&mut self) -> AnswerOutcome {
        if self.state != SessionState::InProgress {
            return AnswerOutcome::Ignored(IgnoreReason::NotInProgress);
        }

        let engine = Arc::clone(&self.engine);
        if let Some(step) = self.current.and_then(|index| engine.flow().steps().get(index)) {
            if step.step_type == StepType::Multi && !self.record.is_set(&step.field) {
                self.record.set(&step.field, FieldValue::List(Vec::new()));
                if let Some(outcome) = self.check_critical() {
                    return outcome;
                }
            }
        }

        self.advance()
    }

    fn check_critical(&mut self) -> Option<AnswerOutcome> {
        let engine = Arc::clone(&self.engine);
        let matches = engine.rule_engine().critical_matches(&self.record);
        if matches.is_empty() {
            return None;
        }
        let ids: Vec<&str> = matches.iter().map(|rule| rule.id.as_str()).collect();
        log::info!("Critical rule(s) matched: {}", ids.join(", "));
        Some(self.finish(SessionState::CriticalHalt))
    }

    fn advance(&mut self) -> AnswerOutcome {
        let engine = Arc::clone(&self.engine);
        let (next, diagnostics) = engine.flow().next_step_with_diagnostics(&self.record);
        self.diagnostics.add_diagnostics(diagnostics);

        match next {
            Some(step) => {
                self.current = engine.flow().step_index(&step.id);
                log::debug!("Next step '{}'", step.id);
                AnswerOutcome::Next(step.id.clone())
            }
            None => self.finish(SessionState::Completed),
        }
    }

    fn finish(&mut self, state: SessionState) -> AnswerOutcome {
        let (result, diagnostics) = self.engine.rule_engine().evaluate_with_diagnostics(&self.record);
        self.diagnostics.add_diagnostics(diagnostics);
        log::info!(
            "Session {state}: priority {} (confidence {:.2})",
            result.priority,
            result.confidence
        );

        self.state = state;
        self.current = None;
        self.result = Some(result);
        self.finished_at = Some(Utc::now());

        match state {
            SessionState::CriticalHalt => AnswerOutcome::CriticalHalt,
            _ => AnswerOutcome::Completed,
        }
    }

    /// Step awaiting an answer; `None` unless in progress
    pub fn current_step(&self) -> Option<&AssessmentStep> {
        if self.state != SessionState::InProgress {
            return None;
        }
        self.current.and_then(|index| self.engine.flow().steps().get(index))
    }

    /// Result; only in terminal states
    pub fn result(&self) -> Option<&TriageResult> {
        if self.state.is_terminal() {
            self.result.as_ref()
        } else {
            None
        }
    }

    /// Fraction of the flow reached, in [0, 1]
    pub fn progress(&self) -> f64 {
        match self.state {
            SessionState::NotStarted => 0.0,
            SessionState::CriticalHalt | SessionState::Completed => 1.0,
            SessionState::InProgress => {
                let total = self.engine.flow().total_steps();
                match self.current {
                    _ if total == 0 => 1.0,
                    Some(index) => (index + 1) as f64 / total as f64,
                    None => 0.0,
                }
            }
        }
    }

    /// Answers collected so far
    pub fn record(&self) -> &PatientRecord {
        &self.record
    }

    /// Lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Shared engine
    pub fn engine(&self) -> &Arc<TriageEngine> {
        &self.engine
    }

    /// Diagnostics raised during this session
    pub fn diagnostics(&self) -> &DiagnosticReporter {
        &self.diagnostics
    }

    /// Export snapshot; only in terminal states
    pub fn report(&self) -> Option<AssessmentReport> {
        let result = self.result()?;
        let timestamp = self.finished_at.unwrap_or_else(Utc::now);
        Some(AssessmentReport::at(result, &self.record, timestamp))
    }
}
