//! Step traversal

use super::step::AssessmentStep;
use crate::diagnostics::Diagnostic;
use crate::evaluator::ConditionEvaluator;
use crate::model::PatientRecord;
use rustc_hash::FxHashMap;

/// Walks the assessment steps in declared order
#[derive(Debug, Clone)]
pub struct FlowController {
    steps: Vec<AssessmentStep>,
    by_id: FxHashMap<String, usize>,
    by_field: FxHashMap<String, usize>,
    evaluator: ConditionEvaluator,
}

impl FlowController {
    /// Create a controller over `steps`
    ///
    /// When several steps share an id or field the first one wins.
    pub fn new(steps: Vec<AssessmentStep>) -> Self {
        Self::with_evaluator(steps, ConditionEvaluator::new())
    }

    /// Create a controller with a configured evaluator
    pub fn with_evaluator(steps: Vec<AssessmentStep>, evaluator: ConditionEvaluator) -> Self {
        let mut by_id = FxHashMap::default();
        let mut by_field = FxHashMap::default();
        for (index, step) in steps.iter().enumerate() {
            by_id.entry(step.id.clone()).or_insert(index);
            by_field.entry(step.field.clone()).or_insert(index);
        }
        Self {
            steps,
            by_id,
            by_field,
            evaluator,
        }
    }

    /// First pending required step, or `None` when the flow is exhausted
    pub fn next_step(&self, record: &PatientRecord) -> Option<&AssessmentStep> {
        self.next_step_with_diagnostics(record).0
    }

    /// [`next_step`](Self::next_step) plus the diagnostics of failing skip conditions
    pub fn next_step_with_diagnostics(
        &self,
        record: &PatientRecord,
    ) -> (Option<&AssessmentStep>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();

        for step in &self.steps {
            if let Some(skip_if) = &step.skip_if {
                // A failing skip condition means "do not skip"
                let (skip, diagnostic) = self.evaluator.evaluate(skip_if, record);
                if let Some(diagnostic) = diagnostic {
                    diagnostics.push(diagnostic.with_origin(step.id.as_str()));
                }
                if skip {
                    log::debug!("Skipping step '{}'", step.id);
                    continue;
                }
            }

            if step.required && !record.is_set(&step.field) {
                return (Some(step), diagnostics);
            }
        }

        (None, diagnostics)
    }

    /// Position of a step in declared order
    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.by_id.get(step_id).copied()
    }

    /// Number of declared steps
    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// Step by id
    pub fn step(&self, step_id: &str) -> Option<&AssessmentStep> {
        self.step_index(step_id).map(|index| &self.steps[index])
    }

    /// Step that collects `field`
    pub fn step_for_field(&self, field: &str) -> Option<&AssessmentStep> {
        self.by_field.get(field).map(|&index| &self.steps[index])
    }

    /// All steps in declared order
    pub fn steps(&self) -> &[AssessmentStep] {
        &self.steps
    }

    /// Whether there are no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
