//! Triage engine - the main entry point for rule evaluation and sessions

use crate::config::{ConfigLoader, ConfigResult, EngineConfig};
use crate::diagnostics::Diagnostic;
use crate::evaluator::ConditionEvaluator;
use crate::flow::{AssessmentStep, FlowController};
use crate::model::PatientRecord;
use crate::rules::{Rule, RuleEngine, TriageResult};
use crate::session::TriageSession;
use std::path::Path;
use std::sync::Arc;

/// A loaded rule set and assessment flow
///
/// Built once from a validated configuration and shared read-only between
/// sessions through an `Arc`. Reconfiguration means building a new engine.
#[derive(Debug, Clone)]
pub struct TriageEngine {
    rules: RuleEngine,
    flow: FlowController,
    config: EngineConfig,
    load_diagnostics: Vec<Diagnostic>,
    profile: Option<String>,
}

impl TriageEngine {
    /// Create an engine from already compiled rules and steps
    pub fn new(rules: Vec<Rule>, steps: Vec<AssessmentStep>, config: EngineConfig) -> Self {
        Self::with_diagnostics(rules, steps, config, Vec::new())
    }

    pub(crate) fn with_diagnostics(
        rules: Vec<Rule>,
        steps: Vec<AssessmentStep>,
        config: EngineConfig,
        load_diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let evaluator = ConditionEvaluator::new().with_logging(config.log_diagnostics);
        Self {
            rules: RuleEngine::with_evaluator(rules, evaluator.clone()),
            flow: FlowController::with_evaluator(steps, evaluator),
            config,
            load_diagnostics,
            profile: None,
        }
    }

    pub(crate) fn set_profile(&mut self, profile: Option<String>) {
        self.profile = profile;
    }

    /// Engine for the built-in questionnaire
    pub fn reference() -> ConfigResult<Self> {
        ConfigLoader::default().reference()
    }

    /// Load a configuration file with default options
    pub async fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        ConfigLoader::default().load_path(path).await
    }

    /// Rule engine
    pub fn rule_engine(&self) -> &RuleEngine {
        &self.rules
    }

    /// Flow controller
    pub fn flow(&self) -> &FlowController {
        &self.flow
    }

    /// Options the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Warnings raised while loading
    pub fn load_diagnostics(&self) -> &[Diagnostic] {
        &self.load_diagnostics
    }

    /// Selected profile, for multi-profile documents
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Classify a complete record
    pub fn evaluate(&self, record: &PatientRecord) -> TriageResult {
        self.rules.evaluate(record)
    }

    /// Start a new session sharing this engine
    pub fn session(self: &Arc<Self>) -> TriageSession {
        TriageSession::new(Arc::clone(self))
    }
}
