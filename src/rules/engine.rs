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

//! Rule matching and priority resolution

use super::result::{MatchedRule, TriageResult};
use super::rule::{Rule, clamp_confidence};
use crate::diagnostics::Diagnostic;
use crate::evaluator::ConditionEvaluator;
use crate::model::PatientRecord;
use indexmap::IndexSet;

/// Matches a fixed rule set against patient records
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<Rule>,
    evaluator: ConditionEvaluator,
}

impl RuleEngine {
    /// Create an engine over `rules`, kept in declared order
    pub fn new(rules: Vec<Rule>) -> Self {
        Self::with_evaluator(rules, ConditionEvaluator::new())
    }

    /// Create an engine with a configured evaluator
    pub fn with_evaluator(rules: Vec<Rule>, evaluator: ConditionEvaluator) -> Self {
        Self { rules, evaluator }
    }

    /// Rules in declared order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule by id
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Classify a record
    pub fn evaluate(&self, record: &PatientRecord) -> TriageResult {
        self.evaluate_with_diagnostics(record).0
    }

    /// Classify a record, returning the diagnostics of failing conditions
    pub fn evaluate_with_diagnostics(&self, record: &PatientRecord) -> (TriageResult, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut matched: Vec<&Rule> = Vec::new();

        for rule in &self.rules {
            let (hit, diagnostic) = self.evaluator.evaluate(&rule.condition, record);
            if let Some(diagnostic) = diagnostic {
                diagnostics.push(diagnostic.with_origin(rule.id.as_str()));
            }
            if hit {
                matched.push(rule);
            }
        }

        if matched.is_empty() {
            log::debug!("No rule matched; using default result");
            return (TriageResult::default(), diagnostics);
        }

        // Stable: ties keep declared order
        matched.sort_by_key(|rule| rule.priority.weight());
        let primary = matched[0];

        let confidence =
            clamp_confidence(matched.iter().map(|rule| rule.confidence).sum::<f64>() / matched.len() as f64);

        let actions: IndexSet<&str> = matched
            .iter()
            .flat_map(|rule| rule.actions.iter().map(String::as_str))
            .collect();

        log::debug!(
            "Matched {} rule(s); primary '{}' ({})",
            matched.len(),
            primary.id,
            primary.priority
        );

        let result = TriageResult {
            priority: primary.priority.clone(),
            reassess_time: primary.reassess_time,
            confidence,
            actions: actions.into_iter().map(str::to_string).collect(),
            matched_rules: matched.into_iter().map(MatchedRule::from).collect(),
        };
        (result, diagnostics)
    }

    /// Whether any critical rule matches; failures count as non-matches
    pub fn has_critical_condition(&self, record: &PatientRecord) -> bool {
        self.critical_rules()
            .any(|rule| self.evaluator.matches(&rule.condition, record))
    }

    /// Critical rules currently matching
    pub fn critical_matches(&self, record: &PatientRecord) -> Vec<&Rule> {
        self.critical_rules()
            .filter(|rule| self.evaluator.matches(&rule.condition, record))
            .collect()
    }

    fn critical_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| rule.is_critical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Condition;
    use crate::rules::Priority;
    use pretty_assertions::assert_eq;

    fn rule(id: &str, condition: &str, priority: Priority, confidence: f64) -> Rule {
        Rule::new(id, Condition::compile(condition, 64), priority).with_confidence(confidence)
    }

    fn engine(rules: Vec<Rule>) -> RuleEngine {
        RuleEngine::with_evaluator(rules, ConditionEvaluator::new().with_logging(false))
    }

    #[test]
    fn test_no_match_defaults_to_green() {
        let engine = engine(vec![rule("r1", "pain > 9", Priority::Red, 0.9)]);
        let result = engine.evaluate(&PatientRecord::new().with("pain", 3));
        assert_eq!(result, TriageResult::default());
        assert!(result.is_default());
    }

    #[test]
    fn test_sort_mean_and_dedup() {
        let engine = engine(vec![
            rule("g", "pain >= 1", Priority::Green, 0.6).with_actions(["Rest", "Monitor"]),
            rule("y1", "pain >= 5", Priority::Yellow, 0.8).with_actions(["Monitor", "Analgesia"]),
            rule("r", "pain >= 7", Priority::Red, 0.9)
                .with_actions(["Immediate care"])
                .with_reassess_time(5),
            rule("y2", "pain >= 6", Priority::Yellow, 0.7).with_actions(["Rest"]),
        ]);

        let result = engine.evaluate(&PatientRecord::new().with("pain", 8));
        let ids: Vec<&str> = result.matched_rules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["r", "y1", "y2", "g"]);
        assert_eq!(result.priority, Priority::Red);
        assert_eq!(result.reassess_time, Some(5));
        assert!((result.confidence - 0.75).abs() < 1e-9);
        assert_eq!(
            result.actions,
            ["Immediate care", "Monitor", "Analgesia", "Rest"]
        );
    }

    #[test]
    fn test_failing_conditions_report_diagnostics() {
        let engine = engine(vec![
            rule("bad", "breathing > 3", Priority::Red, 0.9),
            rule("broken", "pain >", Priority::Red, 0.9),
        ]);
        let (result, diagnostics) =
            engine.evaluate_with_diagnostics(&PatientRecord::new().with("breathing", "absent").with("pain", 2));
        assert!(result.is_default());
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].location.origin.as_deref(), Some("bad"));
    }

    #[test]
    fn test_critical_scan() {
        let engine = engine(vec![
            rule("crit-bad", "breathing < 1", Priority::Black, 0.9).critical(),
            rule("crit", "breathing == 'absent'", Priority::Black, 0.95).critical(),
            rule("plain", "pain > 0", Priority::Green, 0.5),
        ]);

        let record = PatientRecord::new().with("breathing", "absent");
        assert!(engine.has_critical_condition(&record));
        let ids: Vec<&str> = engine.critical_matches(&record).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["crit"]);

        // Non-critical matches never trigger the scan
        assert!(!engine.has_critical_condition(&PatientRecord::new().with("pain", 4)));
    }
}
