//! Triage outcome value object

use super::rule::{Priority, Rule};
use serde::{Deserialize, Serialize};

/// Actions recommended when no rule matches
pub const DEFAULT_ACTIONS: [&str; 2] = ["Standard assessment", "Basic care as needed"];

/// Confidence reported when no rule matches
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Summary of a rule that matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedRule {
    /// Rule identifier
    pub id: String,
    /// Rule display name
    pub name: String,
    /// Rule tier
    pub priority: Priority,
    /// Rule confidence
    pub confidence: f64,
}

impl From<&Rule> for MatchedRule {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            priority: rule.priority.clone(),
            confidence: rule.confidence,
        }
    }
}

/// Classification produced by the rule engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageResult {
    /// Tier of the primary (most urgent) match
    pub priority: Priority,
    /// Matches ordered by ascending priority weight
    pub matched_rules: Vec<MatchedRule>,
    /// Mean confidence of all matches
    pub confidence: f64,
    /// Union of all matched actions, first-seen order
    pub actions: Vec<String>,
    /// Reassessment interval of the primary match, in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reassess_time: Option<u32>,
}

impl Default for TriageResult {
    fn default() -> Self {
        Self {
            priority: Priority::Green,
            matched_rules: Vec::new(),
            confidence: DEFAULT_CONFIDENCE,
            actions: DEFAULT_ACTIONS.iter().map(|a| (*a).to_string()).collect(),
            reassess_time: None,
        }
    }
}

impl TriageResult {
    /// Primary match, if any rule matched
    pub fn primary(&self) -> Option<&MatchedRule> {
        self.matched_rules.first()
    }

    /// Whether this is the no-match default
    pub fn is_default(&self) -> bool {
        self.matched_rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_camel_case_serialization() {
        let result = TriageResult {
            reassess_time: Some(15),
            ..TriageResult::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "priority": "GREEN",
                "matchedRules": [],
                "confidence": 0.5,
                "actions": ["Standard assessment", "Basic care as needed"],
                "reassessTime": 15
            })
        );
    }
}
