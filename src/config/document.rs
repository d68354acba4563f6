//! Declarative configuration document

use crate::flow::{StepOption, StepType};
use crate::rules::Priority;
use serde::{Deserialize, Serialize};

/// Rules and steps as written in the configuration document
///
/// Both collections are required; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TriageConfig {
    /// Rule definitions, in declared order
    pub triage_rules: Vec<RuleDefinition>,
    /// Step definitions, in traversal order
    pub assessment_flow: Vec<StepDefinition>,
}

/// One entry of `triageRules`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    /// Unique identifier
    pub id: String,
    /// Display name; falls back to the id
    #[serde(default)]
    pub name: String,
    /// Condition text
    pub condition: String,
    /// Tier name
    pub priority: Priority,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Recommended actions
    #[serde(default)]
    pub actions: Vec<String>,
    /// Minutes until reassessment
    #[serde(default, alias = "reassessTime", skip_serializing_if = "Option::is_none")]
    pub reassess_time: Option<u32>,
    /// Checked after every answer
    #[serde(default, rename = "isCritical", alias = "is_critical")]
    pub is_critical: bool,
}

/// One entry of `assessmentFlow`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDefinition {
    /// Unique identifier
    pub id: String,
    /// Prompt
    pub question: String,
    /// Answer kind
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Record field
    pub field: String,
    /// Selectable answers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<StepOption>,
    /// Whether the flow waits for this step
    #[serde(default = "default_required")]
    pub required: bool,
    /// Skip condition text
    #[serde(default, alias = "skipIf", skip_serializing_if = "Option::is_none")]
    pub skip_if: Option<String>,
    /// Longer explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Assessor hint
    #[serde(default, alias = "helpText", skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    /// Scale lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    /// Scale upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

fn default_required() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_aliases() {
        let yaml = r#"
triageRules:
  - id: r1
    condition: "pain >= 7"
    priority: RED
    confidence: 0.8
    reassessTime: 10
    is_critical: true
assessmentFlow:
  - id: pain
    question: Pain level?
    type: scale
    field: pain
    skipIf: "consciousness == 'unresponsive'"
    helpText: 1 is mild
"#;
        let config: TriageConfig = serde_yaml::from_str(yaml).unwrap();
        let rule = &config.triage_rules[0];
        assert_eq!(rule.reassess_time, Some(10));
        assert!(rule.is_critical);
        assert!(rule.name.is_empty());

        let step = &config.assessment_flow[0];
        assert_eq!(step.step_type, StepType::Scale);
        assert!(step.required);
        assert_eq!(step.skip_if.as_deref(), Some("consciousness == 'unresponsive'"));
        assert_eq!(step.help_text.as_deref(), Some("1 is mild"));
    }

    #[test]
    fn test_sections_are_required() {
        assert!(serde_yaml::from_str::<TriageConfig>("{}").is_err());
        assert!(serde_yaml::from_str::<TriageConfig>("triageRules: []").is_err());
        assert!(serde_yaml::from_str::<TriageConfig>("triageRules: []\nassessmentFlow: []").is_ok());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let yaml = "triageRules: []\nassessmentFlow: []\ntriage_rules: []";
        assert!(serde_yaml::from_str::<TriageConfig>(yaml).is_err());

        let rule = "id: r\ncondition: \"pain > 3\"\npriority: RED\nconfidence: 0.5\nisCritcal: true";
        assert!(serde_yaml::from_str::<RuleDefinition>(rule).is_err());
    }
}
