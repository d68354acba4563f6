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

//! Parsing, validation and compilation of configuration documents

use super::EngineConfig;
use super::document::{RuleDefinition, StepDefinition, TriageConfig};
use super::error::{ConfigError, ConfigResult};
use super::profiles::{ConfigDocument, ProfileCatalog};
use crate::diagnostics::{Diagnostic, DiagnosticBuilder, DiagnosticCode};
use crate::engine::TriageEngine;
use crate::evaluator::Condition;
use crate::flow::{AssessmentStep, StepType};
use crate::model::FieldPath;
use crate::rules::Rule;
use rustc_hash::FxHashSet;
use std::path::Path;

/// Built-in START-style questionnaire
pub const REFERENCE_CONFIG: &str = include_str!("reference.yaml");

/// Serialization format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML (`.yaml`, `.yml`)
    Yaml,
    /// JSON (`.json`)
    Json,
}

impl DocumentFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            DocumentFormat::Yaml => "yaml",
            DocumentFormat::Json => "json",
        }
    }
}

/// Loads configuration documents into engines
///
/// Loading happens once per engine. Every condition is compiled here; a
/// document that fails validation never produces an engine.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Create a loader with the given options
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Options used for compilation
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse a document without validating it
    pub fn parse_document(&self, text: &str, format: DocumentFormat) -> ConfigResult<ConfigDocument> {
        let name = format.name();
        match format {
            DocumentFormat::Yaml => {
                let value: serde_yaml::Value =
                    serde_yaml::from_str(text).map_err(|e| ConfigError::malformed(name, e))?;
                if value.get("profiles").is_some() {
                    serde_yaml::from_value::<ProfileCatalog>(value)
                        .map(ConfigDocument::Profiles)
                        .map_err(|e| ConfigError::malformed(name, e))
                } else {
                    serde_yaml::from_value::<TriageConfig>(value)
                        .map(ConfigDocument::Single)
                        .map_err(|e| ConfigError::malformed(name, e))
                }
            }
            DocumentFormat::Json => {
                let value: serde_json::Value =
                    serde_json::from_str(text).map_err(|e| ConfigError::malformed(name, e))?;
                if value.get("profiles").is_some() {
                    serde_json::from_value::<ProfileCatalog>(value)
                        .map(ConfigDocument::Profiles)
                        .map_err(|e| ConfigError::malformed(name, e))
                } else {
                    serde_json::from_value::<TriageConfig>(value)
                        .map(ConfigDocument::Single)
                        .map_err(|e| ConfigError::malformed(name, e))
                }
            }
        }
    }

    /// Build an engine from document text
    pub fn load_str(&self, text: &str, format: DocumentFormat) -> ConfigResult<TriageEngine> {
        let document = self.parse_document(text, format)?;
        self.load_document(&document)
    }

    /// Build the engine for the configured profile
    ///
    /// Every profile of the document is validated, not only the selected one.
    pub fn load_document(&self, document: &ConfigDocument) -> ConfigResult<TriageEngine> {
        let (selected, _) = document.select(self.config.profile.as_deref())?;
        let selected = selected.map(str::to_string);
        let engines = self.build_document(document)?;
        if let Some(profile) = &selected {
            log::info!("Using configuration profile '{profile}'");
        }
        engines
            .into_iter()
            .find(|engine| engine.profile() == selected.as_deref())
            .ok_or_else(|| ConfigError::UnknownProfile(selected.unwrap_or_default()))
    }

    /// Validate and compile every configuration in a document
    ///
    /// Profiles are compiled independently, in declared order; the first
    /// failure is returned as [`ConfigError::InProfile`].
    pub fn build_document(&self, document: &ConfigDocument) -> ConfigResult<Vec<TriageEngine>> {
        match document {
            ConfigDocument::Single(config) => Ok(vec![self.build(config)?]),
            ConfigDocument::Profiles(catalog) => catalog
                .profiles
                .iter()
                .map(|(name, config)| {
                    let mut engine = self.build(config).map_err(|error| error.in_profile(name))?;
                    engine.set_profile(Some(name.clone()));
                    Ok(engine)
                })
                .collect(),
        }
    }

    /// Build an engine from YAML text
    pub fn from_yaml_str(&self, text: &str) -> ConfigResult<TriageEngine> {
        self.load_str(text, DocumentFormat::Yaml)
    }

    /// Build an engine from JSON text
    pub fn from_json_str(&self, text: &str) -> ConfigResult<TriageEngine> {
        self.load_str(text, DocumentFormat::Json)
    }

    /// Build an engine from the built-in questionnaire
    pub fn reference(&self) -> ConfigResult<TriageEngine> {
        self.from_yaml_str(REFERENCE_CONFIG)
    }

    /// Read and build an engine from a `.yaml`, `.yml` or `.json` file
    pub async fn load_path(&self, path: impl AsRef<Path>) -> ConfigResult<TriageEngine> {
        let document = self.read_document(path).await?;
        self.load_document(&document)
    }

    /// Read and parse a `.yaml`, `.yml` or `.json` file without validating it
    pub async fn read_document(&self, path: impl AsRef<Path>) -> ConfigResult<ConfigDocument> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("Loaded {} bytes from {}", text.len(), path.display());
        self.parse_document(&text, format)
    }

    /// Validate and compile one configuration
    pub fn build(&self, config: &TriageConfig) -> ConfigResult<TriageEngine> {
        let mut diagnostics = Vec::new();
        let rules = self.compile_rules(&config.triage_rules, &mut diagnostics)?;
        let steps = self.compile_steps(&config.assessment_flow, &mut diagnostics)?;
        self.check_collected_fields(&rules, &steps, &mut diagnostics);

        log::debug!(
            "Compiled {} rule(s) and {} step(s) with {} diagnostic(s)",
            rules.len(),
            steps.len(),
            diagnostics.len()
        );
        Ok(TriageEngine::with_diagnostics(
            rules,
            steps,
            self.config.clone(),
            diagnostics,
        ))
    }

    /// Validate a configuration, returning its load warnings
    pub fn validate(&self, config: &TriageConfig) -> ConfigResult<Vec<Diagnostic>> {
        self.build(config)
            .map(|engine| engine.load_diagnostics().to_vec())
    }

    fn compile_condition(
        &self,
        origin: &str,
        source: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ConfigResult<Condition> {
        let depth = self.config.max_condition_depth;
        if self.config.strict_conditions {
            return Condition::compile_strict(source, depth).map_err(|error| {
                ConfigError::InvalidCondition {
                    origin: origin.to_string(),
                    source_text: source.to_string(),
                    error,
                }
            });
        }

        let condition = Condition::compile(source, depth);
        if let Some(diagnostic) = condition.parse_diagnostic() {
            if self.config.log_diagnostics {
                log::warn!(
                    "Condition of '{origin}' does not parse and will never match: {}",
                    diagnostic.message
                );
            }
            diagnostics.push(diagnostic.with_origin(origin));
        }
        Ok(condition)
    }

    fn compile_rules(
        &self,
        definitions: &[RuleDefinition],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ConfigResult<Vec<Rule>> {
        let mut seen = FxHashSet::default();
        let mut rules = Vec::with_capacity(definitions.len());

        for definition in definitions {
            if !seen.insert(definition.id.as_str()) {
                return Err(ConfigError::DuplicateRuleId(definition.id.clone()));
            }
            if !(0.0..=1.0).contains(&definition.confidence) {
                return Err(ConfigError::InvalidConfidence {
                    rule: definition.id.clone(),
                    value: definition.confidence,
                });
            }
            if !definition.priority.is_known() {
                log::warn!(
                    "Rule '{}' has unknown priority '{}'; it sorts last",
                    definition.id,
                    definition.priority
                );
                diagnostics.push(
                    DiagnosticBuilder::warning(DiagnosticCode::UnknownPriority)
                        .with_message(format!("Unknown priority '{}'", definition.priority))
                        .with_origin(definition.id.as_str())
                        .build(),
                );
            }

            let condition = self.compile_condition(&definition.id, &definition.condition, diagnostics)?;
            let name = if definition.name.is_empty() {
                definition.id.clone()
            } else {
                definition.name.clone()
            };

            rules.push(Rule {
                id: definition.id.clone(),
                name,
                condition,
                priority: definition.priority.clone(),
                confidence: definition.confidence,
                actions: definition.actions.clone(),
                reassess_time: definition.reassess_time,
                is_critical: definition.is_critical,
            });
        }

        Ok(rules)
    }

    fn compile_steps(
        &self,
        definitions: &[StepDefinition],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ConfigResult<Vec<AssessmentStep>> {
        let mut seen = FxHashSet::default();
        let mut steps = Vec::with_capacity(definitions.len());
        let (default_min, default_max) = self.config.default_scale_range;

        for definition in definitions {
            let id = definition.id.as_str();
            if !seen.insert(id) {
                return Err(ConfigError::DuplicateStepId(definition.id.clone()));
            }
            if FieldPath::parse(&definition.field).is_empty() {
                return Err(ConfigError::invalid_step(id, "field is empty"));
            }

            let (min, max) = match definition.step_type {
                StepType::Single | StepType::Multi => {
                    if definition.options.is_empty() {
                        return Err(ConfigError::invalid_step(
                            id,
                            format!("{} step declares no options", definition.step_type),
                        ));
                    }
                    (definition.min, definition.max)
                }
                StepType::Scale => {
                    let min = definition.min.unwrap_or(default_min);
                    let max = definition.max.unwrap_or(default_max);
                    if min > max {
                        return Err(ConfigError::invalid_step(
                            id,
                            format!("scale minimum {min} exceeds maximum {max}"),
                        ));
                    }
                    (Some(min), Some(max))
                }
            };

            let skip_if = definition
                .skip_if
                .as_deref()
                .map(|source| self.compile_condition(id, source, diagnostics))
                .transpose()?;

            steps.push(AssessmentStep {
                id: definition.id.clone(),
                question: definition.question.clone(),
                step_type: definition.step_type,
                field: definition.field.clone(),
                options: definition.options.clone(),
                required: definition.required,
                skip_if,
                description: definition.description.clone(),
                help_text: definition.help_text.clone(),
                min,
                max,
            });
        }

        Ok(steps)
    }

    /// Warn about rule fields that no step ever writes
    fn check_collected_fields(
        &self,
        rules: &[Rule],
        steps: &[AssessmentStep],
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let collected: Vec<FieldPath> = steps.iter().map(|step| FieldPath::parse(&step.field)).collect();

        for rule in rules {
            for field in rule.condition.fields() {
                if collected.iter().any(|path| overlaps(path, &field)) {
                    continue;
                }
                if self.config.log_diagnostics {
                    log::warn!("Rule '{}' reads '{field}', which no step collects", rule.id);
                }
                diagnostics.push(
                    DiagnosticBuilder::uncollected_field(&field.to_string())
                        .with_origin(rule.id.as_str())
                        .build(),
                );
            }
        }
    }
}

/// One path is a segment prefix of the other
fn overlaps(a: &FieldPath, b: &FieldPath) -> bool {
    let n = a.len().min(b.len());
    a.segments()[..n] == b.segments()[..n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Priority;

    fn loader() -> ConfigLoader {
        ConfigLoader::new(EngineConfig::testing())
    }

    const MINIMAL: &str = r#"
triageRules:
  - id: r1
    name: Severe pain
    condition: "pain >= 7"
    priority: RED
    confidence: 0.9
    actions: [Treat]
assessmentFlow:
  - id: pain
    question: Pain?
    type: scale
    field: pain
    required: true
"#;

    #[test]
    fn test_reference_config_loads_cleanly() {
        let engine = loader().reference().unwrap();
        assert_eq!(engine.rule_engine().rules().len(), 15);
        assert_eq!(engine.flow().total_steps(), 7);
        assert!(engine.load_diagnostics().is_empty(), "{:?}", engine.load_diagnostics());
    }

    #[test]
    fn test_scale_defaults_applied() {
        let loader = ConfigLoader::new(
            EngineConfig::builder()
                .default_scale_range(0, 5)
                .log_diagnostics(false)
                .build(),
        );
        let engine = loader.from_yaml_str(MINIMAL).unwrap();
        assert_eq!(engine.flow().step("pain").unwrap().scale_range(), (0, 5));
    }

    #[test]
    fn test_json_document() {
        let json = r#"{
            "triageRules": [{"id": "r1", "condition": "pain > 3", "priority": "YELLOW", "confidence": 0.6}],
            "assessmentFlow": [{"id": "pain", "question": "Pain?", "type": "scale", "field": "pain"}]
        }"#;
        let engine = loader().from_json_str(json).unwrap();
        let rule = engine.rule_engine().rule("r1").unwrap();
        assert_eq!(rule.name, "r1");
        assert_eq!(rule.priority, Priority::Yellow);
    }

    #[test]
    fn test_validation_errors() {
        let duplicate_rule = MINIMAL.replace(
            "assessmentFlow:",
            "  - id: r1\n    condition: \"true\"\n    priority: GREEN\n    confidence: 0.1\nassessmentFlow:",
        );
        assert!(matches!(
            loader().from_yaml_str(&duplicate_rule),
            Err(ConfigError::DuplicateRuleId(id)) if id == "r1"
        ));

        let bad_confidence = MINIMAL.replace("confidence: 0.9", "confidence: 1.2");
        assert!(matches!(
            loader().from_yaml_str(&bad_confidence),
            Err(ConfigError::InvalidConfidence { value, .. }) if value == 1.2
        ));

        let bad_range = MINIMAL.replace("required: true", "required: true\n    min: 8\n    max: 3");
        assert!(matches!(
            loader().from_yaml_str(&bad_range),
            Err(ConfigError::InvalidStep { step, .. }) if step == "pain"
        ));

        let no_options = MINIMAL.replace("type: scale", "type: single");
        assert!(matches!(
            loader().from_yaml_str(&no_options),
            Err(ConfigError::InvalidStep { .. })
        ));

        assert!(matches!(
            loader().from_yaml_str("triageRules: [oops"),
            Err(ConfigError::Malformed { format: "yaml", .. })
        ));
    }

    #[test]
    fn test_lenient_and_strict_conditions() {
        let broken = MINIMAL.replace("pain >= 7", "pain >= ");

        let engine = loader().from_yaml_str(&broken).unwrap();
        let diagnostics = engine.load_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location.origin.as_deref(), Some("r1"));
        assert!(!engine.rule_engine().rule("r1").unwrap().condition.is_valid());

        let strict = ConfigLoader::new(EngineConfig::strict());
        assert!(matches!(
            strict.from_yaml_str(&broken),
            Err(ConfigError::InvalidCondition { origin, .. }) if origin == "r1"
        ));
    }

    #[test]
    fn test_load_warnings() {
        let text = MINIMAL
            .replace("pain >= 7", "pain >= 7 and vital_signs.heart_rate > 120")
            .replace("priority: RED", "priority: PURPLE");
        let engine = loader().from_yaml_str(&text).unwrap();
        let codes: Vec<&DiagnosticCode> = engine.load_diagnostics().iter().map(|d| &d.code).collect();
        assert_eq!(
            codes,
            [&DiagnosticCode::UnknownPriority, &DiagnosticCode::UncollectedField]
        );
    }

    #[test]
    fn test_overlapping_paths() {
        assert!(overlaps(&FieldPath::parse("vital_signs"), &FieldPath::parse("vital_signs.heart_rate")));
        assert!(overlaps(&FieldPath::parse("vital_signs.heart_rate"), &FieldPath::parse("vital_signs")));
        assert!(!overlaps(&FieldPath::parse("vital_signs.heart_rate"), &FieldPath::parse("vital_signs.temperature")));
    }

    #[test]
    fn test_missing_sections_rejected() {
        let misspelled = "triage_rules:\n  - {id: r, condition: \"pain >= 7\", priority: RED, confidence: 0.9}";
        for text in ["{}", misspelled, "triageRules: []"] {
            assert!(
                matches!(loader().from_yaml_str(text), Err(ConfigError::Malformed { format: "yaml", .. })),
                "{text}"
            );
        }
        assert!(matches!(
            loader().from_json_str(r#"{"rules": []}"#),
            Err(ConfigError::Malformed { format: "json", .. })
        ));
    }

    #[test]
    fn test_every_profile_validated() {
        let text = r#"
profiles:
  field:
    triageRules: []
    assessmentFlow:
      - { id: pain, question: "Pain?", type: scale, field: pain }
  hospital:
    triageRules:
      - { id: dup, condition: "pain > 3", priority: RED, confidence: 0.9 }
      - { id: dup, condition: "pain > 5", priority: RED, confidence: 0.5 }
    assessmentFlow: []
"#;
        let error = loader().from_yaml_str(text).unwrap_err();
        assert!(matches!(
            &error,
            ConfigError::InProfile { profile, source }
                if profile == "hospital" && matches!(source.as_ref(), ConfigError::DuplicateRuleId(id) if id == "dup")
        ));

        let fixed = text.replace("id: dup, condition: \"pain > 5\"", "id: dup2, condition: \"pain > 5\"");
        let document = loader().parse_document(&fixed, DocumentFormat::Yaml).unwrap();
        let engines = loader().build_document(&document).unwrap();
        let names: Vec<Option<&str>> = engines.iter().map(TriageEngine::profile).collect();
        assert_eq!(names, [Some("field"), Some("hospital")]);
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let result = loader().load_path("rules.toml").await;
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }
}
