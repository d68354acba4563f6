//! Loading configuration documents from disk and text

use pretty_assertions::assert_eq;
use rstest::rstest;
use shifa_triage::config::{ConfigLoader, DocumentFormat, REFERENCE_CONFIG};
use shifa_triage::*;
use std::path::PathBuf;

const PROFILES: &str = r#"
default: hospital
profiles:
  field:
    triageRules:
      - id: bleeding
        condition: "bleeding == 'severe'"
        priority: RED
        confidence: 0.9
        isCritical: true
    assessmentFlow:
      - id: bleeding
        question: Bleeding?
        type: single
        field: bleeding
        options:
          - { value: none, label: None }
          - { value: severe, label: Severe, critical: true }
  hospital:
    triageRules:
      - id: fever
        condition: "temperature >= 39.5"
        priority: YELLOW
        confidence: 0.6
        reassessTime: 30
    assessmentFlow:
      - id: temperature
        question: Body temperature?
        type: scale
        field: temperature
        min: 34
        max: 43
"#;

struct TempFile(PathBuf);

impl TempFile {
    fn new(name: &str, contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!("shifa-triage-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        Self(path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn loader() -> ConfigLoader {
    ConfigLoader::new(EngineConfig::testing())
}

#[tokio::test]
async fn load_yaml_file() {
    let file = TempFile::new("reference.yaml", REFERENCE_CONFIG);
    let engine = loader().load_path(&file.0).await.unwrap();
    assert_eq!(engine.rule_engine().rules().len(), 15);
    assert_eq!(engine.flow().steps()[0].id, "consciousness");
    assert_eq!(engine.profile(), None);
}

#[tokio::test]
async fn load_json_file() {
    let json = serde_json::json!({
        "triageRules": [
            {"id": "hr", "condition": "heart_rate > 120", "priority": "RED", "confidence": 0.8, "actions": ["Monitor"]}
        ],
        "assessmentFlow": [
            {"id": "hr", "question": "Heart rate?", "type": "scale", "field": "heart_rate", "min": 20, "max": 250}
        ]
    });
    let file = TempFile::new("rules.json", &json.to_string());
    let engine = loader().load_path(&file.0).await.unwrap();

    let result = engine.evaluate(&PatientRecord::new().with("heart_rate", 140));
    assert_eq!(result.priority, Priority::Red);
    assert_eq!(result.actions, vec!["Monitor"]);
    assert_eq!(engine.flow().step("hr").unwrap().scale_range(), (20, 250));
}

#[tokio::test]
async fn missing_file_is_io_error() {
    let path = std::env::temp_dir().join("shifa-triage-does-not-exist.yaml");
    let error = loader().load_path(&path).await.unwrap_err();
    assert!(matches!(error, ConfigError::Io { .. }));
    assert!(error.to_string().contains("shifa-triage-does-not-exist.yaml"));
}

#[tokio::test]
async fn engine_load_uses_defaults() {
    let file = TempFile::new("profiles.yml", PROFILES);
    let engine = TriageEngine::load(&file.0).await.unwrap();
    assert_eq!(engine.profile(), Some("hospital"));
}

#[rstest]
#[case(None, "hospital", "temperature")]
#[case(Some("field"), "field", "bleeding")]
#[case(Some("hospital"), "hospital", "temperature")]
fn profile_selection(#[case] requested: Option<&str>, #[case] selected: &str, #[case] first_step: &str) {
    let mut builder = EngineConfig::builder().log_diagnostics(false);
    if let Some(name) = requested {
        builder = builder.profile(name);
    }
    let engine = ConfigLoader::new(builder.build()).from_yaml_str(PROFILES).unwrap();
    assert_eq!(engine.profile(), Some(selected));
    assert_eq!(engine.flow().steps()[0].id, first_step);
}

#[test]
fn unknown_profile_is_rejected() {
    let loader = ConfigLoader::new(EngineConfig::builder().profile("ambulance").build());
    assert!(matches!(
        loader.from_yaml_str(PROFILES),
        Err(ConfigError::UnknownProfile(name)) if name == "ambulance"
    ));
    assert!(matches!(
        loader.reference(),
        Err(ConfigError::UnknownProfile(_))
    ));
}

#[test]
fn profile_reassess_alias() {
    let engine = ConfigLoader::new(EngineConfig::builder().profile("hospital").build())
        .from_yaml_str(PROFILES)
        .unwrap();
    let rule = engine.rule_engine().rule("fever").unwrap();
    assert_eq!(rule.reassess_time, Some(30));
    assert!(!rule.is_critical);
}

#[rstest]
#[case("rules.yaml", Some(DocumentFormat::Yaml))]
#[case("rules.YML", Some(DocumentFormat::Yaml))]
#[case("rules.json", Some(DocumentFormat::Json))]
#[case("rules.toml", None)]
#[case("rules", None)]
fn format_from_extension(#[case] path: &str, #[case] expected: Option<DocumentFormat>) {
    assert_eq!(DocumentFormat::from_path(std::path::Path::new(path)), expected);
}

#[test]
fn duplicate_step_id_is_rejected() {
    let yaml = r#"
triageRules: []
assessmentFlow:
  - { id: pain, question: "Pain?", type: scale, field: pain }
  - { id: pain, question: "Pain again?", type: scale, field: pain_again }
"#;
    assert!(matches!(
        loader().from_yaml_str(yaml),
        Err(ConfigError::DuplicateStepId(id)) if id == "pain"
    ));
}

#[test]
fn invalid_skip_condition_in_strict_mode() {
    let yaml = r#"
triageRules: []
assessmentFlow:
  - { id: pain, question: "Pain?", type: scale, field: pain, skip_if: "consciousness ==" }
"#;
    let error = ConfigLoader::new(EngineConfig::strict())
        .from_yaml_str(yaml)
        .unwrap_err();
    assert!(matches!(&error, ConfigError::InvalidCondition { origin, .. } if origin == "pain"));
    assert_eq!(error.to_diagnostic().location.source_text.as_deref(), Some("consciousness =="));
}

#[test]
fn lenient_skip_condition_never_skips() {
    let yaml = r#"
triageRules: []
assessmentFlow:
  - { id: pain, question: "Pain?", type: scale, field: pain, skip_if: "consciousness ==" }
"#;
    let engine = loader().from_yaml_str(yaml).unwrap();
    assert_eq!(engine.load_diagnostics().len(), 1);
    assert_eq!(
        engine.flow().next_step(&PatientRecord::new()).map(|step| step.id.as_str()),
        Some("pain")
    );
}

#[rstest]
#[case::empty("{}")]
#[case::misspelled_section(
    "triage_rules:\n  - {id: r, condition: \"pain >= 7\", priority: RED, confidence: 0.9}"
)]
#[case::missing_flow("triageRules:\n  - {id: r, condition: \"pain >= 7\", priority: RED, confidence: 0.9}")]
#[case::misspelled_rule_key(
    "triageRules:\n  - {id: r, condition: \"pain >= 7\", priority: RED, confidence: 0.9, isCritcal: true}\nassessmentFlow: []"
)]
fn incomplete_documents_are_rejected(#[case] yaml: &str) {
    assert!(matches!(
        loader().from_yaml_str(yaml),
        Err(ConfigError::Malformed { format: "yaml", .. })
    ));
}

#[test]
fn json_without_sections_is_rejected() {
    assert!(matches!(
        loader().from_json_str(r#"{"rules": []}"#),
        Err(ConfigError::Malformed { format: "json", .. })
    ));
}

#[rstest]
#[case(None)]
#[case(Some("field"))]
fn invalid_sibling_profile_fails_load(#[case] requested: Option<&str>) {
    let broken = PROFILES.replace("confidence: 0.6", "confidence: 7.5");
    let mut builder = EngineConfig::builder().log_diagnostics(false);
    if let Some(name) = requested {
        builder = builder.profile(name);
    }

    let error = ConfigLoader::new(builder.build()).from_yaml_str(&broken).unwrap_err();
    match &error {
        ConfigError::InProfile { profile, source } => {
            assert_eq!(profile, "hospital");
            assert!(matches!(source.as_ref(), ConfigError::InvalidConfidence { rule, .. } if rule == "fever"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(error.to_diagnostic().location.origin.as_deref(), Some("fever"));
}

#[tokio::test]
async fn read_document_builds_every_profile() {
    let file = TempFile::new("catalog.yaml", PROFILES);
    let loader = loader();
    let document = loader.read_document(&file.0).await.unwrap();
    let engines = loader.build_document(&document).unwrap();

    let profiles: Vec<Option<&str>> = engines.iter().map(|engine| engine.profile()).collect();
    assert_eq!(profiles, [Some("field"), Some("hospital")]);
}
