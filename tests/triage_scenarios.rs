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

//! End-to-end triage scenarios across the rule engine, flow and session

use pretty_assertions::assert_eq;
use rstest::rstest;
use shifa_triage::flow::StepOption;
use shifa_triage::rules::DEFAULT_ACTIONS;
use shifa_triage::*;
use std::sync::Arc;

fn condition(source: &str) -> Condition {
    Condition::compile(source, 64)
}

fn yes_no(index: usize) -> AssessmentStep {
    let field = format!("f{index}");
    AssessmentStep::new(field.clone(), StepType::Single, field, format!("Question {index}?"))
        .with_options([StepOption::new("yes", "Yes"), StepOption::new("no", "No")])
}

fn reference() -> Arc<TriageEngine> {
    Arc::new(ConfigLoader::new(EngineConfig::testing()).reference().unwrap())
}

fn approx(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}

#[test]
fn no_rule_matches_gives_default_green() {
    let engine = RuleEngine::new(vec![
        Rule::new("r", condition("pain >= 7"), Priority::Red).with_confidence(0.9),
    ]);
    let result = engine.evaluate(&PatientRecord::new().with("pain", 2));

    assert_eq!(result.priority, Priority::Green);
    assert_eq!(result.confidence, 0.5);
    assert_eq!(result.actions, DEFAULT_ACTIONS.map(String::from).to_vec());
    assert!(result.matched_rules.is_empty());
    assert_eq!(result.reassess_time, None);
}

#[test]
fn matched_rules_are_combined() {
    let engine = RuleEngine::new(vec![
        Rule::new("yellow", condition("pain > 3"), Priority::Yellow)
            .with_confidence(0.5)
            .with_actions(["B", "C"]),
        Rule::new("red", condition("pain >= 7"), Priority::Red)
            .with_confidence(0.9)
            .with_actions(["A", "B"])
            .with_reassess_time(5),
    ]);
    let result = engine.evaluate(&PatientRecord::new().with("pain", 8));

    assert_eq!(result.priority, Priority::Red);
    assert!(approx(result.confidence, 0.7));
    assert_eq!(result.actions, vec!["A", "B", "C"]);
    assert_eq!(result.reassess_time, Some(5));
    let ids: Vec<&str> = result.matched_rules.iter().map(|rule| rule.id.as_str()).collect();
    assert_eq!(ids, ["red", "yellow"]);
}

#[test]
fn critical_rule_halts_long_flow() {
    let engine = Arc::new(TriageEngine::new(
        vec![Rule::new("f3-critical", condition("f3 == 'yes'"), Priority::Red).critical()],
        (1..=10).map(yes_no).collect(),
        EngineConfig::testing(),
    ));
    let mut session = engine.session();

    assert_eq!(session.start(), AnswerOutcome::Next("f1".into()));
    assert_eq!(session.answer("f1", "no"), AnswerOutcome::Next("f2".into()));
    assert_eq!(session.answer("f2", "no"), AnswerOutcome::Next("f3".into()));
    assert_eq!(session.answer("f3", "yes"), AnswerOutcome::CriticalHalt);

    assert_eq!(session.state(), SessionState::CriticalHalt);
    assert!(session.current_step().is_none());
    assert_eq!(session.progress(), 1.0);
    assert_eq!(session.result().unwrap().priority, Priority::Red);
    assert_eq!(session.record().len(), 3);
}

#[test]
fn skip_condition_bypasses_required_step() {
    let engine = Arc::new(TriageEngine::new(
        Vec::new(),
        vec![
            yes_no(1),
            yes_no(2).with_skip_if(condition("f1 == 'yes'")),
            yes_no(3),
        ],
        EngineConfig::testing(),
    ));
    let mut session = engine.session();
    session.start();
    assert_eq!(session.answer("f1", "yes"), AnswerOutcome::Next("f3".into()));

    session.start();
    assert_eq!(session.answer("f1", "no"), AnswerOutcome::Next("f2".into()));
}

#[rstest]
#[case("pain != 5")]
#[case("pain == 5")]
#[case("pain < 5")]
#[case("pain between 1 and 10")]
#[case("pain in [1, 2, 3]")]
#[case("not (pain > 5) and pain != 3")]
fn comparisons_on_missing_field_are_false(#[case] source: &str) {
    let evaluator = ConditionEvaluator::new();
    let (matched, diagnostic) = evaluator.evaluate(&condition(source), &PatientRecord::new());
    assert!(!matched, "{source}");
    assert!(diagnostic.is_none());
}

#[rstest]
#[case("vital_signs.heart_rate > 120", true)]
#[case("vital_signs.heart_rate + 10 >= 140", true)]
#[case("vital_signs.temperature > 38.5 or age >= 65", false)]
#[case("symptoms contains 'fever' and not (symptoms contains 'rash')", true)]
#[case("exists(vital_signs.heart_rate) and count(allergies) == 0 and count(symptoms) == 2", true)]
fn nested_record_conditions(#[case] source: &str, #[case] expected: bool) {
    let record: PatientRecord = serde_json::json!({
        "age": 40,
        "symptoms": ["cough", "fever"],
        "vital_signs": { "heart_rate": 130, "temperature": 37.9 }
    })
    .try_into()
    .unwrap();
    assert_eq!(ConditionEvaluator::new().matches(&condition(source), &record), expected, "{source}");
}

#[test]
fn invalid_condition_never_matches() {
    let engine = RuleEngine::new(vec![
        Rule::new("broken", condition("pain >="), Priority::Black).critical(),
        Rule::new("ok", condition("pain >= 7"), Priority::Red),
    ]);
    let record = PatientRecord::new().with("pain", 9);

    let (result, diagnostics) = engine.evaluate_with_diagnostics(&record);
    assert_eq!(result.priority, Priority::Red);
    assert!(!engine.has_critical_condition(&record));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].location.origin.as_deref(), Some("broken"));
}

#[test]
fn division_by_zero_is_a_non_match() {
    let engine = RuleEngine::new(vec![
        Rule::new("ratio", condition("heart_rate / systolic > 1"), Priority::Red),
    ]);
    let record = PatientRecord::new().with("heart_rate", 120).with("systolic", 0);
    let (result, diagnostics) = engine.evaluate_with_diagnostics(&record);
    assert!(result.is_default());
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn reference_walking_wounded() {
    let mut session = reference().session();
    session.start();
    session.answer("consciousness", "alert");
    session.answer("breathing", "normal");
    session.answer("circulation", "normal");
    session.answer("bleeding", "none");
    session.answer("mobility", "normal");
    assert_eq!(session.answer("pain", 2), AnswerOutcome::Next("injuries".into()));
    assert_eq!(session.answer("injuries", "extremities"), AnswerOutcome::AwaitingCompletion);
    assert_eq!(session.complete_step(), AnswerOutcome::Completed);

    let result = session.result().unwrap();
    assert_eq!(result.priority, Priority::Green);
    assert!(approx(result.confidence, 0.8));
    assert_eq!(result.reassess_time, Some(60));
    assert_eq!(result.primary().map(|rule| rule.id.as_str()), Some("green-minor"));
}

#[test]
fn reference_unresponsive_skips_mobility_and_pain() {
    let mut session = reference().session();
    session.start();
    session.answer("consciousness", "unresponsive");
    session.answer("breathing", "normal");
    session.answer("circulation", "weak");
    assert_eq!(session.answer("bleeding", "none"), AnswerOutcome::Next("injuries".into()));
    assert_eq!(session.complete_step(), AnswerOutcome::Completed);

    let result = session.result().unwrap();
    assert_eq!(result.priority, Priority::Red);
    assert_eq!(result.primary().map(|rule| rule.id.as_str()), Some("red-altered-consciousness"));
    assert!(!session.record().is_set("pain"));
}

#[test]
fn reference_severe_breathing_halts() {
    let mut session = reference().session();
    session.start();
    session.answer("consciousness", "alert");
    assert_eq!(session.answer("breathing", "severe"), AnswerOutcome::CriticalHalt);

    let result = session.result().unwrap();
    assert_eq!(result.priority, Priority::Red);
    assert!(approx(result.confidence, 0.9));
    assert_eq!(result.reassess_time, Some(5));
}

#[test]
fn reference_no_vital_signs_is_black() {
    let mut session = reference().session();
    session.start();
    session.answer("consciousness", "unresponsive");
    assert_eq!(session.answer("breathing", "absent"), AnswerOutcome::Next("circulation".into()));
    assert_eq!(session.answer("circulation", "absent"), AnswerOutcome::CriticalHalt);

    let result = session.result().unwrap();
    assert_eq!(result.priority, Priority::Black);
    assert_eq!(result.matched_rules[0].id, "black-no-vital-signs");
    assert!(result.actions.contains(&"No vital signs present".to_string()));
}

#[test]
fn multi_select_list_answer_stays_open() {
    let mut session = reference().session();
    session.start();
    for (field, value) in [
        ("consciousness", "alert"),
        ("breathing", "normal"),
        ("circulation", "normal"),
        ("bleeding", "minor"),
        ("mobility", "limited"),
    ] {
        session.answer(field, value);
    }
    session.answer("pain", 8);
    assert_eq!(
        session.answer("injuries", FieldValue::list(["back", "head"])),
        AnswerOutcome::AwaitingCompletion
    );
    assert_eq!(
        session.answer("injuries", FieldValue::list(["back", "wings"])),
        AnswerOutcome::Ignored(IgnoreReason::InvalidValue)
    );
    assert_eq!(session.complete_step(), AnswerOutcome::Completed);

    let result = session.result().unwrap();
    let ids: Vec<&str> = result.matched_rules.iter().map(|rule| rule.id.as_str()).collect();
    assert_eq!(
        ids,
        ["red-spinal", "red-severe-core-pain", "yellow-bleeding", "yellow-limited-mobility"]
    );
}

#[test]
fn report_snapshot_of_finished_session() {
    let mut session = reference().session();
    session.start();
    session.answer("consciousness", "alert");
    session.answer("breathing", "normal");
    session.answer("circulation", "normal");
    session.answer("bleeding", "severe");

    let report = session.report().unwrap();
    let json = report.to_json();
    assert_eq!(json["version"], "1.0");
    assert_eq!(json["triageResult"]["priority"], "RED");
    assert_eq!(json["patientData"]["bleeding"], "severe");
    assert_eq!(json["triageResult"]["matchedRules"][0]["id"], "red-severe-bleeding");
}
