//! Export snapshot for downstream exporters (PDF, QR)

use crate::model::PatientRecord;
use crate::rules::{Priority, TriageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot format version
pub const REPORT_VERSION: &str = "1.0";

/// Rule summary as exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedRule {
    /// Rule identifier
    pub id: String,
    /// Rule display name
    pub name: String,
    /// Rule confidence
    pub confidence: f64,
}

/// Classification as exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedResult {
    /// Final tier
    pub priority: Priority,
    /// Aggregated confidence
    pub confidence: f64,
    /// Recommended actions
    pub actions: Vec<String>,
    /// Minutes until reassessment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reassess_time: Option<u32>,
    /// Rules that matched, primary first
    pub matched_rules: Vec<ReportedRule>,
}

/// Read-only snapshot of a finished assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentReport {
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// Classification
    pub triage_result: ReportedResult,
    /// Answers collected
    pub patient_data: PatientRecord,
    /// Snapshot format version
    pub version: String,
}

impl AssessmentReport {
    /// Snapshot `result` and `record` now
    pub fn new(result: &TriageResult, record: &PatientRecord) -> Self {
        Self::at(result, record, Utc::now())
    }

    /// Snapshot with an explicit timestamp
    pub fn at(result: &TriageResult, record: &PatientRecord, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            triage_result: ReportedResult {
                priority: result.priority.clone(),
                confidence: result.confidence,
                actions: result.actions.clone(),
                reassess_time: result.reassess_time,
                matched_rules: result
                    .matched_rules
                    .iter()
                    .map(|rule| ReportedRule {
                        id: rule.id.clone(),
                        name: rule.name.clone(),
                        confidence: rule.confidence,
                    })
                    .collect(),
            },
            patient_data: record.clone(),
            version: REPORT_VERSION.to_string(),
        }
    }

    /// JSON form consumed by exporters
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Pretty-printed JSON text
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
