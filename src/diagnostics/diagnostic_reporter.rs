//! Diagnostic collection for configuration loading and evaluation runs

use super::diagnostic::{Diagnostic, Severity};
use std::collections::BTreeMap;
use std::fmt;

/// Diagnostic report with summary information
#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    /// All diagnostics in the report
    pub diagnostics: Vec<Diagnostic>,
    /// Summary statistics
    pub summary: DiagnosticSummary,
}

/// Summary statistics for diagnostics
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSummary {
    /// Total number of diagnostics
    pub total_count: usize,
    /// Number of error diagnostics
    pub error_count: usize,
    /// Number of warning diagnostics
    pub warning_count: usize,
    /// Number of info diagnostics
    pub info_count: usize,
    /// Number of hint diagnostics
    pub hint_count: usize,
    /// Overall severity (highest severity present)
    pub overall_severity: Severity,
}

/// Collects diagnostics from several sources
#[derive(Debug, Default, Clone)]
pub struct DiagnosticReporter {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReporter {
    /// Create a new diagnostic reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic to the report
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add multiple diagnostics to the report
    pub fn add_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Generate a complete diagnostic report
    pub fn generate_report(&self) -> DiagnosticReport {
        DiagnosticReport {
            diagnostics: self.diagnostics.clone(),
            summary: self.generate_summary(),
        }
    }

    fn generate_summary(&self) -> DiagnosticSummary {
        let mut summary = DiagnosticSummary {
            total_count: self.diagnostics.len(),
            ..Default::default()
        };

        for diagnostic in &self.diagnostics {
            match diagnostic.severity {
                Severity::Error => summary.error_count += 1,
                Severity::Warning => summary.warning_count += 1,
                Severity::Info => summary.info_count += 1,
                Severity::Hint => summary.hint_count += 1,
            }
        }
        summary.overall_severity = self
            .diagnostics
            .iter()
            .map(|d| d.severity)
            .max()
            .unwrap_or_default();

        summary
    }

    /// Get all error diagnostics
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.with_severity(Severity::Error)
    }

    /// Get all warning diagnostics
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.with_severity(Severity::Warning)
    }

    fn with_severity(&self, severity: Severity) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .collect()
    }

    /// Get diagnostics grouped by severity
    pub fn group_by_severity(&self) -> BTreeMap<Severity, Vec<&Diagnostic>> {
        let mut grouped = BTreeMap::new();

        for diagnostic in &self.diagnostics {
            grouped
                .entry(diagnostic.severity)
                .or_insert_with(Vec::new)
                .push(diagnostic);
        }

        grouped
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// All collected diagnostics
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take the collected diagnostics, leaving the reporter empty
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Clear all diagnostics
    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    /// Get total number of diagnostics
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Check if reporter is empty
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diagnostic Report")?;
        writeln!(f, "==================")?;
        writeln!(f, "Total: {}", self.summary.total_count)?;
        writeln!(f, "Errors: {}", self.summary.error_count)?;
        writeln!(f, "Warnings: {}", self.summary.warning_count)?;
        writeln!(f, "Info: {}", self.summary.info_count)?;
        writeln!(f, "Hints: {}", self.summary.hint_count)?;
        writeln!(f)?;

        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }

        Ok(())
    }
}
