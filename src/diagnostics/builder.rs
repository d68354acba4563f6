//! Builder pattern for constructing diagnostics

use super::diagnostic::{Diagnostic, DiagnosticCode, Severity};
use super::location::{SourceLocation, Span};

/// Builder for constructing diagnostics fluently
#[derive(Debug, Clone)]
pub struct DiagnosticBuilder {
    severity: Severity,
    code: DiagnosticCode,
    message: String,
    location: SourceLocation,
    help: Option<String>,
}

impl DiagnosticBuilder {
    fn with_severity(severity: Severity, code: DiagnosticCode) -> Self {
        Self {
            severity,
            code,
            message: String::new(),
            location: SourceLocation::default(),
            help: None,
        }
    }

    /// Create a new error diagnostic builder
    pub fn error(code: DiagnosticCode) -> Self {
        Self::with_severity(Severity::Error, code)
    }

    /// Create a new warning diagnostic builder
    pub fn warning(code: DiagnosticCode) -> Self {
        Self::with_severity(Severity::Warning, code)
    }

    /// Create a new info diagnostic builder
    pub fn info(code: DiagnosticCode) -> Self {
        Self::with_severity(Severity::Info, code)
    }

    /// Create a new hint diagnostic builder
    pub fn hint(code: DiagnosticCode) -> Self {
        Self::with_severity(Severity::Hint, code)
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the location from a span
    pub fn with_span(mut self, span: Span) -> Self {
        self.location.span = Some(span);
        self
    }

    /// Set the location from byte offsets
    pub fn with_offsets(self, start: usize, end: usize) -> Self {
        self.with_span(Span::new(start, end))
    }

    /// Attach the expression text
    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        self.location.source_text = Some(text.into());
        self
    }

    /// Attach the owning rule or step
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.location.origin = Some(origin.into());
        self
    }

    /// Override the generated help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Build the diagnostic
    pub fn build(self) -> Diagnostic {
        let mut diagnostic =
            Diagnostic::new(self.code, self.severity, self.message, self.location);
        if self.help.is_some() {
            diagnostic.help = self.help;
        }
        diagnostic
    }
}

// Convenience functions for common diagnostics

impl DiagnosticBuilder {
    /// Create an "unknown function" error
    pub fn unknown_function(name: &str) -> Self {
        Self::error(DiagnosticCode::UnknownFunction)
            .with_message(format!("Unknown function '{name}'"))
    }

    /// Create a "type mismatch" error
    pub fn type_mismatch(expected: &str, actual: &str) -> Self {
        Self::error(DiagnosticCode::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
        .with_message(format!("Type mismatch: expected {expected}, found {actual}"))
    }

    /// Create an "uncollected field" warning
    pub fn uncollected_field(field: &str) -> Self {
        Self::warning(DiagnosticCode::UncollectedField)
            .with_message(format!("Field '{field}' is not collected by any assessment step"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_location() {
        let diagnostic = DiagnosticBuilder::unknown_function("max")
            .with_offsets(0, 3)
            .with_source_text("max(pain)")
            .with_origin("rule:r1")
            .build();

        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.location.span, Some(Span::new(0, 3)));
        assert_eq!(diagnostic.location.origin.as_deref(), Some("rule:r1"));
        assert_eq!(diagnostic.message, "Unknown function 'max'");
    }

    #[test]
    fn test_help_override() {
        let diagnostic = DiagnosticBuilder::warning(DiagnosticCode::InvalidAnswer)
            .with_help("Pick one of the listed options")
            .build();
        assert_eq!(
            diagnostic.help.as_deref(),
            Some("Pick one of the listed options")
        );
    }
}
