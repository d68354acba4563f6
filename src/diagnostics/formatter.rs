//! Formatting diagnostics for different output formats

use super::diagnostic::Diagnostic;
#[cfg(feature = "terminal")]
use super::diagnostic::Severity;

/// Output format for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
    /// Compact single-line format
    Compact,
}

/// Formatter for diagnostics
pub struct DiagnosticFormatter {
    format: Format,
    show_code: bool,
    show_help: bool,
    #[cfg(feature = "terminal")]
    use_color: bool,
}

impl DiagnosticFormatter {
    /// Create a new formatter
    pub fn new(format: Format) -> Self {
        Self {
            format,
            show_code: true,
            show_help: true,
            #[cfg(feature = "terminal")]
            use_color: true,
        }
    }

    /// Set whether to show error codes
    pub fn with_code(mut self, show: bool) -> Self {
        self.show_code = show;
        self
    }

    /// Set whether to show help lines
    pub fn with_help(mut self, show: bool) -> Self {
        self.show_help = show;
        self
    }

    /// Set whether to use color (terminal feature only)
    #[cfg(feature = "terminal")]
    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Format a diagnostic
    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        match self.format {
            Format::Text => self.format_text(diagnostic),
            Format::Json => self.format_json(diagnostic),
            Format::Compact => self.format_compact(diagnostic),
        }
    }

    /// Format multiple diagnostics
    pub fn format_all(&self, diagnostics: &[Diagnostic]) -> String {
        match self.format {
            Format::Text => diagnostics
                .iter()
                .map(|d| self.format_text(d))
                .collect::<Vec<_>>()
                .join("\n"),
            Format::Json => serde_json::to_string_pretty(diagnostics)
                .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}")),
            Format::Compact => diagnostics
                .iter()
                .map(|d| self.format_compact(d))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    fn header(&self, diagnostic: &Diagnostic) -> String {
        #[cfg(feature = "terminal")]
        if self.use_color {
            use colored::Colorize;
            let severity_str = match diagnostic.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
                Severity::Info => "info".blue().bold(),
                Severity::Hint => "hint".green().bold(),
            };
            return format!("{}: {}", severity_str, diagnostic.message.bold());
        }

        format!("{}: {}", diagnostic.severity, diagnostic.message)
    }

    fn underline(&self, diagnostic: &Diagnostic, width: usize) -> String {
        let marks = "^".repeat(width.max(1));

        #[cfg(feature = "terminal")]
        if self.use_color {
            use colored::Colorize;
            return match diagnostic.severity {
                Severity::Error => marks.red().to_string(),
                Severity::Warning => marks.yellow().to_string(),
                Severity::Info => marks.blue().to_string(),
                Severity::Hint => marks.green().to_string(),
            };
        }

        let _ = diagnostic;
        marks
    }

    fn format_text(&self, diagnostic: &Diagnostic) -> String {
        let mut result = self.header(diagnostic);

        if self.show_code {
            result.push_str(&format!(" [{}]", diagnostic.code_string()));
        }
        result.push('\n');

        result.push_str(&format!(" --> {}\n", diagnostic.location));

        // Conditions are single-line, so the caret row sits under the text
        if let Some(source) = &diagnostic.location.source_text {
            result.push_str(&format!("  | {source}\n"));
            if let Some(span) = diagnostic.location.span {
                let start = span.start.min(source.len());
                let prefix_width = source
                    .get(..start)
                    .map(|s| s.chars().count())
                    .unwrap_or(start);
                let width = source
                    .get(start..span.end.min(source.len()))
                    .map(|s| s.chars().count())
                    .unwrap_or(span.len());
                result.push_str("  | ");
                result.push_str(&" ".repeat(prefix_width));
                result.push_str(&self.underline(diagnostic, width));
                result.push('\n');
            }
        }

        if self.show_help {
            if let Some(help) = &diagnostic.help {
                result.push_str(&format!("  = help: {help}\n"));
            }
        }

        result
    }

    fn format_json(&self, diagnostic: &Diagnostic) -> String {
        serde_json::to_string_pretty(diagnostic)
            .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    fn format_compact(&self, diagnostic: &Diagnostic) -> String {
        let code = if self.show_code {
            format!("[{}] ", diagnostic.code_string())
        } else {
            String::new()
        };

        format!(
            "{}: {}: {}{}",
            diagnostic.location, diagnostic.severity, code, diagnostic.message
        )
    }
}

impl Default for DiagnosticFormatter {
    fn default() -> Self {
        Self::new(Format::Text)
    }
}

/// Extension trait for formatting diagnostics
pub trait DiagnosticFormat {
    /// Format as human-readable text
    fn to_text(&self) -> String;

    /// Format as JSON
    fn to_json(&self) -> String;

    /// Format as compact single line
    fn to_compact(&self) -> String;
}

impl DiagnosticFormat for Diagnostic {
    fn to_text(&self) -> String {
        DiagnosticFormatter::new(Format::Text).format(self)
    }

    fn to_json(&self) -> String {
        DiagnosticFormatter::new(Format::Json).format(self)
    }

    fn to_compact(&self) -> String {
        DiagnosticFormatter::new(Format::Compact).format(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::builder::DiagnosticBuilder;

    fn plain(format: Format) -> DiagnosticFormatter {
        let formatter = DiagnosticFormatter::new(format);
        #[cfg(feature = "terminal")]
        let formatter = formatter.with_color(false);
        formatter
    }

    #[test]
    fn test_text_format() {
        let diagnostic = DiagnosticBuilder::unknown_function("max")
            .with_offsets(8, 11)
            .with_source_text("pain >= max(7)")
            .with_origin("rule:pain")
            .build();

        let output = plain(Format::Text).with_code(false).format(&diagnostic);

        assert!(output.contains("error: Unknown function 'max'"));
        assert!(output.contains("  | pain >= max(7)"));
        assert!(output.contains("  |         ^^^"));
        assert!(output.contains("rule:pain@8..11"));
    }

    #[test]
    fn test_compact_format() {
        let diagnostic = DiagnosticBuilder::unknown_function("max")
            .with_origin("rule:pain")
            .build();

        let output = plain(Format::Compact).format(&diagnostic);

        assert_eq!(output, "rule:pain: error: [E006] Unknown function 'max'");
    }

    #[test]
    fn test_json_format() {
        let diagnostic = DiagnosticBuilder::type_mismatch("number", "text").build();
        let output = plain(Format::Json).format(&diagnostic);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["severity"], "error");
        assert_eq!(parsed["code"]["kind"], "type_mismatch");
    }

    #[test]
    fn test_multiple_diagnostics() {
        let diagnostics = vec![
            DiagnosticBuilder::unknown_function("foo").build(),
            DiagnosticBuilder::type_mismatch("number", "text").build(),
        ];

        let output = plain(Format::Compact).format_all(&diagnostics);

        assert_eq!(output.lines().count(), 2);
    }
}
