//! Compiled conditions

use crate::ast::{ConditionNode, FieldCollector};
use crate::diagnostics::{Diagnostic, Severity};
use crate::model::FieldPath;
use crate::parser::{ParseError, ParseResult, parse_condition_with_depth};
use std::fmt;

/// A condition parsed once at configuration load
///
/// Unparsable text is kept as [`Condition::Invalid`]; it never matches and
/// evaluating it yields a diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Successfully parsed condition
    Parsed {
        /// Text as written in the configuration
        source: String,
        /// Parsed tree
        ast: ConditionNode,
    },
    /// Condition text that failed to parse
    Invalid {
        /// Text as written in the configuration
        source: String,
        /// Parser failure
        error: ParseError,
    },
}

impl Condition {
    /// Parse `source`, keeping failures as an invalid condition
    pub fn compile(source: impl Into<String>, max_depth: usize) -> Self {
        let source = source.into();
        match parse_condition_with_depth(&source, max_depth) {
            Ok(ast) => Condition::Parsed { source, ast },
            Err(error) => Condition::Invalid { source, error },
        }
    }

    /// Parse `source`, failing on invalid text
    pub fn compile_strict(source: impl Into<String>, max_depth: usize) -> ParseResult<Self> {
        let source = source.into();
        let ast = parse_condition_with_depth(&source, max_depth)?;
        Ok(Condition::Parsed { source, ast })
    }

    /// Wrap an already built tree
    pub fn from_ast(ast: ConditionNode) -> Self {
        Condition::Parsed {
            source: ast.to_string(),
            ast,
        }
    }

    /// Text as written
    pub fn source(&self) -> &str {
        match self {
            Condition::Parsed { source, .. } | Condition::Invalid { source, .. } => source,
        }
    }

    /// Parsed tree, if the text was valid
    pub fn ast(&self) -> Option<&ConditionNode> {
        match self {
            Condition::Parsed { ast, .. } => Some(ast),
            Condition::Invalid { .. } => None,
        }
    }

    /// Parser failure, if the text was invalid
    pub fn error(&self) -> Option<&ParseError> {
        match self {
            Condition::Parsed { .. } => None,
            Condition::Invalid { error, .. } => Some(error),
        }
    }

    /// Whether the text parsed
    pub fn is_valid(&self) -> bool {
        matches!(self, Condition::Parsed { .. })
    }

    /// Fields this condition reads
    pub fn fields(&self) -> Vec<FieldPath> {
        self.ast().map(FieldCollector::collect).unwrap_or_default()
    }

    /// Load-time diagnostic for an invalid condition
    ///
    /// Downgraded to a warning because the condition still loads and simply
    /// never matches.
    pub fn parse_diagnostic(&self) -> Option<Diagnostic> {
        let error = self.error()?;
        let mut diagnostic = error.to_diagnostic();
        diagnostic.severity = Severity::Warning;
        diagnostic.location.source_text = Some(self.source().to_string());
        Some(diagnostic)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticCode, Span};
    use crate::parser::DEFAULT_MAX_DEPTH;

    #[test]
    fn test_compile_valid() {
        let condition = Condition::compile("pain >= 7 and exists(allergies)", DEFAULT_MAX_DEPTH);
        assert!(condition.is_valid());
        let fields: Vec<String> = condition.fields().iter().map(ToString::to_string).collect();
        assert_eq!(fields, ["pain", "allergies"]);
    }

    #[test]
    fn test_compile_invalid_keeps_source() {
        let condition = Condition::compile("pain >= ", DEFAULT_MAX_DEPTH);
        assert!(!condition.is_valid());
        assert_eq!(condition.source(), "pain >= ");
        assert!(condition.fields().is_empty());

        let diagnostic = condition.parse_diagnostic().unwrap();
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(diagnostic.code, DiagnosticCode::UnexpectedEof);
        assert_eq!(diagnostic.location.span, Some(Span::new(8, 8)));
    }

    #[test]
    fn test_compile_strict() {
        assert!(Condition::compile_strict("a ==", DEFAULT_MAX_DEPTH).is_err());
        assert!(Condition::compile_strict("a == 1", DEFAULT_MAX_DEPTH).is_ok());
    }
}
