//! Source location tracking for diagnostics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte range inside a condition expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at an offset
    pub const fn point(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Span length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Where a diagnostic points to
///
/// `origin` names the configuration element that owns the expression, such
/// as `rule:cardiac_arrest` or `step:breathing_check`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Offending range inside `source_text`
    pub span: Option<Span>,
    /// The expression text
    pub source_text: Option<String>,
    /// Owning rule or step
    pub origin: Option<String>,
}

impl SourceLocation {
    /// Create a location from a span
    pub fn new(span: Span) -> Self {
        Self {
            span: Some(span),
            source_text: None,
            origin: None,
        }
    }

    /// Location without a span, only naming the owner
    pub fn origin(origin: impl Into<String>) -> Self {
        Self {
            span: None,
            source_text: None,
            origin: Some(origin.into()),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.origin, &self.span) {
            (Some(origin), Some(span)) => write!(f, "{origin}@{span}"),
            (Some(origin), None) => write!(f, "{origin}"),
            (None, Some(span)) => write!(f, "{span}"),
            (None, None) => write!(f, "<unknown>"),
        }
    }
}
