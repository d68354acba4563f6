//! Diagnostic system for condition parsing, evaluation and configuration
//!
//! Every error type in the crate converts into a [`Diagnostic`], so tooling
//! can show load-time and run-time problems the same way.

pub mod builder;
pub mod diagnostic;
pub mod diagnostic_reporter;
pub mod formatter;
pub mod location;

pub use builder::DiagnosticBuilder;
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use diagnostic_reporter::{DiagnosticReport, DiagnosticReporter, DiagnosticSummary};
pub use formatter::{DiagnosticFormat, DiagnosticFormatter, Format};
pub use location::{SourceLocation, Span};
