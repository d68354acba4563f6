//! Rule engine
//!
//! A [`RuleEngine`] evaluates every [`Rule`] against a record, orders the
//! matches by [`Priority`] weight and folds them into a [`TriageResult`].

pub mod engine;
pub mod result;
pub mod rule;

pub use engine::RuleEngine;
pub use result::{DEFAULT_ACTIONS, DEFAULT_CONFIDENCE, MatchedRule, TriageResult};
pub use rule::{Priority, Rule};
