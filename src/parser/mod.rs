//! Condition expression parser
//!
//! Turns condition text such as `breathing == 'absent' and pain >= 7` into a
//! [`ConditionNode`](crate::ast::ConditionNode) tree. The tokenizer is
//! zero-copy over the input and the parser is a Pratt (precedence climbing)
//! parser with a configurable nesting limit.

#![warn(missing_docs)]

pub mod error;
pub mod pratt;
pub mod span;
pub mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use pratt::{DEFAULT_MAX_DEPTH, PrattParser, Precedence, parse_condition, parse_condition_with_depth};
pub use span::Spanned;
pub use tokenizer::{Token, Tokenizer, tokenize};

/// Parse a condition string into an AST
pub fn parse(input: &str) -> ParseResult<crate::ast::ConditionNode> {
    parse_condition(input)
}
