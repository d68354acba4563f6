//! Abstract Syntax Tree (AST) definitions for condition expressions

mod expression;
mod operator;
mod visitor;

pub use expression::*;
pub use operator::*;
pub use visitor::*;
