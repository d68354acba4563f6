// Copyright 2024 Shifa Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Condition AST node definitions

use super::operator::{BinaryOperator, UnaryOperator};
use crate::model::{FieldPath, FieldValue};
use rust_decimal::Decimal;
use smallvec::SmallVec;
use std::fmt;

/// AST representation of condition expressions
///
/// Large variants are boxed to keep the enum small.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionNode {
    /// Literal value (text, number, boolean)
    Literal(Literal),

    /// Reference to a record field (`breathing`, `vital_signs.heart_rate`)
    Field(FieldPath),

    /// List literal (`['head', 'chest']`)
    List(Vec<ConditionNode>),

    /// Binary operation (arithmetic, comparison, logical, membership)
    BinaryOp(Box<BinaryOpData>),

    /// Unary operation (negation, not)
    UnaryOp {
        /// The operator
        op: UnaryOperator,
        /// The operand
        operand: Box<ConditionNode>,
    },

    /// Inclusive range test (`pain between 4 and 7`)
    Between(Box<BetweenData>),

    /// Builtin function call (`exists(allergies)`)
    FunctionCall(Box<FunctionCallData>),
}

/// Binary operation data (separate struct to optimize enum size)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryOpData {
    /// The operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: ConditionNode,
    /// Right operand
    pub right: ConditionNode,
}

/// Range test data
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BetweenData {
    /// Tested value
    pub value: ConditionNode,
    /// Lower bound (inclusive)
    pub low: ConditionNode,
    /// Upper bound (inclusive)
    pub high: ConditionNode,
}

/// Function call data
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionCallData {
    /// Called builtin
    pub function: Builtin,
    /// Arguments
    pub args: SmallVec<[ConditionNode; 2]>,
}

/// Builtin functions available in conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `exists(path)`: whether the field is set
    Exists,
    /// `count(path)`: list length, 1 for a scalar, 0 when missing
    Count,
}

impl Builtin {
    /// Resolve a builtin by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "exists" => Some(Self::Exists),
            "count" => Some(Self::Count),
            _ => None,
        }
    }

    /// Function name as written in conditions
    pub fn name(self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::Count => "count",
        }
    }
}

/// Literal values in conditions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// Boolean literal
    Boolean(bool),
    /// Integer literal
    Integer(i64),
    /// Decimal literal
    Decimal(Decimal),
    /// String literal
    Text(String),
}

impl Literal {
    /// Convert into the record value model
    pub fn to_value(&self) -> FieldValue {
        match self {
            Self::Boolean(b) => FieldValue::Boolean(*b),
            Self::Integer(i) => FieldValue::Integer(*i),
            Self::Decimal(d) => FieldValue::Decimal(*d),
            Self::Text(s) => FieldValue::Text(s.clone()),
        }
    }
}

impl ConditionNode {
    /// Create a literal expression
    pub fn literal(value: Literal) -> Self {
        Self::Literal(value)
    }

    /// Create a text literal
    pub fn text(value: impl Into<String>) -> Self {
        Self::Literal(Literal::Text(value.into()))
    }

    /// Create an integer literal
    pub fn integer(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    /// Create a field reference from a dotted name
    pub fn field(dotted: &str) -> Self {
        Self::Field(FieldPath::parse(dotted))
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: ConditionNode, right: ConditionNode) -> Self {
        Self::BinaryOp(Box::new(BinaryOpData { op, left, right }))
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: ConditionNode) -> Self {
        Self::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a range test
    pub fn between(value: ConditionNode, low: ConditionNode, high: ConditionNode) -> Self {
        Self::Between(Box::new(BetweenData { value, low, high }))
    }

    /// Create a builtin call
    pub fn function_call(function: Builtin, args: impl Into<SmallVec<[ConditionNode; 2]>>) -> Self {
        Self::FunctionCall(Box::new(FunctionCallData {
            function,
            args: args.into(),
        }))
    }

    /// Nesting depth of the tree (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        match self {
            Self::Literal(_) | Self::Field(_) => 1,
            Self::List(items) => 1 + items.iter().map(Self::depth).max().unwrap_or(0),
            Self::BinaryOp(data) => 1 + data.left.depth().max(data.right.depth()),
            Self::UnaryOp { operand, .. } => 1 + operand.depth(),
            Self::Between(data) => {
                1 + data.value.depth().max(data.low.depth()).max(data.high.depth())
            }
            Self::FunctionCall(data) => 1 + data.args.iter().map(Self::depth).max().unwrap_or(0),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        }
    }
}

/// Fully parenthesised rendering, re-parseable into the same tree
impl fmt::Display for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Field(path) => write!(f, "{path}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::BinaryOp(data) => write!(f, "({} {} {})", data.left, data.op, data.right),
            Self::UnaryOp { op, operand } => match op {
                UnaryOperator::Not => write!(f, "(not {operand})"),
                UnaryOperator::Negate => write!(f, "(-{operand})"),
            },
            Self::Between(data) => {
                write!(f, "({} between {} and {})", data.value, data.low, data.high)
            }
            Self::FunctionCall(data) => {
                write!(f, "{}(", data.function.name())?;
                for (i, arg) in data.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
