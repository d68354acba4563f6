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

//! Pratt parser for condition expressions
//!
//! Precedence levels (highest to lowest):
//! - **Unary** (7): `-` negation
//! - **Multiplicative** (6): `*`, `/`
//! - **Additive** (5): `+`, `-`
//! - **Comparison** (4): `==`, `!=`, `<`, `<=`, `>`, `>=`, `in`, `contains`,
//!   `between .. and ..` (non-associative)
//! - **Not** (3): prefix `not` / `!`
//! - **And** (2): `and` / `&&`
//! - **Or** (1): `or` / `||`

use super::error::{ParseError, ParseResult, common_messages};
use super::span::Spanned;
use super::tokenizer::{Token, Tokenizer};
use crate::ast::{BinaryOperator, Builtin, ConditionNode, Literal, UnaryOperator};
use crate::model::FieldPath;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use std::str::FromStr;

/// Default limit on expression nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Operator precedence levels (higher = tighter binding)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// Logical OR
    Or = 1,
    /// Logical AND
    And = 2,
    /// Prefix logical NOT
    Not = 3,
    /// Comparison, membership and range tests
    Comparison = 4,
    /// Additive operators (+, -)
    Additive = 5,
    /// Multiplicative operators (*, /)
    Multiplicative = 6,
    /// Prefix negation
    Unary = 7,
}

impl Precedence {
    /// Get the next higher precedence level for left-associative operators
    #[inline(always)]
    pub const fn next_level(self) -> Self {
        match self {
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Not,
            Precedence::Not => Precedence::Comparison,
            Precedence::Comparison => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Unary,
            Precedence::Unary => Precedence::Unary,
        }
    }
}

/// Precedence of a token in infix position
#[inline(always)]
fn get_precedence(token: &Token<'_>) -> Option<Precedence> {
    match token {
        Token::Or => Some(Precedence::Or),
        Token::And => Some(Precedence::And),
        Token::Equal
        | Token::NotEqual
        | Token::LessThan
        | Token::LessThanOrEqual
        | Token::GreaterThan
        | Token::GreaterThanOrEqual
        | Token::In
        | Token::Contains
        | Token::Between => Some(Precedence::Comparison),
        Token::Plus | Token::Minus => Some(Precedence::Additive),
        Token::Multiply | Token::Divide => Some(Precedence::Multiplicative),
        _ => None,
    }
}

/// Convert token to binary operator
#[inline(always)]
fn token_to_binary_op(token: &Token<'_>) -> Option<BinaryOperator> {
    match token {
        Token::Equal => Some(BinaryOperator::Equal),
        Token::NotEqual => Some(BinaryOperator::NotEqual),
        Token::And => Some(BinaryOperator::And),
        Token::Or => Some(BinaryOperator::Or),
        Token::LessThan => Some(BinaryOperator::LessThan),
        Token::LessThanOrEqual => Some(BinaryOperator::LessThanOrEqual),
        Token::GreaterThan => Some(BinaryOperator::GreaterThan),
        Token::GreaterThanOrEqual => Some(BinaryOperator::GreaterThanOrEqual),
        Token::In => Some(BinaryOperator::In),
        Token::Contains => Some(BinaryOperator::Contains),
        Token::Plus => Some(BinaryOperator::Add),
        Token::Minus => Some(BinaryOperator::Subtract),
        Token::Multiply => Some(BinaryOperator::Multiply),
        Token::Divide => Some(BinaryOperator::Divide),
        _ => None,
    }
}

/// Pratt parser producing a [`ConditionNode`] tree
///
/// Every recursive descent counts against `max_depth`, so hostile or
/// accidental deep nesting fails with [`ParseError::NestingTooDeep`] instead
/// of exhausting the stack.
pub struct PrattParser<'input> {
    tokenizer: Tokenizer<'input>,
    current_token: Option<Spanned<Token<'input>>>,
    input_len: usize,
    depth: usize,
    max_depth: usize,
}

impl<'input> PrattParser<'input> {
    /// Create a parser with the default nesting limit
    #[inline]
    pub fn new(input: &'input str) -> Self {
        Self::with_max_depth(input, DEFAULT_MAX_DEPTH)
    }

    /// Create a parser with an explicit nesting limit
    pub fn with_max_depth(input: &'input str, max_depth: usize) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            current_token: None,
            input_len: input.len(),
            depth: 0,
            max_depth,
        }
    }

    #[inline(always)]
    fn advance(&mut self) -> ParseResult<()> {
        self.current_token = self.tokenizer.next_spanned()?;
        Ok(())
    }

    #[inline(always)]
    fn current(&self) -> Option<&Token<'input>> {
        self.current_token.as_ref().map(|t| &t.value)
    }

    /// Byte offset of the current token, or end of input
    #[inline(always)]
    fn position(&self) -> usize {
        self.current_token
            .as_ref()
            .map_or(self.input_len, |t| t.start)
    }

    /// Error for the current token when something else was required
    fn unexpected(&self) -> ParseError {
        match &self.current_token {
            Some(token) => ParseError::unexpected_token_dynamic(token.value.to_string(), token.start),
            None => ParseError::UnexpectedEof {
                position: self.input_len,
            },
        }
    }

    fn expect(&mut self, expected: Token<'input>, description: &'static str) -> ParseResult<()> {
        match self.current() {
            Some(token) if *token == expected => self.advance(),
            Some(_) => Err(ParseError::expected_token_prealloc(
                description,
                self.position(),
            )),
            None => Err(ParseError::UnexpectedEof {
                position: self.input_len,
            }),
        }
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::NestingTooDeep {
                max_depth: self.max_depth,
                position: self.position(),
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Dotted field path starting at the current identifier
    fn parse_field_path(&mut self) -> ParseResult<FieldPath> {
        let mut segments: SmallVec<[String; 2]> = SmallVec::new();
        match self.current() {
            Some(Token::Identifier(name)) => segments.push((*name).to_string()),
            _ => {
                return Err(ParseError::expected_token_prealloc(
                    common_messages::EXPECTED_FIELD_PATH,
                    self.position(),
                ));
            }
        }
        self.advance()?;

        while let Some(Token::Dot) = self.current() {
            self.advance()?;
            match self.current() {
                Some(Token::Identifier(name)) => {
                    segments.push((*name).to_string());
                    self.advance()?;
                }
                _ => return Err(ParseError::expected_identifier(self.position())),
            }
        }

        Ok(FieldPath::from_segments(segments))
    }

    /// `exists(path)` / `count(path)`; the current token is `(`
    fn parse_function_call(&mut self, name: &'input str, position: usize) -> ParseResult<ConditionNode> {
        let function = Builtin::from_name(name).ok_or_else(|| ParseError::UnknownFunction {
            name: name.to_string().into(),
            position,
        })?;
        self.advance()?; // consume (

        let path = self.parse_field_path()?;
        self.expect(Token::RightParen, common_messages::EXPECTED_RIGHT_PAREN)?;

        let mut args: SmallVec<[ConditionNode; 2]> = SmallVec::new();
        args.push(ConditionNode::Field(path));
        Ok(ConditionNode::function_call(function, args))
    }

    /// `[a, b, c]`; the current token is `[`
    fn parse_list(&mut self) -> ParseResult<ConditionNode> {
        self.advance()?; // consume [
        let mut items = Vec::new();

        if let Some(Token::RightBracket) = self.current() {
            self.advance()?;
            return Ok(ConditionNode::List(items));
        }

        loop {
            items.push(self.parse_expression_with_precedence(Precedence::Or)?);
            match self.current() {
                Some(Token::Comma) => self.advance()?,
                Some(Token::RightBracket) => {
                    self.advance()?;
                    break;
                }
                Some(_) => {
                    return Err(ParseError::expected_token_prealloc(
                        common_messages::EXPECTED_RIGHT_BRACKET,
                        self.position(),
                    ));
                }
                None => {
                    return Err(ParseError::UnexpectedEof {
                        position: self.input_len,
                    });
                }
            }
        }

        Ok(ConditionNode::List(items))
    }

    /// Primary and prefix expressions
    fn parse_prefix(&mut self) -> ParseResult<ConditionNode> {
        let Some(spanned) = self.current_token.clone() else {
            return Err(ParseError::UnexpectedEof {
                position: self.input_len,
            });
        };
        let start = spanned.start;

        match spanned.value {
            Token::Identifier(name) => {
                // Peek past the identifier: `(` makes it a call
                let mut lookahead = self.tokenizer.clone();
                if let Ok(Some(Token::LeftParen)) = lookahead.next_token() {
                    self.advance()?;
                    return self.parse_function_call(name, start);
                }
                Ok(ConditionNode::Field(self.parse_field_path()?))
            }

            Token::Integer(value) => {
                self.advance()?;
                Ok(ConditionNode::Literal(Literal::Integer(value)))
            }

            Token::Decimal(text) => {
                let value = Decimal::from_str(text)
                    .map_err(|_| ParseError::invalid_decimal_literal(text.to_string(), start))?;
                self.advance()?;
                Ok(ConditionNode::Literal(Literal::Decimal(value)))
            }

            Token::String(value) => {
                self.advance()?;
                Ok(ConditionNode::Literal(Literal::Text(value.into_owned())))
            }

            Token::True => {
                self.advance()?;
                Ok(ConditionNode::Literal(Literal::Boolean(true)))
            }
            Token::False => {
                self.advance()?;
                Ok(ConditionNode::Literal(Literal::Boolean(false)))
            }

            Token::Not => {
                self.advance()?;
                let operand = self.parse_expression_with_precedence(Precedence::Not)?;
                Ok(ConditionNode::unary_op(UnaryOperator::Not, operand))
            }

            Token::Minus => {
                self.advance()?;
                let operand = self.parse_expression_with_precedence(Precedence::Unary)?;
                // Fold negative numeric literals
                Ok(match operand {
                    ConditionNode::Literal(Literal::Integer(i)) if i != i64::MIN => {
                        ConditionNode::Literal(Literal::Integer(-i))
                    }
                    ConditionNode::Literal(Literal::Decimal(d)) => {
                        ConditionNode::Literal(Literal::Decimal(-d))
                    }
                    other => ConditionNode::unary_op(UnaryOperator::Negate, other),
                })
            }

            Token::LeftParen => {
                self.advance()?;
                let inner = self.parse_expression_with_precedence(Precedence::Or)?;
                self.expect(Token::RightParen, common_messages::EXPECTED_RIGHT_PAREN)?;
                Ok(inner)
            }

            Token::LeftBracket => self.parse_list(),

            _ => Err(self.unexpected()),
        }
    }

    /// Precedence climbing over infix operators
    fn parse_expression_with_precedence(
        &mut self,
        min_precedence: Precedence,
    ) -> ParseResult<ConditionNode> {
        self.enter()?;
        let result = self.parse_infix_loop(min_precedence);
        self.leave();
        result
    }

    fn parse_infix_loop(&mut self, min_precedence: Precedence) -> ParseResult<ConditionNode> {
        let mut left = self.parse_prefix()?;

        while let Some(current_token) = self.current() {
            let precedence = match get_precedence(current_token) {
                Some(prec) if prec >= min_precedence => prec,
                _ => break,
            };

            if let Token::Between = current_token {
                self.advance()?;
                let low = self.parse_expression_with_precedence(Precedence::Additive)?;
                self.expect(Token::And, common_messages::EXPECTED_BETWEEN_AND)?;
                let high = self.parse_expression_with_precedence(Precedence::Additive)?;
                left = ConditionNode::between(left, low, high);
            } else {
                let op = token_to_binary_op(current_token)
                    .ok_or_else(|| self.unexpected())?;
                self.advance()?;
                let right = self.parse_expression_with_precedence(precedence.next_level())?;
                left = ConditionNode::binary_op(op, left, right);
            }

            // Comparisons do not chain: `a < b < c` is rejected
            if precedence == Precedence::Comparison
                && self.current().and_then(get_precedence) == Some(Precedence::Comparison)
            {
                return Err(self.unexpected());
            }
        }

        Ok(left)
    }

    /// Parse complete input
    pub fn parse(&mut self) -> ParseResult<ConditionNode> {
        self.advance()?;
        if self.current_token.is_none() {
            return Err(ParseError::EmptyExpression);
        }

        let expr = self.parse_expression_with_precedence(Precedence::Or)?;

        // Ensure we consumed all input
        if self.current_token.is_some() {
            return Err(self.unexpected());
        }

        Ok(expr)
    }
}

/// Parse a condition with the default nesting limit
#[inline]
pub fn parse_condition(input: &str) -> ParseResult<ConditionNode> {
    PrattParser::new(input).parse()
}

/// Parse a condition with an explicit nesting limit
pub fn parse_condition_with_depth(input: &str, max_depth: usize) -> ParseResult<ConditionNode> {
    PrattParser::with_max_depth(input, max_depth).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(input: &str) -> String {
        parse_condition(input).unwrap().to_string()
    }

    #[test]
    fn test_precedence_ordering() {
        assert!(Precedence::Multiplicative > Precedence::Additive);
        assert!(Precedence::Additive > Precedence::Comparison);
        assert!(Precedence::Comparison > Precedence::Not);
        assert!(Precedence::Not > Precedence::And);
        assert!(Precedence::And > Precedence::Or);
    }

    #[test]
    fn test_logical_precedence() {
        assert_eq!(
            render("a == 1 or b == 2 and c == 3"),
            "((a == 1) or ((b == 2) and (c == 3)))"
        );
        assert_eq!(render("not a == 1 and b"), "((not (a == 1)) and b)");
        assert_eq!(render("!(a || b)"), "(not (a or b))");
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(render("2 + 3 * 4 > x"), "((2 + (3 * 4)) > x)");
        assert_eq!(render("a - b - c == 0"), "(((a - b) - c) == 0)");
        assert_eq!(render("-x < -3"), "((-x) < -3)");
    }

    #[test]
    fn test_field_paths_and_calls() {
        assert_eq!(
            render("vital_signs.heart_rate > 120 and exists(allergies)"),
            "((vital_signs.heart_rate > 120) and exists(allergies))"
        );
        assert_eq!(render("count(injuries) >= 2"), "(count(injuries) >= 2)");
    }

    #[test]
    fn test_membership_and_range() {
        assert_eq!(
            render("consciousness in ['pain', 'unresponsive']"),
            "(consciousness in ['pain', 'unresponsive'])"
        );
        assert_eq!(
            render("injuries contains 'head'"),
            "(injuries contains 'head')"
        );
        assert_eq!(
            render("pain between 4 and 7 and breathing == 'normal'"),
            "((pain between 4 and 7) and (breathing == 'normal'))"
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            parse_condition("38.5").unwrap(),
            ConditionNode::Literal(Literal::Decimal(Decimal::from_str("38.5").unwrap()))
        );
        assert_eq!(
            parse_condition("\"absent\"").unwrap(),
            ConditionNode::text("absent")
        );
        assert_eq!(
            parse_condition("true").unwrap(),
            ConditionNode::Literal(Literal::Boolean(true))
        );
        assert_eq!(parse_condition("[]").unwrap(), ConditionNode::List(vec![]));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_condition("   "), Err(ParseError::EmptyExpression));
        assert_eq!(
            parse_condition("pain >"),
            Err(ParseError::UnexpectedEof { position: 6 })
        );
        assert_eq!(
            parse_condition("(pain > 3"),
            Err(ParseError::UnexpectedEof { position: 9 })
        );
        assert_eq!(
            parse_condition("max(pain) > 3"),
            Err(ParseError::UnknownFunction {
                name: "max".into(),
                position: 0
            })
        );
        assert!(matches!(
            parse_condition("a < b < c"),
            Err(ParseError::UnexpectedToken { position: 6, .. })
        ));
        assert!(matches!(
            parse_condition("pain between 4 or 7"),
            Err(ParseError::ExpectedToken { position: 15, .. })
        ));
        assert!(matches!(
            parse_condition("a b"),
            Err(ParseError::UnexpectedToken { position: 2, .. })
        ));
        assert!(matches!(
            parse_condition("exists('x')"),
            Err(ParseError::ExpectedToken { position: 7, .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}a{}", "(".repeat(10), ")".repeat(10));
        assert!(parse_condition_with_depth(&deep, 32).is_ok());
        assert!(matches!(
            parse_condition_with_depth(&deep, 5),
            Err(ParseError::NestingTooDeep { max_depth: 5, .. })
        ));

        let nots = format!("{}a", "not ".repeat(100));
        assert!(matches!(
            parse_condition(&nots),
            Err(ParseError::NestingTooDeep { .. })
        ));
    }
}
