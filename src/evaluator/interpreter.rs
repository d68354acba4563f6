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

//! Tree-walking interpreter for condition ASTs
//!
//! Intermediate results are `Option<Cow<FieldValue>>`: `None` stands for a
//! field absent from the record, and record values are borrowed rather than
//! cloned.

use super::condition::Condition;
use super::error::{EvaluationError, EvaluationResult};
use crate::ast::{BetweenData, BinaryOperator, Builtin, ConditionNode, FunctionCallData, UnaryOperator};
use crate::diagnostics::Diagnostic;
use crate::model::{FieldValue, PatientRecord};
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::cmp::Ordering;

type Evaluated<'a> = Option<Cow<'a, FieldValue>>;

#[inline]
fn truthy(value: &Evaluated<'_>) -> bool {
    value.as_deref().is_some_and(FieldValue::is_truthy)
}

#[inline]
fn boolean<'a>(value: bool) -> Evaluated<'a> {
    Some(Cow::Owned(FieldValue::Boolean(value)))
}

/// Evaluates compiled conditions against a patient record
///
/// `evaluate` never fails: parse and runtime errors produce `false` and a
/// diagnostic, logged with `log::warn!` unless logging is disabled.
#[derive(Debug, Clone)]
pub struct ConditionEvaluator {
    log_diagnostics: bool,
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionEvaluator {
    /// Create an evaluator that logs failures
    pub fn new() -> Self {
        Self {
            log_diagnostics: true,
        }
    }

    /// Toggle `log::warn!` output for failures
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_diagnostics = enabled;
        self
    }

    /// Evaluate, exposing failures
    pub fn try_evaluate(&self, condition: &Condition, record: &PatientRecord) -> EvaluationResult<bool> {
        match condition {
            Condition::Parsed { ast, .. } => self.try_evaluate_node(ast, record),
            Condition::Invalid { error, .. } => Err(EvaluationError::InvalidCondition {
                message: error.to_string(),
            }),
        }
    }

    /// Evaluate a bare tree to a boolean using truthiness
    pub fn try_evaluate_node(&self, node: &ConditionNode, record: &PatientRecord) -> EvaluationResult<bool> {
        let value = eval(node, record)?;
        Ok(truthy(&value))
    }

    /// Evaluate a bare tree to its value; `None` when the result is missing
    pub fn evaluate_value(&self, node: &ConditionNode, record: &PatientRecord) -> EvaluationResult<Option<FieldValue>> {
        Ok(eval(node, record)?.map(Cow::into_owned))
    }

    /// Evaluate, treating every failure as `false`
    pub fn evaluate(&self, condition: &Condition, record: &PatientRecord) -> (bool, Option<Diagnostic>) {
        match self.try_evaluate(condition, record) {
            Ok(result) => (result, None),
            Err(error) => {
                if self.log_diagnostics {
                    log::warn!("Condition `{}` treated as false: {error}", condition.source());
                }
                let mut diagnostic = error.to_diagnostic();
                diagnostic.location.source_text = Some(condition.source().to_string());
                (false, Some(diagnostic))
            }
        }
    }

    /// Evaluate and drop the diagnostic
    #[inline]
    pub fn matches(&self, condition: &Condition, record: &PatientRecord) -> bool {
        self.evaluate(condition, record).0
    }
}

fn eval<'a>(node: &ConditionNode, record: &'a PatientRecord) -> EvaluationResult<Evaluated<'a>> {
    match node {
        ConditionNode::Literal(literal) => Ok(Some(Cow::Owned(literal.to_value()))),
        ConditionNode::Field(path) => Ok(record.get_path(path).map(Cow::Borrowed)),
        ConditionNode::List(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                // Missing elements are dropped
                if let Some(value) = eval(item, record)? {
                    values.push(value.into_owned());
                }
            }
            Ok(Some(Cow::Owned(FieldValue::List(values))))
        }
        ConditionNode::BinaryOp(data) => eval_binary(data.op, &data.left, &data.right, record),
        ConditionNode::UnaryOp { op, operand } => eval_unary(*op, operand, record),
        ConditionNode::Between(data) => eval_between(data, record),
        ConditionNode::FunctionCall(data) => eval_function(data, record),
    }
}

fn eval_binary<'a>(
    op: BinaryOperator,
    left: &ConditionNode,
    right: &ConditionNode,
    record: &'a PatientRecord,
) -> EvaluationResult<Evaluated<'a>> {
    match op {
        BinaryOperator::And => {
            if !truthy(&eval(left, record)?) {
                return Ok(boolean(false));
            }
            Ok(boolean(truthy(&eval(right, record)?)))
        }
        BinaryOperator::Or => {
            if truthy(&eval(left, record)?) {
                return Ok(boolean(true));
            }
            Ok(boolean(truthy(&eval(right, record)?)))
        }
        _ => {
            let lhs = eval(left, record)?;
            let rhs = eval(right, record)?;

            if op.is_arithmetic() {
                return match (lhs, rhs) {
                    (Some(l), Some(r)) => arithmetic(op, &l, &r).map(|v| Some(Cow::Owned(v))),
                    _ => Ok(None),
                };
            }

            // Every comparison against a missing operand is false
            let (Some(l), Some(r)) = (lhs, rhs) else {
                return Ok(boolean(false));
            };
            let result = match op {
                BinaryOperator::Equal => l.loose_eq(&r),
                BinaryOperator::NotEqual => !l.loose_eq(&r),
                BinaryOperator::In => membership(op, &l, &r)?,
                BinaryOperator::Contains => containment(op, &l, &r)?,
                _ => {
                    let ordering = order(op.symbol(), &l, &r)?;
                    match op {
                        BinaryOperator::LessThan => ordering == Ordering::Less,
                        BinaryOperator::LessThanOrEqual => ordering != Ordering::Greater,
                        BinaryOperator::GreaterThan => ordering == Ordering::Greater,
                        BinaryOperator::GreaterThanOrEqual => ordering != Ordering::Less,
                        _ => unreachable!("non-ordering operator {op}"),
                    }
                }
            };
            Ok(boolean(result))
        }
    }
}

fn order(symbol: &'static str, l: &FieldValue, r: &FieldValue) -> EvaluationResult<Ordering> {
    l.partial_compare(r)
        .ok_or_else(|| EvaluationError::mismatch(symbol, l.type_name(), r.type_name()))
}

/// `needle in haystack`
fn membership(op: BinaryOperator, needle: &FieldValue, haystack: &FieldValue) -> EvaluationResult<bool> {
    match (needle, haystack) {
        (FieldValue::List(needles), FieldValue::List(items)) => Ok(needles
            .iter()
            .any(|n| items.iter().any(|item| item.loose_eq(n)))),
        (_, FieldValue::List(items)) => Ok(items.iter().any(|item| item.loose_eq(needle))),
        (FieldValue::Text(n), FieldValue::Text(h)) => Ok(h.contains(n.as_str())),
        _ => Err(EvaluationError::mismatch(
            op.symbol(),
            needle.type_name(),
            haystack.type_name(),
        )),
    }
}

/// `haystack contains needle`
fn containment(op: BinaryOperator, haystack: &FieldValue, needle: &FieldValue) -> EvaluationResult<bool> {
    match (haystack, needle) {
        (FieldValue::List(items), _) => Ok(items.iter().any(|item| item.loose_eq(needle))),
        (FieldValue::Text(h), FieldValue::Text(n)) => Ok(h.contains(n.as_str())),
        _ => Err(EvaluationError::mismatch(
            op.symbol(),
            haystack.type_name(),
            needle.type_name(),
        )),
    }
}

fn arithmetic(op: BinaryOperator, l: &FieldValue, r: &FieldValue) -> EvaluationResult<FieldValue> {
    let symbol = op.symbol();
    let overflow = || EvaluationError::Overflow { operation: symbol };

    if let (FieldValue::Integer(a), FieldValue::Integer(b)) = (l, r) {
        let result = match op {
            BinaryOperator::Add => a.checked_add(*b),
            BinaryOperator::Subtract => a.checked_sub(*b),
            BinaryOperator::Multiply => a.checked_mul(*b),
            // Integer division is exact, so it goes through decimals
            _ => None,
        };
        if let Some(value) = result {
            return Ok(FieldValue::Integer(value));
        }
        if op != BinaryOperator::Divide {
            return Err(overflow());
        }
    }

    let (Some(a), Some(b)) = (l.as_decimal(), r.as_decimal()) else {
        return Err(EvaluationError::mismatch(symbol, l.type_name(), r.type_name()));
    };

    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Subtract => a.checked_sub(b),
        BinaryOperator::Multiply => a.checked_mul(b),
        BinaryOperator::Divide => {
            if b.is_zero() {
                return Err(EvaluationError::DivisionByZero);
            }
            a.checked_div(b)
        }
        _ => unreachable!("non-arithmetic operator {op}"),
    };
    result.map(normalize).ok_or_else(overflow)
}

/// Whole decimals collapse back to integers
fn normalize(value: Decimal) -> FieldValue {
    let value = value.normalize();
    match FieldValue::Decimal(value).as_integer() {
        Some(i) => FieldValue::Integer(i),
        None => FieldValue::Decimal(value),
    }
}

fn eval_unary<'a>(
    op: UnaryOperator,
    operand: &ConditionNode,
    record: &'a PatientRecord,
) -> EvaluationResult<Evaluated<'a>> {
    let value = eval(operand, record)?;
    match op {
        UnaryOperator::Not => Ok(boolean(!truthy(&value))),
        UnaryOperator::Negate => {
            let Some(value) = value else {
                return Ok(None);
            };
            let negated = match &*value {
                FieldValue::Integer(i) => FieldValue::Integer(
                    i.checked_neg()
                        .ok_or(EvaluationError::Overflow { operation: "-" })?,
                ),
                FieldValue::Decimal(d) => FieldValue::Decimal(-*d),
                other => {
                    return Err(EvaluationError::mismatch("-", other.type_name(), other.type_name()));
                }
            };
            Ok(Some(Cow::Owned(negated)))
        }
    }
}

fn eval_between<'a>(data: &BetweenData, record: &'a PatientRecord) -> EvaluationResult<Evaluated<'a>> {
    let value = eval(&data.value, record)?;
    let low = eval(&data.low, record)?;
    let high = eval(&data.high, record)?;
    let (Some(value), Some(low), Some(high)) = (value, low, high) else {
        return Ok(boolean(false));
    };

    let above = order("between", &value, &low)? != Ordering::Less;
    let below = order("between", &value, &high)? != Ordering::Greater;
    Ok(boolean(above && below))
}

fn eval_function<'a>(data: &FunctionCallData, record: &'a PatientRecord) -> EvaluationResult<Evaluated<'a>> {
    let argument = match data.args.first() {
        Some(arg) => eval(arg, record)?,
        None => None,
    };

    let value = match data.function {
        Builtin::Exists => FieldValue::Boolean(argument.is_some()),
        Builtin::Count => {
            let count = match argument.as_deref() {
                None => 0,
                Some(FieldValue::List(items)) => items.len(),
                Some(_) => 1,
            };
            FieldValue::Integer(i64::try_from(count).unwrap_or(i64::MAX))
        }
    };
    Ok(Some(Cow::Owned(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DEFAULT_MAX_DEPTH;
    use pretty_assertions::assert_eq;

    fn record() -> PatientRecord {
        PatientRecord::new()
            .with("breathing", "present")
            .with("pain", 8)
            .with("temperature", Decimal::new(385, 1))
            .with("injuries", vec!["head", "chest"])
            .with("vital_signs.heart_rate", 130)
            .with("conscious", true)
    }

    fn check(source: &str) -> bool {
        let condition = Condition::compile(source, DEFAULT_MAX_DEPTH);
        ConditionEvaluator::new()
            .with_logging(false)
            .try_evaluate(&condition, &record())
            .unwrap()
    }

    fn failure(source: &str) -> EvaluationError {
        let condition = Condition::compile(source, DEFAULT_MAX_DEPTH);
        ConditionEvaluator::new()
            .try_evaluate(&condition, &record())
            .unwrap_err()
    }

    #[test]
    fn test_comparisons() {
        assert!(check("breathing == 'present'"));
        assert!(check("breathing = \"present\""));
        assert!(!check("breathing == 'Present'"));
        assert!(check("pain >= 7 and pain < 10"));
        assert!(check("temperature > 38"));
        assert!(check("pain == 8.0"));
        assert!(check("vital_signs.heart_rate > 120"));
        assert!(check("'abc' < 'abd'"));
    }

    #[test]
    fn test_missing_fields_are_false() {
        assert!(!check("circulation == 'absent'"));
        assert!(!check("circulation != 'absent'"));
        assert!(!check("circulation > 3"));
        assert!(!check("circulation in ['a', 'b']"));
        assert!(!check("circulation between 1 and 3"));
        assert!(!check("vital_signs.blood_pressure < 90"));
        assert!(!check("circulation + 1 > 0"));
        assert!(check("not exists(circulation)"));
        assert!(check("count(circulation) == 0"));
    }

    #[test]
    fn test_membership() {
        assert!(check("breathing in ['present', 'labored']"));
        assert!(check("injuries contains 'head'"));
        assert!(!check("injuries contains 'leg'"));
        assert!(check("injuries in ['leg', 'chest']"));
        assert!(check("'sent' in breathing"));
        assert!(check("breathing contains 'res'"));
        assert!(check("8 in [7, 8.0]"));
    }

    #[test]
    fn test_range_and_counts() {
        assert!(check("pain between 8 and 10"));
        assert!(!check("pain between 1 and 7"));
        assert!(check("count(injuries) == 2"));
        assert!(check("count(pain) == 1"));
        assert!(check("exists(vital_signs.heart_rate)"));
    }

    #[test]
    fn test_arithmetic() {
        assert!(check("pain * 2 - 1 == 15"));
        assert!(check("pain / 16 == 0.5"));
        assert!(check("-pain < 0"));
        assert!(check("temperature + 1.5 == 40"));
    }

    #[test]
    fn test_truthiness() {
        assert!(check("conscious"));
        assert!(check("breathing and pain"));
        assert!(!check("circulation"));
        assert!(check("circulation or injuries"));
        assert!(check("not []"));
        assert!(!check("0"));
    }

    #[test]
    fn test_short_circuit_skips_errors() {
        assert!(!check("false and 1 / 0 == 1"));
        assert!(check("true or breathing < 3"));
    }

    #[test]
    fn test_runtime_errors() {
        assert_eq!(failure("pain / 0 > 1"), EvaluationError::DivisionByZero);
        assert_eq!(
            failure("breathing < 3"),
            EvaluationError::mismatch("<", "text", "integer")
        );
        assert_eq!(
            failure("pain in 7"),
            EvaluationError::mismatch("in", "integer", "integer")
        );
        assert!(matches!(
            failure("pain >"),
            EvaluationError::InvalidCondition { .. }
        ));
    }

    #[test]
    fn test_evaluate_never_fails() {
        let evaluator = ConditionEvaluator::new().with_logging(false);
        let condition = Condition::compile("breathing > 3", DEFAULT_MAX_DEPTH);
        let (result, diagnostic) = evaluator.evaluate(&condition, &record());
        assert!(!result);
        let diagnostic = diagnostic.unwrap();
        assert_eq!(diagnostic.location.source_text.as_deref(), Some("breathing > 3"));

        let (result, diagnostic) = evaluator.evaluate(&Condition::compile("pain > 3", 64), &record());
        assert!(result);
        assert!(diagnostic.is_none());
    }

    #[test]
    fn test_evaluate_value() {
        let evaluator = ConditionEvaluator::new();
        let node = crate::parser::parse_condition("pain * 2").unwrap();
        assert_eq!(
            evaluator.evaluate_value(&node, &record()).unwrap(),
            Some(FieldValue::Integer(16))
        );
        let node = crate::parser::parse_condition("missing * 2").unwrap();
        assert_eq!(evaluator.evaluate_value(&node, &record()).unwrap(), None);
    }
}
