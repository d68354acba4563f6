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

//! Visitor pattern for AST traversal

use super::expression::{BetweenData, ConditionNode, FunctionCallData, Literal};
use super::operator::{BinaryOperator, UnaryOperator};
use crate::model::FieldPath;

/// Trait for visiting AST nodes
///
/// Every method walks into children by default, so implementors only
/// override the nodes they care about.
pub trait Visitor: Sized {
    /// Visit an expression node
    fn visit_condition(&mut self, node: &ConditionNode) {
        walk_condition(self, node)
    }

    /// Visit a literal
    fn visit_literal(&mut self, _literal: &Literal) {}

    /// Visit a field reference
    fn visit_field(&mut self, _path: &FieldPath) {}

    /// Visit a list literal
    fn visit_list(&mut self, items: &[ConditionNode]) {
        for item in items {
            self.visit_condition(item);
        }
    }

    /// Visit a binary operation
    fn visit_binary_op(
        &mut self,
        _op: BinaryOperator,
        left: &ConditionNode,
        right: &ConditionNode,
    ) {
        self.visit_condition(left);
        self.visit_condition(right);
    }

    /// Visit a unary operation
    fn visit_unary_op(&mut self, _op: UnaryOperator, operand: &ConditionNode) {
        self.visit_condition(operand);
    }

    /// Visit a range test
    fn visit_between(&mut self, data: &BetweenData) {
        self.visit_condition(&data.value);
        self.visit_condition(&data.low);
        self.visit_condition(&data.high);
    }

    /// Visit a builtin call
    fn visit_function_call(&mut self, data: &FunctionCallData) {
        for arg in &data.args {
            self.visit_condition(arg);
        }
    }
}

/// Default implementation of walking a condition tree
pub fn walk_condition<V: Visitor>(visitor: &mut V, node: &ConditionNode) {
    match node {
        ConditionNode::Literal(lit) => visitor.visit_literal(lit),
        ConditionNode::Field(path) => visitor.visit_field(path),
        ConditionNode::List(items) => visitor.visit_list(items),
        ConditionNode::BinaryOp(data) => visitor.visit_binary_op(data.op, &data.left, &data.right),
        ConditionNode::UnaryOp { op, operand } => visitor.visit_unary_op(*op, operand),
        ConditionNode::Between(data) => visitor.visit_between(data),
        ConditionNode::FunctionCall(data) => visitor.visit_function_call(data),
    }
}

/// Collects every field a condition reads, in first-seen order
#[derive(Debug, Default)]
pub struct FieldCollector {
    fields: Vec<FieldPath>,
}

impl FieldCollector {
    /// Collect the fields of one tree
    pub fn collect(node: &ConditionNode) -> Vec<FieldPath> {
        let mut collector = Self::default();
        collector.visit_condition(node);
        collector.fields
    }
}

impl Visitor for FieldCollector {
    fn visit_field(&mut self, path: &FieldPath) {
        if !self.fields.contains(path) {
            self.fields.push(path.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_collector() {
        let node = ConditionNode::binary_op(
            BinaryOperator::Or,
            ConditionNode::binary_op(
                BinaryOperator::LessThan,
                ConditionNode::field("vital_signs.heart_rate"),
                ConditionNode::integer(40),
            ),
            ConditionNode::between(
                ConditionNode::field("vital_signs.heart_rate"),
                ConditionNode::field("pain"),
                ConditionNode::integer(10),
            ),
        );

        let fields: Vec<String> = FieldCollector::collect(&node)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(fields, ["vital_signs.heart_rate", "pain"]);
    }

    #[test]
    fn test_custom_visitor_counts_literals() {
        #[derive(Default)]
        struct LiteralCounter(usize);

        impl Visitor for LiteralCounter {
            fn visit_literal(&mut self, _literal: &Literal) {
                self.0 += 1;
            }
        }

        let node = ConditionNode::List(vec![
            ConditionNode::text("head"),
            ConditionNode::text("chest"),
            ConditionNode::field("injuries"),
        ]);
        let mut counter = LiteralCounter::default();
        counter.visit_condition(&node);
        assert_eq!(counter.0, 2);
    }
}
