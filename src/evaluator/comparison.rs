// Copyright 2024 OctoFHIR Team
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

//! Comparison semantics for filter expressions

use crate::ast::BinaryOperator;
use crate::model::JsonPathValue;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

/// Structural equality. Numbers compare by their `f64` value, so `1` equals
/// `1.0`. Object member order is irrelevant.
pub fn deep_equal(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Number(l), JsonValue::Number(r)) => l.as_f64() == r.as_f64(),
        (JsonValue::Array(l), JsonValue::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| deep_equal(a, b))
        }
        (JsonValue::Object(l), JsonValue::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, a)| r.get(key).is_some_and(|b| deep_equal(a, b)))
        }
        _ => left == right,
    }
}

/// Ordering between two numbers or two strings. Any other pairing is unordered.
pub fn ordering(left: &JsonValue, right: &JsonValue) -> Option<Ordering> {
    match (left, right) {
        (JsonValue::Number(l), JsonValue::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (JsonValue::String(l), JsonValue::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn candidate_equal(left: Option<&JsonValue>, right: Option<&JsonValue>) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => deep_equal(l, r),
        (None, None) => true,
        _ => false,
    }
}

fn candidate_matches(op: BinaryOperator, left: Option<&JsonValue>, right: Option<&JsonValue>) -> bool {
    let ordered = |wanted: fn(Ordering) -> bool| match (left, right) {
        (Some(l), Some(r)) => ordering(l, r).is_some_and(wanted),
        _ => false,
    };
    match op {
        BinaryOperator::Equal => candidate_equal(left, right),
        BinaryOperator::NotEqual => !candidate_equal(left, right),
        BinaryOperator::LessThan => ordered(Ordering::is_lt),
        BinaryOperator::GreaterThan => ordered(Ordering::is_gt),
        BinaryOperator::LessThanOrEqual => {
            candidate_equal(left, right) || ordered(Ordering::is_lt)
        }
        BinaryOperator::GreaterThanOrEqual => {
            candidate_equal(left, right) || ordered(Ordering::is_gt)
        }
        BinaryOperator::And | BinaryOperator::Or => false,
    }
}

/// `==` when at least one side selected no nodes: holds when both are
/// empty, or when the other side is Nothing.
fn empty_equal(left: &JsonPathValue<'_>, right: &JsonPathValue<'_>) -> bool {
    match (left.count(), right.count()) {
        (0, 0) => true,
        (0, _) => right.is_nothing(),
        (_, 0) => left.is_nothing(),
        _ => false,
    }
}

/// Evaluate a comparison operator.
///
/// Each side contributes its candidates (all nodes of a node list, or the
/// scalar itself) and the comparison holds if any pair satisfies it.
pub fn compare(op: BinaryOperator, left: &JsonPathValue<'_>, right: &JsonPathValue<'_>) -> bool {
    if left.count() == 0 || right.count() == 0 {
        return match op {
            BinaryOperator::Equal => empty_equal(left, right),
            BinaryOperator::NotEqual => !empty_equal(left, right),
            _ => false,
        };
    }
    let right_candidates = right.candidates();
    left.candidates().into_iter().any(|l| {
        right_candidates
            .iter()
            .any(|&r| candidate_matches(op, l, r))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn nodes(values: &[JsonValue]) -> JsonPathValue<'_> {
        JsonPathValue::nodes(values.iter().collect())
    }

    #[rstest]
    #[case(json!(1), json!(1.0), true)]
    #[case(json!([1, {"a": null}]), json!([1.0, {"a": null}]), true)]
    #[case(json!({"a": 1, "b": 2}), json!({"b": 2, "a": 1}), true)]
    #[case(json!({"a": 1}), json!({"a": 1, "b": 2}), false)]
    #[case(json!("1"), json!(1), false)]
    #[case(json!(null), json!(false), false)]
    fn test_deep_equal(#[case] left: JsonValue, #[case] right: JsonValue, #[case] expected: bool) {
        assert_eq!(deep_equal(&left, &right), expected);
    }

    #[rstest]
    #[case(BinaryOperator::LessThan, json!(1), json!(2), true)]
    #[case(BinaryOperator::LessThan, json!("a"), json!("b"), true)]
    #[case(BinaryOperator::LessThan, json!(1), json!("2"), false)]
    #[case(BinaryOperator::GreaterThan, json!(3), json!(2.5), true)]
    #[case(BinaryOperator::LessThanOrEqual, json!(true), json!(true), true)]
    #[case(BinaryOperator::LessThanOrEqual, json!(true), json!(false), false)]
    #[case(BinaryOperator::GreaterThanOrEqual, json!([1]), json!([1]), true)]
    #[case(BinaryOperator::GreaterThanOrEqual, json!("a"), json!("b"), false)]
    #[case(BinaryOperator::NotEqual, json!(1), json!(2), true)]
    #[case(BinaryOperator::Equal, json!(null), json!(null), true)]
    fn test_scalar_comparisons(
        #[case] op: BinaryOperator,
        #[case] left: JsonValue,
        #[case] right: JsonValue,
        #[case] expected: bool,
    ) {
        let l = JsonPathValue::scalar(left);
        let r = JsonPathValue::scalar(right);
        assert_eq!(compare(op, &l, &r), expected);
    }

    #[test]
    fn test_empty_candidate_rules() {
        let empty = nodes(&[]);
        let other_empty = nodes(&[]);
        let one = JsonPathValue::scalar(json!(1));
        let nothing = JsonPathValue::Nothing;

        assert!(compare(BinaryOperator::Equal, &empty, &other_empty));
        assert!(!compare(BinaryOperator::NotEqual, &empty, &other_empty));
        assert!(!compare(BinaryOperator::Equal, &empty, &one));
        assert!(compare(BinaryOperator::NotEqual, &empty, &one));
        assert!(compare(BinaryOperator::Equal, &nothing, &empty));
        assert!(compare(BinaryOperator::Equal, &empty, &nothing));
        assert!(!compare(BinaryOperator::LessThanOrEqual, &empty, &other_empty));
        assert!(!compare(BinaryOperator::GreaterThan, &one, &empty));
    }

    #[test]
    fn test_nothing_candidates() {
        let nothing = JsonPathValue::Nothing;
        let null = JsonPathValue::scalar(json!(null));
        assert!(compare(BinaryOperator::Equal, &nothing, &JsonPathValue::Nothing));
        assert!(compare(BinaryOperator::LessThanOrEqual, &nothing, &JsonPathValue::Nothing));
        assert!(!compare(BinaryOperator::Equal, &nothing, &null));
        assert!(compare(BinaryOperator::NotEqual, &nothing, &null));
        assert!(!compare(BinaryOperator::LessThan, &nothing, &null));
    }

    #[test]
    fn test_any_pair_matches() {
        let values = [json!(1), json!(5), json!("x")];
        let list = nodes(&values);
        let four = JsonPathValue::scalar(json!(4));
        assert!(compare(BinaryOperator::GreaterThan, &list, &four));
        assert!(compare(BinaryOperator::LessThan, &list, &four));
        assert!(!compare(BinaryOperator::Equal, &list, &four));
        assert!(compare(BinaryOperator::NotEqual, &list, &four));
        assert!(compare(BinaryOperator::Equal, &list, &JsonPathValue::scalar(json!("x"))));
    }
}
