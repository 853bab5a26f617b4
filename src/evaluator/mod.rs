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

//! Filter expression evaluation

pub mod comparison;

pub use comparison::{compare, deep_equal, ordering};

use crate::compiler::CompiledFilter;
use crate::model::JsonPathValue;
use serde_json::Value as JsonValue;

/// Evaluate a compiled filter against the document root and the candidate
/// node currently being tested.
///
/// Absolute sub-queries run from `root`, relative ones from `current`.
/// `&&` and `||` short-circuit on truthiness.
pub fn evaluate<'a>(
    filter: &'a CompiledFilter,
    root: &'a JsonValue,
    current: &'a JsonValue,
) -> JsonPathValue<'a> {
    match filter {
        CompiledFilter::Literal(value) => JsonPathValue::borrowed(value),
        CompiledFilter::Query { absolute, program } => {
            let start = if *absolute { root } else { current };
            JsonPathValue::nodes(program.query_from(root, start))
        }
        CompiledFilter::Not(operand) => {
            JsonPathValue::boolean(!evaluate(operand, root, current).is_truthy())
        }
        CompiledFilter::And(left, right) => JsonPathValue::boolean(
            evaluate(left, root, current).is_truthy() && evaluate(right, root, current).is_truthy(),
        ),
        CompiledFilter::Or(left, right) => JsonPathValue::boolean(
            evaluate(left, root, current).is_truthy() || evaluate(right, root, current).is_truthy(),
        ),
        CompiledFilter::Compare { op, left, right } => {
            let left = evaluate(left, root, current);
            let right = evaluate(right, root, current);
            JsonPathValue::boolean(compare(*op, &left, &right))
        }
        CompiledFilter::Call(call) => {
            let args = call
                .args
                .iter()
                .map(|arg| evaluate(arg, root, current))
                .collect();
            call.function.evaluate(args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::parser::parse;
    use crate::registry::FunctionRegistry;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn filter_of(query: &str) -> CompiledFilter {
        let program = compile(&parse(query).unwrap(), &FunctionRegistry::standard()).unwrap();
        program.filter_at(0).clone()
    }

    #[test]
    fn test_relative_and_absolute_queries() {
        let root = json!({"limit": 3});
        let current = json!({"n": 5});
        let filter = filter_of("$[?@.n > $.limit]");
        assert_eq!(evaluate(&filter, &root, &current), JsonPathValue::boolean(true));

        let filter = filter_of("$[?@.n]");
        let CompiledFilter::Query { program, .. } = &filter else {
            panic!("expected a query");
        };
        assert_eq!(program.source(), Some("['n']"));
        assert_eq!(
            evaluate(&filter, &root, &current),
            JsonPathValue::nodes(vec![&json!(5)])
        );
    }

    #[test]
    fn test_nested_filter_sees_document_root() {
        let root = json!({"limit": 1});
        let current = json!({"xs": [{"v": 1}, {"v": 2}], "limit": 2});
        let filter = filter_of("$[?@.xs[?@.v == $.limit]]");
        assert_eq!(
            evaluate(&filter, &root, &current),
            JsonPathValue::nodes(vec![&json!({"v": 1})])
        );
    }

    #[test]
    fn test_logical_operators() {
        let root = json!(null);
        let current = json!({"a": true, "b": false});
        assert!(evaluate(&filter_of("$[?@.a && !@.c]"), &root, &current).is_truthy());
        assert!(evaluate(&filter_of("$[?@.c || @.b]"), &root, &current).is_truthy());
        assert!(!evaluate(&filter_of("$[?!@.b]"), &root, &current).is_truthy());
        assert!(!evaluate(&filter_of("$[?@.b == true]"), &root, &current).is_truthy());
    }

    #[test]
    fn test_function_calls() {
        let root = json!(null);
        let current = json!({"tags": ["a", "b", "c"], "name": "abc"});
        assert_eq!(
            evaluate(&filter_of("$[?length(@.tags) == 3]"), &root, &current),
            JsonPathValue::boolean(true)
        );
        assert_eq!(
            evaluate(&filter_of("$[?match(@.name, 'a.c')]"), &root, &current),
            JsonPathValue::boolean(true)
        );
        assert_eq!(
            evaluate(&filter_of("$[?count(@.*) == 2]"), &root, &current),
            JsonPathValue::boolean(true)
        );
    }
}
