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

//! Filter usage rules checked before compilation

use crate::ast::{FilterExpr, PathExpr, SelectorExpr};
use crate::error::ValidationError;
use crate::registry::{FunctionRegistry, FunctionUse};

/// Validate every filter reachable from a path, including filters nested
/// inside filter sub-paths
pub fn validate(path: &PathExpr, registry: &FunctionRegistry) -> Result<(), ValidationError> {
    Validator { registry }.visit_path(path)
}

struct Validator<'r> {
    registry: &'r FunctionRegistry,
}

impl Validator<'_> {
    fn visit_path(&self, path: &PathExpr) -> Result<(), ValidationError> {
        for segment in &path.segments {
            for selector in &segment.selectors {
                if let SelectorExpr::Filter(filter) = selector {
                    self.visit_filter(filter, FunctionUse::Logical, false)?;
                }
            }
        }
        Ok(())
    }

    fn visit_filter(
        &self,
        expr: &FilterExpr,
        usage: FunctionUse,
        in_comparison: bool,
    ) -> Result<(), ValidationError> {
        match expr {
            FilterExpr::Literal(_) => {
                if usage == FunctionUse::Logical {
                    return Err(ValidationError::LiteralMustBeCompared);
                }
                Ok(())
            }
            FilterExpr::Path { path, .. } => {
                if in_comparison && !path.is_singular() {
                    return Err(ValidationError::ComparisonRequiresSingularQuery);
                }
                self.visit_path(path)
            }
            FilterExpr::Unary { operand, .. } => {
                self.visit_filter(operand, FunctionUse::Logical, false)
            }
            FilterExpr::Binary(data) => {
                let (usage, in_comparison) = if data.op.is_logical() {
                    (FunctionUse::Logical, false)
                } else {
                    (FunctionUse::ComparisonOperand, true)
                };
                self.visit_filter(&data.left, usage, in_comparison)?;
                self.visit_filter(&data.right, usage, in_comparison)
            }
            FilterExpr::FunctionCall(call) => {
                let function = self.registry.get(&call.name).ok_or_else(|| {
                    ValidationError::UnknownFunction {
                        name: call.name.clone(),
                    }
                })?;
                function.validate(&call.args, usage, in_comparison)?;
                for arg in &call.args {
                    self.visit_filter(arg, FunctionUse::Argument, false)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use rstest::rstest;

    fn check(query: &str) -> Result<(), ValidationError> {
        validate(&parse(query).unwrap(), &FunctionRegistry::standard())
    }

    #[rstest]
    #[case("$[?@.a]")]
    #[case("$[?@.*]")]
    #[case("$[?!@..a]")]
    #[case("$[?@.a == 1]")]
    #[case("$[?$.x[0] != @['y']]")]
    #[case("$[?1 == 1]")]
    #[case("$[?length(@.a) > 1]")]
    #[case("$[?count(@.*) == 2]")]
    #[case("$[?value(@..x) == 'v']")]
    #[case("$[?match(@.a, 'x') && !search(@.b, 'y')]")]
    #[case("$[?length(value(@.*)) == 1]")]
    #[case("$[?@[?@.b == 1]]")]
    fn test_valid_filters(#[case] query: &str) {
        assert_eq!(check(query), Ok(()), "{query}");
    }

    #[rstest]
    #[case("$[?1]", ValidationError::LiteralMustBeCompared)]
    #[case("$[?@.a && 'x']", ValidationError::LiteralMustBeCompared)]
    #[case("$[?!null]", ValidationError::LiteralMustBeCompared)]
    #[case("$[?@.* == 1]", ValidationError::ComparisonRequiresSingularQuery)]
    #[case("$[?1 < @..a]", ValidationError::ComparisonRequiresSingularQuery)]
    #[case("$[?@['a','b'] == 1]", ValidationError::ComparisonRequiresSingularQuery)]
    #[case("$[?nope(@)]", ValidationError::UnknownFunction { name: "nope".into() })]
    #[case("$[?length(@.a)]", ValidationError::FunctionResultMustBeCompared { name: "length".into() })]
    #[case("$[?count(1) == 1]", ValidationError::FunctionRequiresQueryArgument { name: "count".into() })]
    #[case("$[?length(@.*) == 1]", ValidationError::FunctionRequiresSingularQuery { name: "length".into() })]
    #[case("$[?match(@.a, 'x') == true]", ValidationError::FunctionResultMustNotBeCompared { name: "match".into() })]
    #[case("$[?@[?@.b.* == 1]]", ValidationError::ComparisonRequiresSingularQuery)]
    fn test_invalid_filters(#[case] query: &str, #[case] expected: ValidationError) {
        assert_eq!(check(query), Err(expected), "{query}");
    }

    #[test]
    fn test_arity_error() {
        assert_eq!(
            check("$[?value(@.a, @.b) == 1]"),
            Err(ValidationError::FunctionArityInvalid {
                name: "value".into(),
                expected: 1,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_unknown_function_in_empty_registry() {
        let path = parse("$[?length(@) == 1]").unwrap();
        assert!(matches!(
            validate(&path, &FunctionRegistry::new()),
            Err(ValidationError::UnknownFunction { .. })
        ));
    }
}
