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

//! `length(value)`

use super::{check_arity, check_compared};
use crate::ast::FilterExpr;
use crate::error::ValidationError;
use crate::model::JsonPathValue;
use crate::registry::function::{FunctionUse, JsonPathFunction};
use serde_json::Value as JsonValue;

/// Length of a string (in characters), array or object
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthFunction;

impl LengthFunction {
    pub const NAME: &'static str = "length";
}

impl JsonPathFunction for LengthFunction {
    fn validate(
        &self,
        args: &[FilterExpr],
        usage: FunctionUse,
        in_comparison: bool,
    ) -> Result<(), ValidationError> {
        check_arity(Self::NAME, args, 1)?;
        check_compared(Self::NAME, usage, in_comparison)?;
        if let Some(path) = args[0].as_path() {
            if !path.is_singular() {
                return Err(ValidationError::FunctionRequiresSingularQuery {
                    name: Self::NAME.to_string(),
                });
            }
        }
        Ok(())
    }

    fn evaluate<'a>(&self, args: Vec<JsonPathValue<'a>>) -> JsonPathValue<'a> {
        let [arg] = args.as_slice() else {
            return JsonPathValue::Nothing;
        };
        match arg.as_single() {
            Some(JsonValue::String(s)) => JsonPathValue::number(s.chars().count()),
            Some(JsonValue::Array(items)) => JsonPathValue::number(items.len()),
            Some(JsonValue::Object(members)) => JsonPathValue::number(members.len()),
            _ => JsonPathValue::Nothing,
        }
    }
}
