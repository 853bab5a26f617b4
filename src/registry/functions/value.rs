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

//! `value(query)`

use super::{check_arity, check_compared, check_query_argument};
use crate::ast::FilterExpr;
use crate::error::ValidationError;
use crate::model::JsonPathValue;
use crate::registry::function::{FunctionUse, JsonPathFunction};

/// The single node selected by a query, or Nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueFunction;

impl ValueFunction {
    pub const NAME: &'static str = "value";
}

impl JsonPathFunction for ValueFunction {
    fn validate(
        &self,
        args: &[FilterExpr],
        usage: FunctionUse,
        in_comparison: bool,
    ) -> Result<(), ValidationError> {
        check_arity(Self::NAME, args, 1)?;
        check_compared(Self::NAME, usage, in_comparison)?;
        check_query_argument(Self::NAME, &args[0])
    }

    fn evaluate<'a>(&self, args: Vec<JsonPathValue<'a>>) -> JsonPathValue<'a> {
        let Ok([arg]) = <[_; 1]>::try_from(args) else {
            return JsonPathValue::Nothing;
        };
        match arg {
            JsonPathValue::Nodes(nodes) if nodes.len() == 1 => JsonPathValue::borrowed(nodes[0]),
            JsonPathValue::Nodes(_) => JsonPathValue::Nothing,
            scalar => scalar,
        }
    }
}
