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

//! Built-in functions: `length`, `count`, `value`, `match` and `search`

pub mod count;
pub mod length;
pub mod regex;
pub mod value;

pub use count::CountFunction;
pub use length::LengthFunction;
pub use regex::{RegexFunction, RegexMode, normalize_dot_pattern};
pub use value::ValueFunction;

use super::function::FunctionUse;
use crate::ast::FilterExpr;
use crate::error::ValidationError;

fn check_arity(name: &str, args: &[FilterExpr], expected: usize) -> Result<(), ValidationError> {
    if args.len() != expected {
        return Err(ValidationError::FunctionArityInvalid {
            name: name.to_string(),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

/// Value-typed results cannot stand alone as a predicate
fn check_compared(name: &str, usage: FunctionUse, in_comparison: bool) -> Result<(), ValidationError> {
    if !in_comparison && usage == FunctionUse::Logical {
        return Err(ValidationError::FunctionResultMustBeCompared {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn check_query_argument(name: &str, arg: &FilterExpr) -> Result<(), ValidationError> {
    if arg.as_path().is_none() {
        return Err(ValidationError::FunctionRequiresQueryArgument {
            name: name.to_string(),
        });
    }
    Ok(())
}
