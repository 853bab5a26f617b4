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

//! Filter expressions lowered for evaluation

use super::bytecode::Program;
use crate::ast::BinaryOperator;
use crate::registry::JsonPathFunction;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Filter expression with sub-paths compiled to programs and function
/// calls bound to their implementations
#[derive(Debug, Clone)]
pub enum CompiledFilter {
    /// Literal scalar
    Literal(JsonValue),

    /// Query run from the root (`absolute`) or from the current candidate
    Query {
        /// `true` for `$`, `false` for `@`
        absolute: bool,
        /// Compiled sub-path
        program: Program,
    },

    /// Logical negation
    Not(Box<CompiledFilter>),

    /// Short-circuit `&&`
    And(Box<CompiledFilter>, Box<CompiledFilter>),

    /// Short-circuit `||`
    Or(Box<CompiledFilter>, Box<CompiledFilter>),

    /// Comparison; `op` is never `&&` or `||`
    Compare {
        /// Comparison operator
        op: BinaryOperator,
        /// Left operand
        left: Box<CompiledFilter>,
        /// Right operand
        right: Box<CompiledFilter>,
    },

    /// Bound function call
    Call(BoundCall),
}

/// Function call site resolved against a registry
#[derive(Clone)]
pub struct BoundCall {
    /// Name the function was called by
    pub name: String,
    /// Implementation captured at compile time
    pub function: Arc<dyn JsonPathFunction>,
    /// Compiled arguments
    pub args: Vec<CompiledFilter>,
}

impl fmt::Debug for BoundCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundCall")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CompiledFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledFilter::Literal(value) => write!(f, "{value}"),
            CompiledFilter::Query { absolute, program } => {
                let marker = if *absolute { "$" } else { "@" };
                match program.source() {
                    Some(source) => write!(f, "{marker}{source}"),
                    None => write!(f, "{marker}<{} instructions>", program.instructions().len()),
                }
            }
            CompiledFilter::Not(operand) => write!(f, "!({operand})"),
            CompiledFilter::And(left, right) => write!(f, "({left} && {right})"),
            CompiledFilter::Or(left, right) => write!(f, "({left} || {right})"),
            CompiledFilter::Compare { op, left, right } => write!(f, "({left} {op} {right})"),
            CompiledFilter::Call(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
