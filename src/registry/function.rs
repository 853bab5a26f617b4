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

//! Function contract used by the validator, compiler and evaluator

use crate::ast::FilterExpr;
use crate::error::ValidationError;
use crate::model::JsonPathValue;
use std::fmt;
use std::sync::Arc;

/// Where a function call appears in a filter expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionUse {
    /// As a predicate on its own, or as an operand of `!`, `&&` or `||`
    Logical,
    /// As an operand of a comparison
    ComparisonOperand,
    /// As an argument of another function
    Argument,
}

/// A function callable from filter expressions.
///
/// Implementations must be stateless with respect to evaluation: the same
/// function object is shared by every program compiled against a registry
/// and may be called from many threads at once.
pub trait JsonPathFunction: Send + Sync {
    /// Check a call site before compilation.
    ///
    /// `usage` tells where the call appears and `in_comparison` whether the
    /// call itself is a comparison operand. The default accepts every call.
    fn validate(
        &self,
        args: &[FilterExpr],
        usage: FunctionUse,
        in_comparison: bool,
    ) -> Result<(), ValidationError> {
        let _ = (args, usage, in_comparison);
        Ok(())
    }

    /// Compute the result from evaluated arguments
    fn evaluate<'a>(&self, args: Vec<JsonPathValue<'a>>) -> JsonPathValue<'a>;
}

type ValidateFn =
    dyn Fn(&[FilterExpr], FunctionUse, bool) -> Result<(), ValidationError> + Send + Sync;
type EvaluateFn = dyn for<'a> Fn(Vec<JsonPathValue<'a>>) -> JsonPathValue<'a> + Send + Sync;

/// Closure-backed function definition.
///
/// ```rust
/// use octofhir_jsonpath::{FunctionDefinition, FunctionRegistry, JsonPathValue};
///
/// let mut registry = FunctionRegistry::standard();
/// registry
///     .register_definition(
///         "first",
///         FunctionDefinition::new().with_evaluator(|args| match args.into_iter().next() {
///             Some(JsonPathValue::Nodes(nodes)) => nodes
///                 .into_iter()
///                 .next()
///                 .map(JsonPathValue::borrowed)
///                 .unwrap_or_default(),
///             _ => JsonPathValue::Nothing,
///         }),
///     )
///     .unwrap();
/// assert!(registry.contains("first"));
/// ```
#[derive(Clone, Default)]
pub struct FunctionDefinition {
    validator: Option<Arc<ValidateFn>>,
    evaluator: Option<Arc<EvaluateFn>>,
}

impl FunctionDefinition {
    /// Create an empty definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the call-site validator
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&[FilterExpr], FunctionUse, bool) -> Result<(), ValidationError>
            + Send
            + Sync
            + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Set the evaluator
    pub fn with_evaluator<F>(mut self, evaluator: F) -> Self
    where
        F: for<'a> Fn(Vec<JsonPathValue<'a>>) -> JsonPathValue<'a> + Send + Sync + 'static,
    {
        self.evaluator = Some(Arc::new(evaluator));
        self
    }

    /// Whether an evaluator has been set
    pub fn has_evaluator(&self) -> bool {
        self.evaluator.is_some()
    }

    /// Turn into a registrable function, or `None` without an evaluator
    pub(crate) fn into_function(self) -> Option<DefinedFunction> {
        Some(DefinedFunction {
            validator: self.validator,
            evaluator: self.evaluator?,
        })
    }
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("has_validator", &self.validator.is_some())
            .field("has_evaluator", &self.evaluator.is_some())
            .finish()
    }
}

/// A [`FunctionDefinition`] that is known to have an evaluator
pub(crate) struct DefinedFunction {
    validator: Option<Arc<ValidateFn>>,
    evaluator: Arc<EvaluateFn>,
}

impl JsonPathFunction for DefinedFunction {
    fn validate(
        &self,
        args: &[FilterExpr],
        usage: FunctionUse,
        in_comparison: bool,
    ) -> Result<(), ValidationError> {
        match &self.validator {
            Some(validator) => validator(args, usage, in_comparison),
            None => Ok(()),
        }
    }

    fn evaluate<'a>(&self, args: Vec<JsonPathValue<'a>>) -> JsonPathValue<'a> {
        (self.evaluator)(args)
    }
}
