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

//! Error types for validation, compilation, registration and the top-level API

use crate::parser::ParseError;
use thiserror::Error;

/// Result type for the top-level query API
pub type Result<T> = std::result::Result<T, JsonPathError>;

/// Filter usage rule violations found before compilation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A bare literal used as a whole predicate
    #[error("literal must be compared")]
    LiteralMustBeCompared,

    /// A non-singular query used as a comparison operand
    #[error("comparison requires a singular query")]
    ComparisonRequiresSingularQuery,

    /// Call to a function that is not registered
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// Function name
        name: String,
    },

    /// Wrong number of arguments
    #[error("function '{name}' expects {expected} argument(s), got {actual}")]
    FunctionArityInvalid {
        /// Function name
        name: String,
        /// Required argument count
        expected: usize,
        /// Argument count at the call site
        actual: usize,
    },

    /// A value-typed function result used as a predicate
    #[error("result of function '{name}' must be compared")]
    FunctionResultMustBeCompared {
        /// Function name
        name: String,
    },

    /// A logical function result used as a comparison operand
    #[error("result of function '{name}' must not be compared")]
    FunctionResultMustNotBeCompared {
        /// Function name
        name: String,
    },

    /// A non-singular query passed where a single value is needed
    #[error("function '{name}' requires a singular query argument")]
    FunctionRequiresSingularQuery {
        /// Function name
        name: String,
    },

    /// A non-query expression passed where a node list is needed
    #[error("function '{name}' requires a query argument")]
    FunctionRequiresQueryArgument {
        /// Function name
        name: String,
    },

    /// Rule violation reported by a user-registered validator
    #[error("function '{name}': {message}")]
    Custom {
        /// Function name
        name: String,
        /// Description of the violation
        message: String,
    },
}

/// Errors raised while lowering a syntax tree to bytecode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The tree failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A call site names a function the registry does not hold
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// Function name
        name: String,
    },

    /// An operand does not fit the instruction encoding
    #[error("program too large: more than {limit} {what}")]
    ProgramTooLarge {
        /// What overflowed
        what: &'static str,
        /// Largest supported count
        limit: usize,
    },

    /// The emitted instruction stream failed structural verification
    #[error("invalid program: {0}")]
    InvalidProgram(#[from] ProgramError),
}

/// Structural defects in an instruction stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// A segment begin whose target is not its matching segment end
    #[error("instruction {pc}: jump target {target} does not match its segment end")]
    BadJumpTarget {
        /// Offending instruction
        pc: usize,
        /// Encoded target
        target: usize,
    },

    /// A segment end or begin without a partner
    #[error("instruction {pc}: unbalanced segment")]
    UnbalancedSegment {
        /// Offending instruction
        pc: usize,
    },

    /// A selector or descend instruction in the wrong place
    #[error("instruction {pc}: {opcode} is not allowed here")]
    MisplacedInstruction {
        /// Offending instruction
        pc: usize,
        /// Instruction mnemonic
        opcode: &'static str,
    },

    /// A constant reference out of range or of the wrong kind
    #[error("instruction {pc}: constant {index} is not a valid {expected} operand")]
    BadConstant {
        /// Offending instruction
        pc: usize,
        /// Constant pool index
        index: usize,
        /// Expected constant kind
        expected: &'static str,
    },
}

/// Errors raised when adding a function to a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Name does not match `[A-Za-z_][A-Za-z0-9_]*`
    #[error("invalid function name '{name}'")]
    BadFunctionName {
        /// Rejected name
        name: String,
    },

    /// Definition without an evaluator
    #[error("function '{name}' has no evaluator")]
    BadFunctionDefinition {
        /// Function name
        name: String,
    },

    /// Name already taken in this registry
    #[error("function '{name}' is already registered")]
    FunctionAlreadyExists {
        /// Function name
        name: String,
    },
}

/// Single error type surfaced by the top-level entry points
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsonPathError {
    /// Syntax error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Validation or compilation failure
    #[error("invalid JSONPath query {query:?}: {source}")]
    Compile {
        /// Query text
        query: String,
        /// Underlying failure
        #[source]
        source: CompileError,
    },

    /// Function registration failure
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl JsonPathError {
    /// Wrap a compile failure together with the query text it came from
    pub fn compile(query: impl Into<String>, source: CompileError) -> Self {
        JsonPathError::Compile {
            query: query.into(),
            source,
        }
    }

    /// The query text, when the error relates to one
    pub fn query(&self) -> Option<&str> {
        match self {
            JsonPathError::Parse(err) => Some(&err.query),
            JsonPathError::Compile { query, .. } => Some(query),
            JsonPathError::Registration(_) => None,
        }
    }
}
