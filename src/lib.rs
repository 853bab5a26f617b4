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

//! JSONPath query engine for `serde_json` documents
//!
//! Queries are parsed into a syntax tree, checked against the filter usage
//! rules, compiled to a flat bytecode program and executed by a small
//! frame-stack virtual machine. Compiled programs are immutable and can be
//! shared between threads.
//!
//! ```
//! use octofhir_jsonpath::{FunctionRegistry, query};
//! use serde_json::json;
//!
//! let doc = json!({"store": {"book": [{"title": "A", "price": 8}, {"title": "B", "price": 22}]}});
//! let titles = query("$.store.book[?@.price < 10].title", &doc, &FunctionRegistry::standard()).unwrap();
//! assert_eq!(titles, vec![&json!("A")]);
//! ```

pub mod analyzer;
pub mod ast;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod registry;
pub mod vm;

// Re-export main types
pub use analyzer::validate;
pub use ast::{FilterExpr, PathExpr, SegmentExpr, SelectorExpr, SliceExpr};
pub use compiler::{Instruction, PathCompiler, Program, compile};
pub use config::EngineConfig;
pub use engine::{CacheStats, JsonPathEngine};
pub use error::{
    CompileError, JsonPathError, ProgramError, RegistrationError, Result, ValidationError,
};
pub use model::{JsonPathValue, NodeList};
pub use parser::{ParseError, ParseErrorKind, parse};
pub use registry::{FunctionDefinition, FunctionRegistry, FunctionUse, JsonPathFunction};
pub use vm::{Execution, execute};

use serde_json::Value as JsonValue;

/// Parse and compile query text, reporting failures against the text
pub fn compile_query(query: &str, registry: &FunctionRegistry) -> Result<Program> {
    let path = parse(query)?;
    let program = compile(&path, registry).map_err(|err| JsonPathError::compile(query, err))?;
    Ok(program.with_source(query))
}

/// Parse, compile and run a query against a document
pub fn query<'a>(
    query: &str,
    document: &'a JsonValue,
    registry: &FunctionRegistry,
) -> Result<NodeList<'a>> {
    Ok(compile_query(query, registry)?.query(document))
}

/// Like [`parse`], panicking on invalid input
///
/// # Panics
///
/// Panics with the parse error message if `query` is not valid syntax.
pub fn must_parse(query: &str) -> PathExpr {
    match parse(query) {
        Ok(path) => path,
        Err(err) => panic!("{err}"),
    }
}

/// Like [`compile_query`], panicking on failure
///
/// # Panics
///
/// Panics with the error message if `query` does not parse or compile.
pub fn must_compile(query: &str, registry: &FunctionRegistry) -> Program {
    match compile_query(query, registry) {
        Ok(program) => program,
        Err(err) => panic!("{err}"),
    }
}

/// Like [`query`](fn@query), panicking on failure
///
/// # Panics
///
/// Panics with the error message if `query` does not parse or compile.
pub fn must_query<'a>(
    query: &str,
    document: &'a JsonValue,
    registry: &FunctionRegistry,
) -> NodeList<'a> {
    must_compile(query, registry).query(document)
}
