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

//! Shared fixtures for integration tests

#![allow(dead_code)]

use octofhir_jsonpath::{FunctionRegistry, query};
use serde_json::{Value, json};

/// The classic bookstore document
pub fn bookstore() -> Value {
    json!({
        "store": {
            "book": [
                {"category": "reference", "author": "Nigel Rees", "title": "Sayings of the Century", "price": 8.95},
                {"category": "fiction", "author": "Evelyn Waugh", "title": "Sword of Honour", "price": 12.99},
                {"category": "fiction", "author": "Herman Melville", "title": "Moby Dick", "isbn": "0-553-21311-3", "price": 8.99},
                {"category": "fiction", "author": "J. R. R. Tolkien", "title": "The Lord of the Rings", "isbn": "0-395-19395-8", "price": 22.99}
            ],
            "bicycle": {"color": "red", "price": 399}
        },
        "expensive": 10
    })
}

/// Run a query with the standard registry and return owned results
pub fn run(query_text: &str, document: &Value) -> Vec<Value> {
    query(query_text, document, &FunctionRegistry::standard())
        .unwrap_or_else(|err| panic!("{query_text}: {err}"))
        .into_iter()
        .cloned()
        .collect()
}

/// Run a query and wrap the results in a JSON array for comparison
pub fn run_array(query_text: &str, document: &Value) -> Value {
    Value::Array(run(query_text, document))
}

/// Initialise logging once for tests that want log output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
