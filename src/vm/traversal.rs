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

//! Deterministic document traversal

use crate::model::NodeList;
use serde_json::{Map, Value as JsonValue};

/// Object member values in ascending byte-wise key order
pub fn sorted_members(object: &Map<String, JsonValue>) -> NodeList<'_> {
    let mut entries: Vec<(&String, &JsonValue)> = object.iter().collect();
    entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
    entries.into_iter().map(|(_, value)| value).collect()
}

/// Direct children of a node: array elements in order, object values by key.
/// Scalars have none.
pub fn children(node: &JsonValue) -> NodeList<'_> {
    match node {
        JsonValue::Array(items) => items.iter().collect(),
        JsonValue::Object(object) => sorted_members(object),
        _ => Vec::new(),
    }
}

/// Append the children of `node` to `out`
pub fn append_children<'a>(out: &mut NodeList<'a>, node: &'a JsonValue) {
    match node {
        JsonValue::Array(items) => out.extend(items.iter()),
        JsonValue::Object(object) => out.extend(sorted_members(object)),
        _ => {}
    }
}

/// Pre-order expansion of every node in `nodes`: each node, then its
/// descendants, before moving on to the next sibling.
///
/// Uses an explicit stack, so nesting depth is bounded by memory rather
/// than the call stack.
pub fn descendants<'a>(nodes: &[&'a JsonValue]) -> NodeList<'a> {
    let mut result = Vec::with_capacity(nodes.len());
    let mut stack: Vec<&'a JsonValue> = Vec::new();
    for &node in nodes {
        stack.push(node);
        while let Some(current) = stack.pop() {
            result.push(current);
            let start = stack.len();
            append_children(&mut stack, current);
            stack[start..].reverse();
        }
    }
    result
}
