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

//! Values exchanged between the filter evaluator and functions

use serde_json::Value as JsonValue;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;

/// Nodes selected from a document, in selection order
pub type NodeList<'a> = Vec<&'a JsonValue>;

/// Candidates a value contributes to a comparison. `None` stands for Nothing.
pub type Candidates<'v> = SmallVec<[Option<&'v JsonValue>; 4]>;

/// Result of evaluating a filter sub-expression or a function.
///
/// A node list is always distinct from a scalar, even when it holds exactly
/// one node. `Nothing` means "no value produced" and is distinct from JSON
/// `null`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JsonPathValue<'a> {
    /// No value
    #[default]
    Nothing,

    /// A single scalar, either borrowed from a document or a literal, or
    /// produced by a function
    Scalar(Cow<'a, JsonValue>),

    /// Nodes selected by a query
    Nodes(NodeList<'a>),
}

impl<'a> JsonPathValue<'a> {
    /// Scalar owned by the value
    pub fn scalar(value: JsonValue) -> Self {
        JsonPathValue::Scalar(Cow::Owned(value))
    }

    /// Scalar borrowed from a document or literal
    pub fn borrowed(value: &'a JsonValue) -> Self {
        JsonPathValue::Scalar(Cow::Borrowed(value))
    }

    /// Boolean scalar
    pub fn boolean(value: bool) -> Self {
        JsonPathValue::scalar(JsonValue::Bool(value))
    }

    /// Number scalar
    pub fn number(value: usize) -> Self {
        JsonPathValue::scalar(JsonValue::from(value))
    }

    /// Node list
    pub fn nodes(nodes: NodeList<'a>) -> Self {
        JsonPathValue::Nodes(nodes)
    }

    /// Whether this is the Nothing sentinel
    pub fn is_nothing(&self) -> bool {
        matches!(self, JsonPathValue::Nothing)
    }

    /// Whether this is a node list
    pub fn is_nodes(&self) -> bool {
        matches!(self, JsonPathValue::Nodes(_))
    }

    /// Number of comparison candidates: the node count for node lists, 1 otherwise
    pub fn count(&self) -> usize {
        match self {
            JsonPathValue::Nodes(nodes) => nodes.len(),
            _ => 1,
        }
    }

    /// Truthiness used by `!`, `&&`, `||` and filter selection.
    ///
    /// Node lists are truthy when non-empty. Scalars are truthy unless they
    /// are `null`, `false` or Nothing.
    pub fn is_truthy(&self) -> bool {
        match self {
            JsonPathValue::Nothing => false,
            JsonPathValue::Nodes(nodes) => !nodes.is_empty(),
            JsonPathValue::Scalar(value) => !matches!(
                value.as_ref(),
                JsonValue::Null | JsonValue::Bool(false)
            ),
        }
    }

    /// Values taking part in a comparison
    pub fn candidates(&self) -> Candidates<'_> {
        match self {
            JsonPathValue::Nothing => smallvec::smallvec![None],
            JsonPathValue::Scalar(value) => smallvec::smallvec![Some(value.as_ref())],
            JsonPathValue::Nodes(nodes) => nodes.iter().map(|node| Some(*node)).collect(),
        }
    }

    /// The single value this represents: a scalar, or a node list of exactly one
    pub fn as_single(&self) -> Option<&JsonValue> {
        match self {
            JsonPathValue::Scalar(value) => Some(value.as_ref()),
            JsonPathValue::Nodes(nodes) if nodes.len() == 1 => Some(nodes[0]),
            _ => None,
        }
    }

    /// The single value as a string slice
    pub fn as_str(&self) -> Option<&str> {
        self.as_single().and_then(JsonValue::as_str)
    }

    /// Convert to an owned JSON value. Nothing and node lists of other than
    /// one node have no JSON representation.
    pub fn to_json(&self) -> Option<JsonValue> {
        self.as_single().cloned()
    }
}

impl From<bool> for JsonPathValue<'_> {
    fn from(value: bool) -> Self {
        JsonPathValue::boolean(value)
    }
}

impl From<JsonValue> for JsonPathValue<'_> {
    fn from(value: JsonValue) -> Self {
        JsonPathValue::scalar(value)
    }
}

impl<'a> From<NodeList<'a>> for JsonPathValue<'a> {
    fn from(nodes: NodeList<'a>) -> Self {
        JsonPathValue::Nodes(nodes)
    }
}

impl fmt::Display for JsonPathValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonPathValue::Nothing => f.write_str("Nothing"),
            JsonPathValue::Scalar(value) => write!(f, "{value}"),
            JsonPathValue::Nodes(nodes) => {
                f.write_str("[")?;
                for (i, node) in nodes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{node}")?;
                }
                f.write_str("]")
            }
        }
    }
}
