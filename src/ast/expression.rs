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

//! Query AST node definitions

use super::operator::{BinaryOperator, UnaryOperator};
use crate::parser::lexer::MAX_SAFE_INTEGER;
use serde_json::Value as JsonValue;
use std::fmt;

/// A complete path: the root marker followed by zero or more segments.
///
/// The same node type is used for top-level queries and for the `$...` and
/// `@...` sub-paths inside filter expressions.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathExpr {
    /// Segments in application order
    pub segments: Vec<SegmentExpr>,
}

impl PathExpr {
    /// Create a path from its segments
    pub fn new(segments: Vec<SegmentExpr>) -> Self {
        Self { segments }
    }

    /// Whether the path can select at most one node.
    ///
    /// A singular path has no descendant segments and every segment holds
    /// exactly one Name or Index selector.
    pub fn is_singular(&self) -> bool {
        self.segments.iter().all(SegmentExpr::is_singular)
    }

    /// Whether the path has no segments (`$` or `@` on its own)
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Write the path segments without the leading root marker
    fn fmt_segments(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        self.fmt_segments(f)
    }
}

/// One step of a path (`.name`, `.*`, `..x`, or `[...]`)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentExpr {
    /// Whether the segment applies to every descendant (`..`)
    pub descendant: bool,
    /// Selectors applied in order, outputs concatenated
    pub selectors: Vec<SelectorExpr>,
}

impl SegmentExpr {
    /// Create a child segment
    pub fn child(selectors: Vec<SelectorExpr>) -> Self {
        Self {
            descendant: false,
            selectors,
        }
    }

    /// Create a descendant segment
    pub fn descendant(selectors: Vec<SelectorExpr>) -> Self {
        Self {
            descendant: true,
            selectors,
        }
    }

    fn is_singular(&self) -> bool {
        !self.descendant
            && self.selectors.len() == 1
            && matches!(
                self.selectors[0],
                SelectorExpr::Name(_) | SelectorExpr::Index(_)
            )
    }
}

impl fmt::Display for SegmentExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descendant {
            f.write_str("..")?;
        }
        f.write_str("[")?;
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{selector}")?;
        }
        f.write_str("]")
    }
}

/// A single selector within a segment
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectorExpr {
    /// Object member by name
    Name(String),
    /// Array element by index, negative counts from the end
    Index(i64),
    /// All array elements or object member values
    Wildcard,
    /// Array slice
    Slice(SliceExpr),
    /// Elements or member values for which the filter holds
    Filter(FilterExpr),
}

impl fmt::Display for SelectorExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorExpr::Name(name) => write_quoted(f, name),
            SelectorExpr::Index(index) => write!(f, "{index}"),
            SelectorExpr::Wildcard => f.write_str("*"),
            SelectorExpr::Slice(slice) => write!(f, "{slice}"),
            SelectorExpr::Filter(filter) => write!(f, "?{filter}"),
        }
    }
}

/// Slice bounds as written in the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SliceExpr {
    /// Start bound, if written
    pub start: Option<i64>,
    /// End bound, if written
    pub end: Option<i64>,
    /// Step, 1 when omitted
    pub step: i64,
}

impl SliceExpr {
    /// Create a slice
    pub fn new(start: Option<i64>, end: Option<i64>, step: i64) -> Self {
        Self { start, end, step }
    }
}

impl Default for SliceExpr {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            step: 1,
        }
    }
}

impl fmt::Display for SliceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        f.write_str(":")?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        if self.step != 1 {
            write!(f, ":{}", self.step)?;
        }
        Ok(())
    }
}

/// Filter expression tree
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterExpr {
    /// Literal scalar
    Literal(LiteralValue),

    /// Query evaluated from the root (`$`) or the current candidate (`@`)
    Path {
        /// `true` for `$`, `false` for `@`
        absolute: bool,
        /// Segments following the marker
        path: PathExpr,
    },

    /// Unary operation
    Unary {
        /// The operator
        op: UnaryOperator,
        /// The operand
        operand: Box<FilterExpr>,
    },

    /// Binary operation (boxed for size optimization)
    Binary(Box<BinaryOpData>),

    /// Function call with name and arguments
    FunctionCall(FunctionCallData),
}

/// Binary operation data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinaryOpData {
    /// The operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: FilterExpr,
    /// Right operand
    pub right: FilterExpr,
}

/// Function call data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionCallData {
    /// Function name
    pub name: String,
    /// Arguments in call order
    pub args: Vec<FilterExpr>,
}

impl FilterExpr {
    /// Create a literal node
    pub fn literal(value: LiteralValue) -> Self {
        FilterExpr::Literal(value)
    }

    /// Create a `$...` path node
    pub fn root_path(path: PathExpr) -> Self {
        FilterExpr::Path {
            absolute: true,
            path,
        }
    }

    /// Create an `@...` path node
    pub fn current_path(path: PathExpr) -> Self {
        FilterExpr::Path {
            absolute: false,
            path,
        }
    }

    /// Create a negation node
    pub fn not(operand: FilterExpr) -> Self {
        FilterExpr::Unary {
            op: UnaryOperator::Not,
            operand: Box::new(operand),
        }
    }

    /// Create a binary node
    pub fn binary(op: BinaryOperator, left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Binary(Box::new(BinaryOpData { op, left, right }))
    }

    /// Create a function call node
    pub fn function_call(name: impl Into<String>, args: Vec<FilterExpr>) -> Self {
        FilterExpr::FunctionCall(FunctionCallData {
            name: name.into(),
            args,
        })
    }

    /// The sub-path if this node is a `$`/`@` query
    pub fn as_path(&self) -> Option<&PathExpr> {
        match self {
            FilterExpr::Path { path, .. } => Some(path),
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            FilterExpr::Binary(data) => data.op.precedence(),
            _ => u8::MAX,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        // Comparisons never chain, so an equal-precedence operand is wrapped too
        if self.precedence() < parent || (parent == 3 && self.precedence() == 3) {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Literal(value) => write!(f, "{value}"),
            FilterExpr::Path { absolute, path } => {
                f.write_str(if *absolute { "$" } else { "@" })?;
                path.fmt_segments(f)
            }
            FilterExpr::Unary { op, operand } => {
                write!(f, "{op}")?;
                operand.fmt_operand(f, u8::MAX)
            }
            FilterExpr::Binary(data) => {
                let precedence = data.op.precedence();
                data.left.fmt_operand(f, precedence)?;
                write!(f, " {} ", data.op)?;
                // Left-associative: a right operand of equal precedence needs parentheses
                if data.right.precedence() == precedence {
                    write!(f, "({})", data.right)
                } else {
                    data.right.fmt_operand(f, precedence)
                }
            }
            FilterExpr::FunctionCall(call) => {
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

/// Literal scalar values
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LiteralValue {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
}

impl LiteralValue {
    /// Convert to the document value model
    pub fn to_json(&self) -> JsonValue {
        match self {
            LiteralValue::Null => JsonValue::Null,
            LiteralValue::Boolean(b) => JsonValue::Bool(*b),
            // Integral literals keep an integer representation
            LiteralValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER as f64 => {
                JsonValue::from(*n as i64)
            }
            LiteralValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            LiteralValue::String(s) => JsonValue::String(s.clone()),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => f.write_str("null"),
            LiteralValue::Boolean(b) => write!(f, "{b}"),
            LiteralValue::Number(n) => write!(f, "{n}"),
            LiteralValue::String(s) => write_quoted(f, s),
        }
    }
}

/// Write a single-quoted string literal, escaping as needed
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for ch in s.chars() {
        match ch {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\u{08}' => f.write_str("\\b")?,
            '\u{0C}' => f.write_str("\\f")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}
