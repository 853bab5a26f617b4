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

//! Parser error types

use std::fmt;
use thiserror::Error;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Kind of syntax error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Missing `$`, empty query, or whitespace around the query
    ExpectedRoot,
    /// Token that does not fit the grammar at this position
    UnexpectedToken,
    /// String literal without a closing quote
    UnterminatedString,
    /// Invalid escape sequence or raw control character in a string
    BadEscape,
    /// Malformed number literal in a filter
    BadNumber,
    /// Malformed slice bound or step
    BadSlice,
    /// Malformed function argument list
    BadFunctionCall,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ParseErrorKind::ExpectedRoot => "expected root",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnterminatedString => "unterminated string",
            ParseErrorKind::BadEscape => "invalid escape",
            ParseErrorKind::BadNumber => "invalid number",
            ParseErrorKind::BadSlice => "invalid slice",
            ParseErrorKind::BadFunctionCall => "invalid function call",
        };
        f.write_str(message)
    }
}

/// Parse error with location information
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid JSONPath query at offset {position} in {query:?}: {kind}")]
pub struct ParseError {
    /// What went wrong
    pub kind: ParseErrorKind,
    /// Byte offset into the query where the error was detected
    pub position: usize,
    /// The full query text
    pub query: String,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(kind: ParseErrorKind, position: usize, query: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            query: query.into(),
        }
    }

    /// The remaining query text starting at the error position
    pub fn remainder(&self) -> &str {
        self.query.get(self.position..).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParseError::new(ParseErrorKind::BadSlice, 3, "$[1:x]");
        assert_eq!(
            err.to_string(),
            "invalid JSONPath query at offset 3 in \"$[1:x]\": invalid slice"
        );
        assert_eq!(err.remainder(), ":x]");
    }
}
