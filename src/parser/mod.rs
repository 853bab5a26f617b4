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

//! Recursive-descent parser for JSONPath queries
//!
//! The parser is a pure function of the query text: it never consults a
//! document or the function registry. Every failure carries the byte offset
//! where it was detected.

pub mod error;
mod filter;
pub(crate) mod lexer;
mod literal;
mod path;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::MAX_SAFE_INTEGER;

use crate::ast::PathExpr;
use lexer::Cursor;

/// Parse a JSONPath query into a syntax tree
pub fn parse(query: &str) -> ParseResult<PathExpr> {
    Parser::new(query).parse()
}

/// Recursive-descent parser state
pub struct Parser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Parser<'a> {
    /// Create a parser over the query text
    pub fn new(query: &'a str) -> Self {
        Self {
            cursor: Cursor::new(query),
        }
    }

    /// Parse the whole input as a query
    pub fn parse(mut self) -> ParseResult<PathExpr> {
        let query = self.cursor.input();
        let padded = query.starts_with(char::is_whitespace) || query.ends_with(char::is_whitespace);
        if query.is_empty() || padded {
            return Err(self.error_at(ParseErrorKind::ExpectedRoot, 0));
        }
        let path = self.parse_query()?;
        if !self.cursor.is_eof() {
            return Err(self.error(ParseErrorKind::UnexpectedToken));
        }
        Ok(path)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(kind, self.cursor.position())
    }

    fn error_at(&self, kind: ParseErrorKind, position: usize) -> ParseError {
        ParseError::new(kind, position, self.cursor.input())
    }
}
