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

//! Filter expression grammar
//!
//! Precedence from loosest to tightest: `||`, `&&`, comparison, `!`,
//! primary. Comparisons do not chain.

use super::error::{ParseErrorKind, ParseResult};
use super::lexer::is_name_first;
use super::Parser;
use crate::ast::{BinaryOperator, FilterExpr, LiteralValue};

impl<'a> Parser<'a> {
    pub(super) fn parse_filter(&mut self) -> ParseResult<FilterExpr> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> ParseResult<FilterExpr> {
        let mut left = self.parse_logical_and()?;
        loop {
            self.cursor.skip_whitespace();
            if !self.cursor.eat_str("||") {
                return Ok(left);
            }
            let right = self.parse_logical_and()?;
            left = FilterExpr::binary(BinaryOperator::Or, left, right);
        }
    }

    fn parse_logical_and(&mut self) -> ParseResult<FilterExpr> {
        let mut left = self.parse_comparison()?;
        loop {
            self.cursor.skip_whitespace();
            if !self.cursor.eat_str("&&") {
                return Ok(left);
            }
            let right = self.parse_comparison()?;
            left = FilterExpr::binary(BinaryOperator::And, left, right);
        }
    }

    fn parse_comparison(&mut self) -> ParseResult<FilterExpr> {
        let left = self.parse_unary()?;
        self.cursor.skip_whitespace();
        let Some(op) = self.eat_comparison_operator() else {
            return Ok(left);
        };
        let right = self.parse_unary()?;
        self.cursor.skip_whitespace();
        let chained_at = self.cursor.position();
        if self.eat_comparison_operator().is_some() {
            return Err(self.error_at(ParseErrorKind::UnexpectedToken, chained_at));
        }
        Ok(FilterExpr::binary(op, left, right))
    }

    fn eat_comparison_operator(&mut self) -> Option<BinaryOperator> {
        const OPERATORS: [(&str, BinaryOperator); 6] = [
            ("==", BinaryOperator::Equal),
            ("!=", BinaryOperator::NotEqual),
            ("<=", BinaryOperator::LessThanOrEqual),
            (">=", BinaryOperator::GreaterThanOrEqual),
            ("<", BinaryOperator::LessThan),
            (">", BinaryOperator::GreaterThan),
        ];
        OPERATORS
            .iter()
            .find(|(text, _)| self.cursor.eat_str(text))
            .map(|(_, op)| *op)
    }

    fn parse_unary(&mut self) -> ParseResult<FilterExpr> {
        self.cursor.skip_whitespace();
        if self.cursor.eat('!') {
            return Ok(FilterExpr::not(self.parse_unary()?));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<FilterExpr> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            None => Err(self.error(ParseErrorKind::UnexpectedToken)),
            Some('(') => {
                self.cursor.bump();
                let inner = self.parse_logical_or()?;
                self.cursor.skip_whitespace();
                if !self.cursor.eat(')') {
                    return Err(self.error(ParseErrorKind::UnexpectedToken));
                }
                Ok(inner)
            }
            Some('\'' | '"') => Ok(FilterExpr::literal(LiteralValue::String(
                self.parse_string()?,
            ))),
            Some('$') => {
                self.cursor.bump();
                Ok(FilterExpr::root_path(self.parse_relative_path()?))
            }
            Some('@') => {
                self.cursor.bump();
                Ok(FilterExpr::current_path(self.parse_relative_path()?))
            }
            Some(c) if c == '-' || c.is_ascii_digit() => match self.parse_number() {
                Some(n) => Ok(FilterExpr::literal(LiteralValue::Number(n))),
                None => Err(self.error(ParseErrorKind::BadNumber)),
            },
            Some(c) if is_name_first(c) => self.parse_word(),
            Some(_) => Err(self.error(ParseErrorKind::UnexpectedToken)),
        }
    }

    /// Keyword literal or function call
    fn parse_word(&mut self) -> ParseResult<FilterExpr> {
        let start = self.cursor.position();
        let word = self
            .parse_name()
            .ok_or_else(|| self.error(ParseErrorKind::UnexpectedToken))?;
        if self.cursor.eat('(') {
            let args = self.parse_call_arguments()?;
            return Ok(FilterExpr::function_call(word, args));
        }
        let literal = match word {
            "true" => LiteralValue::Boolean(true),
            "false" => LiteralValue::Boolean(false),
            "null" => LiteralValue::Null,
            _ => return Err(self.error_at(ParseErrorKind::UnexpectedToken, start)),
        };
        Ok(FilterExpr::literal(literal))
    }

    fn parse_call_arguments(&mut self) -> ParseResult<Vec<FilterExpr>> {
        let mut args = Vec::new();
        self.cursor.skip_whitespace();
        if self.cursor.eat(')') {
            return Ok(args);
        }
        loop {
            args.push(self.parse_logical_or()?);
            self.cursor.skip_whitespace();
            if self.cursor.eat(')') {
                return Ok(args);
            }
            if !self.cursor.eat(',') {
                return Err(self.error(ParseErrorKind::BadFunctionCall));
            }
        }
    }
}
