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

//! Segments and selectors

use super::error::{ParseErrorKind, ParseResult};
use super::Parser;
use crate::ast::{PathExpr, SegmentExpr, SelectorExpr, SliceExpr};

impl<'a> Parser<'a> {
    /// `$` followed by segments, up to the end of input
    pub(super) fn parse_query(&mut self) -> ParseResult<PathExpr> {
        if !self.cursor.eat('$') {
            return Err(self.error(ParseErrorKind::ExpectedRoot));
        }
        let mut segments = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.is_eof() {
                break;
            }
            match self.parse_segment()? {
                Some(segment) => segments.push(segment),
                None => return Err(self.error(ParseErrorKind::UnexpectedToken)),
            }
        }
        Ok(PathExpr::new(segments))
    }

    /// Segments following a `$` or `@` inside a filter
    pub(super) fn parse_relative_path(&mut self) -> ParseResult<PathExpr> {
        let mut segments = Vec::new();
        loop {
            let before = self.cursor.position();
            self.cursor.skip_whitespace();
            match self.parse_segment()? {
                Some(segment) => segments.push(segment),
                None => {
                    self.cursor.reset(before);
                    break;
                }
            }
        }
        Ok(PathExpr::new(segments))
    }

    fn parse_segment(&mut self) -> ParseResult<Option<SegmentExpr>> {
        match self.cursor.peek() {
            Some('.') => {
                self.cursor.bump();
                if self.cursor.eat('.') {
                    let selectors = self.parse_descendant_selectors()?;
                    return Ok(Some(SegmentExpr::descendant(selectors)));
                }
                let selector = self.parse_shorthand_selector()?;
                Ok(Some(SegmentExpr::child(vec![selector])))
            }
            Some('[') => {
                let selectors = self.parse_bracketed_selectors()?;
                Ok(Some(SegmentExpr::child(selectors)))
            }
            _ => Ok(None),
        }
    }

    fn parse_descendant_selectors(&mut self) -> ParseResult<Vec<SelectorExpr>> {
        if self.cursor.peek() == Some('[') {
            return self.parse_bracketed_selectors();
        }
        Ok(vec![self.parse_shorthand_selector()?])
    }

    /// `*` or a member name after `.` or `..`
    fn parse_shorthand_selector(&mut self) -> ParseResult<SelectorExpr> {
        if self.cursor.eat('*') {
            return Ok(SelectorExpr::Wildcard);
        }
        match self.parse_name() {
            Some(name) => Ok(SelectorExpr::Name(name.to_string())),
            None => Err(self.error(ParseErrorKind::UnexpectedToken)),
        }
    }

    fn parse_bracketed_selectors(&mut self) -> ParseResult<Vec<SelectorExpr>> {
        if !self.cursor.eat('[') {
            return Err(self.error(ParseErrorKind::UnexpectedToken));
        }
        self.cursor.skip_whitespace();
        let mut selectors = Vec::new();
        loop {
            selectors.push(self.parse_bracketed_selector()?);
            self.cursor.skip_whitespace();
            if self.cursor.eat(']') {
                return Ok(selectors);
            }
            if !self.cursor.eat(',') {
                return Err(self.error(ParseErrorKind::UnexpectedToken));
            }
            self.cursor.skip_whitespace();
        }
    }

    fn parse_bracketed_selector(&mut self) -> ParseResult<SelectorExpr> {
        match self.cursor.peek() {
            None => Err(self.error(ParseErrorKind::UnexpectedToken)),
            Some('*') => {
                self.cursor.bump();
                Ok(SelectorExpr::Wildcard)
            }
            Some('?') => {
                self.cursor.bump();
                self.cursor.skip_whitespace();
                Ok(SelectorExpr::Filter(self.parse_filter()?))
            }
            Some('\'' | '"') => Ok(SelectorExpr::Name(self.parse_string()?)),
            Some(_) => self.parse_index_or_slice(),
        }
    }

    fn parse_index_or_slice(&mut self) -> ParseResult<SelectorExpr> {
        let start = if self.cursor.peek() == Some(':') {
            None
        } else {
            match self.parse_int() {
                Some(n) => Some(n),
                None => return Err(self.error(ParseErrorKind::UnexpectedToken)),
            }
        };
        self.cursor.skip_whitespace();
        if !self.cursor.eat(':') {
            return match start {
                Some(index) => Ok(SelectorExpr::Index(index)),
                None => Err(self.error(ParseErrorKind::BadSlice)),
            };
        }

        self.cursor.skip_whitespace();
        let end = if self.at_slice_terminator(true) {
            None
        } else {
            Some(self.parse_slice_int()?)
        };

        self.cursor.skip_whitespace();
        let mut step = 1;
        if self.cursor.eat(':') {
            self.cursor.skip_whitespace();
            if !self.at_slice_terminator(false) {
                step = self.parse_slice_int()?;
            }
        }
        Ok(SelectorExpr::Slice(SliceExpr::new(start, end, step)))
    }

    /// Whether the cursor sits on something that ends a slice part
    fn at_slice_terminator(&self, colon_terminates: bool) -> bool {
        match self.cursor.peek() {
            None | Some(',' | ']') => true,
            Some(':') => colon_terminates,
            Some(_) => false,
        }
    }

    fn parse_slice_int(&mut self) -> ParseResult<i64> {
        self.parse_int()
            .ok_or_else(|| self.error(ParseErrorKind::BadSlice))
    }
}
