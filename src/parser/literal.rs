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

//! String, integer and number literals

use super::error::{ParseErrorKind, ParseResult};
use super::lexer::{MAX_SAFE_INTEGER, is_digit, is_name_char, is_name_first};
use super::Parser;

impl<'a> Parser<'a> {
    /// Parse a single- or double-quoted string literal at the cursor
    pub(super) fn parse_string(&mut self) -> ParseResult<String> {
        let quote = match self.cursor.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error(ParseErrorKind::UnterminatedString)),
        };
        self.cursor.bump();

        let mut out = String::new();
        loop {
            let char_pos = self.cursor.position();
            let Some(ch) = self.cursor.bump() else {
                return Err(self.error(ParseErrorKind::UnterminatedString));
            };
            if ch == quote {
                return Ok(out);
            }
            if (ch as u32) < 0x20 {
                return Err(self.error_at(ParseErrorKind::BadEscape, char_pos));
            }
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            let Some(escaped) = self.cursor.bump() else {
                return Err(self.error_at(ParseErrorKind::BadEscape, char_pos));
            };
            match escaped {
                '\\' | '/' => out.push(escaped),
                '\'' | '"' if escaped == quote => out.push(escaped),
                'b' => out.push('\u{08}'),
                'f' => out.push('\u{0C}'),
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                'u' => out.push(self.parse_unicode_escape(char_pos)?),
                _ => return Err(self.error_at(ParseErrorKind::BadEscape, char_pos)),
            }
        }
    }

    /// Parse the hex digits of a `\uXXXX` escape, combining surrogate pairs
    fn parse_unicode_escape(&mut self, escape_pos: usize) -> ParseResult<char> {
        let high = self
            .hex_word()
            .ok_or_else(|| self.error_at(ParseErrorKind::BadEscape, escape_pos))?;
        let code = match high {
            0xD800..=0xDBFF => {
                let low_pos = self.cursor.position();
                if !self.cursor.eat_str("\\u") {
                    return Err(self.error_at(ParseErrorKind::BadEscape, low_pos));
                }
                match self.hex_word() {
                    Some(low @ 0xDC00..=0xDFFF) => {
                        0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                    }
                    _ => return Err(self.error_at(ParseErrorKind::BadEscape, low_pos)),
                }
            }
            0xDC00..=0xDFFF => return Err(self.error_at(ParseErrorKind::BadEscape, escape_pos)),
            code => code,
        };
        char::from_u32(code).ok_or_else(|| self.error_at(ParseErrorKind::BadEscape, escape_pos))
    }

    fn hex_word(&mut self) -> Option<u32> {
        let start = self.cursor.position();
        let digits = self.cursor.take(4)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            self.cursor.reset(start);
            return None;
        }
        u32::from_str_radix(digits, 16).ok()
    }

    /// Parse an index or slice integer.
    ///
    /// Leading zeros, `-0` and magnitudes beyond the exactly representable
    /// double range are rejected. The cursor is left untouched on failure.
    pub(super) fn parse_int(&mut self) -> Option<i64> {
        let start = self.cursor.position();
        let negative = self.cursor.eat('-');
        let value = self
            .integer_part()
            .then(|| self.cursor.since(start))
            .filter(|text| !(negative && *text == "-0"))
            .and_then(|text| text.parse::<i64>().ok())
            .filter(|n| n.unsigned_abs() <= MAX_SAFE_INTEGER.unsigned_abs());
        if value.is_none() {
            self.cursor.reset(start);
        }
        value
    }

    /// Parse a JSON number literal. The cursor is left untouched on failure.
    pub(super) fn parse_number(&mut self) -> Option<f64> {
        let start = self.cursor.position();
        let value = self.number_text(start).and_then(|text| {
            text.parse::<f64>().ok().filter(|n| n.is_finite())
        });
        if value.is_none() {
            self.cursor.reset(start);
        }
        value
    }

    fn number_text(&mut self, start: usize) -> Option<&'a str> {
        self.cursor.eat('-');
        if !self.integer_part() {
            return None;
        }
        if self.cursor.eat('.') && !self.cursor.eat_digits() {
            return None;
        }
        if self.cursor.eat('e') || self.cursor.eat('E') {
            let _ = self.cursor.eat('+') || self.cursor.eat('-');
            if !self.cursor.eat_digits() {
                return None;
            }
        }
        Some(self.cursor.since(start))
    }

    /// `0` or a non-zero digit followed by digits
    fn integer_part(&mut self) -> bool {
        if self.cursor.eat('0') {
            return !self.cursor.peek_is(is_digit);
        }
        self.cursor.eat_digits()
    }

    /// Parse a shorthand member name or function name
    pub(super) fn parse_name(&mut self) -> Option<&'a str> {
        let start = self.cursor.position();
        if !self.cursor.peek_is(is_name_first) {
            return None;
        }
        self.cursor.bump();
        while self.cursor.peek_is(is_name_char) {
            self.cursor.bump();
        }
        Some(self.cursor.since(start))
    }
}
