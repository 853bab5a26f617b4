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

//! Character cursor and character classes used by the parser

/// Largest integer magnitude exactly representable as an IEEE-754 double
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Byte-offset cursor over the query text
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn reset(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Text consumed since `start`
    pub fn since(&self, start: usize) -> &'a str {
        &self.input[start..self.pos]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_is(&self, pred: impl FnOnce(char) -> bool) -> bool {
        self.peek().is_some_and(pred)
    }

    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn eat_str(&mut self, expected: &str) -> bool {
        if self.rest().starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    /// Consume a run of ASCII digits, returning whether any were consumed
    pub fn eat_digits(&mut self) -> bool {
        let start = self.pos;
        while self.peek_is(is_digit) {
            self.pos += 1;
        }
        self.pos > start
    }

    /// Consume exactly `n` bytes if they are all available
    pub fn take(&mut self, n: usize) -> Option<&'a str> {
        let taken = self.rest().get(..n)?;
        self.pos += n;
        Some(taken)
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek_is(is_whitespace) {
            self.pos += 1;
        }
    }
}

/// Blank characters allowed between tokens
pub fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

pub fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

/// First character of a shorthand member name or function name
pub fn is_name_first(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic() || ch as u32 >= 0x80
}

/// Subsequent characters of a shorthand member name
pub fn is_name_char(ch: char) -> bool {
    is_name_first(ch) || is_digit(ch)
}
