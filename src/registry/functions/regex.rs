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

//! `match(string, pattern)` and `search(string, pattern)`

use super::check_arity;
use crate::ast::FilterExpr;
use crate::error::ValidationError;
use crate::model::JsonPathValue;
use crate::registry::function::{FunctionUse, JsonPathFunction};
use crate::registry::regex_cache::RegexCache;
use std::sync::Arc;

/// How a pattern is applied to the input string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexMode {
    /// The whole string must match
    Match,
    /// Some substring must match
    Search,
}

impl RegexMode {
    /// Function name for this mode
    pub fn name(&self) -> &'static str {
        match self {
            RegexMode::Match => "match",
            RegexMode::Search => "search",
        }
    }
}

/// Regular-expression test over a string.
///
/// Both arguments must resolve to single strings, otherwise the result is
/// Nothing, as it is for patterns that fail to compile. An unescaped `.`
/// outside a character class never matches `\n` or `\r`.
#[derive(Debug, Clone)]
pub struct RegexFunction {
    mode: RegexMode,
    cache: Arc<RegexCache>,
}

impl RegexFunction {
    /// Create the function backed by a shared regex cache
    pub fn new(mode: RegexMode, cache: Arc<RegexCache>) -> Self {
        Self { mode, cache }
    }

    /// Final pattern text handed to the regex engine
    pub fn pattern_for(&self, pattern: &str) -> String {
        match self.mode {
            RegexMode::Match => normalize_dot_pattern(&format!("^(?:{pattern})$")),
            RegexMode::Search => normalize_dot_pattern(pattern),
        }
    }
}

impl JsonPathFunction for RegexFunction {
    fn validate(
        &self,
        args: &[FilterExpr],
        _usage: FunctionUse,
        in_comparison: bool,
    ) -> Result<(), ValidationError> {
        check_arity(self.mode.name(), args, 2)?;
        if in_comparison {
            return Err(ValidationError::FunctionResultMustNotBeCompared {
                name: self.mode.name().to_string(),
            });
        }
        Ok(())
    }

    fn evaluate<'a>(&self, args: Vec<JsonPathValue<'a>>) -> JsonPathValue<'a> {
        let [input, pattern] = args.as_slice() else {
            return JsonPathValue::Nothing;
        };
        let (Some(input), Some(pattern)) = (input.as_str(), pattern.as_str()) else {
            return JsonPathValue::Nothing;
        };
        match self.cache.get_regex(&self.pattern_for(pattern)) {
            Ok(regex) => JsonPathValue::boolean(regex.is_match(input)),
            Err(err) => {
                log::debug!("{}: invalid pattern {pattern:?}: {err}", self.mode.name());
                JsonPathValue::Nothing
            }
        }
    }
}

/// Rewrite every unescaped `.` outside a character class to `[^\r\n]`
pub fn normalize_dot_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut escaped = false;
    let mut in_class = false;
    for ch in pattern.chars() {
        match ch {
            _ if escaped => {
                out.push(ch);
                escaped = false;
            }
            '\\' => {
                out.push(ch);
                escaped = true;
            }
            '[' => {
                out.push(ch);
                in_class = true;
            }
            ']' => {
                out.push(ch);
                in_class = false;
            }
            '.' if !in_class => out.push_str(r"[^\r\n]"),
            _ => out.push(ch),
        }
    }
    out
}
