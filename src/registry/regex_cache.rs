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

//! Bounded cache of compiled regular expressions for `match` and `search`

use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default number of patterns kept by a regex cache
pub const DEFAULT_REGEX_CACHE_CAPACITY: usize = 128;

/// Thread-safe LRU cache keyed by the final pattern text
#[derive(Debug)]
pub struct RegexCache {
    cache: Mutex<LruCache<String, Regex>>,
}

impl RegexCache {
    /// Create a cache holding up to `capacity` patterns (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get a compiled regex, compiling and caching it on a miss
    pub fn get_regex(&self, pattern: &str) -> Result<Regex, regex::Error> {
        if let Some(regex) = self.cache.lock().get(pattern) {
            log::trace!("regex cache hit for {pattern:?}");
            return Ok(regex.clone());
        }

        // Compiled without holding the lock
        let regex = Regex::new(pattern)?;
        self.cache.lock().put(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    /// Number of cached patterns
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached patterns
    pub fn capacity(&self) -> usize {
        self.cache.lock().cap().get()
    }

    /// Drop every cached pattern
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

impl Default for RegexCache {
    fn default() -> Self {
        Self::new(DEFAULT_REGEX_CACHE_CAPACITY)
    }
}

/// Process-wide cache used by [`FunctionRegistry::standard`](super::FunctionRegistry::standard)
pub(crate) static SHARED_REGEX_CACHE: Lazy<Arc<RegexCache>> =
    Lazy::new(|| Arc::new(RegexCache::default()));
