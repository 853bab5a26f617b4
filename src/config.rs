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

//! Engine configuration options

use crate::registry::DEFAULT_REGEX_CACHE_CAPACITY;

/// Default capacity of the engine's compiled program cache
pub const DEFAULT_PROGRAM_CACHE_CAPACITY: usize = 256;

/// Configuration for [`JsonPathEngine`](crate::engine::JsonPathEngine)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of compiled programs kept, keyed by query text.
    /// Zero disables the cache.
    pub program_cache_capacity: usize,

    /// Maximum number of compiled regular expressions kept for `match` and
    /// `search` in registries built by the engine
    pub regex_cache_capacity: usize,
}

impl EngineConfig {
    /// Create a configuration with explicit capacities
    pub fn new(program_cache_capacity: usize, regex_cache_capacity: usize) -> Self {
        Self {
            program_cache_capacity,
            regex_cache_capacity,
        }
    }

    /// Configuration that compiles every query afresh
    pub fn uncached() -> Self {
        Self {
            program_cache_capacity: 0,
            ..Self::default()
        }
    }

    /// Set the program cache capacity
    pub fn with_program_cache_capacity(mut self, capacity: usize) -> Self {
        self.program_cache_capacity = capacity;
        self
    }

    /// Set the regex cache capacity
    pub fn with_regex_cache_capacity(mut self, capacity: usize) -> Self {
        self.regex_cache_capacity = capacity;
        self
    }

    /// Whether compiled programs are cached
    pub fn caches_programs(&self) -> bool {
        self.program_cache_capacity > 0
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program_cache_capacity: DEFAULT_PROGRAM_CACHE_CAPACITY,
            regex_cache_capacity: DEFAULT_REGEX_CACHE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.program_cache_capacity, 256);
        assert_eq!(config.regex_cache_capacity, 128);
        assert!(config.caches_programs());
    }

    #[test]
    fn test_engine_config_builders() {
        let config = EngineConfig::default()
            .with_program_cache_capacity(8)
            .with_regex_cache_capacity(4);
        assert_eq!(config, EngineConfig::new(8, 4));
        assert!(!EngineConfig::uncached().caches_programs());
    }
}
