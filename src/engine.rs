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

//! Query engine with a cache of compiled programs

use crate::compiler::Program;
use crate::config::EngineConfig;
use crate::error::{JsonPathError, Result};
use crate::model::NodeList;
use crate::registry::{FunctionRegistry, RegexCache};
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of program cache activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to compile
    pub misses: u64,
    /// Programs currently cached
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache, 0.0 when there were none
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Parses, compiles and runs queries against a fixed function registry.
///
/// Compiled programs are cached by query text. The engine is `Send + Sync`
/// and can be shared between threads behind an `Arc`.
///
/// # Examples
///
/// ```
/// use octofhir_jsonpath::JsonPathEngine;
/// use serde_json::json;
///
/// let engine = JsonPathEngine::new();
/// let doc = json!({"items": [{"price": 5}, {"price": 12}]});
/// let cheap = engine.query("$.items[?@.price < 10].price", &doc).unwrap();
/// assert_eq!(cheap, vec![&json!(5)]);
/// ```
pub struct JsonPathEngine {
    registry: Arc<FunctionRegistry>,
    config: EngineConfig,
    programs: Option<Mutex<LruCache<String, Arc<Program>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for JsonPathEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonPathEngine {
    /// Create an engine with the built-in functions and default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the built-in functions, using its own regex
    /// cache sized by `config`
    pub fn with_config(config: EngineConfig) -> Self {
        let regex_cache = Arc::new(RegexCache::new(config.regex_cache_capacity));
        let registry = Arc::new(FunctionRegistry::with_regex_cache(regex_cache));
        Self::with_registry(registry, config)
    }

    /// Create an engine over a caller-provided registry
    pub fn with_registry(registry: Arc<FunctionRegistry>, config: EngineConfig) -> Self {
        let programs = NonZeroUsize::new(config.program_cache_capacity)
            .map(|capacity| Mutex::new(LruCache::new(capacity)));
        Self {
            registry,
            config,
            programs,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Registry queries are compiled against
    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile a query, reusing a cached program when one exists
    pub fn compile(&self, query: &str) -> Result<Arc<Program>> {
        let Some(programs) = &self.programs else {
            return crate::compile_query(query, &self.registry).map(Arc::new);
        };

        if let Some(program) = programs.lock().get(query) {
            log::trace!("program cache hit for {query:?}");
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(program));
        }

        log::trace!("program cache miss for {query:?}");
        self.misses.fetch_add(1, Ordering::Relaxed);
        // Compiled without holding the lock
        let program = Arc::new(crate::compile_query(query, &self.registry)?);
        programs.lock().put(query.to_string(), Arc::clone(&program));
        Ok(program)
    }

    /// Compile (or fetch) a query and run it against `document`
    pub fn query<'a>(&self, query: &str, document: &'a JsonValue) -> Result<NodeList<'a>> {
        let program = self.compile(query)?;
        Ok(program.query(document))
    }

    /// Current cache counters
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.programs.as_ref().map_or(0, |p| p.lock().len()),
        }
    }

    /// Drop every cached program
    pub fn clear_cache(&self) {
        if let Some(programs) = &self.programs {
            programs.lock().clear();
        }
    }
}

impl std::fmt::Debug for JsonPathEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonPathEngine")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("cache", &self.cache_stats())
            .finish()
    }
}
