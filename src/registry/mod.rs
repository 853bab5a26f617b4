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

//! Function registry
//!
//! A registry maps names to [`JsonPathFunction`] implementations. It is
//! consulted by the validator (usage rules), the compiler (binding call
//! sites) and, through the bound functions, by the evaluator. Registries are
//! built up front and treated as read-only afterwards; clone one to add
//! functions without affecting the original.

pub mod function;
pub mod functions;
pub mod regex_cache;

pub use function::{FunctionDefinition, FunctionUse, JsonPathFunction};
pub use regex_cache::{DEFAULT_REGEX_CACHE_CAPACITY, RegexCache};

use crate::error::RegistrationError;
use crate::parser::lexer::{is_name_char, is_name_first};
use functions::{CountFunction, LengthFunction, RegexFunction, RegexMode, ValueFunction};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Named collection of filter functions.
///
/// `Default` yields the built-in set, like [`FunctionRegistry::standard`].
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: IndexMap<String, Arc<dyn JsonPathFunction>>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            functions: IndexMap::new(),
        }
    }

    /// Create a registry holding the built-in functions, sharing the
    /// process-wide regex cache
    pub fn standard() -> Self {
        Self::with_regex_cache(Arc::clone(&regex_cache::SHARED_REGEX_CACHE))
    }

    /// Create a registry holding the built-in functions, with `match` and
    /// `search` backed by the given cache
    pub fn with_regex_cache(cache: Arc<RegexCache>) -> Self {
        let mut functions: IndexMap<String, Arc<dyn JsonPathFunction>> = IndexMap::new();
        functions.insert(LengthFunction::NAME.into(), Arc::new(LengthFunction));
        functions.insert(CountFunction::NAME.into(), Arc::new(CountFunction));
        functions.insert(ValueFunction::NAME.into(), Arc::new(ValueFunction));
        for mode in [RegexMode::Match, RegexMode::Search] {
            functions.insert(
                mode.name().into(),
                Arc::new(RegexFunction::new(mode, Arc::clone(&cache))),
            );
        }
        Self { functions }
    }

    /// Register a function implementation under `name`
    pub fn register<F>(&mut self, name: &str, function: F) -> Result<(), RegistrationError>
    where
        F: JsonPathFunction + 'static,
    {
        self.register_arc(name, Arc::new(function))
    }

    /// Register a shared function implementation under `name`
    pub fn register_arc(
        &mut self,
        name: &str,
        function: Arc<dyn JsonPathFunction>,
    ) -> Result<(), RegistrationError> {
        check_name(name)?;
        self.insert_new(name, function)
    }

    /// Register a closure-backed definition under `name`
    pub fn register_definition(
        &mut self,
        name: &str,
        definition: FunctionDefinition,
    ) -> Result<(), RegistrationError> {
        check_name(name)?;
        let function = definition
            .into_function()
            .ok_or_else(|| RegistrationError::BadFunctionDefinition {
                name: name.to_string(),
            })?;
        self.insert_new(name, Arc::new(function))
    }

    fn insert_new(
        &mut self,
        name: &str,
        function: Arc<dyn JsonPathFunction>,
    ) -> Result<(), RegistrationError> {
        if self.functions.contains_key(name) {
            return Err(RegistrationError::FunctionAlreadyExists {
                name: name.to_string(),
            });
        }
        log::debug!("registered function '{name}'");
        self.functions.insert(name.to_string(), function);
        Ok(())
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn JsonPathFunction>> {
        self.functions.get(name)
    }

    /// Whether a function is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether no functions are registered
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Whether `name` can be registered: the character classes the parser
/// accepts in call names
pub fn is_valid_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_first(first) => chars.all(is_name_char),
        _ => false,
    }
}

fn check_name(name: &str) -> Result<(), RegistrationError> {
    if !is_valid_function_name(name) {
        return Err(RegistrationError::BadFunctionName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JsonPathValue;
    use pretty_assertions::assert_eq;

    fn constant_true() -> FunctionDefinition {
        FunctionDefinition::new().with_evaluator(|_| JsonPathValue::boolean(true))
    }

    #[test]
    fn test_standard_functions() {
        let registry = FunctionRegistry::standard();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["length", "count", "value", "match", "search"]
        );
        assert!(FunctionRegistry::new().is_empty());
        assert_eq!(FunctionRegistry::default().len(), 5);
    }

    #[test]
    fn test_name_rules() {
        assert!(is_valid_function_name("_x1"));
        assert!(is_valid_function_name("émoji"));
        assert!(!is_valid_function_name(""));
        assert!(!is_valid_function_name("1x"));
        assert!(!is_valid_function_name("a-b"));
        assert!(is_valid_function_name("☺f"));
        assert!(is_valid_function_name("f·2"));

        let mut registry = FunctionRegistry::new();
        assert_eq!(
            registry.register_definition("bad name", constant_true()),
            Err(RegistrationError::BadFunctionName {
                name: "bad name".into()
            })
        );
    }

    #[test]
    fn test_definition_needs_evaluator() {
        let mut registry = FunctionRegistry::new();
        assert_eq!(
            registry.register_definition("f", FunctionDefinition::new()),
            Err(RegistrationError::BadFunctionDefinition { name: "f".into() })
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_leaves_registry_unchanged() {
        let mut registry = FunctionRegistry::standard();
        let before = registry.get("length").map(Arc::clone);
        assert_eq!(
            registry.register_definition("length", constant_true()),
            Err(RegistrationError::FunctionAlreadyExists {
                name: "length".into()
            })
        );
        let after = registry.get("length").map(Arc::clone);
        assert!(Arc::ptr_eq(&before.unwrap(), &after.unwrap()));
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_clone_is_isolated() {
        let original = FunctionRegistry::standard();
        let mut sandbox = original.clone();
        sandbox.register_definition("always", constant_true()).unwrap();
        assert!(sandbox.contains("always"));
        assert!(!original.contains("always"));
    }
}
