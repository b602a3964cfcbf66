// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value kinds that node fields can hold.
//!
//! Value types are compared by name only. The registry is built once and
//! shared read-only between editors (see [`ValueTypeRegistry::shared`]).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Built-in value type names
pub mod builtin {
    /// Free text
    pub const STRING: &str = "string";
    /// Floating point number
    pub const NUMBER: &str = "number";
    /// True/false flag
    pub const BOOLEAN: &str = "boolean";
    /// One of a fixed set of string options
    pub const ENUM: &str = "enum";
    /// Color as a hex string
    pub const COLOR: &str = "color";
    /// Arbitrary JSON
    pub const JSON: &str = "json";
}

/// A named primitive kind used to type node fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueType {
    /// Registry-unique name
    pub name: String,
}

impl ValueType {
    /// Create a value type with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Immutable set of value types, keyed by name
#[derive(Debug, Clone, Default)]
pub struct ValueTypeRegistry {
    types: IndexMap<String, ValueType>,
}

impl ValueTypeRegistry {
    /// Create a registry from a list of names. Later duplicates are ignored.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut types = IndexMap::new();
        for name in names {
            let name = name.into();
            types
                .entry(name.clone())
                .or_insert_with(|| ValueType::new(name));
        }
        Self { types }
    }

    /// The built-in registry
    pub fn builtin() -> Self {
        Self::from_names([
            builtin::STRING,
            builtin::NUMBER,
            builtin::BOOLEAN,
            builtin::ENUM,
            builtin::COLOR,
            builtin::JSON,
        ])
    }

    /// Process-wide handle to the built-in registry
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<ValueTypeRegistry>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(Self::builtin())).clone()
    }

    /// Look up a value type by name
    pub fn get(&self, name: &str) -> Option<&ValueType> {
        self.types.get(name)
    }

    /// Whether a value type with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// All value types in registration order
    pub fn types(&self) -> impl Iterator<Item = &ValueType> {
        self.types.values()
    }

    /// Number of registered value types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let registry = ValueTypeRegistry::builtin();
        assert_eq!(registry.get("number"), Some(&ValueType::new("number")));
        assert!(registry.get("Number").is_none());
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_duplicate_names_collapse() {
        let registry = ValueTypeRegistry::from_names(["a", "b", "a"]);
        let names: Vec<_> = registry.types().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_shared_is_single_instance() {
        assert!(Arc::ptr_eq(&ValueTypeRegistry::shared(), &ValueTypeRegistry::shared()));
    }
}
