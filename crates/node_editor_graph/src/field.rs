// SPDX-License-Identifier: MIT OR Apache-2.0
//! Field definitions for node type schemas.

use crate::value::ValueType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identifier for a field, unique within its node type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub String);

impl FieldId {
    /// Create a new random field ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FieldId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for FieldId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One typed entry of a node type schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeField {
    /// Stable field ID
    pub id: FieldId,
    /// Display name
    pub name: String,
    /// Value kind, resolved against the value type registry
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Value given to new nodes
    #[serde(default)]
    pub default: Value,
    /// Whether a value must be provided
    #[serde(default)]
    pub required: bool,
    /// Whether the field is visible on the node
    #[serde(default = "default_shown")]
    pub shown: bool,
}

fn default_shown() -> bool {
    true
}

impl NodeField {
    /// Create a visible, optional field with a null default
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id: FieldId::new(),
            name: name.into(),
            value_type,
            default: Value::Null,
            required: false,
            shown: true,
        }
    }

    /// Use a fixed ID instead of a random one
    pub fn with_id(mut self, id: impl Into<FieldId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the default value
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Hide the field on the node
    pub fn hidden(mut self) -> Self {
        self.shown = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let field = NodeField::new("Speed", ValueType::new("number"))
            .with_id("speed")
            .with_default(2.5)
            .required()
            .hidden();
        assert_eq!(field.id.as_str(), "speed");
        assert_eq!(field.default, json!(2.5));
        assert!(field.required);
        assert!(!field.shown);
    }

    #[test]
    fn test_json_shape() {
        let field = NodeField::new("Label", ValueType::new("string")).with_id("label");
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "label",
                "name": "Label",
                "type": { "name": "string" },
                "default": null,
                "required": false,
                "shown": true
            })
        );
    }

    #[test]
    fn test_missing_flags_use_defaults() {
        let field: NodeField =
            serde_json::from_value(json!({"id": "f", "name": "F", "type": {"name": "boolean"}}))
                .unwrap();
        assert!(field.shown);
        assert!(!field.required);
        assert_eq!(field.default, Value::Null);
    }
}
