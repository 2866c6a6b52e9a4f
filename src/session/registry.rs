//! Tool registry built from `tools/list`.
//!
//! Holds the descriptors the remote server advertised for the current
//! session and validates call arguments against each tool's declared
//! `inputSchema` before anything is sent.

use std::collections::BTreeMap;

use serde_json::Value;

use super::errors::SessionError;
use super::types::{ToolArguments, ToolDescriptor};

/// Discovered tools, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registry contents with a fresh `tools/list` result.
    pub fn replace_all(&mut self, tools: Vec<ToolDescriptor>) {
        self.tools = tools.into_iter().map(|t| (t.name.clone(), t)).collect();
    }

    pub fn get_tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// All tools, sorted by name.
    pub fn all_tools(&self) -> Vec<&ToolDescriptor> {
        self.tools.values().collect()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate a tool call against the registry.
    ///
    /// Checks that the tool exists, that every `required` field is present,
    /// and that top-level arguments match the declared `type` of their
    /// property. Schemas without `properties` accept any object.
    pub fn validate_tool_call(
        &self,
        tool_name: &str,
        arguments: &ToolArguments,
    ) -> Result<(), SessionError> {
        let def = self.get_tool(tool_name).ok_or(SessionError::UnknownTool {
            name: tool_name.to_string(),
        })?;

        if let Some(required) = def.input_schema.get("required").and_then(Value::as_array) {
            for field_name in required.iter().filter_map(Value::as_str) {
                if !arguments.contains_key(field_name) {
                    return Err(SessionError::InvalidArguments {
                        tool: tool_name.to_string(),
                        reason: format!("missing required field: '{field_name}'"),
                    });
                }
            }
        }

        if let Some(properties) = def.input_schema.get("properties").and_then(Value::as_object) {
            for (field_name, value) in arguments {
                let Some(expected) = properties
                    .get(field_name)
                    .and_then(|p| p.get("type"))
                    .and_then(Value::as_str)
                else {
                    continue;
                };
                if !matches_json_type(value, expected) {
                    return Err(SessionError::InvalidArguments {
                        tool: tool_name.to_string(),
                        reason: format!(
                            "field '{field_name}' should be {expected}, got {}",
                            json_type_name(value)
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Whether `value` satisfies a JSON Schema primitive `type` keyword.
///
/// Unknown type names are accepted.
fn matches_json_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn add_numbers() -> ToolDescriptor {
        ToolDescriptor {
            name: "add_numbers".into(),
            description: "adds two numbers".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "a": {"type": "integer"},
                    "b": {"type": "integer"}
                },
                "required": ["a", "b"]
            }),
        }
    }

    fn args(value: Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.replace_all(vec![
            add_numbers(),
            ToolDescriptor {
                name: "greet_user".into(),
                description: "greets".into(),
                input_schema: Value::Null,
            },
        ]);
        registry
    }

    #[test]
    fn test_replace_all_and_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.tool_names(), vec!["add_numbers", "greet_user"]);
        assert!(registry.get_tool("add_numbers").is_some());
    }

    #[test]
    fn test_replace_all_drops_previous_tools() {
        let mut registry = registry();
        registry.replace_all(vec![add_numbers()]);
        assert_eq!(registry.len(), 1);
        assert!(registry.get_tool("greet_user").is_none());
    }

    #[test]
    fn test_validate_tool_call_valid() {
        let registry = registry();
        assert!(registry
            .validate_tool_call("add_numbers", &args(json!({"a": 5, "b": 3})))
            .is_ok());
    }

    #[test]
    fn test_validate_tool_call_missing_required() {
        let registry = registry();
        let err = registry
            .validate_tool_call("add_numbers", &args(json!({"a": 5})))
            .unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_validate_tool_call_type_mismatch() {
        let registry = registry();
        let err = registry
            .validate_tool_call("add_numbers", &args(json!({"a": "five", "b": 3})))
            .unwrap_err();
        match err {
            SessionError::InvalidArguments { reason, .. } => {
                assert!(reason.contains("integer"));
                assert!(reason.contains("string"));
            }
            other => panic!("expected InvalidArguments, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_tool_call_unknown_tool() {
        let registry = registry();
        let err = registry
            .validate_tool_call("divide_numbers", &ToolArguments::new())
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownTool { .. }));
    }

    #[test]
    fn test_schema_less_tool_accepts_anything() {
        let registry = registry();
        assert!(registry
            .validate_tool_call("greet_user", &args(json!({"name": 42})))
            .is_ok());
    }
}
