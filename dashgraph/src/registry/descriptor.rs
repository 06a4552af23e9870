//! Tool descriptors and validation of caller-supplied actions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::tool_source::ToolSpec;

/// Who executes a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolOwnership {
    /// Executed in-graph by the tool execution node.
    Local,
    /// Executed by the external caller; the graph only signals the request.
    External,
}

/// A tool in the unified set: schema plus ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    /// JSON schema for the arguments (always an object schema).
    pub parameters: Value,
    pub ownership: ToolOwnership,
}

/// A caller-supplied descriptor that was dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolDescriptorError {
    #[error("tool descriptor #{index} is not an object")]
    NotAnObject { index: usize },
    #[error("tool descriptor #{index} has no name")]
    MissingName { index: usize },
    #[error("tool descriptor name `{name}` must be 1-64 characters of [A-Za-z0-9_-]")]
    InvalidName { name: String },
    #[error("tool descriptor `{name}` has no parameter schema")]
    MissingParameters { name: String },
    #[error("tool descriptor `{name}` has an invalid parameter schema: {reason}")]
    InvalidParameters { name: String, reason: String },
    #[error("tool descriptor `{name}` duplicates an earlier external tool")]
    Duplicate { name: String },
}

impl ToolDescriptor {
    /// Descriptor for a compiled-in tool.
    pub fn local(spec: ToolSpec) -> Self {
        Self {
            name: spec.name,
            description: spec.description,
            parameters: spec.input_schema,
            ownership: ToolOwnership::Local,
        }
    }

    /// Validates a caller-supplied action and adapts it into an external descriptor.
    ///
    /// Requires a non-empty `name` and a parameter schema under `parameters` or
    /// `input_schema`. The schema may be a JSON-schema object or a list of action
    /// parameters (`{ name, type?, description?, required? }`), which is converted
    /// into an object schema. `index` is the position in the caller's list, used
    /// for error reporting.
    pub fn from_external(index: usize, value: &Value) -> Result<Self, ToolDescriptorError> {
        let obj = value
            .as_object()
            .ok_or(ToolDescriptorError::NotAnObject { index })?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ToolDescriptorError::MissingName { index })?
            .to_string();
        if !is_valid_tool_name(&name) {
            return Err(ToolDescriptorError::InvalidName { name });
        }

        let description = obj
            .get("description")
            .and_then(Value::as_str)
            .map(ToString::to_string);

        let raw = obj
            .get("parameters")
            .or_else(|| obj.get("input_schema"))
            .filter(|v| !v.is_null())
            .ok_or_else(|| ToolDescriptorError::MissingParameters { name: name.clone() })?;

        let parameters = match raw {
            Value::Object(schema) => object_schema(&name, schema)?,
            Value::Array(params) => params_to_schema(&name, params)?,
            other => {
                return Err(ToolDescriptorError::InvalidParameters {
                    name,
                    reason: format!("expected object or array, got {}", other),
                })
            }
        };

        Ok(Self {
            name,
            description,
            parameters,
            ownership: ToolOwnership::External,
        })
    }

    /// Schema view handed to the model adapter.
    pub fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.parameters.clone(),
        }
    }

    pub fn is_external(&self) -> bool {
        self.ownership == ToolOwnership::External
    }
}

/// Function names accepted by chat completion endpoints.
fn is_valid_tool_name(name: &str) -> bool {
    (1..=64).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn object_schema(name: &str, schema: &Map<String, Value>) -> Result<Value, ToolDescriptorError> {
    let invalid = |reason: &str| ToolDescriptorError::InvalidParameters {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if schema.get("properties").is_some_and(|p| !p.is_object()) {
        return Err(invalid("`properties` must be an object"));
    }
    if let Some(required) = schema.get("required") {
        let all_strings = required
            .as_array()
            .is_some_and(|r| r.iter().all(Value::is_string));
        if !all_strings {
            return Err(invalid("`required` must be an array of strings"));
        }
    }
    match schema.get("type") {
        None => {
            let mut schema = schema.clone();
            schema.insert("type".into(), json!("object"));
            Ok(Value::Object(schema))
        }
        Some(Value::String(t)) if t == "object" => Ok(Value::Object(schema.clone())),
        Some(other) => Err(ToolDescriptorError::InvalidParameters {
            name: name.to_string(),
            reason: format!("schema type must be \"object\", got {}", other),
        }),
    }
}

fn params_to_schema(name: &str, params: &[Value]) -> Result<Value, ToolDescriptorError> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for p in params {
        let pname = p
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ToolDescriptorError::InvalidParameters {
                name: name.to_string(),
                reason: "parameter without a name".to_string(),
            })?;
        let ptype = p.get("type").and_then(Value::as_str).unwrap_or("string");

        let mut prop = param_type_schema(ptype);
        if let Some(desc) = p.get("description").and_then(Value::as_str) {
            prop.insert("description".into(), json!(desc));
        }
        properties.insert(pname.to_string(), Value::Object(prop));

        if p.get("required").and_then(Value::as_bool).unwrap_or(true) {
            required.push(json!(pname));
        }
    }

    Ok(json!({
        "type": "object",
        "properties": properties,
        "required": required,
    }))
}

fn param_type_schema(ptype: &str) -> Map<String, Value> {
    let mut prop = Map::new();
    match ptype.strip_suffix("[]") {
        Some(item) => {
            prop.insert("type".into(), json!("array"));
            prop.insert("items".into(), Value::Object(param_type_schema(item)));
        }
        None => {
            prop.insert("type".into(), json!(ptype));
        }
    }
    prop
}
