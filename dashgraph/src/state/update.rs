//! Partial state updates produced by nodes and by turn input.

use serde_json::Value;

use super::Language;
use crate::error::AgentError;
use crate::message::Message;
use crate::registry::ToolDescriptor;

/// Partial update to [`ConversationState`](super::ConversationState).
///
/// Absent scalar fields (`None`) retain the previous value; `messages` are appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub language: Option<Language>,
    pub external_actions: Option<Vec<ToolDescriptor>>,
}

impl StateUpdate {
    /// Update that appends the given messages.
    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Update that appends a single message.
    pub fn message(message: Message) -> Self {
        Self::messages(vec![message])
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_external_actions(mut self, actions: Vec<ToolDescriptor>) -> Self {
        self.external_actions = Some(actions);
        self
    }

    /// Parses an update from JSON, checking field names and declared types.
    ///
    /// Accepted fields: `messages` (array of messages) and `language` (string).
    /// External actions are not accepted here: they are validated by the
    /// [`ToolRegistry`](crate::registry::ToolRegistry) and attached with
    /// [`with_external_actions`](Self::with_external_actions).
    pub fn from_json(value: &Value) -> Result<Self, AgentError> {
        let obj = value.as_object().ok_or_else(|| {
            AgentError::SchemaViolation(format!("state update must be an object, got {}", value))
        })?;

        let mut update = StateUpdate::default();
        for (field, v) in obj {
            match field.as_str() {
                "messages" => {
                    update.messages = serde_json::from_value(v.clone()).map_err(|e| {
                        AgentError::SchemaViolation(format!("field `messages`: {}", e))
                    })?;
                }
                "language" => {
                    if v.is_null() {
                        continue;
                    }
                    let s = v.as_str().ok_or_else(|| {
                        AgentError::SchemaViolation(format!(
                            "field `language` must be a string, got {}",
                            v
                        ))
                    })?;
                    update.language = Some(s.parse().map_err(AgentError::SchemaViolation)?);
                }
                other => {
                    return Err(AgentError::SchemaViolation(format!(
                        "unknown state field `{}`",
                        other
                    )))
                }
            }
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: A well-formed JSON update yields messages and language.
    #[test]
    fn from_json_accepts_known_fields() {
        let u = StateUpdate::from_json(&json!({
            "messages": [{ "role": "user", "content": "hi" }],
            "language": "spanish"
        }))
        .unwrap();
        assert_eq!(u.messages, vec![Message::user("hi")]);
        assert_eq!(u.language, Some(Language::Spanish));
        assert!(u.external_actions.is_none());
    }

    /// **Scenario**: Unknown field is a schema violation naming the field.
    #[test]
    fn from_json_rejects_unknown_field() {
        let err = StateUpdate::from_json(&json!({ "mood": "happy" })).unwrap_err();
        match err {
            AgentError::SchemaViolation(msg) => assert!(msg.contains("mood"), "{}", msg),
            other => panic!("expected SchemaViolation, got {:?}", other),
        }
    }

    /// **Scenario**: Wrong types for declared fields are schema violations.
    #[test]
    fn from_json_rejects_type_mismatch() {
        for bad in [
            json!({ "language": 3 }),
            json!({ "language": "klingon" }),
            json!({ "messages": "hi" }),
            json!({ "messages": [{ "role": "narrator", "content": "x" }] }),
            json!(["not", "an", "object"]),
        ] {
            assert!(
                matches!(StateUpdate::from_json(&bad), Err(AgentError::SchemaViolation(_))),
                "expected violation for {}",
                bad
            );
        }
    }

    /// **Scenario**: null language means "not present" and keeps the previous value.
    #[test]
    fn from_json_null_language_is_absent() {
        let u = StateUpdate::from_json(&json!({ "language": null })).unwrap();
        assert!(u.language.is_none());
    }
}
