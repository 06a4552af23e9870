//! Serializer for checkpoint state (state <-> bytes).

use crate::memory::checkpointer::CheckpointError;

/// Serializes and deserializes state for durable checkpoint storage.
///
/// Used by `SqliteSaver`. `MemorySaver` keeps the state values themselves.
pub trait Serializer<S>: Send + Sync {
    fn serialize(&self, state: &S) -> Result<Vec<u8>, CheckpointError>;
    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError>;
}

/// JSON serializer over serde.
///
/// Fields marked `#[serde(skip)]` (such as the per-turn external actions of
/// `ConversationState`) are not persisted and come back as their default.
pub struct JsonSerializer;

impl<S> Serializer<S> for JsonSerializer
where
    S: serde::Serialize + serde::de::DeserializeOwned,
{
    fn serialize(&self, state: &S) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec(state).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<S, CheckpointError> {
        serde_json::from_slice(bytes).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::registry::ToolDescriptor;
    use crate::state::{ConversationState, Language};
    use crate::tool_source::ToolSpec;

    /// **Scenario**: Durable fields survive; per-turn external actions are dropped.
    #[test]
    fn json_serializer_persists_durable_fields_only() {
        let ser = JsonSerializer;
        let state = ConversationState {
            messages: vec![Message::user("hi"), Message::assistant("hola")],
            language: Language::Spanish,
            external_actions: vec![ToolDescriptor::local(ToolSpec {
                name: "addModule".into(),
                description: None,
                input_schema: serde_json::json!({ "type": "object" }),
            })],
        };
        let bytes = ser.serialize(&state).unwrap();
        let restored: ConversationState = ser.deserialize(&bytes).unwrap();
        assert_eq!(restored.messages, state.messages);
        assert_eq!(restored.language, Language::Spanish);
        assert!(restored.external_actions.is_empty());
    }

    /// **Scenario**: Invalid JSON on deserialize returns CheckpointError::Serialization.
    #[test]
    fn json_serializer_invalid_json_deserialize_returns_checkpoint_error() {
        let ser = JsonSerializer;
        let result: Result<ConversationState, _> = ser.deserialize(b"{ not valid json ]");
        match result {
            Err(CheckpointError::Serialization(s)) => assert!(!s.is_empty()),
            other => panic!("expected Serialization variant: {:?}", other.map(|_| ())),
        }
    }
}
