//! Turn arguments from the command line: message, actions file, tool results.

use std::path::{Path, PathBuf};

use dashgraph::state::pending_tool_calls;
use dashgraph::{ConversationState, Message, TurnInput};
use serde_json::Value;

use crate::config::RunConfig;

use super::Error;

/// What the caller supplies for one turn.
#[derive(Clone, Debug, Default)]
pub struct TurnArgs {
    /// New user message.
    pub message: Option<String>,
    /// JSON file with the external actions available this turn.
    pub actions_file: Option<PathBuf>,
    /// Results for pending external calls, as `CALL_ID=JSON`.
    pub tool_results: Vec<String>,
}

/// Reads external action descriptors: a JSON array, or an object with an `actions` array.
pub fn load_actions(path: &Path) -> Result<Vec<Value>, Error> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read actions file {}: {}", path.display(), e))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| format!("actions file {} is not valid JSON: {}", path.display(), e))?;
    match value {
        Value::Array(actions) => Ok(actions),
        Value::Object(mut obj) => match obj.remove("actions") {
            Some(Value::Array(actions)) => Ok(actions),
            _ => Err(format!(
                "actions file {} must hold an array or an object with an `actions` array",
                path.display()
            )
            .into()),
        },
        _ => Err(format!("actions file {} must hold an array", path.display()).into()),
    }
}

/// Splits `CALL_ID=JSON` at the first `=`. A payload that is not JSON is kept as a string.
pub fn parse_tool_result(spec: &str) -> Result<(String, Value), Error> {
    let (id, payload) = spec
        .split_once('=')
        .ok_or_else(|| format!("tool result `{}` must look like CALL_ID=JSON", spec))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("tool result `{}` has an empty call id", spec).into());
    }
    let payload = serde_json::from_str(payload).unwrap_or_else(|_| Value::String(payload.to_string()));
    Ok((id.to_string(), payload))
}

/// Builds the turn input; tool results are matched to the thread's pending calls by id.
pub fn build_turn_input(
    config: &RunConfig,
    args: &TurnArgs,
    prior: Option<&ConversationState>,
) -> Result<TurnInput, Error> {
    let mut input = TurnInput::new(config.thread_id.clone());
    if let Some(language) = config.language {
        input = input.with_language(language);
    }
    if let Some(text) = &args.message {
        input = input.with_message(Message::user(text.clone()));
    }
    if let Some(path) = &args.actions_file {
        input = input.with_external_actions(load_actions(path)?);
    }

    let pending = prior
        .map(|s| pending_tool_calls(&s.messages))
        .unwrap_or_default();
    for spec in &args.tool_results {
        let (id, payload) = parse_tool_result(spec)?;
        let call = pending
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| format!("thread {} has no pending call with id {}", config.thread_id, id))?;
        let content = match payload {
            Value::String(s) => s,
            other => other.to_string(),
        };
        input = input.with_tool_result(Message::tool_result(id, call.name.clone(), content));
    }

    if input.new_message.is_none() && input.tool_results.is_empty() {
        return Err("nothing to send: pass a message or a tool result".into());
    }
    Ok(input)
}
