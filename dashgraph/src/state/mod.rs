//! Conversation state schema: fields, partial updates and merge policy.
//!
//! [`ConversationState`] is the unit of truth for one thread. Nodes never mutate it in
//! place; they produce [`StateUpdate`]s that [`ConversationState::merge`] folds in:
//! `messages` concatenates, `language` and `external_actions` replace when present.

mod merge;
mod update;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::registry::ToolDescriptor;

pub use merge::pending_tool_calls;
pub use update::StateUpdate;

/// Response language preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => f.write_str("english"),
            Language::Spanish => f.write_str("spanish"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" => Ok(Self::English),
            "spanish" => Ok(Self::Spanish),
            _ => Err(format!(
                "unknown language: {} (use english or spanish)",
                s
            )),
        }
    }
}

/// Per-thread conversation state.
///
/// `messages` and `language` are durable and checkpointed. `external_actions` holds the
/// caller-supplied tool descriptors accepted for the current turn only; it is skipped
/// by serde so it never reaches a checkpoint and is empty after a resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Causally ordered, append-only conversation log.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Language the assistant should answer in.
    #[serde(default)]
    pub language: Language,
    /// Externally owned tools valid for the current turn.
    #[serde(skip)]
    pub external_actions: Vec<ToolDescriptor>,
}

impl ConversationState {
    /// The most recent assistant message, if it is the last message in the log.
    pub fn last_assistant(&self) -> Option<&Message> {
        match self.messages.last() {
            Some(m @ Message::Assistant { .. }) => Some(m),
            _ => None,
        }
    }
}
