//! Scripted LLM client for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{LlmClient, ModelOutput};
use crate::error::AgentError;
use crate::message::{Message, ToolCall};
use crate::tool_source::ToolSpec;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Output(ModelOutput),
    /// Fail with `AgentError::Endpoint(message)`.
    EndpointError(String),
    /// Never answer (for timeout tests).
    Stall,
}

/// What the mock saw on one invocation.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

/// LLM client that replays a script of replies in order.
///
/// Each `invoke` pops the next reply; an exhausted script is an endpoint error.
/// Requests are recorded for assertions.
#[derive(Default)]
pub struct MockLlm {
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<MockRequest>>,
}

impl MockLlm {
    pub fn new(script: Vec<MockReply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Mock that always answers with the same text once.
    pub fn with_text(text: &str) -> Self {
        Self::new(vec![MockReply::Output(ModelOutput::text(text))])
    }

    /// Builder: append a text reply.
    pub fn then_text(self, text: &str) -> Self {
        self.push(MockReply::Output(ModelOutput::text(text)))
    }

    /// Builder: append a single tool call reply.
    pub fn then_tool_call(self, id: &str, name: &str, arguments: Value) -> Self {
        self.then_tool_calls(vec![ToolCall::new(id, name, arguments)])
    }

    /// Builder: append a reply with several tool calls.
    pub fn then_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.push(MockReply::Output(ModelOutput::from_parts(String::new(), calls)))
    }

    /// Builder: append an endpoint failure.
    pub fn then_endpoint_error(self, message: &str) -> Self {
        self.push(MockReply::EndpointError(message.to_string()))
    }

    /// Builder: append a reply that never arrives.
    pub fn then_stall(self) -> Self {
        self.push(MockReply::Stall)
    }

    fn push(self, reply: MockReply) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
        self
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelOutput, AgentError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(MockRequest {
                system_prompt: system_prompt.to_string(),
                messages: messages.to_vec(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            });
        }
        let reply = self
            .script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front());
        match reply {
            Some(MockReply::Output(out)) => Ok(out),
            Some(MockReply::EndpointError(msg)) => Err(AgentError::Endpoint(msg)),
            Some(MockReply::Stall) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AgentError::Endpoint("mock stalled".into()))
            }
            None => Err(AgentError::Endpoint("mock script exhausted".into())),
        }
    }
}
