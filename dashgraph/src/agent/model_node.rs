//! Model node: derive the system prompt, call the LLM with the unified tools, append
//! its output.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::LlmClient;
use crate::registry::ToolRegistry;
use crate::state::{ConversationState, StateUpdate};

use super::{system_prompt, DEFAULT_MODEL_TIMEOUT, MODEL_NODE};

/// Model node: one model call per run.
///
/// Builds the prompt from `state.language`, presents the local tools unified with the
/// turn's external actions, and appends the resulting assistant message. The call is
/// bounded by a timeout; expiry is an `AgentError::Endpoint`.
///
/// **Interaction**: Implements `Node<ConversationState>`; its conditional edge is the
/// [`AgentRouter`](super::AgentRouter).
pub struct ModelNode {
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ModelNode {
    pub fn new(llm: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            llm,
            registry,
            timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Node<ConversationState> for ModelNode {
    fn id(&self) -> &str {
        MODEL_NODE
    }

    async fn run(&self, state: ConversationState) -> Result<(ConversationState, Next), AgentError> {
        let tools = self.registry.unify(&state.external_actions).specs();
        let prompt = system_prompt(state.language);

        let output = tokio::time::timeout(
            self.timeout,
            self.llm.invoke(&prompt, &state.messages, &tools),
        )
        .await
        .map_err(|_| {
            AgentError::Endpoint(format!(
                "model call timed out after {} ms",
                self.timeout.as_millis()
            ))
        })??;

        debug!(
            tool_calls = output.tool_calls().len(),
            tools = tools.len(),
            "model returned"
        );
        let next = state.apply(StateUpdate::message(output.into_message()))?;
        Ok((next, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::message::Message;
    use crate::state::Language;
    use crate::tool_source::MockToolSource;
    use serde_json::json;

    async fn registry() -> Arc<ToolRegistry> {
        Arc::new(
            ToolRegistry::from_source(&MockToolSource::market_example())
                .await
                .unwrap(),
        )
    }

    /// **Scenario**: The model sees the language prompt and the unified tools; its reply is appended.
    #[tokio::test]
    async fn appends_model_output() {
        let registry = registry().await;
        let resolution = registry.resolve(&[json!({ "name": "addModule", "parameters": {} })]);
        let llm = Arc::new(MockLlm::default().then_text("hola"));
        let node = ModelNode::new(llm.clone(), registry);
        let state = ConversationState {
            messages: vec![Message::user("hi")],
            language: Language::Spanish,
            external_actions: resolution.external,
        };

        let (out, next) = node.run(state).await.unwrap();
        assert_eq!(next, Next::Continue);
        assert_eq!(out.messages.last(), Some(&Message::assistant("hola")));

        let req = &llm.requests()[0];
        assert_eq!(req.system_prompt, "You are a helpful assistant. Talk in spanish.");
        assert_eq!(req.messages, vec![Message::user("hi")]);
        assert_eq!(
            req.tool_names,
            vec!["getMarketMovers", "getStockHistory", "addModule"]
        );
    }

    /// **Scenario**: A model call that outlives the timeout is an endpoint error.
    #[tokio::test]
    async fn timeout_is_endpoint_error() {
        let llm = Arc::new(MockLlm::default().then_stall());
        let node = ModelNode::new(llm, registry().await).with_timeout(Duration::from_millis(20));
        let result = node.run(ConversationState::default()).await;
        assert!(matches!(result, Err(AgentError::Endpoint(m)) if m.contains("timed out")));
    }

    /// **Scenario**: Endpoint errors from the client propagate.
    #[tokio::test]
    async fn endpoint_error_propagates() {
        let llm = Arc::new(MockLlm::default().then_endpoint_error("401 unauthorized"));
        let node = ModelNode::new(llm, registry().await);
        assert!(matches!(
            node.run(ConversationState::default()).await,
            Err(AgentError::Endpoint(_))
        ));
    }
}
