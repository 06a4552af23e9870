//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Works against OpenAI or Azure OpenAI: the client is generic over the
//! `async_openai` config. Tool schemas are sent as function tools; the response's
//! function tool calls become [`ToolCall`]s with parsed JSON arguments.
//!
//! **Interaction**: Implements `LlmClient`; used by the model node like `MockLlm`.
//! Depends on `async_openai` (feature `openai`).

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::llm::{LlmClient, ModelOutput};
use crate::message::{Message, ToolCall};
use crate::tool_source::ToolSpec;

use async_openai::{
    config::{Config, OpenAIConfig},
    types::chat::{
        ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessage, ChatCompletionTool, ChatCompletionTools,
        CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
    },
    Client,
};

/// Chat Completions client implementing `LlmClient`.
///
/// `ChatOpenAI::new` reads `OPENAI_API_KEY` from the environment; use
/// `with_config` for explicit OpenAI or Azure configuration.
pub struct ChatOpenAI<C: Config = OpenAIConfig> {
    client: Client<C>,
    model: String,
    temperature: Option<f32>,
}

impl ChatOpenAI<OpenAIConfig> {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            temperature: None,
        }
    }
}

impl<C: Config> ChatOpenAI<C> {
    /// Build client with custom config (`OpenAIConfig` or `AzureConfig`).
    pub fn with_config(config: C, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
        }
    }

    /// Set temperature (0-2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn messages_to_request(
        system_prompt: &str,
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
        let mut out = Vec::with_capacity(messages.len() + 1);
        out.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage::from(system_prompt),
        ));
        for m in messages {
            let converted = match m {
                Message::User { content } => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(content.as_str()),
                ),
                Message::Assistant {
                    content,
                    tool_calls,
                } => {
                    let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                    if !content.is_empty() {
                        args.content(content.as_str());
                    }
                    if !tool_calls.is_empty() {
                        args.tool_calls(tool_calls.iter().map(to_openai_call).collect::<Vec<_>>());
                    }
                    ChatCompletionRequestMessage::Assistant(args.build().map_err(build_error)?)
                }
                Message::Tool {
                    call_id, content, ..
                } => ChatCompletionRequestMessage::Tool(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(call_id.as_str())
                        .content(content.as_str())
                        .build()
                        .map_err(build_error)?,
                ),
            };
            out.push(converted);
        }
        Ok(out)
    }
}

fn build_error(e: impl std::fmt::Display) -> AgentError {
    AgentError::ExecutionFailed(format!("OpenAI request build failed: {}", e))
}

fn to_openai_call(call: &ToolCall) -> ChatCompletionMessageToolCalls {
    ChatCompletionMessageToolCalls::Function(ChatCompletionMessageToolCall {
        id: call.id.clone(),
        function: FunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.to_string(),
        },
    })
}

/// Parses the model's argument string; malformed JSON degrades to `{}`.
fn parse_arguments(tool: &str, raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(tool, error = %e, "tool call arguments are not valid JSON");
            Value::Object(Default::default())
        }
    }
}

#[async_trait]
impl<C: Config> LlmClient for ChatOpenAI<C> {
    async fn invoke(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelOutput, AgentError> {
        let openai_messages = Self::messages_to_request(system_prompt, messages)?;
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(openai_messages);

        if !tools.is_empty() {
            let chat_tools: Vec<ChatCompletionTools> = tools
                .iter()
                .map(|t| {
                    ChatCompletionTools::Function(ChatCompletionTool {
                        function: FunctionObject {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: Some(t.input_schema.clone()),
                            ..Default::default()
                        },
                    })
                })
                .collect();
            args.tools(chat_tools);
        }

        if let Some(t) = self.temperature {
            args.temperature(t);
        }

        let request = args.build().map_err(build_error)?;

        debug!(model = %self.model, messages = messages.len(), tools = tools.len(), "chat completion request");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::Endpoint(format!("OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Endpoint("OpenAI returned no choices".to_string()))?;

        let msg = choice.message;
        let content = msg.content.unwrap_or_default();
        let calls: Vec<ToolCall> = msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tc| match tc {
                ChatCompletionMessageToolCalls::Function(f) => {
                    let arguments = parse_arguments(&f.function.name, &f.function.arguments);
                    Some(ToolCall::new(f.id, f.function.name, arguments))
                }
                _ => None,
            })
            .collect();

        Ok(ModelOutput::from_parts(content, calls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::config::AzureConfig;
    use serde_json::json;

    /// **Scenario**: ChatOpenAI::with_config accepts OpenAI and Azure configs.
    #[test]
    fn chat_openai_with_config_creates_client() {
        let config = OpenAIConfig::new().with_api_key("test-key");
        let c = ChatOpenAI::with_config(config, "gpt-4o").with_temperature(0.0);
        assert_eq!(c.model(), "gpt-4o");

        let azure = AzureConfig::new()
            .with_api_base("https://example.openai.azure.com")
            .with_api_key("k")
            .with_deployment_id("gpt-4o")
            .with_api_version("2024-02-15-preview");
        let _ = ChatOpenAI::with_config(azure, "gpt-4o");
    }

    /// **Scenario**: The system prompt leads; tool calls and tool results are carried through.
    #[test]
    fn messages_to_request_keeps_tool_exchange() {
        let messages = vec![
            Message::user("movers?"),
            Message::assistant_with_calls(
                "",
                vec![ToolCall::new("c1", "getMarketMovers", json!({}))],
            ),
            Message::tool_result("c1", "getMarketMovers", "{}"),
            Message::assistant("done"),
        ];
        let out = ChatOpenAI::<OpenAIConfig>::messages_to_request("sys", &messages).unwrap();
        assert_eq!(out.len(), 5);
        assert!(matches!(out[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(out[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(out[3], ChatCompletionRequestMessage::Tool(_)));
    }

    /// **Scenario**: Malformed or empty argument strings become an empty object.
    #[test]
    fn parse_arguments_falls_back_to_empty_object() {
        assert_eq!(parse_arguments("t", r#"{"ticker":"AAPL"}"#), json!({"ticker": "AAPL"}));
        assert_eq!(parse_arguments("t", ""), json!({}));
        assert_eq!(parse_arguments("t", "{not json"), json!({}));
    }
}
