//! Run one turn with the given config; does not read .env.
//!
//! Builds the executor from config (ChatOpenAI on OpenAI or Azure, market data tools,
//! SQLite checkpoints) and runs the turn, optionally printing node progress.

use std::io::Write;
use std::sync::Arc;

use async_openai::config::{AzureConfig, OpenAIConfig};
use dashgraph::tools::market_tools;
use dashgraph::{
    AgentExecutor, AgentOptions, AggregateToolSource, Checkpointer, ChatOpenAI, ConversationState,
    LlmClient, Message, StreamEvent, StreamMode, TurnOutput,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::{EndpointConfig, RunConfig};

use super::{build_turn_input, Error, TurnArgs};

fn build_llm(config: &RunConfig) -> Arc<dyn LlmClient> {
    match &config.endpoint {
        EndpointConfig::OpenAi {
            api_base,
            api_key,
            model,
        } => {
            let openai_config = OpenAIConfig::new()
                .with_api_base(api_base)
                .with_api_key(api_key.clone());
            Arc::new(
                ChatOpenAI::with_config(openai_config, model.clone())
                    .with_temperature(config.temperature),
            )
        }
        EndpointConfig::Azure {
            api_key,
            instance_name,
            deployment_name,
            api_version,
        } => {
            let azure_config = AzureConfig::new()
                .with_api_base(EndpointConfig::azure_api_base(instance_name))
                .with_api_key(api_key.clone())
                .with_deployment_id(deployment_name.clone())
                .with_api_version(api_version.clone());
            Arc::new(
                ChatOpenAI::with_config(azure_config, deployment_name.clone())
                    .with_temperature(config.temperature),
            )
        }
    }
}

#[cfg(feature = "sqlite")]
fn build_checkpointer(config: &RunConfig) -> Result<Arc<dyn Checkpointer<ConversationState>>, Error> {
    let saver = dashgraph::SqliteSaver::new(&config.db_path, Arc::new(dashgraph::JsonSerializer))?;
    Ok(Arc::new(saver))
}

#[cfg(not(feature = "sqlite"))]
fn build_checkpointer(_config: &RunConfig) -> Result<Arc<dyn Checkpointer<ConversationState>>, Error> {
    tracing::warn!("built without sqlite; the thread is not persisted");
    Ok(Arc::new(dashgraph::MemorySaver::new()))
}

/// Builds the executor for `config`: model endpoint, market data tools, checkpoints.
pub async fn build_executor(config: &RunConfig) -> Result<AgentExecutor, Error> {
    let client = reqwest::Client::new();
    let mut tools = AggregateToolSource::new();
    for tool in market_tools(client, &config.market_data_url) {
        tools.register(tool);
    }
    let options = AgentOptions {
        model_timeout: config.model_timeout,
        node_logging: config.verbose,
        ..AgentOptions::default()
    };
    debug!(endpoint = ?config.endpoint, db_path = %config.db_path, "building executor");
    let executor = AgentExecutor::from_tool_source(
        build_llm(config),
        Arc::new(tools),
        build_checkpointer(config)?,
        options,
    )
    .await?;
    Ok(executor)
}

/// Run one turn with given config; does not read .env.
pub async fn run_with_config(config: &RunConfig, args: &TurnArgs) -> Result<TurnOutput, Error> {
    let executor = build_executor(config).await?;
    run_turn(&executor, config, args).await
}

/// Runs one turn on an existing executor. With `config.stream`, prints node progress
/// to stderr as the turn runs.
pub async fn run_turn(
    executor: &AgentExecutor,
    config: &RunConfig,
    args: &TurnArgs,
) -> Result<TurnOutput, Error> {
    let prior = executor.state(&config.thread_id).await?;
    let input = build_turn_input(config, args, prior.as_ref())?;

    if !config.stream {
        return Ok(executor.run_turn(input).await?);
    }

    let (tx, mut rx) = mpsc::channel::<StreamEvent<ConversationState>>(32);
    let print_progress = async move {
        while let Some(event) = rx.recv().await {
            if let StreamEvent::Updates { node_id, state } = event {
                let _ = writeln!(std::io::stderr(), "{}", progress_line(&node_id, &state));
            }
        }
    };
    let (out, ()) = tokio::join!(
        executor.stream_turn(input, [StreamMode::Updates], tx),
        print_progress
    );
    Ok(out?)
}

/// One progress line for a finished node.
fn progress_line(node_id: &str, state: &ConversationState) -> String {
    match state.messages.last() {
        Some(Message::Assistant { tool_calls, .. }) if !tool_calls.is_empty() => {
            let names: Vec<&str> = tool_calls.iter().map(|c| c.name.as_str()).collect();
            format!("[{}] requested {}", node_id, names.join(", "))
        }
        Some(Message::Assistant { .. }) => format!("[{}] answered", node_id),
        Some(Message::Tool { .. }) => format!("[{}] tool results received", node_id),
        _ => format!("[{}] done", node_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashgraph::ToolCall;
    use serde_json::json;

    /// **Scenario**: Progress lines name requested tools and results.
    #[test]
    fn progress_line_describes_step() {
        let mut state = ConversationState::default();
        state.messages.push(Message::assistant_with_calls(
            "",
            vec![ToolCall::new("c1", "getMarketMovers", json!({}))],
        ));
        assert_eq!(progress_line("model", &state), "[model] requested getMarketMovers");
        state
            .messages
            .push(Message::tool_result("c1", "getMarketMovers", "{}"));
        assert_eq!(progress_line("tools", &state), "[tools] tool results received");
    }
}
