//! Run config: model endpoint, market data URL, DB path, thread. Filled from env / .env.
//!
//! Interacts with [`RunOptions`](super::RunOptions) and [`run_with_config`](crate::run_with_config).

use std::time::Duration;

use dashgraph::Language;

/// Error type used for config loading and runs.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";
const DEFAULT_DB_PATH: &str = "dashgraph.db";
const DEFAULT_THREAD_ID: &str = "default";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;

/// Model endpoint, resolved once per invocation.
#[derive(Clone, PartialEq)]
pub enum EndpointConfig {
    /// OpenAI or any OpenAI-compatible base URL.
    OpenAi {
        api_base: String,
        api_key: String,
        model: String,
    },
    /// Azure OpenAI deployment.
    Azure {
        api_key: String,
        instance_name: String,
        deployment_name: String,
        api_version: String,
    },
}

impl EndpointConfig {
    /// Model (or deployment) name sent with each request.
    pub fn model(&self) -> &str {
        match self {
            EndpointConfig::OpenAi { model, .. } => model,
            EndpointConfig::Azure {
                deployment_name, ..
            } => deployment_name,
        }
    }

    /// Azure resource endpoint, e.g. `https://my-instance.openai.azure.com`.
    pub fn azure_api_base(instance_name: &str) -> String {
        format!("https://{}.openai.azure.com", instance_name)
    }
}

// Keys stay out of Debug output.
impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointConfig::OpenAi {
                api_base, model, ..
            } => f
                .debug_struct("OpenAi")
                .field("api_base", api_base)
                .field("model", model)
                .finish_non_exhaustive(),
            EndpointConfig::Azure {
                instance_name,
                deployment_name,
                api_version,
                ..
            } => f
                .debug_struct("Azure")
                .field("instance_name", instance_name)
                .field("deployment_name", deployment_name)
                .field("api_version", api_version)
                .finish_non_exhaustive(),
        }
    }
}

/// Run config for one CLI turn.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub endpoint: EndpointConfig,
    /// Sampling temperature 0-2. Default: 0.
    pub temperature: f32,
    /// Bound on each model call.
    pub model_timeout: Duration,
    /// Base URL of the market data service.
    pub market_data_url: String,
    /// SQLite database path for checkpoints.
    pub db_path: String,
    /// Conversation thread to continue.
    pub thread_id: String,
    /// Response language; `None` keeps the thread's current language.
    pub language: Option<Language>,
    /// When true, print node progress while the turn runs.
    pub stream: bool,
    /// When true, show debug logs and wrap nodes with logging middleware.
    pub verbose: bool,
}

impl RunConfig {
    /// Fill config from env vars. Call `dotenv::dotenv().ok()` first to include `.env`.
    ///
    /// Azure is selected when `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_INSTANCE_NAME` and
    /// `AZURE_OPENAI_DEPLOYMENT_NAME` are all set; otherwise `OPENAI_API_KEY` is required.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let azure = (
            var("AZURE_OPENAI_API_KEY"),
            var("AZURE_OPENAI_INSTANCE_NAME"),
            var("AZURE_OPENAI_DEPLOYMENT_NAME"),
        );
        let endpoint = match azure {
            (Some(api_key), Some(instance_name), Some(deployment_name)) => EndpointConfig::Azure {
                api_key,
                instance_name,
                deployment_name,
                api_version: var("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            },
            _ => {
                let api_key = var("OPENAI_API_KEY").ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "OPENAI_API_KEY is not set (or configure AZURE_OPENAI_API_KEY, AZURE_OPENAI_INSTANCE_NAME and AZURE_OPENAI_DEPLOYMENT_NAME); please configure it in .env",
                    )
                })?;
                EndpointConfig::OpenAi {
                    api_base: var("OPENAI_API_BASE")
                        .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
                    api_key,
                    model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                }
            }
        };

        let temperature = match var("OPENAI_TEMPERATURE") {
            Some(s) => s
                .trim()
                .parse::<f32>()
                .map_err(|e| format!("OPENAI_TEMPERATURE: {}", e))?,
            None => 0.0,
        };
        let timeout_secs = match var("MODEL_TIMEOUT_SECS") {
            Some(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("MODEL_TIMEOUT_SECS: {}", e))?,
            None => DEFAULT_MODEL_TIMEOUT_SECS,
        };

        Ok(Self {
            endpoint,
            temperature,
            model_timeout: Duration::from_secs(timeout_secs),
            market_data_url: var("MARKET_DATA_URL")
                .unwrap_or_else(|| dashgraph::tools::DEFAULT_MARKET_DATA_URL.to_string()),
            db_path: var("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            thread_id: var("THREAD_ID").unwrap_or_else(|| DEFAULT_THREAD_ID.to_string()),
            language: None,
            stream: false,
            verbose: false,
        })
    }

    /// Apply optional overrides from `RunOptions` to this config.
    ///
    /// Only set fields in `options` override; `stream` and `verbose` switch on when set.
    pub fn apply_options(&mut self, options: &super::RunOptions) {
        if let Some(t) = options.temperature {
            self.temperature = t;
        }
        if let Some(tid) = &options.thread_id {
            self.thread_id = tid.clone();
        }
        if let Some(path) = &options.db_path {
            self.db_path = path.clone();
        }
        if let Some(language) = options.language {
            self.language = Some(language);
        }
        if options.stream {
            self.stream = true;
        }
        if options.verbose {
            self.verbose = true;
        }
    }
}
