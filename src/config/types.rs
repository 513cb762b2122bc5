use crate::{Error, Result, probe::Scenario};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    /// Replaces the built-in scenario catalogue when non-empty.
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit log lines as JSON objects instead of plain text.
    #[serde(default)]
    pub json: bool,
}

impl Config {
    /// Rejects values that deserialize fine but cannot drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_secs == 0 {
            return Err(Error::config("api.timeout_secs must be greater than zero"));
        }
        if self.stream.ping_interval_secs == 0 {
            return Err(Error::config("stream.ping_interval_secs must be greater than zero"));
        }
        if self.stream.ping_timeout_secs == 0 {
            return Err(Error::config("stream.ping_timeout_secs must be greater than zero"));
        }
        Ok(())
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl StreamConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: default_ws_url(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_model_name(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval_secs(),
            ping_timeout_secs: default_ping_timeout_secs(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_base_url() -> String {
    "https://api-main-poc.aiml.asu.edu".to_string()
}

fn default_ws_url() -> String {
    "wss://apiws-main-poc.aiml.asu.edu/".to_string()
}

fn default_token_env() -> String {
    "CREATE_AI_API_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_provider() -> String {
    "aws".to_string()
}

fn default_model_name() -> String {
    "claude4_5_sonnet".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_system_prompt() -> String {
    "You are the ASU Study Coach, an AI-powered study assistant that helps students with their courses."
        .to_string()
}

fn default_ping_interval_secs() -> u64 {
    10
}

fn default_ping_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}
