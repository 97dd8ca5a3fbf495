pub mod shell;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::llm::{ LlmConfig, ProviderId };
use crate::models::settings::Theme;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Persistence Args ---
    /// Persistence backend (file, redis, memory)
    #[arg(long, env = "STORE_TYPE", default_value = "file")]
    pub store_type: String,

    /// JSON file used by the file backend. Defaults to the platform data directory.
    #[arg(long, env = "STORE_PATH")]
    pub store_path: Option<PathBuf>,

    /// Redis URL used by the redis backend (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "STORE_REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub store_redis_url: String,

    /// Prefix for Redis keys.
    #[arg(long, env = "STORE_REDIS_PREFIX", default_value = "multi-ai:")]
    pub store_redis_prefix: String,

    // --- Provider Selection Args ---
    /// Provider to talk to (claude, openai, v0, groq). Saved as the new default.
    #[arg(long, env = "CHAT_PROVIDER")]
    pub provider: Option<ProviderId>,

    /// Model identifier for the selected provider. Saved as the new default.
    #[arg(long, env = "CHAT_MODEL")]
    pub model: Option<String>,

    /// UI theme preference (light, dark, system). Saved as the new default.
    #[arg(long, env = "THEME")]
    pub theme: Option<Theme>,

    // --- Provider Credentials (stored on first use, never defaulted) ---
    #[arg(long, env = "CLAUDE_API_KEY", hide_env_values = true)]
    pub claude_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "V0_API_KEY", hide_env_values = true)]
    pub v0_api_key: Option<String>,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    // --- Endpoint Overrides ---
    /// Override the Claude messages endpoint URL
    #[arg(long, env = "CLAUDE_URL")]
    pub claude_url: Option<String>,

    /// Override the OpenAI chat completions endpoint URL
    #[arg(long, env = "OPENAI_URL")]
    pub openai_url: Option<String>,

    /// Override the v0.dev generate endpoint URL
    #[arg(long, env = "V0_URL")]
    pub v0_url: Option<String>,

    /// Override the Groq chat completions endpoint URL
    #[arg(long, env = "GROQ_URL")]
    pub groq_url: Option<String>,

    // --- Mock Mode Args ---
    /// Answer with canned demo responses instead of calling any provider.
    #[arg(long, env = "MOCK", default_value = "false")]
    pub mock: bool,

    /// Seed for the mock response picker, for reproducible demos.
    #[arg(long, env = "MOCK_SEED")]
    pub mock_seed: Option<u64>,

    /// Artificial latency of mock responses in milliseconds.
    #[arg(long, env = "MOCK_DELAY_MS", default_value = "1000")]
    pub mock_delay_ms: u64,

    // --- General App Args ---
    /// Serve the HTTP bridge on this port instead of starting the terminal shell.
    #[arg(long, env = "HTTP_PORT")]
    pub http_port: Option<u16>,

    /// Host address for the HTTP bridge.
    #[arg(long, env = "HTTP_HOST", default_value = "127.0.0.1")]
    pub http_host: String,

    /// Send one message, print the reply, and exit.
    #[arg(short, long)]
    pub message: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            claude_url: self.claude_url.clone(),
            openai_url: self.openai_url.clone(),
            v0_url: self.v0_url.clone(),
            groq_url: self.groq_url.clone(),
            mock: self.mock,
            mock_seed: self.mock_seed,
            mock_delay: Duration::from_millis(self.mock_delay_ms),
        }
    }

    /// Keys passed on the command line or environment, to import into the store.
    pub fn supplied_keys(&self) -> Vec<(ProviderId, String)> {
        [
            (ProviderId::Claude, &self.claude_api_key),
            (ProviderId::OpenAI, &self.openai_api_key),
            (ProviderId::V0, &self.v0_api_key),
            (ProviderId::Groq, &self.groq_api_key),
        ]
            .into_iter()
            .filter_map(|(provider, key)| {
                key.as_deref()
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(|k| (provider, k.to_string()))
            })
            .collect()
    }
}
