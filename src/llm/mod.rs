pub mod chat;
pub mod error;

use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Claude,
    OpenAI,
    V0,
    Groq,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Claude,
        ProviderId::OpenAI,
        ProviderId::V0,
        ProviderId::Groq,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Claude => "claude",
            ProviderId::OpenAI => "openai",
            ProviderId::V0 => "v0",
            ProviderId::Groq => "groq",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderId::Claude => "Claude",
            ProviderId::OpenAI => "ChatGPT",
            ProviderId::V0 => "v0.dev",
            ProviderId::Groq => "Groq",
        }
    }

    /// Store key holding this provider's API key.
    pub fn credential_key(self) -> &'static str {
        match self {
            ProviderId::Claude => "claude_api_key",
            ProviderId::OpenAI => "openai_api_key",
            ProviderId::V0 => "v0_api_key",
            ProviderId::Groq => "groq_api_key",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderId::Claude => "claude-3-opus-20240229",
            ProviderId::OpenAI => "gpt-4",
            ProviderId::V0 => "v0",
            ProviderId::Groq => "llama-3.3-70b-versatile",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseProviderError {
    message: String,
}

impl fmt::Display for ParseProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseProviderError {}

impl FromStr for ProviderId {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Ok(ProviderId::Claude),
            "openai" | "chatgpt" => Ok(ProviderId::OpenAI),
            "v0" | "v0.dev" => Ok(ProviderId::V0),
            "groq" => Ok(ProviderId::Groq),
            _ =>
                Err(ParseProviderError {
                    message: format!("Invalid provider: '{}'", s),
                }),
        }
    }
}

/// Endpoint overrides and mock switches used to build the provider registry.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub claude_url: Option<String>,
    pub openai_url: Option<String>,
    pub v0_url: Option<String>,
    pub groq_url: Option<String>,
    pub mock: bool,
    pub mock_seed: Option<u64>,
    pub mock_delay: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            claude_url: None,
            openai_url: None,
            v0_url: None,
            groq_url: None,
            mock: false,
            mock_seed: None,
            mock_delay: Duration::from_millis(1000),
        }
    }
}

impl LlmConfig {
    pub fn endpoint_override(&self, provider: ProviderId) -> Option<String> {
        match provider {
            ProviderId::Claude => self.claude_url.clone(),
            ProviderId::OpenAI => self.openai_url.clone(),
            ProviderId::V0 => self.v0_url.clone(),
            ProviderId::Groq => self.groq_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_and_ui_aliases() {
        assert_eq!("Claude".parse::<ProviderId>(), Ok(ProviderId::Claude));
        assert_eq!("chatgpt".parse::<ProviderId>(), Ok(ProviderId::OpenAI));
        assert_eq!("v0.dev".parse::<ProviderId>(), Ok(ProviderId::V0));
        assert_eq!(" groq ".parse::<ProviderId>(), Ok(ProviderId::Groq));
        let err = "bard".parse::<ProviderId>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid provider: 'bard'");
    }

    #[test]
    fn serde_names_match_display() {
        for provider in ProviderId::ALL {
            let json = serde_json::to_string(&provider).unwrap();
            assert_eq!(json, format!("\"{}\"", provider));
        }
    }
}
