use thiserror::Error;

use super::ProviderId;

pub const MALFORMED_RESPONSE: &str = "malformed response";

/// Failure of one exchange. Every variant is terminal for that exchange only.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API key missing for {provider}")]
    MissingCredential {
        provider: ProviderId,
    },

    #[error("API Error: {status} - {body}")]
    Transport {
        status: u16,
        body: String,
    },

    #[error("{}", MALFORMED_RESPONSE)]
    MalformedResponse,
}

impl ProviderError {
    pub fn status(&self) -> u16 {
        match self {
            ProviderError::Transport { status, .. } => *status,
            _ => 0,
        }
    }

    pub fn body(&self) -> String {
        match self {
            ProviderError::Transport { body, .. } => body.clone(),
            ProviderError::MalformedResponse => MALFORMED_RESPONSE.to_string(),
            ProviderError::MissingCredential { .. } => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}
