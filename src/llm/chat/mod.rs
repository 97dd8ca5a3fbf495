pub mod anthropic;
pub mod openai;
pub mod groq;
pub mod v0;
pub mod mock;

#[cfg(test)]
pub(crate) mod test_server;

use async_trait::async_trait;
use log::{ debug, info };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, AUTHORIZATION } };
use serde::{ de::DeserializeOwned, Serialize };
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{ LlmConfig, ProviderId };
use super::error::ProviderError;
use self::anthropic::AnthropicChatClient;
use self::openai::OpenAIChatClient;
use self::groq::GroqChatClient;
use self::v0::V0ChatClient;
use self::mock::MockChatClient;

/// One adapter per vendor: turns a single message into a single reply.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send(
        &self,
        message: &str,
        api_key: &str,
        model: &str
    ) -> Result<String, ProviderError>;

    fn display_name(&self) -> &str;

    fn requires_credential(&self) -> bool {
        true
    }
}

/// POSTs `payload` and decodes the reply envelope.
///
/// A non-success status yields `Transport` with the raw body; a success body
/// that does not fit `R` yields `MalformedResponse`.
pub async fn post_json<P, R>(
    http: &HttpClient,
    url: &str,
    headers: HeaderMap,
    payload: &P
) -> Result<R, ProviderError>
    where P: Serialize + ?Sized, R: DeserializeOwned
{
    let resp = http.post(url).headers(headers).json(payload).send().await?;
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        info!("Provider call to {} failed with status {}", url, status.as_u16());
        return Err(ProviderError::Transport {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str::<R>(&body).map_err(|e| {
        debug!("Unexpected response envelope from {}: {}", url, e);
        ProviderError::MalformedResponse
    })
}

/// `Authorization: Bearer <key>`, shared by the OpenAI-compatible vendors.
pub fn bearer_headers(api_key: &str) -> Result<HeaderMap, ProviderError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| ProviderError::Transport {
            status: 0,
            body: format!("Invalid API key format: {}", e),
        })?
    );
    Ok(headers)
}

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    clients: HashMap<ProviderId, Arc<dyn ChatClient>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry where every provider is answered by the canned-response generator.
    pub fn mock(seed: Option<u64>, delay: Duration) -> Self {
        let mut registry = Self::new();
        for provider in ProviderId::ALL {
            let client = match seed {
                Some(seed) => MockChatClient::with_seed(provider.display_name(), seed, delay),
                None => MockChatClient::new(provider.display_name(), delay),
            };
            registry.register(provider, Arc::new(client));
        }
        registry
    }

    pub fn register(&mut self, provider: ProviderId, client: Arc<dyn ChatClient>) {
        self.clients.insert(provider, client);
    }

    pub fn get(&self, provider: ProviderId) -> Option<Arc<dyn ChatClient>> {
        self.clients.get(&provider).cloned()
    }

    pub fn providers(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.clients.keys().copied().collect();
        ids.sort();
        ids
    }
}

pub fn new_registry(config: &LlmConfig) -> Result<ProviderRegistry, reqwest::Error> {
    if config.mock {
        info!("Provider registry using mock responses");
        return Ok(ProviderRegistry::mock(config.mock_seed, config.mock_delay));
    }

    let http = HttpClient::builder().build()?;
    let mut registry = ProviderRegistry::new();
    for provider in ProviderId::ALL {
        let endpoint = config.endpoint_override(provider);
        let client: Arc<dyn ChatClient> = match provider {
            ProviderId::Claude => Arc::new(AnthropicChatClient::new(http.clone(), endpoint)),
            ProviderId::OpenAI => Arc::new(OpenAIChatClient::new(http.clone(), endpoint)),
            ProviderId::V0 => Arc::new(V0ChatClient::new(http.clone(), endpoint)),
            ProviderId::Groq => Arc::new(GroqChatClient::new(http.clone(), endpoint)),
        };
        registry.register(provider, client);
    }
    Ok(registry)
}
