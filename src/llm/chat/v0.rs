use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };

use super::{ bearer_headers, post_json, ChatClient };
use crate::llm::error::ProviderError;

const DEFAULT_ENDPOINT: &str = "https://api.v0.dev/generate";

/// Placeholder v0.dev endpoint: prompt in, `result` out. The model id is not sent.
pub struct V0ChatClient {
    http: HttpClient,
    endpoint: String,
}

#[derive(Serialize)]
struct V0Request<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct V0Response {
    result: String,
}

impl V0ChatClient {
    pub fn new(http: HttpClient, endpoint: Option<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }
}

#[async_trait]
impl ChatClient for V0ChatClient {
    async fn send(
        &self,
        message: &str,
        api_key: &str,
        _model: &str
    ) -> Result<String, ProviderError> {
        let resp: V0Response = post_json(
            &self.http,
            &self.endpoint,
            bearer_headers(api_key)?,
            &(V0Request { prompt: message })
        ).await?;
        Ok(resp.result)
    }

    fn display_name(&self) -> &str {
        "v0.dev"
    }
}
