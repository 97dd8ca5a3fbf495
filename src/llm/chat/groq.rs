use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };

use super::{ bearer_headers, post_json, ChatClient };
use crate::llm::error::ProviderError;

const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Groq's OpenAI-compatible chat completions endpoint.
pub struct GroqChatClient {
    http: HttpClient,
    endpoint: String,
}

#[derive(Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: Vec<GroqMessage>,
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Deserialize)]
struct GroqChoice {
    message: GroqMessage,
}

impl GroqChatClient {
    pub fn new(http: HttpClient, endpoint: Option<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn send(
        &self,
        message: &str,
        api_key: &str,
        model: &str
    ) -> Result<String, ProviderError> {
        let req = GroqRequest {
            model,
            messages: vec![GroqMessage {
                role: "user".to_string(),
                content: message.to_string(),
            }],
        };
        debug!("Groq request to {} with model {}", self.endpoint, model);

        let resp: GroqResponse = post_json(
            &self.http,
            &self.endpoint,
            bearer_headers(api_key)?,
            &req
        ).await?;

        resp.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ProviderError::MalformedResponse)
    }

    fn display_name(&self) -> &str {
        "Groq"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::test_server;
    use reqwest::StatusCode;

    #[tokio::test]
    async fn sends_model_and_single_user_message() {
        let server = test_server::spawn(
            StatusCode::OK,
            r#"{"choices":[{"message":{"role":"assistant","content":"fast answer"}}]}"#
        ).await;
        let client = GroqChatClient::new(HttpClient::new(), Some(server.url.clone()));

        let reply = client.send("why is the sky blue", "gsk_test", "gemma2-9b-it").await.unwrap();

        assert_eq!(reply, "fast answer");
        assert_eq!(server.header("authorization").as_deref(), Some("Bearer gsk_test"));
        let body = server.request().body;
        assert_eq!(body["model"], "gemma2-9b-it");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body.get("max_tokens").is_none());
    }

    #[tokio::test]
    async fn rate_limit_is_a_transport_failure() {
        let server = test_server::spawn(StatusCode::TOO_MANY_REQUESTS, "rate limited").await;
        let client = GroqChatClient::new(HttpClient::new(), Some(server.url.clone()));

        let err = client.send("hello", "gsk_test", "gemma2-9b-it").await.unwrap_err();

        assert_eq!(err.to_string(), "API Error: 429 - rate limited");
    }

    #[tokio::test]
    async fn empty_choices_is_malformed() {
        let server = test_server::spawn(StatusCode::OK, r#"{"choices":[]}"#).await;
        let client = GroqChatClient::new(HttpClient::new(), Some(server.url.clone()));

        let err = client.send("hello", "gsk_test", "gemma2-9b-it").await.unwrap_err();

        assert!(matches!(err, ProviderError::MalformedResponse));
    }
}
