use async_trait::async_trait;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderName, HeaderValue } };
use serde::{ Deserialize, Serialize };

use super::{ post_json, ChatClient };
use crate::llm::error::ProviderError;

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1000;

pub struct AnthropicChatClient {
    http: HttpClient,
    endpoint: String,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    text: String,
}

impl AnthropicChatClient {
    pub fn new(http: HttpClient, endpoint: Option<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }

    fn headers(api_key: &str) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|e| ProviderError::Transport {
                status: 0,
                body: format!("Invalid API key format: {}", e),
            })?
        );
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(API_VERSION)
        );
        Ok(headers)
    }
}

#[async_trait]
impl ChatClient for AnthropicChatClient {
    async fn send(
        &self,
        message: &str,
        api_key: &str,
        model: &str
    ) -> Result<String, ProviderError> {
        let req = AnthropicRequest {
            model,
            max_tokens: MAX_TOKENS,
            messages: vec![AnthropicMessage { role: "user", content: message }],
        };

        let resp: AnthropicResponse = post_json(
            &self.http,
            &self.endpoint,
            Self::headers(api_key)?,
            &req
        ).await?;

        resp.content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or(ProviderError::MalformedResponse)
    }

    fn display_name(&self) -> &str {
        "Claude"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::test_server;
    use reqwest::StatusCode;

    #[tokio::test]
    async fn sends_messages_envelope_with_api_key_headers() {
        let server = test_server::spawn(
            StatusCode::OK,
            r#"{"id":"msg_1","content":[{"type":"text","text":"Hi!"}]}"#
        ).await;
        let client = AnthropicChatClient::new(HttpClient::new(), Some(server.url.clone()));

        let reply = client.send("hello", "sk-ant-test", "claude-3-opus-20240229").await.unwrap();

        assert_eq!(reply, "Hi!");
        assert_eq!(server.header("x-api-key").as_deref(), Some("sk-ant-test"));
        assert_eq!(server.header("anthropic-version").as_deref(), Some("2023-06-01"));
        assert!(server.header("authorization").is_none());
        let body = server.request().body;
        assert_eq!(body["model"], "claude-3-opus-20240229");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[tokio::test]
    async fn empty_content_is_malformed() {
        let server = test_server::spawn(StatusCode::OK, r#"{"content":[]}"#).await;
        let client = AnthropicChatClient::new(HttpClient::new(), Some(server.url.clone()));

        let err = client.send("hello", "key", "claude").await.unwrap_err();

        assert!(matches!(err, ProviderError::MalformedResponse));
    }

    #[tokio::test]
    async fn error_status_keeps_vendor_body() {
        let body = r#"{"type":"error","error":{"type":"authentication_error"}}"#;
        let server = test_server::spawn(StatusCode::UNAUTHORIZED, body).await;
        let client = AnthropicChatClient::new(HttpClient::new(), Some(server.url.clone()));

        let err = client.send("hello", "bad", "claude").await.unwrap_err();

        assert_eq!(err.status(), 401);
        assert_eq!(err.body(), body);
    }
}
