use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };

use super::{ bearer_headers, post_json, ChatClient };
use crate::llm::error::ProviderError;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const MAX_TOKENS: u32 = 1000;

pub struct OpenAIChatClient {
    http: HttpClient,
    endpoint: String,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

impl OpenAIChatClient {
    pub fn new(http: HttpClient, endpoint: Option<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn send(
        &self,
        message: &str,
        api_key: &str,
        model: &str
    ) -> Result<String, ProviderError> {
        let req = OpenAIChatRequest {
            model,
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: message.to_string(),
            }],
            max_tokens: MAX_TOKENS,
        };

        let resp: OpenAIResponse = post_json(
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
        "ChatGPT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::test_server;
    use reqwest::StatusCode;

    #[tokio::test]
    async fn extracts_first_choice_content() {
        let server = test_server::spawn(
            StatusCode::OK,
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"}}]}"#
        ).await;
        let client = OpenAIChatClient::new(HttpClient::new(), Some(server.url.clone()));

        let reply = client.send("hello", "sk-test", "gpt-4").await.unwrap();

        assert_eq!(reply, "Hi!");
        assert_eq!(server.header("authorization").as_deref(), Some("Bearer sk-test"));
        let body = server.request().body;
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[tokio::test]
    async fn missing_message_field_is_malformed() {
        let server = test_server::spawn(StatusCode::OK, r#"{"choices":[{"index":0}]}"#).await;
        let client = OpenAIChatClient::new(HttpClient::new(), Some(server.url.clone()));

        let err = client.send("hello", "sk-test", "gpt-4").await.unwrap_err();

        assert!(matches!(err, ProviderError::MalformedResponse));
        assert_eq!(err.status(), 0);
    }
}
