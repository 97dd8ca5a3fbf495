use axum::{
    extract::State,
    http::StatusCode,
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use log::{ error, info };
use serde::{ Deserialize, Serialize };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };

use crate::llm::ProviderId;
use crate::models::chat::{ ChatMessage, Conversation };
use crate::models::settings::Settings;
use crate::session::ChatSession;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub content: String,
}

#[derive(Serialize)]
struct ChatResponse {
    accepted: bool,
    message: Option<ChatMessage>,
    status: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    busy: bool,
}

#[derive(Serialize)]
struct ClearResponse {
    cleared: bool,
    conversation: Conversation,
}

#[derive(Deserialize)]
pub struct KeyRequest {
    pub provider: ProviderId,
    pub key: String,
}

#[derive(Serialize)]
struct KeysResponse {
    configured: Vec<ProviderId>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    session: Arc<ChatSession>,
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    error!("HTTP handler error: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })).into_response()
}

pub fn router(session: Arc<ChatSession>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/history", get(history_handler).delete(clear_handler))
        .route("/api/status", get(status_handler))
        .route("/api/settings", get(get_settings_handler).put(put_settings_handler))
        .route("/api/keys", get(get_keys_handler).put(put_key_handler))
        .layer(cors)
        .with_state(AppState { session })
}

pub async fn start_http_server(
    addr: SocketAddr,
    session: Arc<ChatSession>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
        e
    })?;
    info!("HTTP bridge listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(session).into_make_service()).await?;
    Ok(())
}

/// The exchange runs in its own task so a client that hangs up cannot cut it
/// off between the user message and the reply.
async fn chat_handler(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let session = Arc::clone(&state.session);
    let exchange = tokio::spawn(async move { session.submit(&req.content).await });
    match exchange.await {
        Ok(Ok(message)) =>
            Json(ChatResponse {
                accepted: message.is_some(),
                message,
                status: state.session.status(),
            }).into_response(),
        Ok(Err(e)) => internal_error(e),
        Err(e) => internal_error(e),
    }
}

async fn history_handler(State(state): State<AppState>) -> Json<Conversation> {
    Json(state.session.conversation().await)
}

async fn clear_handler(State(state): State<AppState>) -> Response {
    match state.session.clear().await {
        Ok(cleared) => {
            let code = if cleared { StatusCode::OK } else { StatusCode::CONFLICT };
            (
                code,
                Json(ClearResponse {
                    cleared,
                    conversation: state.session.conversation().await,
                }),
            ).into_response()
        }
        Err(e) => internal_error(e),
    }
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.session.status(),
        busy: state.session.is_busy(),
    })
}

async fn get_settings_handler(State(state): State<AppState>) -> Json<Settings> {
    Json(state.session.settings().settings().await)
}

async fn put_settings_handler(
    State(state): State<AppState>,
    Json(settings): Json<Settings>
) -> Response {
    match state.session.settings().save_settings(settings.clone()).await {
        Ok(()) => Json(settings).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse {
        configured: state.session.settings().credentials().await.configured(),
    })
}

async fn put_key_handler(State(state): State<AppState>, Json(req): Json<KeyRequest>) -> Response {
    let settings = state.session.settings();
    match settings.save_api_key(req.provider, &req.key).await {
        Ok(()) =>
            Json(KeysResponse {
                configured: settings.credentials().await.configured(),
            }).into_response(),
        Err(e) => internal_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::SettingsService;
    use crate::llm::chat::ProviderRegistry;
    use crate::store::{ KeyValueStore, MemoryStore };
    use serde_json::{ json, Value };
    use std::time::Duration;

    async fn serve() -> String {
        serve_with_delay(Duration::ZERO).await
    }

    async fn serve_with_delay(delay: Duration) -> String {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let settings = Arc::new(SettingsService::load(Arc::clone(&store)).await.unwrap());
        let session = Arc::new(
            ChatSession::new(ProviderRegistry::mock(Some(3), delay), settings, store)
        );
        session.load_history().await.unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(session)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn chat_round_trip_updates_history() {
        let base = serve().await;
        let http = reqwest::Client::new();

        let resp: Value = http
            .post(format!("{}/api/chat", base))
            .json(&json!({ "content": "hello" }))
            .send().await.unwrap()
            .json().await.unwrap();

        assert_eq!(resp["accepted"], true);
        assert_eq!(resp["message"]["role"], "assistant");
        assert!(resp["message"]["content"].as_str().unwrap().starts_with("Claude: "));
        assert_eq!(resp["status"], "Response received");

        let history: Value = http.get(format!("{}/api/history", base)).send().await.unwrap().json().await.unwrap();
        let roles: Vec<&str> = history.as_array().unwrap().iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["assistant", "user", "assistant"]);
    }

    #[tokio::test]
    async fn send_completes_after_client_hangs_up() {
        let base = serve_with_delay(Duration::from_millis(800)).await;
        let http = reqwest::Client::new();

        let hung_up = http
            .post(format!("{}/api/chat", base))
            .json(&json!({ "content": "hello" }))
            .timeout(Duration::from_millis(150))
            .send().await;
        assert!(hung_up.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let history: Value = http.get(format!("{}/api/history", base)).send().await.unwrap().json().await.unwrap();
        let roles: Vec<&str> = history.as_array().unwrap().iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["assistant", "user", "assistant"]);
        let status: Value = http.get(format!("{}/api/status", base)).send().await.unwrap().json().await.unwrap();
        assert_eq!(status["status"], "Response received");
        assert_eq!(status["busy"], false);
    }

    #[tokio::test]
    async fn blank_chat_is_not_accepted() {
        let base = serve().await;
        let resp: Value = reqwest::Client::new()
            .post(format!("{}/api/chat", base))
            .json(&json!({ "content": "   " }))
            .send().await.unwrap()
            .json().await.unwrap();

        assert_eq!(resp["accepted"], false);
        assert!(resp["message"].is_null());
    }

    #[tokio::test]
    async fn keys_endpoint_never_returns_secrets() {
        let base = serve().await;
        let http = reqwest::Client::new();

        let resp = http
            .put(format!("{}/api/keys", base))
            .json(&json!({ "provider": "groq", "key": "gsk_secret" }))
            .send().await.unwrap();
        assert!(resp.status().is_success());
        let body = resp.text().await.unwrap();

        assert!(!body.contains("gsk_secret"));
        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["configured"], json!(["groq"]));
    }

    #[tokio::test]
    async fn delete_history_clears_transcript() {
        let base = serve().await;
        let http = reqwest::Client::new();
        http.post(format!("{}/api/chat", base)).json(&json!({ "content": "hi" })).send().await.unwrap();

        let resp: Value = http.delete(format!("{}/api/history", base)).send().await.unwrap().json().await.unwrap();

        assert_eq!(resp["cleared"], true);
        assert_eq!(resp["conversation"].as_array().unwrap().len(), 1);
        let status: Value = http.get(format!("{}/api/status", base)).send().await.unwrap().json().await.unwrap();
        assert_eq!(status["status"], "Ready");
        assert_eq!(status["busy"], false);
    }

    #[tokio::test]
    async fn settings_can_be_replaced() {
        let base = serve().await;
        let http = reqwest::Client::new();

        http
            .put(format!("{}/api/settings", base))
            .json(&json!({ "theme": "dark", "fontSize": "large", "provider": "groq" }))
            .send().await.unwrap();
        let settings: Value = http.get(format!("{}/api/settings", base)).send().await.unwrap().json().await.unwrap();

        assert_eq!(settings["theme"], "dark");
        assert_eq!(settings["fontSize"], "large");
        assert_eq!(settings["provider"], "groq");
    }
}
