//! Loopback HTTP endpoint standing in for a vendor API in adapter tests.

use axum::{ http::{ HeaderMap, StatusCode }, Json, Router };
use serde_json::Value;
use std::sync::{ Arc, Mutex };

#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestServer {
    pub url: String,
    captured: Arc<Mutex<Option<CapturedRequest>>>,
}

impl TestServer {
    pub fn request(&self) -> CapturedRequest {
        self.captured.lock().unwrap().clone().expect("no request reached the test server")
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.request()
            .headers.get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    }
}

pub async fn spawn(status: StatusCode, body: &str) -> TestServer {
    let captured = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);
    let body = body.to_string();

    let app = Router::new().fallback(move |headers: HeaderMap, Json(payload): Json<Value>| {
        let sink = Arc::clone(&sink);
        let body = body.clone();
        async move {
            *sink.lock().unwrap() = Some(CapturedRequest { headers, body: payload });
            (status, body)
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        url: format!("http://{}/v1/endpoint", addr),
        captured,
    }
}
