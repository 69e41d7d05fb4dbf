use crate::error::{ForgeError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Raw HTTP reply: status plus body text.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The single network seam of the generation client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse>;
}

/// `reqwest` transport. No timeout is configured; the call blocks until the
/// transport layer completes or gives up.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

/// Replays canned replies in order and counts invocations.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<TransportResponse>>>,
    requests: Mutex<Vec<serde_json::Value>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds every reply back by `delay`, like a slow service.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn reply(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Ok(TransportResponse::new(status, body)));
        self
    }

    pub fn fail(self, detail: impl Into<String>) -> Self {
        let detail: String = detail.into();
        self.push(Err(ForgeError::transport(None, detail)));
        self
    }

    /// Scripts an HTTP 200 whose first text part carries `inner_text`.
    pub fn reply_with_text(self, inner_text: &str) -> Self {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": inner_text }] },
                "finishReason": "STOP"
            }]
        });
        self.reply(200, body.to_string())
    }

    pub fn push(&self, reply: Result<TransportResponse>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<serde_json::Value> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(
        &self,
        _url: &str,
        _api_key: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(body.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(ForgeError::transport(None, "no scripted reply left")))
    }
}
