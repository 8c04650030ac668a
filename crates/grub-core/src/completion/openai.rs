//! OpenAI-compatible chat-completions client.
//!
//! Works against the hosted OpenAI API and any server exposing the same
//! `POST {base_url}/chat/completions` contract (Ollama, vLLM, LocalAI).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{
    CompletionClient, CompletionConfig, CompletionRequest, CompletionResponse, UpstreamError,
};

/// Longest error body kept in an [`UpstreamError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible completion endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    config: CompletionConfig,
}

impl OpenAiClient {
    pub fn new(config: CompletionConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// One attempt, no retries.
    async fn send_once(&self, model: &str, prompt: &str) -> Result<String, UpstreamError> {
        let body = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self.http.post(self.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let body = truncate(&text, MAX_ERROR_BODY);
            warn!(status = status.as_u16(), body = %body, "completion service rejected request");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(UpstreamError::NoChoices)?;

        debug!(
            chars = choice.message.content.as_deref().map_or(0, str::len),
            finish_reason = ?choice.finish_reason,
            "received completion"
        );
        Ok(choice.message.content.unwrap_or_default())
    }

    fn transport_error(&self, e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Timeout(self.config.timeout)
        } else {
            UpstreamError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip_all, fields(model))]
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, UpstreamError> {
        let model = if request.model.trim().is_empty() {
            self.config.default_model.as_str()
        } else {
            request.model.as_str()
        };
        tracing::Span::current().record("model", model);

        let mut attempt = 0;
        loop {
            match self.send_once(model, &request.prompt).await {
                Ok(text) => return Ok(CompletionResponse { text }),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.config.backoff_for(attempt);
                    warn!(error = %e, attempt, ?delay, "completion call failed; retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;

    /// Stub server state: how many calls to fail before answering.
    #[derive(Clone)]
    struct Stub {
        calls: Arc<AtomicUsize>,
        fail_first: usize,
        fail_status: StatusCode,
    }

    async fn chat_handler(
        State(stub): State<Stub>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let n = stub.calls.fetch_add(1, Ordering::SeqCst);
        if n < stub.fail_first {
            return (stub.fail_status, Json(json!({"error": "try later"})));
        }
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let content = format!(
            "model={} auth={} prompt={}",
            body["model"].as_str().unwrap_or(""),
            auth,
            body["messages"][0]["content"].as_str().unwrap_or("")
        );
        (
            StatusCode::OK,
            Json(json!({
                "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
            })),
        )
    }

    async fn spawn_stub(fail_first: usize, fail_status: StatusCode) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let stub = Stub {
            calls: calls.clone(),
            fail_first,
            fail_status,
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(chat_handler))
            .with_state(stub);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v1"), calls)
    }

    fn config(base_url: &str) -> CompletionConfig {
        CompletionConfig {
            retry_backoff: Duration::from_millis(1),
            ..CompletionConfig::new(base_url, Some("sk-test".to_string()))
        }
    }

    #[tokio::test]
    async fn sends_prompt_and_returns_content() {
        let (url, calls) = spawn_stub(0, StatusCode::OK).await;
        let client = OpenAiClient::new(config(&url)).unwrap();

        let resp = client
            .complete(&CompletionRequest::new("gpt-4o", "plan my week"))
            .await
            .unwrap();

        assert_eq!(resp.text, "model=gpt-4o auth=Bearer sk-test prompt=plan my week");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_model_uses_default() {
        let (url, _) = spawn_stub(0, StatusCode::OK).await;
        let client = OpenAiClient::new(config(&url)).unwrap();

        let resp = client
            .complete(&CompletionRequest::new("", "hi"))
            .await
            .unwrap();
        assert!(resp.text.starts_with("model=gpt-4 "), "got: {}", resp.text);
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let (url, calls) = spawn_stub(usize::MAX, StatusCode::SERVICE_UNAVAILABLE).await;
        let client = OpenAiClient::new(config(&url)).unwrap();

        let err = client
            .complete(&CompletionRequest::new("gpt-4", "hi"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, UpstreamError::Status { status: 503, .. }),
            "got: {err}"
        );
        // Retries are disabled by default.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_when_configured() {
        let (url, calls) = spawn_stub(2, StatusCode::BAD_GATEWAY).await;
        let client = OpenAiClient::new(CompletionConfig {
            max_retries: 2,
            ..config(&url)
        })
        .unwrap();

        let resp = client
            .complete(&CompletionRequest::new("gpt-4", "hi"))
            .await
            .unwrap();
        assert!(resp.text.ends_with("prompt=hi"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let (url, calls) = spawn_stub(usize::MAX, StatusCode::UNAUTHORIZED).await;
        let client = OpenAiClient::new(CompletionConfig {
            max_retries: 3,
            ..config(&url)
        })
        .unwrap();

        let err = client
            .complete(&CompletionRequest::new("gpt-4", "hi"))
            .await
            .unwrap_err();
        match &err {
            UpstreamError::Status { status, body } => {
                assert_eq!(*status, 401);
                assert!(body.contains("try later"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(!err.to_string().contains("try later"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        // Bind then drop a listener to get a port nobody is serving.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpenAiClient::new(config(&format!("http://{addr}/v1"))).unwrap();
        let err = client
            .complete(&CompletionRequest::new("gpt-4", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)), "got: {err}");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }
}
