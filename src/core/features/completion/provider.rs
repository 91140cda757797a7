use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::ServerSettings;

/// Message used whenever a completion payload lacks `choices[0].message.content`
pub const MALFORMED_COMPLETION: &str = "Invalid response from completion provider";

// -- Strict Serde Structs for the chat-completions protocol --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, or a malformed-response error
    pub fn into_content(self) -> AppResult<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| AppError::MalformedResponse(MALFORMED_COMPLETION.to_string()))
    }
}

/// Opaque text-completion service
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one request and return the raw content of the first choice
    async fn complete(&self, request: &ChatCompletionRequest) -> AppResult<String>;
}

/// OpenAI-compatible chat-completions endpoint reached over HTTPS with a bearer key
pub struct HttpCompletionProvider {
    client: Client,
    url: String,
    api_key: String,
}

impl HttpCompletionProvider {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("polycode/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self::new(settings.provider_url.clone(), settings.api_key.clone())
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, request: &ChatCompletionRequest) -> AppResult<String> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("[Completion] Provider connection failed: {}", e);
                AppError::Transport(format!("Completion provider connection failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            tracing::error!("[Completion] Provider API error: {} {}", status.as_u16(), details);
            return Err(AppError::Provider {
                status: status.as_u16(),
                message: format!(
                    "Provider API error: {}",
                    status.canonical_reason().unwrap_or("Unknown status")
                ),
                details: Some(details),
            });
        }

        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("[Completion] Invalid API response structure: {}", e);
            AppError::MalformedResponse(MALFORMED_COMPLETION.to_string())
        })?;

        parsed.into_content().inspect_err(|_| {
            tracing::error!("[Completion] Response without choices[0].message.content: {}", body);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Serve a chat-completions stand-in on an ephemeral port
    async fn stub_provider() -> String {
        async fn completions(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let content = format!("{} {} {}", auth, body["model"], body["max_tokens"]);
            Json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]}))
        }

        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .route(
                "/limited",
                post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
            )
            .route("/garbage", post(|| async { (StatusCode::OK, "<html>oops</html>") }))
            .route("/empty", post(|| async { Json(json!({"choices": []})) }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        base
    }

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "llama-3.3-70b".to_string(),
            messages: vec![ChatMessage::user("hello")],
            temperature: 0.2,
            max_tokens: 1000,
        }
    }

    #[tokio::test]
    async fn test_http_provider_sends_bearer_key() {
        let base = stub_provider().await;
        let provider = HttpCompletionProvider::new(format!("{}/v1/chat/completions", base), "test-key");

        let content = provider.complete(&request()).await.unwrap();
        assert_eq!(content, "Bearer test-key \"llama-3.3-70b\" 1000");
    }

    #[tokio::test]
    async fn test_http_provider_mirrors_error_status() {
        let base = stub_provider().await;
        let provider = HttpCompletionProvider::new(format!("{}/limited", base), "k");

        assert_eq!(
            provider.complete(&request()).await,
            Err(AppError::Provider {
                status: 429,
                message: "Provider API error: Too Many Requests".to_string(),
                details: Some("slow down".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_http_provider_malformed_bodies() {
        let base = stub_provider().await;

        for path in ["/garbage", "/empty"] {
            let provider = HttpCompletionProvider::new(format!("{}{}", base, path), "k");
            assert_eq!(
                provider.complete(&request()).await,
                Err(AppError::MalformedResponse(MALFORMED_COMPLETION.to_string())),
                "path {}",
                path
            );
        }
    }

    #[tokio::test]
    async fn test_http_provider_unreachable() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let provider = HttpCompletionProvider::new(format!("http://127.0.0.1:{}/v1", port), "k");

        assert!(matches!(provider.complete(&request()).await, Err(AppError::Transport(_))));
    }

    #[test]
    fn test_request_wire_shape() {
        let request = ChatCompletionRequest {
            model: "llama-3.3-70b".to_string(),
            messages: vec![ChatMessage::user("hello")],
            temperature: 0.2,
            max_tokens: 4000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama-3.3-70b");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["max_tokens"], 4000);
    }

    #[test]
    fn test_content_extracted_from_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"x = 1"}},{"message":{"content":"other"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_content().unwrap(), "x = 1");
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        for body in [
            r#"{}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{"role":"assistant"}}]}"#,
        ] {
            let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
            assert_eq!(
                parsed.into_content(),
                Err(AppError::MalformedResponse(MALFORMED_COMPLETION.to_string()))
            );
        }
    }
}
