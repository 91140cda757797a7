use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{ConvertPayload, ExplainPayload};

pub const INVALID_SERVER_RESPONSE: &str = "Invalid response from server";

/// The conversion backend as seen from the client
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Where the backend is expected to run, for user-facing messages
    fn base_url(&self) -> &str;

    async fn translate(&self, source_code: &str, target_language: &str) -> AppResult<String>;

    /// `None` when the backend answered without an explanation
    async fn explain(&self, code: &str, language: Option<&str>) -> AppResult<Option<String>>;
}

/// Talks to the backend routes over HTTP
pub struct HttpBackendClient {
    client: Client,
    base_url: String,
}

impl HttpBackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("polycode/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: serde::Serialize + ?Sized>(&self, path: &str, body: &T) -> AppResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            tracing::error!("[Backend] Request to {} failed: {}", url, e);
            AppError::Transport(format!("Failed to reach {}: {}", url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .filter(|msg| !msg.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Server error: {}", status.as_u16()));
            let details = body.get("details").and_then(Value::as_str).map(str::to_string);

            return Err(AppError::Provider {
                status: status.as_u16(),
                message,
                details,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|_| AppError::MalformedResponse(INVALID_SERVER_RESPONSE.to_string()))
    }
}

fn non_empty_str(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn translate(&self, source_code: &str, target_language: &str) -> AppResult<String> {
        let payload = ConvertPayload {
            source_code: source_code.to_string(),
            target_language: target_language.to_string(),
        };

        let body = self.post("/convert", &payload).await?;
        non_empty_str(&body, "output")
            .ok_or_else(|| AppError::MalformedResponse(INVALID_SERVER_RESPONSE.to_string()))
    }

    async fn explain(&self, code: &str, language: Option<&str>) -> AppResult<Option<String>> {
        let payload = ExplainPayload {
            code: code.to_string(),
            language: language.map(str::to_string),
        };

        let body = self.post("/explain", &payload).await?;
        Ok(non_empty_str(&body, "explanation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let client = HttpBackendClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_non_empty_str() {
        let body = serde_json::json!({"output": "x", "empty": "", "number": 3});
        assert_eq!(non_empty_str(&body, "output").as_deref(), Some("x"));
        assert_eq!(non_empty_str(&body, "empty"), None);
        assert_eq!(non_empty_str(&body, "number"), None);
        assert_eq!(non_empty_str(&body, "missing"), None);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = HttpBackendClient::new(format!("http://127.0.0.1:{}", port));
        let result = client.translate("x = 1", "Go").await;
        assert!(matches!(result, Err(AppError::Transport(_))));
    }
}
