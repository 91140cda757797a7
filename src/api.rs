//! HTTP surface of the conversion backend
//!
//! ## Architecture
//!
//! - `routes`: handlers for `/convert`, `/explain` and `/health`
//! - `error`: maps `AppError` onto status codes and JSON error bodies
//!
//! The router itself carries the cross-cutting layers: permissive CORS, a
//! 10 MB body limit and a panic catcher answering with a JSON 500.

pub mod error;
pub mod routes;

use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::core::features::completion::{CompletionProxy, HttpCompletionProvider};
use crate::shared::error::AppResult;
use crate::shared::settings::ServerSettings;
use error::ApiError;

pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ApiState {
    pub proxy: Arc<CompletionProxy>,
}

impl ApiState {
    pub fn new(proxy: Arc<CompletionProxy>) -> Self {
        Self { proxy }
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    tracing::error!("[API] Unhandled error: {}", message);
    ApiError::unexpected(message).into_response()
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/convert", post(routes::convert).fallback(routes::not_found))
        .route("/explain", post(routes::explain).fallback(routes::not_found))
        .route("/health", get(routes::health).fallback(routes::not_found))
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `state` on an already bound listener until `shutdown` resolves
pub async fn run<F>(listener: TcpListener, state: ApiState, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Start the backend with the real completion provider
pub async fn serve(settings: ServerSettings) -> AppResult<()> {
    let provider = Arc::new(HttpCompletionProvider::from_settings(&settings));
    let proxy = Arc::new(CompletionProxy::new(provider, settings.model.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Code converter server started");
    tracing::info!("Server running on: http://localhost:{}", settings.port);
    tracing::info!("Model: {}", settings.model);
    tracing::info!("API key configured: Yes");

    run(listener, ApiState::new(proxy), shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down server...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::completion::provider::{ChatCompletionRequest, CompletionProvider};
    use crate::shared::error::AppError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Provider with a fixed reply
    struct FixedProvider(Result<String, AppError>);

    #[async_trait]
    impl CompletionProvider for FixedProvider {
        async fn complete(&self, _request: &ChatCompletionRequest) -> AppResult<String> {
            self.0.clone()
        }
    }

    fn app(reply: Result<String, AppError>) -> Router {
        let proxy = CompletionProxy::new(Arc::new(FixedProvider(reply)), "test-model");
        router(ApiState::new(Arc::new(proxy)))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_convert_success() {
        let app = app(Ok("```javascript\nconsole.log(1)\n```".to_string()));
        let (status, body) = send(
            app,
            "POST",
            "/convert",
            Some(r#"{"sourceCode":"print(1)","targetLanguage":"JavaScript"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"output": "console.log(1)"}));
    }

    #[tokio::test]
    async fn test_convert_validation_messages() {
        let cases = [
            (r#"{"targetLanguage":"Go"}"#, "Missing required fields: sourceCode and targetLanguage are required"),
            (r#"{"sourceCode":"","targetLanguage":"Go"}"#, "Missing required fields: sourceCode and targetLanguage are required"),
            (r#"{"sourceCode":5,"targetLanguage":"Go"}"#, "Invalid data types: sourceCode and targetLanguage must be strings"),
            (r#"{"sourceCode":"   ","targetLanguage":"Go"}"#, "sourceCode cannot be empty"),
        ];

        for (payload, message) in cases {
            let (status, body) = send(app(Ok("x".to_string())), "POST", "/convert", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
            assert_eq!(body["error"], message, "payload {}", payload);
        }
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let (status, body) = send(app(Ok("x".to_string())), "POST", "/convert", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON body");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_provider_error_is_mirrored() {
        let app = app(Err(AppError::Provider {
            status: 401,
            message: "Provider API error: Unauthorized".to_string(),
            details: Some("bad key".to_string()),
        }));
        let (status, body) = send(
            app,
            "POST",
            "/convert",
            Some(r#"{"sourceCode":"x","targetLanguage":"Go"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Provider API error: Unauthorized");
        assert_eq!(body["details"], "bad key");
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let app = app(Err(AppError::Transport("connection refused".to_string())));
        let (status, body) = send(app, "POST", "/explain", Some(r#"{"code":"x"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error during explanation");
        assert_eq!(body["message"], "connection refused");
    }

    #[tokio::test]
    async fn test_explain_routes() {
        let (status, body) = send(app(Ok("x".to_string())), "POST", "/explain", Some(r#"{"language":"Go"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required field: code");

        let (status, body) = send(
            app(Ok("  It adds numbers.  ".to_string())),
            "POST",
            "/explain",
            Some(r#"{"code":"a + b","language":"Python"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"explanation": "It adds numbers."}));
    }

    #[tokio::test]
    async fn test_explain_rejects_non_string_fields() {
        for payload in [
            r#"{"code":5}"#,
            r#"{"code":[1],"language":7}"#,
            r#"{"code":"a + b","language":7}"#,
            r#"{"code":"a + b","language":["Go"]}"#,
        ] {
            let (status, body) = send(app(Ok("x".to_string())), "POST", "/explain", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
            assert_eq!(
                body["error"], "Invalid data types: code and language must be strings",
                "payload {}", payload
            );
        }

        let (status, _) = send(
            app(Ok("ok".to_string())),
            "POST",
            "/explain",
            Some(r#"{"code":"a + b","language":null}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_body_without_json_content_type_reads_as_empty() {
        let request = Request::builder()
            .method("POST")
            .uri("/convert")
            .header("content-type", "text/plain")
            .body(Body::from(r#"{"sourceCode":"x","targetLanguage":"Go"}"#))
            .unwrap();
        let response = app(Ok("x".to_string())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body["error"],
            "Missing required fields: sourceCode and targetLanguage are required"
        );

        let (status, body) = send(app(Ok("x".to_string())), "POST", "/explain", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required field: code");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(Ok("x".to_string())), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "test-model");
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = send(app(Ok("x".to_string())), "GET", "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Endpoint not found"}));
    }

    #[tokio::test]
    async fn test_wrong_method_is_not_found() {
        for (method, uri) in [("GET", "/convert"), ("GET", "/explain"), ("POST", "/health"), ("DELETE", "/convert")] {
            let (status, body) = send(app(Ok("x".to_string())), method, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
            assert_eq!(body, json!({"error": "Endpoint not found"}), "{} {}", method, uri);
        }
    }
}
