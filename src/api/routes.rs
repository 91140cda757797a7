use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::error::{ApiError, Operation};
use super::ApiState;
use crate::shared::types::{ConvertResponse, ExplainResponse, HealthResponse};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// JavaScript-style truthiness of a request field
fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

/// Parsed request body; a request without a JSON content type reads as `{}`
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(Value::Object(Map::new())),
        Err(rejection) => {
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            tracing::warn!("[API] Rejected request body: {}", rejection.body_text());
            Err(ApiError::invalid_json(status, rejection.body_text()))
        }
    }
}

/// POST /convert
pub async fn convert(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ConvertResponse> {
    let body = json_body(payload)?;
    let source_code = body.get("sourceCode");
    let target_language = body.get("targetLanguage");

    if is_falsy(source_code) || is_falsy(target_language) {
        return Err(ApiError::bad_request(
            "Missing required fields: sourceCode and targetLanguage are required",
        ));
    }

    let (Some(source_code), Some(target_language)) = (
        source_code.and_then(Value::as_str),
        target_language.and_then(Value::as_str),
    ) else {
        return Err(ApiError::bad_request(
            "Invalid data types: sourceCode and targetLanguage must be strings",
        ));
    };

    if source_code.trim().is_empty() {
        return Err(ApiError::bad_request("sourceCode cannot be empty"));
    }

    let output = state
        .proxy
        .translate(source_code, target_language)
        .await
        .map_err(|e| ApiError::from_app(e, Operation::Convert))?;

    Ok(Json(ConvertResponse { output }))
}

/// POST /explain
pub async fn explain(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ExplainResponse> {
    let body = json_body(payload)?;
    let code = body.get("code");

    if is_falsy(code) {
        return Err(ApiError::bad_request("Missing required field: code"));
    }

    let Some(code) = code.and_then(Value::as_str) else {
        return Err(ApiError::bad_request(
            "Invalid data types: code and language must be strings",
        ));
    };
    let language = match body.get("language") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            return Err(ApiError::bad_request(
                "Invalid data types: code and language must be strings",
            ))
        }
    };

    let explanation = state
        .proxy
        .explain(code, language)
        .await
        .map_err(|e| ApiError::from_app(e, Operation::Explain))?;

    Ok(Json(ExplainResponse { explanation }))
}

/// GET /health
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        model: state.proxy.model().to_string(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_falsy_values() {
        assert!(is_falsy(None));
        assert!(is_falsy(Some(&json!(null))));
        assert!(is_falsy(Some(&json!(""))));
        assert!(is_falsy(Some(&json!(false))));
        assert!(is_falsy(Some(&json!(0))));
        assert!(!is_falsy(Some(&json!(" "))));
        assert!(!is_falsy(Some(&json!(42))));
        assert!(!is_falsy(Some(&json!([]))));
    }
}
