use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::oauth::SignInStage;

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of an outbound call to Google or another third-party API.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl UpstreamError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// HTTP status to report back to our own caller.
    pub fn inferred_status(&self) -> StatusCode {
        match self {
            UpstreamError::Status { status, .. } => match status {
                429 => StatusCode::TOO_MANY_REQUESTS,
                403 => StatusCode::FORBIDDEN,
                404 => StatusCode::NOT_FOUND,
                401 => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            UpstreamError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Sign-in failed after {stage}: {message}")]
    UpstreamAuth { stage: SignInStage, message: String },

    #[error("{error}: {details}")]
    Upstream {
        status: StatusCode,
        error: String,
        details: String,
        hint: Option<String>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{error}: {details}")]
    Validation { error: String, details: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    ValidatorError(#[from] validator::ValidationErrors),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, error_code) = match &self {
            AppError::Authentication(msg) => {
                tracing::debug!("Rejected unauthenticated request: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone(), "AUTHENTICATION_ERROR")
            }
            AppError::UpstreamAuth { stage, message } => {
                tracing::error!("Sign-in failed after {}: {}", stage, message);
                (StatusCode::BAD_GATEWAY, "Authentication failed".to_string(), "UPSTREAM_AUTH_ERROR")
            }
            AppError::Upstream { status, error, details, hint } => {
                tracing::error!("Upstream error ({}): {}: {}", status.as_u16(), error, details);
                let mut body = json!({
                    "error": error,
                    "details": details,
                });
                if let Some(hint) = hint {
                    body["hint"] = json!(hint);
                }
                return (*status, Json(body)).into_response();
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "CONFIGURATION_ERROR")
            }
            AppError::Validation { error, details } => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": error,
                        "details": details
                    })),
                )
                    .into_response();
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "BAD_REQUEST")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), "INTERNAL_ERROR")
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error".to_string(), "SERIALIZATION_ERROR")
            }
            AppError::ValidatorError(e) => {
                let validation_errors = e
                    .field_errors()
                    .iter()
                    .map(|(field, errors)| {
                        (
                            field.to_string(),
                            errors
                                .iter()
                                .map(|e| {
                                    e.message
                                        .as_ref()
                                        .map(|m| m.to_string())
                                        .unwrap_or_else(|| "Invalid value".to_string())
                                })
                                .collect::<Vec<_>>(),
                        )
                    })
                    .collect::<std::collections::HashMap<String, Vec<String>>>();

                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "Invalid form data",
                        "code": "VALIDATION_ERROR",
                        "details": validation_errors
                    })),
                )
                    .into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": error_code
        }));

        (status, body).into_response()
    }
}

// 便利函数，用于创建常见错误
impl AppError {
    pub fn unauthorized(msg: &str) -> Self {
        Self::Authentication(msg.to_string())
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::BadRequest(msg.to_string())
    }

    pub fn configuration(msg: &str) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// 400 with an `{error, details}` body.
    pub fn validation(error: &str, details: &str) -> Self {
        Self::Validation {
            error: error.to_string(),
            details: details.to_string(),
        }
    }

    /// Upstream data failure whose status follows the upstream one.
    pub fn upstream(error: &str, source: &UpstreamError, hint: Option<&str>) -> Self {
        Self::Upstream {
            status: source.inferred_status(),
            error: error.to_string(),
            details: source.to_string(),
            hint: hint.map(str::to_string),
        }
    }

    /// Upstream failure always reported as a 500.
    pub fn upstream_internal(error: &str, details: impl Into<String>) -> Self {
        Self::Upstream {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: error.to_string(),
            details: details.into(),
            hint: None,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inferred_status_passthrough() {
        assert_eq!(UpstreamError::status(429, "x").inferred_status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(UpstreamError::status(403, "x").inferred_status(), StatusCode::FORBIDDEN);
        assert_eq!(UpstreamError::status(404, "x").inferred_status(), StatusCode::NOT_FOUND);
        assert_eq!(UpstreamError::status(401, "x").inferred_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(UpstreamError::status(400, "x").inferred_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(UpstreamError::status(503, "x").inferred_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_error_response() {
        let source = UpstreamError::status(404, "GA4 property not found. Please check the property ID.");
        let response = AppError::upstream("Failed to fetch GA4 analytics data", &source, Some("check it")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_authentication_is_401() {
        let response = AppError::unauthorized("Not authenticated").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_validation_body_has_details() {
        let response = AppError::validation("Missing required parameters", "propertyId is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Missing required parameters", "details": "propertyId is required" }));
    }

    #[test]
    fn test_configuration_is_500() {
        let response = AppError::configuration("OpenAI API key not configured").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
