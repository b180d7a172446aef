use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use agentflow_core::error::{self, ApiError};

use crate::inference::InferenceError;

/// Request-level failures that convert to structured API responses.
///
/// Agent runs never surface here; they always answer with an envelope.
#[derive(Debug)]
pub enum AppError {
    /// Validation error (422)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Model-serving endpoint failed or answered unusably (502)
    Upstream(InferenceError),
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::Upstream(err) => {
                tracing::error!(error = %err, "Inference upstream error");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiError {
                        error: error::codes::UPSTREAM_FAILED.to_string(),
                        message: "The inference service could not complete the request".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: Some(
                            "Check that INFERENCE_BASE_URL points at a running OpenAI-compatible server."
                                .to_string(),
                        ),
                    },
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        AppError::Upstream(err)
    }
}

/// Reject a missing or blank required text field.
pub fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation {
            message: format!("{field} must not be empty"),
            field: Some(field.to_string()),
            received: Some(serde_json::Value::String(value.to_string())),
            docs_hint: Some(format!("Provide a non-empty `{field}` string.")),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        for value in ["", "   ", "\n\t"] {
            let err = require_text(value, "message").expect_err("blank text must be rejected");
            assert!(matches!(err, AppError::Validation { ref field, .. } if field.as_deref() == Some("message")));
        }
    }

    #[test]
    fn non_blank_text_is_accepted() {
        require_text("Check for anomaly", "message").expect("text should pass");
    }

    #[test]
    fn validation_maps_to_unprocessable_entity() {
        let response = AppError::Validation {
            message: "bad".to_string(),
            field: None,
            received: None,
            docs_hint: None,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn upstream_maps_to_bad_gateway() {
        let response = AppError::Upstream(InferenceError::MissingContent).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
