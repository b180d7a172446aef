use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Structured error response returned by the HTTP layer.
/// Agent requests that reach the router never produce one of these; they
/// always answer with an envelope. Only request-level rejections do.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "upstream_failed")
    pub error: String,
    /// Human/agent-readable description of what went wrong
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const UPSTREAM_FAILED: &str = "upstream_failed";
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const RATE_LIMITED: &str = "rate_limited";
}

/// Failure signal from an external lookup tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool itself reported a failure.
    #[error("{0}")]
    Failed(String),
    /// The tool answered, but not with a record we can use.
    #[error("malformed {tool} result: {reason}")]
    Malformed { tool: &'static str, reason: String },
    #[error("no data available for {0}")]
    NoData(NaiveDate),
    #[error("tool panicked: {0}")]
    Panicked(String),
    #[error("timed out after {} ms", .0.as_millis())]
    TimedOut(std::time::Duration),
}

/// Failure while loading tool fixture data.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid fixture file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
