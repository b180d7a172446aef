use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use agentflow_core::error::ApiError;

use crate::error::{AppError, require_text};
use crate::extract::{AppJson, RequestId};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/agent/prompt", post(prompt))
}

pub const ANALYST_SYSTEM_PROMPT: &str = "You are AgentFlow, an operations analyst assistant. \
Answer the user's request concisely using only the information provided. \
If the provided context is insufficient, say exactly what is missing instead of guessing.";

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PromptRequest {
    /// The user's request, must not be empty
    pub message: String,
    /// Structured context to ground the answer (e.g. an agent envelope)
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub context: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PromptResponse {
    pub request_id: String,
    pub model: String,
    /// Text generated by the model
    pub output: String,
}

/// Template a prompt and send it to the inference service
///
/// Wraps the message (and optional context) in the analyst prompt
/// template and returns the model's text. Not routed through the decision
/// router.
#[utoipa::path(
    post,
    path = "/v1/agent/prompt",
    request_body = PromptRequest,
    responses(
        (status = 200, description = "Generated text", body = PromptResponse),
        (status = 422, description = "Missing or empty message", body = ApiError),
        (status = 502, description = "Inference service failed", body = ApiError)
    ),
    tag = "agent"
)]
pub async fn prompt(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    AppJson(req): AppJson<PromptRequest>,
) -> Result<Json<PromptResponse>, AppError> {
    require_text(&req.message, "message")?;

    let user_prompt = build_user_prompt(&req.message, req.context.as_ref());
    let output = state
        .inference
        .complete(ANALYST_SYSTEM_PROMPT, &user_prompt)
        .await?;

    Ok(Json(PromptResponse {
        request_id,
        model: state.inference.model().to_string(),
        output,
    }))
}

/// User prompt: the request, followed by the context as pretty JSON when
/// any was supplied.
pub fn build_user_prompt(message: &str, context: Option<&Map<String, Value>>) -> String {
    let mut prompt = format!("Request:\n{}", message.trim());
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        let rendered = serde_json::to_string_pretty(context).unwrap_or_else(|_| "{}".to_string());
        prompt.push_str("\n\nContext (JSON):\n");
        prompt.push_str(&rendered);
    }
    prompt
}
