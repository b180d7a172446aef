use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tokio::task::JoinError;

use agentflow_core::error::ApiError;
use agentflow_core::{AgentRequest, AgentResponse, DecisionRouter};

use crate::error::{AppError, require_text};
use crate::extract::{AppJson, RequestId};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/agent", post(run_agent))
}

/// Run the agent on a free-text message
///
/// Messages mentioning "anomaly" run the analytics check (and, when an
/// anomaly is found, the database context lookup). Anything else gets the
/// general echo response. The answer is always the same five-field
/// envelope, including when tools fail or the run breaks down.
#[utoipa::path(
    post,
    path = "/v1/agent",
    request_body = AgentRequest,
    responses(
        (status = 200, description = "Agent envelope", body = AgentResponse),
        (status = 422, description = "Missing or empty message", body = ApiError),
        (status = 429, description = "Rate limited")
    ),
    tag = "agent"
)]
pub async fn run_agent(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    AppJson(req): AppJson<AgentRequest>,
) -> Result<Json<AgentResponse>, AppError> {
    require_text(&req.message, "message")?;

    let envelope = execute_agent(
        state.router.clone(),
        state.agent_timeout,
        request_id,
        req,
    )
    .await;
    Ok(Json(envelope))
}

/// Run the router off the async executor, bounded by `timeout`.
///
/// Tool calls carry their own shorter bound inside the router; this
/// deadline covers the run as a whole. Panics and deadline overruns
/// become a failure envelope. A timed-out
/// run is abandoned, not cancelled: its blocking task finishes in the
/// background and the result is dropped.
pub(crate) async fn execute_agent(
    router: DecisionRouter,
    timeout: Duration,
    request_id: String,
    req: AgentRequest,
) -> AgentResponse {
    let run_request_id = request_id.clone();
    let run = tokio::task::spawn_blocking(move || {
        router.run(&req.message, &run_request_id, req.metadata.as_ref())
    });

    match tokio::time::timeout(timeout, run).await {
        Ok(Ok(envelope)) => envelope,
        Ok(Err(join_error)) => {
            let description = describe_join_error(join_error);
            tracing::error!(request_id = %request_id, error = %description, "Agent run failed");
            AgentResponse::failure(request_id, description)
        }
        Err(_) => {
            let description = format!(
                "agent run exceeded the {} ms deadline",
                timeout.as_millis()
            );
            tracing::error!(request_id = %request_id, "Agent run timed out");
            AgentResponse::failure(request_id, description)
        }
    }
}

fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return "agent run was cancelled".to_string();
    }
    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|m| (*m).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("agent run panicked: {message}")
}
