use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use agentflow_core::DecisionRouter;
use agentflow_core::fixtures::ToolFixtures;

mod config;
mod error;
mod extract;
mod inference;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AgentFlow API",
        version = "0.1.0",
        description = "Routes free-text agent requests to analytics workflows and always answers with the same response envelope."
    ),
    paths(
        routes::health::health_check,
        routes::agent::run_agent,
        routes::analyze::analyze_file,
        routes::prompt::prompt,
    ),
    components(schemas(
        HealthResponse,
        agentflow_core::error::ApiError,
        agentflow_core::agent::ActionKind,
        agentflow_core::agent::ActionEntry,
        agentflow_core::agent::AgentRequest,
        agentflow_core::agent::AgentResponse,
        routes::analyze::AnalyzeUpload,
        routes::analyze::AnalyzeResponse,
        routes::analyze::DocumentType,
        routes::analyze::DetectedFile,
        routes::analyze::TabularReports,
        routes::analyze::AnomalyReport,
        routes::analyze::DedupReport,
        routes::analyze::DocumentReports,
        routes::analyze::PolicyCheck,
        routes::prompt::PromptRequest,
        routes::prompt::PromptResponse,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Full application: routes, per-route rate limits and the shared layers.
fn build_app(app_state: state::AppState, config: &config::AppConfig) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::agent::router().layer(middleware::rate_limit::agent_layer()))
        .merge(routes::analyze::router().layer(middleware::rate_limit::agent_layer()))
        .merge(routes::prompt::router().layer(middleware::rate_limit::prompt_layer()))
        .layer(axum::middleware::from_fn(middleware::security_headers::apply))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(
                    middleware::request_id::MakeRequestUuidV7,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(middleware::request_id::http_span),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .option_layer(config.require_https.then(|| {
                    axum::middleware::from_fn(middleware::https::require_https)
                }))
                .layer(middleware::cors::build_cors_layer(&config.cors_origins)),
        )
        .with_state(app_state)
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "agentflow_api=debug,agentflow_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = config::AppConfig::from_env();

    let fixtures = match &config.fixtures_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading tool fixtures");
            ToolFixtures::load(path).expect("Failed to load AGENTFLOW_FIXTURES_PATH")
        }
        None => {
            tracing::info!("No AGENTFLOW_FIXTURES_PATH set, using built-in sample tool data");
            ToolFixtures::sample()
        }
    };
    let fixtures = Arc::new(fixtures);

    let inference = inference::InferenceClient::new(&config.inference)
        .expect("INFERENCE_BASE_URL must be a valid URL");

    let app_state = state::AppState {
        router: DecisionRouter::new(fixtures.clone(), fixtures)
            .with_tool_timeout(config.tool_timeout),
        inference,
        agent_timeout: config.agent_timeout,
    };

    let app = build_app(app_state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("AgentFlow API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
