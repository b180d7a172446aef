use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde_json::{Map, Value};
use uuid::Uuid;

use agentflow_core::fixtures::ToolFixtures;
use agentflow_core::{AgentResponse, DecisionRouter};

use crate::util::{exit_error, parse_json_object, print_json};

#[derive(Args)]
pub struct LocalArgs {
    /// Free-text request (e.g. "check for anomaly yesterday")
    pub message: String,

    /// Tool fixtures JSON file (defaults to the built-in sample data)
    #[arg(long, env = "AGENTFLOW_FIXTURES_PATH")]
    pub fixtures: Option<PathBuf>,

    /// Request metadata as a JSON object
    #[arg(long)]
    pub metadata: Option<String>,

    /// Bound on each tool call, in milliseconds
    #[arg(long, env = "AGENTFLOW_TOOL_TIMEOUT_MS", default_value_t = 5000)]
    pub tool_timeout_ms: u64,

    /// Skip pretty-printing (raw JSON for piping)
    #[arg(long)]
    pub raw: bool,
}

/// Run the decision router in-process. No server is involved.
pub fn run(args: LocalArgs) -> i32 {
    let fixtures = match &args.fixtures {
        Some(path) => ToolFixtures::load(path).unwrap_or_else(|e| {
            exit_error(
                &e.to_string(),
                Some("Fixtures are a JSON object with `analytics` and `database` maps keyed by date"),
            )
        }),
        None => ToolFixtures::sample(),
    };
    let metadata = args.metadata.as_deref().map(|raw| {
        parse_json_object(raw, "--metadata").unwrap_or_else(|e| exit_error(&e, None))
    });

    let envelope = run_local(
        fixtures,
        Duration::from_millis(args.tool_timeout_ms),
        &args.message,
        &Uuid::now_v7().to_string(),
        metadata.as_ref(),
    );
    let value = serde_json::to_value(&envelope).unwrap_or(Value::Null);
    print_json(&value, args.raw, false);
    0
}

pub fn run_local(
    fixtures: ToolFixtures,
    tool_timeout: Duration,
    message: &str,
    request_id: &str,
    metadata: Option<&Map<String, Value>>,
) -> AgentResponse {
    let fixtures = Arc::new(fixtures);
    let router =
        DecisionRouter::new(fixtures.clone(), fixtures).with_tool_timeout(tool_timeout);
    tracing::debug!(request_id, "Running decision router locally");
    router.run(message, request_id, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUND: Duration = Duration::from_secs(2);

    #[test]
    fn test_general_message_runs_locally() {
        let envelope = run_local(ToolFixtures::sample(), BOUND, "status please", "local-1", None);
        assert_eq!(envelope.request_id, "local-1");
        assert_eq!(envelope.response, "Agent processed: status please");
        assert!(!envelope.anomaly_detected);
        assert_eq!(envelope.actions_taken[0].label(), "route:general");
    }

    #[test]
    fn test_anomaly_message_without_fixture_for_date() {
        let empty = ToolFixtures::from_json(r#"{"analytics": {}, "database": {}}"#).unwrap();
        let envelope = run_local(empty, BOUND, "any anomaly?", "local-2", None);
        assert_eq!(envelope.response, "Analytics query failed.");
        assert!(!envelope.anomaly_detected);
        assert_eq!(envelope.warnings.len(), 1);
        assert!(envelope.warnings[0].starts_with("analytics_query failed: "));
    }
}
