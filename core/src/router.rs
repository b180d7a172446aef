//! Decision router: classifies a message, runs the matching branch and
//! assembles the response envelope.
//!
//! Routing is a keyword heuristic, not an intent classifier. Routes are
//! checked in priority order and the first predicate that matches wins;
//! [`Route::General`] is the fallback.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::agent::{ActionEntry, AgentResponse};
use crate::dates::{Clock, SystemClock, resolve_target_date};
use crate::invoke::{DEFAULT_TOOL_TIMEOUT, ToolOutcome, invoke};
use crate::tools::{
    ANALYTICS_TOOL, AnalyticsResult, AnalyticsTool, DATABASE_TOOL, DatabaseContext, DatabaseTool,
};
use crate::trail::ActionTrail;

pub const ANALYTICS_FAILED_RESPONSE: &str = "Analytics query failed.";
pub const GENERAL_RESPONSE_PREFIX: &str = "Agent processed: ";
pub const FINALIZE_ACTION: &str = "finalize";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    AnomalyCheck,
    General,
}

/// Routes with a predicate, highest priority first.
const ROUTES: &[(Route, fn(&str) -> bool)] = &[(Route::AnomalyCheck, mentions_anomaly)];

impl Route {
    pub fn name(self) -> &'static str {
        match self {
            Self::AnomalyCheck => "anomaly_check",
            Self::General => "general",
        }
    }

    pub fn classify(message: &str) -> Self {
        ROUTES
            .iter()
            .find(|(_, matches)| matches(message))
            .map(|(route, _)| *route)
            .unwrap_or(Self::General)
    }
}

fn mentions_anomaly(message: &str) -> bool {
    message.to_lowercase().contains("anomaly")
}

/// What a branch decided. `completed` is false when the branch
/// short-circuited and the request ends without a finalize marker.
struct BranchOutcome {
    response: String,
    anomaly_detected: bool,
    completed: bool,
}

/// Per-request mutable state. Owned by a single `run` call.
#[derive(Default)]
struct RunState {
    trail: ActionTrail,
    warnings: Vec<String>,
}

impl RunState {
    fn record<T>(&mut self, outcome: ToolOutcome<T>) -> Option<T> {
        self.trail.push(outcome.entry);
        if let Some(warning) = outcome.warning {
            self.warnings.push(warning);
        }
        outcome.result
    }
}

/// Stateless across requests: every `run` owns its own trail and warnings,
/// so one router can serve concurrent requests.
#[derive(Clone)]
pub struct DecisionRouter {
    analytics: Arc<dyn AnalyticsTool>,
    database: Arc<dyn DatabaseTool>,
    clock: Arc<dyn Clock>,
    tool_timeout: Duration,
}

impl DecisionRouter {
    pub fn new(analytics: Arc<dyn AnalyticsTool>, database: Arc<dyn DatabaseTool>) -> Self {
        Self {
            analytics,
            database,
            clock: Arc::new(SystemClock),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bound on each individual tool call. An overrun fails that call
    /// only; the branch's failure policy decides what happens next.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Process one message. Never fails: every outcome, including tool
    /// failures, is expressed in the returned envelope.
    pub fn run(
        &self,
        message: &str,
        request_id: &str,
        metadata: Option<&Map<String, Value>>,
    ) -> AgentResponse {
        let route = Route::classify(message);
        let span = tracing::info_span!("agent_run", request_id, route = route.name());
        let _entered = span.enter();
        tracing::debug!(
            metadata_keys = metadata.map_or(0, Map::len),
            "routing agent message"
        );

        let mut state = RunState::default();
        state.trail.push(ActionEntry::route(route.name()));

        let outcome = match route {
            Route::AnomalyCheck => self.anomaly_branch(message, &mut state),
            Route::General => general_branch(message),
        };

        if outcome.completed {
            state.trail.push(ActionEntry::event(FINALIZE_ACTION));
        }

        tracing::info!(
            anomaly_detected = outcome.anomaly_detected,
            actions = state.trail.len(),
            warnings = state.warnings.len(),
            "agent run finished"
        );

        AgentResponse {
            request_id: request_id.to_string(),
            response: outcome.response,
            anomaly_detected: outcome.anomaly_detected,
            actions_taken: state.trail.into_entries(),
            warnings: state.warnings,
        }
    }

    fn anomaly_branch(&self, message: &str, state: &mut RunState) -> BranchOutcome {
        let target_date = resolve_target_date(message, self.clock.today());
        let details = date_details(target_date);

        let tool = Arc::clone(&self.analytics);
        let analytics = invoke(ANALYTICS_TOOL, details.clone(), self.tool_timeout, move || {
            tool.run_analytics_query(target_date)
                .and_then(AnalyticsResult::from_value)
        });
        // Without analytics there is nothing to put context around, so this
        // failure ends the request. Database failures below do not.
        let Some(analytics) = state.record(analytics) else {
            return BranchOutcome {
                response: ANALYTICS_FAILED_RESPONSE.to_string(),
                anomaly_detected: false,
                completed: false,
            };
        };

        let context = if analytics.anomaly {
            let tool = Arc::clone(&self.database);
            let lookup = invoke(DATABASE_TOOL, details, self.tool_timeout, move || {
                tool.run_database_lookup(target_date)
                    .and_then(DatabaseContext::from_value)
            });
            state.record(lookup)
        } else {
            None
        };

        BranchOutcome {
            response: compose_anomaly_response(target_date, &analytics, context.as_ref()),
            anomaly_detected: analytics.anomaly,
            completed: true,
        }
    }
}

fn general_branch(message: &str) -> BranchOutcome {
    BranchOutcome {
        response: format!("{GENERAL_RESPONSE_PREFIX}{message}"),
        anomaly_detected: false,
        completed: true,
    }
}

fn date_details(date: NaiveDate) -> Map<String, Value> {
    let mut details = Map::new();
    details.insert("date".to_string(), Value::String(date.to_string()));
    details
}

/// Deterministic analytics summary. The context clause is omitted
/// entirely when no database context was obtained.
pub fn compose_anomaly_response(
    date: NaiveDate,
    analytics: &AnalyticsResult,
    context: Option<&DatabaseContext>,
) -> String {
    let mut response = format!(
        "Analytics for {date}: {} = {} (avg {}, delta {}%).",
        analytics.metric, analytics.value, analytics.previous_average, analytics.delta_percent
    );

    if analytics.anomaly {
        response.push_str(" Anomaly detected.");
        if let Some(context) = context {
            response.push_str(&format!(
                " Context: {} failed transactions, segment {}, region {}.",
                context.failed_transactions, context.top_customer_segment, context.region
            ));
        }
    } else {
        response.push_str(" No anomaly detected.");
    }

    response
}
