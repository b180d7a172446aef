use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::normalize;

/// What kind of step an action entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A routing decision taken by the router.
    Route,
    /// A call to an external lookup tool.
    Tool,
    /// Anything else worth recording (completion markers, legacy items).
    Event,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Tool => "tool",
            Self::Event => "event",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "route" => Some(Self::Route),
            "tool" => Some(Self::Tool),
            "event" => Some(Self::Event),
            _ => None,
        }
    }
}

/// One observable step taken while servicing a request.
/// Entries are never modified after they are appended to a trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActionEntry {
    pub kind: ActionKind,
    /// Identifier of the step (e.g. "anomaly_check", "analytics_query")
    pub name: String,
    #[serde(default = "default_ok")]
    pub ok: bool,
    /// Elapsed wall time in milliseconds, rounded
    #[serde(default, alias = "ms")]
    pub duration_ms: u64,
    /// Free-form step details
    #[serde(default)]
    #[schema(value_type = Object)]
    pub details: Map<String, Value>,
}

fn default_ok() -> bool {
    true
}

impl ActionEntry {
    pub fn new(kind: ActionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            ok: true,
            duration_ms: 0,
            details: Map::new(),
        }
    }

    pub fn route(name: impl Into<String>) -> Self {
        Self::new(ActionKind::Route, name)
    }

    pub fn event(name: impl Into<String>) -> Self {
        Self::new(ActionKind::Event, name)
    }

    pub fn tool(name: impl Into<String>, ok: bool, duration_ms: u64) -> Self {
        Self {
            ok,
            duration_ms,
            ..Self::new(ActionKind::Tool, name)
        }
    }

    pub fn with_ok(mut self, ok: bool) -> Self {
        self.ok = ok;
        self
    }

    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = details;
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// `kind:name` label used in logs.
    pub fn label(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.name)
    }
}

/// Inbound agent request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentRequest {
    /// Free-text instruction, must not be empty
    pub message: String,
    /// Opaque caller metadata, passed through untouched
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

/// Response envelope. Every field is present on every code path.
///
/// Decoding an envelope runs `actions_taken` through the normalizer, so
/// loosely shaped trails from older producers come out canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgentResponse {
    pub request_id: String,
    /// Human-readable answer, present even on failure
    pub response: String,
    #[serde(default)]
    pub anomaly_detected: bool,
    #[serde(default, deserialize_with = "normalize::deserialize_actions")]
    pub actions_taken: Vec<ActionEntry>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

pub const AGENT_FAILURE_RESPONSE: &str = "Agent failed to process the request.";

impl AgentResponse {
    /// Minimal well-formed envelope for a request the pipeline could not
    /// finish. Only the textual description of the failure is exposed.
    pub fn failure(request_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            response: AGENT_FAILURE_RESPONSE.to_string(),
            anomaly_detected: false,
            actions_taken: vec![ActionEntry::event("error").with_ok(false)],
            warnings: vec![description.into()],
        }
    }
}
