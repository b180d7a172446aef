use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_AGENT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_TOOL_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_INFERENCE_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_INFERENCE_MODEL: &str = "local-model";
const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 120;

/// Connection settings for the model-serving endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Redirect plain-HTTP requests (behind a TLS-terminating proxy)
    pub require_https: bool,
    /// Deadline for a single decision-router run, tool calls included
    pub agent_timeout: Duration,
    /// Bound on each individual tool call inside a run
    pub tool_timeout: Duration,
    /// Tool fixture file; the built-in sample data is used when unset
    pub fixtures_path: Option<PathBuf>,
    pub inference: InferenceConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Blank values count as unset;
    /// unparsable values fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let cors_origins = get("AGENTFLOW_CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT),
            cors_origins,
            require_https: get("AGENTFLOW_REQUIRE_HTTPS").is_some_and(|v| v == "true"),
            agent_timeout: Duration::from_millis(parse_or(
                get("AGENTFLOW_AGENT_TIMEOUT_MS"),
                "AGENTFLOW_AGENT_TIMEOUT_MS",
                DEFAULT_AGENT_TIMEOUT_MS,
            )),
            tool_timeout: Duration::from_millis(parse_or(
                get("AGENTFLOW_TOOL_TIMEOUT_MS"),
                "AGENTFLOW_TOOL_TIMEOUT_MS",
                DEFAULT_TOOL_TIMEOUT_MS,
            )),
            fixtures_path: get("AGENTFLOW_FIXTURES_PATH").map(PathBuf::from),
            inference: InferenceConfig {
                base_url: get("INFERENCE_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_INFERENCE_BASE_URL.to_string()),
                model: get("INFERENCE_MODEL_NAME")
                    .unwrap_or_else(|| DEFAULT_INFERENCE_MODEL.to_string()),
                timeout: Duration::from_secs(parse_or(
                    get("INFERENCE_TIMEOUT_SECS"),
                    "INFERENCE_TIMEOUT_SECS",
                    DEFAULT_INFERENCE_TIMEOUT_SECS,
                )),
            },
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(
    raw: Option<String>,
    key: &str,
    default: T,
) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, fallback = %default, "Invalid config value, using default");
            default
        }),
    }
}
