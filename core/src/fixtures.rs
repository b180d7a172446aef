//! File-backed analytics and database tools.
//!
//! Fixture document layout:
//!
//! ```json
//! {
//!   "analytics": { "2026-10-16": { "metric": "...", "value": 1, ... } },
//!   "database": { "2026-10-16": { "failed_transactions": 3, ... } },
//!   "default_analytics": { ... },
//!   "default_database": { "error": "warehouse offline" }
//! }
//! ```
//!
//! A record shaped `{"error": "<text>"}` makes the tool fail with that text.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{FixtureError, ToolError};
use crate::tools::{AnalyticsTool, DatabaseTool};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolFixtures {
    #[serde(default)]
    pub analytics: BTreeMap<NaiveDate, Value>,
    #[serde(default)]
    pub database: BTreeMap<NaiveDate, Value>,
    /// Served for dates missing from `analytics`
    #[serde(default)]
    pub default_analytics: Option<Value>,
    /// Served for dates missing from `database`
    #[serde(default)]
    pub default_database: Option<Value>,
}

impl ToolFixtures {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| FixtureError::Parse {
            path: display,
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Built-in data set: an anomalous transaction-volume reading for
    /// every date, with matching operational context.
    pub fn sample() -> Self {
        Self {
            default_analytics: Some(json!({
                "metric": "transaction_volume",
                "value": 1240,
                "previous_average": 980,
                "delta_percent": 26.53,
                "anomaly": true
            })),
            default_database: Some(json!({
                "failed_transactions": 37,
                "top_customer_segment": "enterprise",
                "region": "eu-west"
            })),
            ..Self::default()
        }
    }

    fn record(
        table: &BTreeMap<NaiveDate, Value>,
        fallback: Option<&Value>,
        date: NaiveDate,
    ) -> Result<Value, ToolError> {
        let record = table
            .get(&date)
            .or(fallback)
            .ok_or(ToolError::NoData(date))?;

        match record.get("error").and_then(Value::as_str) {
            Some(message) => Err(ToolError::Failed(message.to_string())),
            None => Ok(record.clone()),
        }
    }
}

impl AnalyticsTool for ToolFixtures {
    fn run_analytics_query(&self, date: NaiveDate) -> Result<Value, ToolError> {
        Self::record(&self.analytics, self.default_analytics.as_ref(), date)
    }
}

impl DatabaseTool for ToolFixtures {
    fn run_database_lookup(&self, date: NaiveDate) -> Result<Value, ToolError> {
        Self::record(&self.database, self.default_database.as_ref(), date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn dated_records_take_priority_over_defaults() {
        let fixtures = ToolFixtures::from_json(
            r#"{
                "analytics": {"2026-10-16": {"metric": "signups", "value": 3, "previous_average": 4, "delta_percent": -25}},
                "default_analytics": {"metric": "fallback", "value": 1, "previous_average": 1, "delta_percent": 0}
            }"#,
        )
        .unwrap();

        assert_eq!(fixtures.run_analytics_query(day(16)).unwrap()["metric"], "signups");
        assert_eq!(fixtures.run_analytics_query(day(17)).unwrap()["metric"], "fallback");
    }

    #[test]
    fn missing_date_without_default_is_no_data() {
        let fixtures = ToolFixtures::default();
        let err = fixtures.run_database_lookup(day(1)).unwrap_err();
        assert_eq!(err.to_string(), "no data available for 2026-10-01");
    }

    #[test]
    fn error_records_simulate_failures() {
        let fixtures =
            ToolFixtures::from_json(r#"{"default_database": {"error": "warehouse offline"}}"#).unwrap();
        let err = fixtures.run_database_lookup(day(3)).unwrap_err();
        assert!(matches!(err, ToolError::Failed(ref m) if m == "warehouse offline"));
    }

    #[test]
    fn sample_answers_any_date() {
        let fixtures = ToolFixtures::sample();
        assert_eq!(fixtures.run_analytics_query(day(9)).unwrap()["anomaly"], true);
        assert_eq!(fixtures.run_database_lookup(day(9)).unwrap()["region"], "eu-west");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ToolFixtures::load("/nonexistent/agentflow-fixtures.json").unwrap_err();
        assert!(matches!(err, FixtureError::Io { .. }));
    }

    #[test]
    fn bundled_fixture_file_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures/sample.json");
        let fixtures = ToolFixtures::load(path).expect("bundled fixtures should parse");
        assert!(fixtures.run_analytics_query(day(16)).is_ok());
        assert!(matches!(
            fixtures.run_database_lookup(day(17)),
            Err(ToolError::Failed(ref m)) if m == "warehouse offline"
        ));
    }
}
