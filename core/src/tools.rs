//! External lookup tools and the validated records they produce.
//!
//! Tools hand back raw JSON. The records here are the only place that JSON
//! is interpreted, so the router works with typed values and explicit
//! defaults instead of probing fields at every use site.

use chrono::NaiveDate;
use serde_json::{Map, Number, Value};

use crate::error::ToolError;
use crate::normalize::json_type_name;

pub const ANALYTICS_TOOL: &str = "analytics_query";
pub const DATABASE_TOOL: &str = "database_lookup";

/// Metric query for a single calendar date.
pub trait AnalyticsTool: Send + Sync {
    fn run_analytics_query(&self, date: NaiveDate) -> Result<Value, ToolError>;
}

/// Supplementary operational context for a single calendar date.
pub trait DatabaseTool: Send + Sync {
    fn run_database_lookup(&self, date: NaiveDate) -> Result<Value, ToolError>;
}

impl<F> AnalyticsTool for F
where
    F: Fn(NaiveDate) -> Result<Value, ToolError> + Send + Sync,
{
    fn run_analytics_query(&self, date: NaiveDate) -> Result<Value, ToolError> {
        self(date)
    }
}

impl<F> DatabaseTool for F
where
    F: Fn(NaiveDate) -> Result<Value, ToolError> + Send + Sync,
{
    fn run_database_lookup(&self, date: NaiveDate) -> Result<Value, ToolError> {
        self(date)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsResult {
    pub metric: String,
    /// Numbers are kept as the tool sent them so they render unchanged
    pub value: Number,
    pub previous_average: Number,
    pub delta_percent: Number,
    /// Missing or non-boolean values read as `false`
    pub anomaly: bool,
}

impl AnalyticsResult {
    pub fn from_value(value: Value) -> Result<Self, ToolError> {
        let fields = expect_object(ANALYTICS_TOOL, &value)?;
        Ok(Self {
            metric: required_str(ANALYTICS_TOOL, fields, "metric")?,
            value: required_number(ANALYTICS_TOOL, fields, "value")?,
            previous_average: required_number(ANALYTICS_TOOL, fields, "previous_average")?,
            delta_percent: required_number(ANALYTICS_TOOL, fields, "delta_percent")?,
            anomaly: fields
                .get("anomaly")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseContext {
    pub failed_transactions: i64,
    pub top_customer_segment: String,
    pub region: String,
}

impl DatabaseContext {
    pub fn from_value(value: Value) -> Result<Self, ToolError> {
        let fields = expect_object(DATABASE_TOOL, &value)?;
        let failed_transactions = fields
            .get("failed_transactions")
            .and_then(Value::as_i64)
            .ok_or_else(|| malformed(DATABASE_TOOL, fields, "failed_transactions", "an integer"))?;
        Ok(Self {
            failed_transactions,
            top_customer_segment: required_str(DATABASE_TOOL, fields, "top_customer_segment")?,
            region: required_str(DATABASE_TOOL, fields, "region")?,
        })
    }
}

fn expect_object<'a>(
    tool: &'static str,
    value: &'a Value,
) -> Result<&'a Map<String, Value>, ToolError> {
    value.as_object().ok_or_else(|| ToolError::Malformed {
        tool,
        reason: format!("expected an object, got {}", json_type_name(value)),
    })
}

fn required_str(
    tool: &'static str,
    fields: &Map<String, Value>,
    key: &str,
) -> Result<String, ToolError> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed(tool, fields, key, "a string"))
}

fn required_number(
    tool: &'static str,
    fields: &Map<String, Value>,
    key: &str,
) -> Result<Number, ToolError> {
    match fields.get(key) {
        Some(Value::Number(number)) => Ok(number.clone()),
        _ => Err(malformed(tool, fields, key, "a number")),
    }
}

fn malformed(
    tool: &'static str,
    fields: &Map<String, Value>,
    key: &str,
    expected: &str,
) -> ToolError {
    let reason = match fields.get(key) {
        None => format!("missing field `{key}`"),
        Some(other) => format!(
            "field `{key}` should be {expected}, got {}",
            json_type_name(other)
        ),
    };
    ToolError::Malformed { tool, reason }
}
