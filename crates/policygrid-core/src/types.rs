//! Policy document model shared across PolicyGrid crates.
//!
//! A policy document describes the instance bounds, metric-driven scaling
//! rules, and optional time-based schedules for one application. The field
//! names match the JSON documents operators submit, so a document survives
//! a serialize/deserialize cycle unchanged.

use serde::{Deserialize, Serialize};

/// Opaque application identifier (the primary key of the policy store).
pub type AppId = String;

/// Autoscaling policy attached to one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub instance_min_count: i32,
    pub instance_max_count: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scaling_rules: Vec<ScalingRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedules: Option<Schedules>,
}

impl PolicyDocument {
    /// Parse a policy document from its JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// A metric-driven scaling rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingRule {
    /// Metric name, e.g. "memoryused", "throughput".
    pub metric_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_window_secs: Option<i64>,
    /// How long the threshold must be breached before the rule fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breach_duration_secs: Option<i64>,
    pub threshold: i64,
    /// Comparison operator: `<`, `>`, `<=`, `>=`.
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cool_down_secs: Option<i64>,
    /// Instance delta: `+1`, `-2`, `+10%`.
    pub adjustment: String,
}

/// Time-based schedules, evaluated by the external scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedules {
    /// IANA timezone the schedule times are expressed in.
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recurring_schedule: Vec<RecurringSchedule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific_date: Vec<SpecificDateSchedule>,
}

/// A schedule repeating on days of the week or days of the month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringSchedule {
    /// First day the recurrence applies (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Last day the recurrence applies (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Daily window start (`HH:MM`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Daily window end (`HH:MM`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// ISO weekdays, 1 = Monday .. 7 = Sunday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_month: Option<Vec<i32>>,
    pub instance_min_count: i32,
    pub instance_max_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_min_instance_count: Option<i32>,
}

/// A one-off schedule between two date-times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificDateSchedule {
    /// Window start (`YYYY-MM-DDTHH:MM`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date_time: Option<String>,
    /// Window end (`YYYY-MM-DDTHH:MM`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date_time: Option<String>,
    pub instance_min_count: i32,
    pub instance_max_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_min_instance_count: Option<i32>,
}
