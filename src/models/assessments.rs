use chrono::{DateTime, Utc};
use serde::Serialize;

/// Canonical assessment run status values
pub mod run_status {
    pub const QUEUED: &str = "queued";
    pub const RUNNING: &str = "running";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
}

/// Canonical trigger sources
pub mod triggered_by {
    pub const API: &str = "api";
    pub const SCHEDULED: &str = "scheduled";
}

/// AssessmentRun is one queued or finished pass over the fleet
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentRun {
    pub id: String,
    pub status: String,
    pub triggered_by: String,
    pub device_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<serde_json::Value>,
    #[serde(skip_serializing)]
    pub report_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}
