use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub id: String,
    pub issue_id: String,
    pub resolver: String,
    pub resolution_summary: String,
    pub root_cause: String,
    pub modules_affected: Option<String>,
    pub time_spent_hours: Option<f64>,
    pub commit_id: Option<String>,
    pub resolved_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResolutionInput {
    pub issue_id: String,
    pub resolver: String,
    pub resolution_summary: String,
    pub root_cause: String,
    #[serde(default)]
    pub modules_affected: Option<String>,
    #[serde(default)]
    pub time_spent_hours: Option<f64>,
    #[serde(default)]
    pub commit_id: Option<String>,
}
