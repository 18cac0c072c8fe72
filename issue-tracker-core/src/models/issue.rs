use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Short code such as `ISSUE-250623114709-AB12`.
    pub id: String,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub steps_to_reproduce: String,
    pub severity: IssueSeverity,
    pub priority: IssuePriority,
    pub reporter: String,
    pub frequency: i64,
    pub status: IssueStatus,
    #[serde(default)]
    pub screenshot_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum IssueStatus {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Under Review")]
    UnderReview,
    Testing,
    Resolved,
    Reopened,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::UnderReview => "Under Review",
            Self::Testing => "Testing",
            Self::Resolved => "Resolved",
            Self::Reopened => "Reopened",
            Self::Closed => "Closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Open" => Some(Self::Open),
            "In Progress" => Some(Self::InProgress),
            "Under Review" => Some(Self::UnderReview),
            "Testing" => Some(Self::Testing),
            "Resolved" => Some(Self::Resolved),
            "Reopened" => Some(Self::Reopened),
            "Closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            "Critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IssuePriority {
    P0,
    P1,
    P2,
    P3,
}

impl IssuePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "P0" => Some(Self::P0),
            "P1" => Some(Self::P1),
            "P2" => Some(Self::P2),
            "P3" => Some(Self::P3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIssueInput {
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub steps_to_reproduce: String,
    pub severity: IssueSeverity,
    pub priority: IssuePriority,
    pub reporter: String,
    pub frequency: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFilter {
    pub project_id: Option<String>,
    pub status: Option<IssueStatus>,
    pub reporter: Option<String>,
}
