use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub tech_stack: String,
    pub description: String,
    pub team_members: Vec<String>,
    pub status: ProjectStatus,
    /// Each entry is prefixed with the date it was added, e.g. `[2025-06-23] Beta launch`.
    #[serde(default)]
    pub achievements: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectStatus {
    #[default]
    Active,
    #[serde(rename = "On Hold")]
    OnHold,
    Archived,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::OnHold => "On Hold",
            Self::Archived => "Archived",
            Self::Completed => "Completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(Self::Active),
            "On Hold" => Some(Self::OnHold),
            "Archived" => Some(Self::Archived),
            "Completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    pub tech_stack: String,
    pub description: String,
    pub team_members: Vec<String>,
    #[serde(default)]
    pub status: ProjectStatus,
}

/// Partial update; only the fields present are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_members: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAchievementInput {
    pub new_achievement: String,
}
