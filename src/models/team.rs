//! Maintenance team model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::user::UserShort;

/// Teams created at bootstrap when none exist
pub const DEFAULT_TEAMS: [&str; 4] = [
    "Mechanical Team",
    "Electrical Team",
    "IT Support",
    "General Maintenance",
];

/// Maintenance team record
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MaintenanceTeam {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Team with its members (users whose team_id points at it)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamWithMembers {
    pub id: i32,
    pub name: String,
    pub members: Vec<UserShort>,
}

/// Create team request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTeam {
    #[validate(length(min = 1, message = "Team name is required"))]
    pub name: String,
}
