//! Maintenance request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{RequestStatus, RequestType};

/// Maintenance request record
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MaintenanceRequest {
    pub id: i32,
    pub subject: String,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub status: RequestStatus,
    /// Immutable after creation
    pub equipment_id: i32,
    /// Copied from the equipment's maintenance team at creation
    pub team_id: i32,
    pub technician_id: Option<i32>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub duration_hours: f64,
    pub created_by_id: i32,
    /// Revision counter, bumped on every update
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Create request payload. Any `team_id` or `status` sent by the client is ignored.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRequest {
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub equipment_id: i32,
    pub scheduled_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0.0, message = "Duration cannot be negative"))]
    pub duration_hours: Option<f64>,
}

/// Partial update payload; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateRequest {
    pub status: Option<RequestStatus>,
    pub technician_id: Option<i32>,
    /// Zero is treated as "not provided"
    #[validate(range(min = 0.0, message = "Duration cannot be negative"))]
    pub duration_hours: Option<f64>,
    pub scheduled_date: Option<DateTime<Utc>>,
}

/// Insert payload for the request store, all derived fields resolved
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub subject: String,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub equipment_id: i32,
    pub team_id: i32,
    pub technician_id: Option<i32>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub duration_hours: f64,
    pub created_by_id: i32,
}

/// Request list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct RequestQuery {
    /// Exact status ("New", "In Progress", "Repaired", "Scrap")
    pub status: Option<String>,
    /// Exact type ("Corrective", "Preventive")
    #[serde(rename = "type")]
    pub request_type: Option<String>,
    /// Scheduled on this day (YYYY-MM-DD)
    pub date: Option<String>,
}
