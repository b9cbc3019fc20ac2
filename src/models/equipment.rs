//! Equipment model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Equipment record
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    /// Equipment name / description
    pub name: String,
    pub category: String,
    pub department: Option<String>,
    pub serial_number: String,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_info: String,
    pub location: String,
    /// Team responsible for maintaining this equipment
    pub maintenance_team_id: i32,
    /// Employee who owns / uses the equipment
    pub employee_id: Option<i32>,
    /// Technician pre-assigned to new requests on this equipment
    pub default_technician_id: Option<i32>,
    /// False once a request against this equipment reached Scrap
    pub is_usable: bool,
    pub created_at: DateTime<Utc>,
}

/// Create equipment request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1, message = "Equipment name is required"))]
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub department: Option<String>,
    #[serde(default)]
    pub serial_number: String,
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub warranty_info: String,
    #[serde(default)]
    pub location: String,
    pub maintenance_team_id: i32,
    pub employee_id: Option<i32>,
    pub default_technician_id: Option<i32>,
}

/// Equipment list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct EquipmentQuery {
    /// Case-insensitive match on name, category or department
    pub search: Option<String>,
}
