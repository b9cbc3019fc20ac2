//! Dashboard statistics

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::Role, repository::Repository};

/// Open requests one technician is expected to carry
pub const TECHNICIAN_CAPACITY: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_equipment: i64,
    /// Equipment no longer usable after a scrapped request
    pub critical_equipment: i64,
    pub open_requests: i64,
    pub overdue_requests: i64,
    pub technician_count: i64,
    /// Percentage of technician capacity in use, 0 to 100
    pub utilization_rate: f64,
}

pub fn utilization_rate(open_requests: i64, technicians: i64) -> f64 {
    if technicians <= 0 {
        return 0.0;
    }
    let capacity = (technicians * TECHNICIAN_CAPACITY) as f64;
    (open_requests as f64 / capacity * 100.0).clamp(0.0, 100.0)
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
}

impl DashboardService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Counts are read independently and need not be mutually consistent
    pub async fn stats(&self) -> AppResult<DashboardStats> {
        let total_equipment = self.repository.equipment.count().await?;
        let critical_equipment = self.repository.equipment.count_unusable().await?;
        let open_requests = self.repository.requests.count_open().await?;
        let overdue_requests = self.repository.requests.count_overdue(Utc::now()).await?;
        let technician_count = self.repository.users.count_by_role(Role::Technician).await?;

        Ok(DashboardStats {
            total_equipment,
            critical_equipment,
            open_requests,
            overdue_requests,
            technician_count,
            utilization_rate: utilization_rate(open_requests, technician_count),
        })
    }
}
