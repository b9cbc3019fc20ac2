//! Equipment service

use validator::Validate;

use super::visibility;
use crate::{
    error::{AppError, AppResult},
    models::{equipment::CreateEquipment, Equipment, EquipmentFilter, Principal, Role},
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Equipment visible to the principal, optionally narrowed by a search term
    pub async fn list(&self, principal: &Principal, search: Option<&str>) -> AppResult<Vec<Equipment>> {
        let filter = EquipmentFilter::new(visibility::equipment_scope(principal)).with_search(search);
        self.repository.equipment.find_where(&filter).await
    }

    /// Equipment outside the principal's visibility is reported as missing
    pub async fn get(&self, principal: &Principal, id: i32) -> AppResult<Equipment> {
        let filter = EquipmentFilter::new(visibility::equipment_scope(principal)).with_id(id);
        self.repository
            .equipment
            .find_where(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    pub async fn create(&self, data: CreateEquipment, principal: &Principal) -> AppResult<Equipment> {
        principal.require_manager()?;
        data.validate()?;

        if self.repository.teams.find_by_id(data.maintenance_team_id).await?.is_none() {
            return Err(AppError::InvalidReference(format!(
                "Team {} does not exist",
                data.maintenance_team_id
            )));
        }
        if let Some(employee_id) = data.employee_id {
            self.require_user(employee_id).await?;
        }
        if let Some(technician_id) = data.default_technician_id {
            let technician = self.require_user(technician_id).await?;
            if technician.role != Role::Technician {
                return Err(AppError::Validation(format!(
                    "User {} is not a technician",
                    technician_id
                )));
            }
        }

        let equipment = self.repository.equipment.create(&data).await?;
        tracing::info!(equipment_id = equipment.id, team_id = equipment.maintenance_team_id, "Equipment created");
        Ok(equipment)
    }

    async fn require_user(&self, id: i32) -> AppResult<crate::models::User> {
        self.repository
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::InvalidReference(format!("User {} does not exist", id)))
    }
}
