//! In-memory store implementing every store trait over one shared table set.
//!
//! Used by the test suite and handy for running the API without PostgreSQL.
//! All tables live behind a single lock, so the request update and the
//! equipment retirement it may trigger are applied atomically.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{EquipmentStore, RequestStore, TeamStore, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::CreateEquipment,
        request::NewRequest,
        user::{NewUser, UserFilter},
        Equipment, EquipmentFilter, MaintenanceRequest, MaintenanceTeam, RequestFilter, Role, User,
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    teams: Vec<MaintenanceTeam>,
    equipment: Vec<Equipment>,
    requests: Vec<MaintenanceRequest>,
}

// Rows are never hard-deleted, so ids are positions + 1.
fn next_id<T>(rows: &[T]) -> i32 {
    rows.len() as i32 + 1
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        if tables
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        if let Some(team_id) = user.team_id {
            if !tables.teams.iter().any(|t| t.id == team_id) {
                return Err(AppError::InvalidReference(
                    "User references a missing record".to_string(),
                ));
            }
        }

        let row = User {
            id: next_id(&tables.users),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            team_id: user.team_id,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: Utc::now(),
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| {
                u.reset_token_hash.as_deref() == Some(token_hash)
                    && u.reset_token_expires_at.map_or(false, |exp| exp > now)
            })
            .cloned())
    }

    async fn find_where(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables
            .users
            .iter()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        let row = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;
        *row = user.clone();
        Ok(user.clone())
    }

    async fn count_by_role(&self, role: Role) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().filter(|u| u.role == role).count() as i64)
    }
}

#[async_trait]
impl TeamStore for MemoryStore {
    async fn create(&self, name: &str) -> AppResult<MaintenanceTeam> {
        let mut tables = self.tables.lock().await;
        let team = MaintenanceTeam {
            id: next_id(&tables.teams),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        tables.teams.push(team.clone());
        Ok(team)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<MaintenanceTeam>> {
        let tables = self.tables.lock().await;
        Ok(tables.teams.iter().find(|t| t.id == id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<MaintenanceTeam>> {
        let tables = self.tables.lock().await;
        Ok(tables.teams.clone())
    }

    async fn count(&self) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.teams.len() as i64)
    }
}

#[async_trait]
impl EquipmentStore for MemoryStore {
    async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let mut tables = self.tables.lock().await;
        let team_exists = tables.teams.iter().any(|t| t.id == data.maintenance_team_id);
        let users_exist = [data.employee_id, data.default_technician_id]
            .into_iter()
            .flatten()
            .all(|id| tables.users.iter().any(|u| u.id == id));
        if !team_exists || !users_exist {
            return Err(AppError::InvalidReference(
                "Equipment references a missing record".to_string(),
            ));
        }

        let row = Equipment {
            id: next_id(&tables.equipment),
            name: data.name.clone(),
            category: data.category.clone(),
            department: data.department.clone(),
            serial_number: data.serial_number.clone(),
            purchase_date: data.purchase_date,
            warranty_info: data.warranty_info.clone(),
            location: data.location.clone(),
            maintenance_team_id: data.maintenance_team_id,
            employee_id: data.employee_id,
            default_technician_id: data.default_technician_id,
            is_usable: true,
            created_at: Utc::now(),
        };
        tables.equipment.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Equipment>> {
        let tables = self.tables.lock().await;
        Ok(tables.equipment.iter().find(|e| e.id == id).cloned())
    }

    async fn find_where(&self, filter: &EquipmentFilter) -> AppResult<Vec<Equipment>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Equipment> = tables
            .equipment
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn count(&self) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.equipment.len() as i64)
    }

    async fn count_unusable(&self) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.equipment.iter().filter(|e| !e.is_usable).count() as i64)
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn create(&self, request: &NewRequest) -> AppResult<MaintenanceRequest> {
        let mut tables = self.tables.lock().await;
        let equipment_exists = tables.equipment.iter().any(|e| e.id == request.equipment_id);
        let users_exist = [Some(request.created_by_id), request.technician_id]
            .into_iter()
            .flatten()
            .all(|id| tables.users.iter().any(|u| u.id == id));
        if !equipment_exists || !users_exist {
            return Err(AppError::InvalidReference(
                "Request references a missing record".to_string(),
            ));
        }

        let now = Utc::now();
        let row = MaintenanceRequest {
            id: next_id(&tables.requests),
            subject: request.subject.clone(),
            request_type: request.request_type,
            status: request.status,
            equipment_id: request.equipment_id,
            team_id: request.team_id,
            technician_id: request.technician_id,
            scheduled_date: request.scheduled_date,
            duration_hours: request.duration_hours,
            created_by_id: request.created_by_id,
            version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.requests.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<MaintenanceRequest>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .requests
            .iter()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .cloned())
    }

    async fn find_where(&self, filter: &RequestFilter) -> AppResult<Vec<MaintenanceRequest>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<MaintenanceRequest> = tables
            .requests
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn update(&self, request: &MaintenanceRequest, retire_equipment: bool) -> AppResult<MaintenanceRequest> {
        let mut tables = self.tables.lock().await;

        let stored = tables
            .requests
            .iter_mut()
            .find(|r| r.id == request.id && r.deleted_at.is_none() && r.version == request.version)
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "Request {} was modified concurrently, reload and retry",
                    request.id
                ))
            })?;

        stored.status = request.status;
        stored.technician_id = request.technician_id;
        stored.duration_hours = request.duration_hours;
        stored.scheduled_date = request.scheduled_date;
        stored.version += 1;
        stored.updated_at = Utc::now();
        let updated = stored.clone();

        if retire_equipment {
            if let Some(equipment) = tables
                .equipment
                .iter_mut()
                .find(|e| e.id == updated.equipment_id)
            {
                equipment.is_usable = false;
            }
        }

        Ok(updated)
    }

    async fn soft_delete(&self, id: i32) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
        {
            Some(row) => {
                row.deleted_at = Some(Utc::now());
                row.version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_open(&self) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .requests
            .iter()
            .filter(|r| r.deleted_at.is_none() && r.status.is_open())
            .count() as i64)
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .requests
            .iter()
            .filter(|r| {
                r.deleted_at.is_none()
                    && !r.status.is_closed()
                    && r.scheduled_date.map_or(false, |d| d < now)
            })
            .count() as i64)
    }
}
