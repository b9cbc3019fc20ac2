//! Repository layer for database operations
//!
//! Services talk to the store only through the traits below, so the
//! PostgreSQL implementation can be swapped for [`memory::MemoryStore`].

pub mod equipment;
pub mod memory;
pub mod requests;
pub mod teams;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::CreateEquipment,
        request::NewRequest,
        user::{NewUser, UserFilter},
        Equipment, EquipmentFilter, MaintenanceRequest, MaintenanceTeam, RequestFilter, Role, User,
    },
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: &NewUser) -> AppResult<User>;
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// User holding an unexpired reset token with this digest
    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<Option<User>>;
    async fn find_where(&self, filter: &UserFilter) -> AppResult<Vec<User>>;
    async fn save(&self, user: &User) -> AppResult<User>;
    async fn count_by_role(&self, role: Role) -> AppResult<i64>;
}

#[async_trait]
pub trait TeamStore: Send + Sync {
    async fn create(&self, name: &str) -> AppResult<MaintenanceTeam>;
    async fn find_by_id(&self, id: i32) -> AppResult<Option<MaintenanceTeam>>;
    async fn list(&self) -> AppResult<Vec<MaintenanceTeam>>;
    async fn count(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait EquipmentStore: Send + Sync {
    async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment>;
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Equipment>>;
    async fn find_where(&self, filter: &EquipmentFilter) -> AppResult<Vec<Equipment>>;
    async fn count(&self) -> AppResult<i64>;
    async fn count_unusable(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn create(&self, request: &NewRequest) -> AppResult<MaintenanceRequest>;
    /// Soft-deleted requests are reported as absent
    async fn find_by_id(&self, id: i32) -> AppResult<Option<MaintenanceRequest>>;
    async fn find_where(&self, filter: &RequestFilter) -> AppResult<Vec<MaintenanceRequest>>;
    /// Persist the mutable fields of `request` if its `version` is still current,
    /// and, when `retire_equipment` is set, mark its equipment unusable in the
    /// same transaction. A stale version yields `AppError::Conflict` and no write.
    async fn update(&self, request: &MaintenanceRequest, retire_equipment: bool) -> AppResult<MaintenanceRequest>;
    /// Returns false when no live request has this id
    async fn soft_delete(&self, id: i32) -> AppResult<bool>;
    async fn count_open(&self) -> AppResult<i64>;
    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64>;
}

/// Store handles shared by all services
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UserStore>,
    pub teams: Arc<dyn TeamStore>,
    pub equipment: Arc<dyn EquipmentStore>,
    pub requests: Arc<dyn RequestStore>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            teams: Arc::new(teams::TeamsRepository::new(pool.clone())),
            equipment: Arc::new(equipment::EquipmentRepository::new(pool.clone())),
            requests: Arc::new(requests::RequestsRepository::new(pool)),
        }
    }

    /// Create a repository backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::default();
        Self {
            users: Arc::new(store.clone()),
            teams: Arc::new(store.clone()),
            equipment: Arc::new(store.clone()),
            requests: Arc::new(store),
        }
    }
}

/// Translate constraint violations into domain errors; everything else stays opaque
pub(crate) fn map_write_error(err: sqlx::Error, entity: &str) -> AppError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            return AppError::Conflict(format!("{} already exists", entity));
        }
        if db.is_foreign_key_violation() {
            return AppError::InvalidReference(format!("{} references a missing record", entity));
        }
    }
    AppError::Database(err)
}
