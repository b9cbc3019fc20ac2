//! Business logic services

pub mod dashboard;
pub mod email;
pub mod equipment;
pub mod requests;
pub mod teams;
pub mod users;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, EmailConfig},
    error::AppResult,
    repository::Repository,
};

use email::Notifier;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub teams: teams::TeamsService,
    pub equipment: equipment::EquipmentService,
    pub requests: requests::RequestsService,
    pub dashboard: dashboard::DashboardService,
    repository: Repository,
}

impl Services {
    /// Create all services over the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        email_config: EmailConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users: users::UsersService::new(
                repository.clone(),
                auth_config,
                email_config.frontend_url,
                notifier.clone(),
            ),
            teams: teams::TeamsService::new(repository.clone()),
            equipment: equipment::EquipmentService::new(repository.clone()),
            requests: requests::RequestsService::new(repository.clone(), notifier),
            dashboard: dashboard::DashboardService::new(repository.clone()),
            repository,
        }
    }

    /// Round-trip to the store, used by the readiness probe
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.teams.count().await.map(|_| ())
    }
}
