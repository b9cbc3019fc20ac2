//! Maintenance teams service

use std::collections::HashMap;

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        team::{CreateTeam, TeamWithMembers, DEFAULT_TEAMS},
        user::UserFilter,
        MaintenanceTeam, Principal, UserShort,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct TeamsService {
    repository: Repository,
}

impl TeamsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn create(&self, data: CreateTeam, principal: &Principal) -> AppResult<MaintenanceTeam> {
        principal.require_manager()?;
        data.validate()?;

        let team = self.repository.teams.create(data.name.trim()).await?;
        tracing::info!(team_id = team.id, name = %team.name, "Team created");
        Ok(team)
    }

    /// All teams with the users attached to them
    pub async fn list_with_members(&self) -> AppResult<Vec<TeamWithMembers>> {
        let teams = self.repository.teams.list().await?;
        let users = self.repository.users.find_where(&UserFilter::default()).await?;

        let mut members: HashMap<i32, Vec<UserShort>> = HashMap::new();
        for user in users {
            if let Some(team_id) = user.team_id {
                members.entry(team_id).or_default().push(user.into());
            }
        }

        Ok(teams
            .into_iter()
            .map(|team| TeamWithMembers {
                members: members.remove(&team.id).unwrap_or_default(),
                id: team.id,
                name: team.name,
            })
            .collect())
    }

    /// Create the default teams on an empty database. Returns how many were created.
    pub async fn seed_defaults(&self) -> AppResult<usize> {
        if self.repository.teams.count().await? > 0 {
            return Ok(0);
        }
        for name in DEFAULT_TEAMS {
            self.repository.teams.create(name).await?;
        }
        tracing::info!(count = DEFAULT_TEAMS.len(), "Seeded default maintenance teams");
        Ok(DEFAULT_TEAMS.len())
    }
}
