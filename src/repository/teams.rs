//! Maintenance teams repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{map_write_error, TeamStore};
use crate::{error::AppResult, models::MaintenanceTeam};

#[derive(Clone)]
pub struct TeamsRepository {
    pool: Pool<Postgres>,
}

impl TeamsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamStore for TeamsRepository {
    async fn create(&self, name: &str) -> AppResult<MaintenanceTeam> {
        sqlx::query_as::<_, MaintenanceTeam>(
            "INSERT INTO maintenance_teams (name) VALUES ($1) RETURNING *",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Team"))
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<MaintenanceTeam>> {
        let team = sqlx::query_as::<_, MaintenanceTeam>("SELECT * FROM maintenance_teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(team)
    }

    async fn list(&self) -> AppResult<Vec<MaintenanceTeam>> {
        let teams = sqlx::query_as::<_, MaintenanceTeam>("SELECT * FROM maintenance_teams ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(teams)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM maintenance_teams")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
