//! Maintenance requests repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, QueryBuilder};

use super::{map_write_error, RequestStore};
use crate::{
    error::{AppError, AppResult},
    models::{request::NewRequest, MaintenanceRequest, RequestFilter, RequestScope},
};

#[derive(Clone)]
pub struct RequestsRepository {
    pool: Pool<Postgres>,
}

impl RequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestStore for RequestsRepository {
    async fn create(&self, request: &NewRequest) -> AppResult<MaintenanceRequest> {
        sqlx::query_as::<_, MaintenanceRequest>(
            r#"
            INSERT INTO maintenance_requests (subject, request_type, status, equipment_id, team_id,
                                              technician_id, scheduled_date, duration_hours,
                                              created_by_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&request.subject)
        .bind(request.request_type)
        .bind(request.status)
        .bind(request.equipment_id)
        .bind(request.team_id)
        .bind(request.technician_id)
        .bind(request.scheduled_date)
        .bind(request.duration_hours)
        .bind(request.created_by_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Request"))
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<MaintenanceRequest>> {
        let row = sqlx::query_as::<_, MaintenanceRequest>(
            "SELECT * FROM maintenance_requests WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_where(&self, filter: &RequestFilter) -> AppResult<Vec<MaintenanceRequest>> {
        if filter.is_empty_scope() {
            return Ok(Vec::new());
        }

        let mut query =
            QueryBuilder::<Postgres>::new("SELECT * FROM maintenance_requests WHERE deleted_at IS NULL");

        match &filter.scope {
            RequestScope::All | RequestScope::Nothing => {}
            RequestScope::Equipment(ids) => {
                query.push(" AND equipment_id = ANY(").push_bind(ids.clone()).push(")");
            }
            RequestScope::CreatedByOrEquipment {
                user_id,
                equipment_ids,
            } => {
                query.push(" AND (created_by_id = ").push_bind(*user_id);
                query.push(" OR equipment_id = ANY(").push_bind(equipment_ids.clone()).push("))");
            }
        }

        if let Some(equipment_id) = filter.equipment_id {
            query.push(" AND equipment_id = ").push_bind(equipment_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(request_type) = filter.request_type {
            query.push(" AND request_type = ").push_bind(request_type);
        }
        if let Some((start, end)) = filter.scheduled_between {
            query.push(" AND scheduled_date >= ").push_bind(start);
            query.push(" AND scheduled_date < ").push_bind(end);
        }

        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = query
            .build_query_as::<MaintenanceRequest>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update(&self, request: &MaintenanceRequest, retire_equipment: bool) -> AppResult<MaintenanceRequest> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, MaintenanceRequest>(
            r#"
            UPDATE maintenance_requests
            SET status = $3, technician_id = $4, duration_hours = $5, scheduled_date = $6,
                version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(request.id)
        .bind(request.version)
        .bind(request.status)
        .bind(request.technician_id)
        .bind(request.duration_hours)
        .bind(request.scheduled_date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Request"))?
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "Request {} was modified concurrently, reload and retry",
                request.id
            ))
        })?;

        if retire_equipment {
            sqlx::query("UPDATE equipment SET is_usable = FALSE WHERE id = $1")
                .bind(updated.equipment_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn soft_delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE maintenance_requests
            SET deleted_at = NOW(), version = version + 1
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_open(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM maintenance_requests
            WHERE deleted_at IS NULL AND status IN ('New', 'In Progress')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM maintenance_requests
            WHERE deleted_at IS NULL
              AND scheduled_date < $1
              AND status NOT IN ('Repaired', 'Scrap')
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
