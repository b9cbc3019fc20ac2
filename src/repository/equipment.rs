//! Equipment repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use super::{map_write_error, EquipmentStore};
use crate::{
    error::AppResult,
    models::{equipment::CreateEquipment, Equipment, EquipmentFilter, EquipmentScope},
};

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EquipmentStore for EquipmentRepository {
    async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (name, category, department, serial_number, purchase_date,
                                   warranty_info, location, maintenance_team_id, employee_id,
                                   default_technician_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.category)
        .bind(&data.department)
        .bind(&data.serial_number)
        .bind(data.purchase_date)
        .bind(&data.warranty_info)
        .bind(&data.location)
        .bind(data.maintenance_team_id)
        .bind(data.employee_id)
        .bind(data.default_technician_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Equipment"))
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Equipment>> {
        let row = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_where(&self, filter: &EquipmentFilter) -> AppResult<Vec<Equipment>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM equipment WHERE 1=1");

        match filter.scope {
            EquipmentScope::All => {}
            EquipmentScope::OwnedBy(user_id) => {
                query.push(" AND employee_id = ").push_bind(user_id);
            }
            EquipmentScope::DefaultTechnician(user_id) => {
                query.push(" AND default_technician_id = ").push_bind(user_id);
            }
        }

        if let Some(id) = filter.id {
            query.push(" AND id = ").push_bind(id);
        }

        // Grouped so the OR never escapes the role restriction
        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search);
            query.push(" AND (LOWER(name) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(category) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(COALESCE(department, '')) LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }

        query.push(" ORDER BY name");

        let rows = query.build_query_as::<Equipment>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_unusable(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment WHERE is_usable = FALSE")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
