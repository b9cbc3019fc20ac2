//! User listing endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{Role, UserShort},
};

use super::AuthenticatedUser;

/// List employees
#[utoipa::path(
    get,
    path = "/users/employees",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users with the Employee role", body = Vec<UserShort>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_employees(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserShort>>> {
    let users = state.services.users.list_by_role(Role::Employee).await?;
    Ok(Json(users))
}

/// List technicians
#[utoipa::path(
    get,
    path = "/users/technicians",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users with the Technician role", body = Vec<UserShort>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_technicians(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserShort>>> {
    let users = state.services.users.list_by_role(Role::Technician).await?;
    Ok(Json(users))
}
