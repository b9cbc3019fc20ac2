//! Maintenance team endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        team::{CreateTeam, TeamWithMembers},
        MaintenanceTeam,
    },
};

use super::{AppJson, AuthenticatedUser};

/// List teams with their members
#[utoipa::path(
    get,
    path = "/teams",
    tag = "teams",
    responses(
        (status = 200, description = "Teams and members", body = Vec<TeamWithMembers>)
    )
)]
pub async fn list_teams(State(state): State<crate::AppState>) -> AppResult<Json<Vec<TeamWithMembers>>> {
    let teams = state.services.teams.list_with_members().await?;
    Ok(Json(teams))
}

/// Create a team (managers only)
#[utoipa::path(
    post,
    path = "/teams",
    tag = "teams",
    security(("bearer_auth" = [])),
    request_body = CreateTeam,
    responses(
        (status = 201, description = "Team created", body = MaintenanceTeam),
        (status = 403, description = "Manager role required")
    )
)]
pub async fn create_team(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(data): AppJson<CreateTeam>,
) -> AppResult<(StatusCode, Json<MaintenanceTeam>)> {
    let team = state.services.teams.create(data, &claims.principal()).await?;
    Ok((StatusCode::CREATED, Json(team)))
}
