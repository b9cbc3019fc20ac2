//! Maintenance request endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        request::{CreateRequest, RequestQuery, UpdateRequest},
        MaintenanceRequest,
    },
};

use super::{AppJson, AppPath, AppQuery, AuthenticatedUser};

/// List requests visible to the caller
#[utoipa::path(
    get,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Requests", body = Vec<MaintenanceRequest>),
        (status = 400, description = "Malformed filter value")
    )
)]
pub async fn list_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppQuery(query): AppQuery<RequestQuery>,
) -> AppResult<Json<Vec<MaintenanceRequest>>> {
    let requests = state
        .services
        .requests
        .list(&claims.principal(), &query)
        .await?;
    Ok(Json(requests))
}

/// Maintenance history of one piece of equipment
#[utoipa::path(
    get,
    path = "/equipment/{id}/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Requests against the equipment", body = Vec<MaintenanceRequest>),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn list_equipment_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Vec<MaintenanceRequest>>> {
    let requests = state
        .services
        .requests
        .list_for_equipment(id, &claims.principal())
        .await?;
    Ok(Json(requests))
}

/// Create a maintenance request
#[utoipa::path(
    post,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Request created", body = MaintenanceRequest),
        (status = 400, description = "Invalid input or unknown equipment"),
        (status = 403, description = "Only the equipment owner may report a breakdown")
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(data): AppJson<CreateRequest>,
) -> AppResult<(StatusCode, Json<MaintenanceRequest>)> {
    let created = state
        .services
        .requests
        .create(data, &claims.principal())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a maintenance request
#[utoipa::path(
    put,
    path = "/requests/{id}",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Request ID")),
    request_body = UpdateRequest,
    responses(
        (status = 200, description = "Request updated", body = MaintenanceRequest),
        (status = 403, description = "Assigned to another technician"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Concurrent modification")
    )
)]
pub async fn update_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppPath(id): AppPath<i32>,
    AppJson(patch): AppJson<UpdateRequest>,
) -> AppResult<Json<MaintenanceRequest>> {
    let updated = state
        .services
        .requests
        .update(id, patch, &claims.principal())
        .await?;
    Ok(Json(updated))
}

/// Delete a maintenance request (managers only)
#[utoipa::path(
    delete,
    path = "/requests/{id}",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 204, description = "Request deleted"),
        (status = 403, description = "Manager role required"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn delete_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<StatusCode> {
    state.services.requests.delete(id, &claims.principal()).await?;
    Ok(StatusCode::NO_CONTENT)
}
