use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::{
    extractors::{require_admin, AuthenticatedUser},
    models::{CreateShiftInput, ListShiftsQuery, Shift, ShiftMutationResponse, ShiftPage, UpdateShiftInput},
    AppResult, AppState,
};

/// GET /api/shifts?page=&size=&sort=
#[utoipa::path(
    get,
    path = "/api/shifts",
    params(ListShiftsQuery),
    responses(
        (status = 200, description = "One page of the shift catalog", body = ShiftPage)
    ),
    tag = "shifts",
    security(("cookie_auth" = []))
)]
pub async fn list_shifts(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedUser,
    Query(query): Query<ListShiftsQuery>,
) -> AppResult<Json<ShiftPage>> {
    tracing::debug!(page = query.page, size = ?query.size, sort = ?query.sort, "list_shifts called");
    Ok(Json(state.services.catalog.list(&query).await?))
}

/// GET /api/shifts/{id}
#[utoipa::path(
    get,
    path = "/api/shifts/{id}",
    params(("id" = i32, Path, description = "Shift id")),
    responses(
        (status = 200, description = "The shift", body = Shift),
        (status = 404, description = "Shift not found")
    ),
    tag = "shifts",
    security(("cookie_auth" = []))
)]
pub async fn get_shift(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Shift>> {
    Ok(Json(state.services.catalog.get(id).await?))
}

/// POST /api/shifts
#[utoipa::path(
    post,
    path = "/api/shifts",
    request_body = CreateShiftInput,
    responses(
        (status = 200, description = "Shift created", body = Shift),
        (status = 403, description = "Administrator role required"),
        (status = 409, description = "A shift with that name exists"),
        (status = 422, description = "Empty name")
    ),
    tag = "shifts",
    security(("cookie_auth" = []))
)]
pub async fn create_shift(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<CreateShiftInput>,
) -> AppResult<Json<Shift>> {
    require_admin(&auth)?;
    Ok(Json(state.services.catalog.create(input).await?))
}

/// PUT /api/shifts/{id}
#[utoipa::path(
    put,
    path = "/api/shifts/{id}",
    params(("id" = i32, Path, description = "Shift id")),
    request_body = UpdateShiftInput,
    responses(
        (status = 200, description = "Shift updated", body = Shift),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Shift not found"),
        (status = 409, description = "Another shift has that name")
    ),
    tag = "shifts",
    security(("cookie_auth" = []))
)]
pub async fn update_shift(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(input): Json<UpdateShiftInput>,
) -> AppResult<Json<Shift>> {
    require_admin(&auth)?;
    Ok(Json(state.services.catalog.update(id, input).await?))
}

/// POST /api/shifts/{id}/deactivate
#[utoipa::path(
    post,
    path = "/api/shifts/{id}/deactivate",
    params(("id" = i32, Path, description = "Shift id")),
    responses(
        (status = 200, description = "Shift deactivated", body = Shift),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Shift not found")
    ),
    tag = "shifts",
    security(("cookie_auth" = []))
)]
pub async fn deactivate_shift(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Shift>> {
    require_admin(&auth)?;
    Ok(Json(state.services.catalog.deactivate(id).await?))
}

/// DELETE /api/shifts/{id}
#[utoipa::path(
    delete,
    path = "/api/shifts/{id}",
    params(("id" = i32, Path, description = "Shift id")),
    responses(
        (status = 200, description = "Shift deleted", body = ShiftMutationResponse),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Shift not found"),
        (status = 409, description = "Shift is still referenced")
    ),
    tag = "shifts",
    security(("cookie_auth" = []))
)]
pub async fn delete_shift(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ShiftMutationResponse>> {
    require_admin(&auth)?;
    state.services.catalog.delete(id).await?;

    Ok(Json(ShiftMutationResponse {
        success: true,
        shift_id: Some(id),
        message: Some("Shift deleted".to_string()),
    }))
}
