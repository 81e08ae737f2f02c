use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    extractors::{require_admin, AuthenticatedUser},
    models::{ApproveInput, CreateShiftChangeInput, RejectInput, ShiftChangeRequest},
    AppError, AppResult, AppState,
};

/// POST /api/shift-changes
#[utoipa::path(
    post,
    path = "/api/shift-changes",
    request_body = CreateShiftChangeInput,
    responses(
        (status = 200, description = "Request created, awaiting the target", body = ShiftChangeRequest),
        (status = 400, description = "Target schedule belongs to the requester"),
        (status = 403, description = "Original schedule is not the caller's"),
        (status = 404, description = "Schedule not found"),
        (status = 409, description = "An open request already exists for the original schedule")
    ),
    tag = "shift-changes",
    security(("cookie_auth" = []))
)]
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<CreateShiftChangeInput>,
) -> AppResult<Json<ShiftChangeRequest>> {
    Ok(Json(
        state
            .services
            .shift_changes
            .create(auth.employee_id, input)
            .await?,
    ))
}

/// GET /api/shift-changes/my
#[utoipa::path(
    get,
    path = "/api/shift-changes/my",
    responses(
        (status = 200, description = "Requests made by the caller, newest first", body = Vec<ShiftChangeRequest>)
    ),
    tag = "shift-changes",
    security(("cookie_auth" = []))
)]
pub async fn get_my_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<ShiftChangeRequest>>> {
    Ok(Json(
        state
            .services
            .shift_changes
            .list_for_requester(auth.employee_id)
            .await?,
    ))
}

/// GET /api/shift-changes/incoming
#[utoipa::path(
    get,
    path = "/api/shift-changes/incoming",
    responses(
        (status = 200, description = "Requests waiting on the caller's answer", body = Vec<ShiftChangeRequest>)
    ),
    tag = "shift-changes",
    security(("cookie_auth" = []))
)]
pub async fn get_incoming_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<ShiftChangeRequest>>> {
    Ok(Json(
        state
            .services
            .shift_changes
            .list_incoming(auth.employee_id)
            .await?,
    ))
}

/// GET /api/shift-changes/approvals
#[utoipa::path(
    get,
    path = "/api/shift-changes/approvals",
    responses(
        (status = 200, description = "Target-approved requests waiting on an administrator", body = Vec<ShiftChangeRequest>),
        (status = 403, description = "Administrator role required")
    ),
    tag = "shift-changes",
    security(("cookie_auth" = []))
)]
pub async fn get_approval_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<ShiftChangeRequest>>> {
    require_admin(&auth)?;
    Ok(Json(state.services.shift_changes.list_awaiting_admin().await?))
}

/// GET /api/shift-changes/{id}
#[utoipa::path(
    get,
    path = "/api/shift-changes/{id}",
    params(("id" = i32, Path, description = "Request id")),
    responses(
        (status = 200, description = "The request", body = ShiftChangeRequest),
        (status = 403, description = "Not a party to the request"),
        (status = 404, description = "Request not found")
    ),
    tag = "shift-changes",
    security(("cookie_auth" = []))
)]
pub async fn get_request(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ShiftChangeRequest>> {
    let request = state.services.shift_changes.get(id).await?;

    let is_party = request.requester_id == auth.employee_id || request.target_id == auth.employee_id;
    if !is_party && !auth.is_admin {
        return Err(AppError::Forbidden(format!(
            "Not a party to shift change request {}",
            id
        )));
    }
    Ok(Json(request))
}

/// POST /api/shift-changes/{id}/approve
#[utoipa::path(
    post,
    path = "/api/shift-changes/{id}/approve",
    params(("id" = i32, Path, description = "Request id")),
    request_body = ApproveInput,
    responses(
        (status = 200, description = "Target approved; awaiting an administrator", body = ShiftChangeRequest),
        (status = 403, description = "Caller is not the target"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not awaiting the target")
    ),
    tag = "shift-changes",
    security(("cookie_auth" = []))
)]
pub async fn approve_request(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(input): Json<ApproveInput>,
) -> AppResult<Json<ShiftChangeRequest>> {
    Ok(Json(
        state
            .services
            .shift_changes
            .approve(auth.employee_id, id, input.message)
            .await?,
    ))
}

/// POST /api/shift-changes/{id}/reject
#[utoipa::path(
    post,
    path = "/api/shift-changes/{id}/reject",
    params(("id" = i32, Path, description = "Request id")),
    request_body = RejectInput,
    responses(
        (status = 200, description = "Target declined; request closed", body = ShiftChangeRequest),
        (status = 403, description = "Caller is not the target"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not awaiting the target")
    ),
    tag = "shift-changes",
    security(("cookie_auth" = []))
)]
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(input): Json<RejectInput>,
) -> AppResult<Json<ShiftChangeRequest>> {
    Ok(Json(
        state
            .services
            .shift_changes
            .reject(auth.employee_id, id, input.reason)
            .await?,
    ))
}

/// POST /api/shift-changes/{id}/admin-approve
#[utoipa::path(
    post,
    path = "/api/shift-changes/{id}/admin-approve",
    params(("id" = i32, Path, description = "Request id")),
    request_body = ApproveInput,
    responses(
        (status = 200, description = "Approved and the two schedules swapped owners", body = ShiftChangeRequest),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Not awaiting an administrator, or the swap would double-book")
    ),
    tag = "shift-changes",
    security(("cookie_auth" = []))
)]
pub async fn admin_approve_request(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(input): Json<ApproveInput>,
) -> AppResult<Json<ShiftChangeRequest>> {
    require_admin(&auth)?;
    tracing::info!(request_id = id, admin_id = auth.employee_id, "Admin approving shift change");
    Ok(Json(
        state
            .services
            .shift_changes
            .admin_approve(id, input.message)
            .await?,
    ))
}

/// POST /api/shift-changes/{id}/admin-reject
#[utoipa::path(
    post,
    path = "/api/shift-changes/{id}/admin-reject",
    params(("id" = i32, Path, description = "Request id")),
    request_body = RejectInput,
    responses(
        (status = 200, description = "Vetoed by an administrator", body = ShiftChangeRequest),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is already closed")
    ),
    tag = "shift-changes",
    security(("cookie_auth" = []))
)]
pub async fn admin_reject_request(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(input): Json<RejectInput>,
) -> AppResult<Json<ShiftChangeRequest>> {
    require_admin(&auth)?;
    tracing::info!(request_id = id, admin_id = auth.employee_id, "Admin rejecting shift change");
    Ok(Json(
        state
            .services
            .shift_changes
            .admin_reject(id, input.reason)
            .await?,
    ))
}
