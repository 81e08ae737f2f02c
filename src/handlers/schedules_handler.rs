use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    extractors::{require_admin, require_self_or_admin, AuthenticatedUser},
    models::{
        AssignScheduleInput, CoveragePeer, CoverageQuery, ScheduleDateQuery, ScheduleMutationResponse,
        ScheduleRangeQuery, WorkSchedule,
    },
    AppResult, AppState,
};

/// GET /api/schedules?start=&end=&employeeId=
#[utoipa::path(
    get,
    path = "/api/schedules",
    params(ScheduleRangeQuery),
    responses(
        (status = 200, description = "Work schedules in the inclusive range, by date then employee name", body = Vec<WorkSchedule>),
        (status = 422, description = "start is after end")
    ),
    tag = "schedules",
    security(("cookie_auth" = []))
)]
pub async fn get_schedules_for_range(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedUser,
    Query(query): Query<ScheduleRangeQuery>,
) -> AppResult<Json<Vec<WorkSchedule>>> {
    let schedules = match query.employee_id {
        Some(employee_id) => {
            state
                .services
                .schedules
                .find_by_employee_and_range(employee_id, query.start, query.end)
                .await?
        }
        None => state.services.schedules.find_by_range(query.start, query.end).await?,
    };
    Ok(Json(schedules))
}

/// GET /api/schedules/by-date?date=
#[utoipa::path(
    get,
    path = "/api/schedules/by-date",
    params(ScheduleDateQuery),
    responses(
        (status = 200, description = "Work schedules on the date", body = Vec<WorkSchedule>)
    ),
    tag = "schedules",
    security(("cookie_auth" = []))
)]
pub async fn get_schedules_for_date(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedUser,
    Query(query): Query<ScheduleDateQuery>,
) -> AppResult<Json<Vec<WorkSchedule>>> {
    Ok(Json(state.services.schedules.find_by_date(query.date).await?))
}

/// GET /api/schedules/coverage?employeeId=&date=&shiftId=
#[utoipa::path(
    get,
    path = "/api/schedules/coverage",
    params(CoverageQuery),
    responses(
        (status = 200, description = "Same-role colleagues on the same shift that day", body = Vec<CoveragePeer>),
        (status = 403, description = "Not the employee or an administrator"),
        (status = 404, description = "Employee not found")
    ),
    tag = "schedules",
    security(("cookie_auth" = []))
)]
pub async fn get_coverage(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Query(query): Query<CoverageQuery>,
) -> AppResult<Json<Vec<CoveragePeer>>> {
    require_self_or_admin(&auth, query.employee_id)?;
    Ok(Json(
        state
            .services
            .coverage
            .peers(query.employee_id, query.date, query.shift_id)
            .await?,
    ))
}

/// GET /api/schedules/{id}
#[utoipa::path(
    get,
    path = "/api/schedules/{id}",
    params(("id" = Uuid, Path, description = "Work schedule id")),
    responses(
        (status = 200, description = "The work schedule", body = WorkSchedule),
        (status = 404, description = "Work schedule not found")
    ),
    tag = "schedules",
    security(("cookie_auth" = []))
)]
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WorkSchedule>> {
    Ok(Json(state.services.schedules.get(id).await?))
}

/// POST /api/schedules
#[utoipa::path(
    post,
    path = "/api/schedules",
    request_body = AssignScheduleInput,
    responses(
        (status = 200, description = "Manual assignment created", body = WorkSchedule),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Unknown employee or shift"),
        (status = 409, description = "Employee already has a shift that day")
    ),
    tag = "schedules",
    security(("cookie_auth" = []))
)]
pub async fn assign_schedule(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<AssignScheduleInput>,
) -> AppResult<Json<WorkSchedule>> {
    require_admin(&auth)?;
    Ok(Json(state.services.schedules.assign(input).await?))
}

/// DELETE /api/schedules/{id}
#[utoipa::path(
    delete,
    path = "/api/schedules/{id}",
    params(("id" = Uuid, Path, description = "Work schedule id")),
    responses(
        (status = 200, description = "Work schedule removed", body = ScheduleMutationResponse),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Work schedule not found"),
        (status = 409, description = "An open shift change request references the row")
    ),
    tag = "schedules",
    security(("cookie_auth" = []))
)]
pub async fn unassign_schedule(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ScheduleMutationResponse>> {
    require_admin(&auth)?;
    state.services.schedules.unassign(id).await?;

    Ok(Json(ScheduleMutationResponse {
        success: true,
        message: Some("Work schedule removed".to_string()),
    }))
}
