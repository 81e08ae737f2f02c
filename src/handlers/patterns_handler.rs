use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::{
    extractors::{require_admin, require_self_or_admin, AuthenticatedUser},
    models::{
        CreatePatternInput, DeletePatternQuery, PatternMutationResponse, PatternWithShifts, RegenerateInput,
        RegenerationReport, ReplacePatternShiftsInput, SchedulePattern,
    },
    AppResult, AppState,
};

/// POST /api/patterns
#[utoipa::path(
    post,
    path = "/api/patterns",
    request_body = CreatePatternInput,
    responses(
        (status = 200, description = "Pattern created and made the employee's active pattern", body = PatternWithShifts),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Unknown employee or shift"),
        (status = 422, description = "Invalid cells")
    ),
    tag = "patterns",
    security(("cookie_auth" = []))
)]
pub async fn create_pattern(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<CreatePatternInput>,
) -> AppResult<Json<PatternWithShifts>> {
    require_admin(&auth)?;
    Ok(Json(state.services.patterns.create(input).await?))
}

/// GET /api/patterns/{id}
#[utoipa::path(
    get,
    path = "/api/patterns/{id}",
    params(("id" = i32, Path, description = "Pattern id")),
    responses(
        (status = 200, description = "Pattern with its cells", body = PatternWithShifts),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Pattern not found")
    ),
    tag = "patterns",
    security(("cookie_auth" = []))
)]
pub async fn get_pattern(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<PatternWithShifts>> {
    let pattern = state.services.patterns.get(id).await?;
    require_self_or_admin(&auth, pattern.pattern.employee_id)?;
    Ok(Json(pattern))
}

/// PUT /api/patterns/{id}/shifts
#[utoipa::path(
    put,
    path = "/api/patterns/{id}/shifts",
    params(("id" = i32, Path, description = "Pattern id")),
    request_body = ReplacePatternShiftsInput,
    responses(
        (status = 200, description = "Cells replaced; regenerate to apply them", body = PatternWithShifts),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Pattern or shift not found"),
        (status = 422, description = "Invalid cells")
    ),
    tag = "patterns",
    security(("cookie_auth" = []))
)]
pub async fn replace_pattern_shifts(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(input): Json<ReplacePatternShiftsInput>,
) -> AppResult<Json<PatternWithShifts>> {
    require_admin(&auth)?;
    Ok(Json(state.services.patterns.replace_shifts(id, input.shifts).await?))
}

/// POST /api/patterns/{id}/activate
#[utoipa::path(
    post,
    path = "/api/patterns/{id}/activate",
    params(("id" = i32, Path, description = "Pattern id")),
    responses(
        (status = 200, description = "Pattern active; the employee's other patterns deactivated", body = PatternWithShifts),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Pattern not found")
    ),
    tag = "patterns",
    security(("cookie_auth" = []))
)]
pub async fn activate_pattern(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<PatternWithShifts>> {
    require_admin(&auth)?;
    Ok(Json(state.services.patterns.activate(id).await?))
}

/// POST /api/patterns/{id}/regenerate
#[utoipa::path(
    post,
    path = "/api/patterns/{id}/regenerate",
    params(("id" = i32, Path, description = "Pattern id")),
    request_body = RegenerateInput,
    responses(
        (status = 200, description = "Regeneration report, including non-fatal conflicts", body = RegenerationReport),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Pattern not found"),
        (status = 409, description = "Pattern is inactive")
    ),
    tag = "patterns",
    security(("cookie_auth" = []))
)]
pub async fn regenerate_pattern(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(input): Json<RegenerateInput>,
) -> AppResult<Json<RegenerationReport>> {
    require_admin(&auth)?;
    Ok(Json(state.services.patterns.regenerate(id, input.start_date).await?))
}

/// DELETE /api/patterns/{id}?confirm=
#[utoipa::path(
    delete,
    path = "/api/patterns/{id}",
    params(("id" = i32, Path, description = "Pattern id"), DeletePatternQuery),
    responses(
        (status = 200, description = "Pattern deleted", body = PatternMutationResponse),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Pattern not found"),
        (status = 409, description = "Pattern is active and the delete was not confirmed")
    ),
    tag = "patterns",
    security(("cookie_auth" = []))
)]
pub async fn delete_pattern(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(id): Path<i32>,
    Query(query): Query<DeletePatternQuery>,
) -> AppResult<Json<PatternMutationResponse>> {
    require_admin(&auth)?;
    state.services.patterns.delete(id, query.confirm).await?;

    Ok(Json(PatternMutationResponse {
        success: true,
        affected: 1,
        message: Some("Pattern deleted".to_string()),
    }))
}

/// GET /api/employees/{id}/patterns
#[utoipa::path(
    get,
    path = "/api/employees/{id}/patterns",
    params(("id" = i32, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Pattern history, newest first", body = Vec<SchedulePattern>),
        (status = 403, description = "Not the employee or an administrator")
    ),
    tag = "patterns",
    security(("cookie_auth" = []))
)]
pub async fn get_employee_patterns(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(employee_id): Path<i32>,
) -> AppResult<Json<Vec<SchedulePattern>>> {
    require_self_or_admin(&auth, employee_id)?;
    Ok(Json(state.services.patterns.patterns_for_employee(employee_id).await?))
}

/// GET /api/employees/{id}/patterns/active
#[utoipa::path(
    get,
    path = "/api/employees/{id}/patterns/active",
    params(("id" = i32, Path, description = "Employee id")),
    responses(
        (status = 200, description = "The active pattern, or null", body = Option<PatternWithShifts>),
        (status = 403, description = "Not the employee or an administrator")
    ),
    tag = "patterns",
    security(("cookie_auth" = []))
)]
pub async fn get_active_pattern(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(employee_id): Path<i32>,
) -> AppResult<Json<Option<PatternWithShifts>>> {
    require_self_or_admin(&auth, employee_id)?;
    Ok(Json(state.services.patterns.active_pattern(employee_id).await?))
}

/// POST /api/employees/{id}/patterns/deactivate
#[utoipa::path(
    post,
    path = "/api/employees/{id}/patterns/deactivate",
    params(("id" = i32, Path, description = "Employee id")),
    responses(
        (status = 200, description = "All of the employee's patterns deactivated; generated rows kept", body = PatternMutationResponse),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Employee not found")
    ),
    tag = "patterns",
    security(("cookie_auth" = []))
)]
pub async fn deactivate_employee_patterns(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Path(employee_id): Path<i32>,
) -> AppResult<Json<PatternMutationResponse>> {
    require_admin(&auth)?;
    let affected = state.services.patterns.deactivate_for_employee(employee_id).await?;

    Ok(Json(PatternMutationResponse {
        success: true,
        affected,
        message: Some(format!("Deactivated {} patterns", affected)),
    }))
}
