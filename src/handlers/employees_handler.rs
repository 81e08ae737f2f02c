use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    extractors::{require_admin, AuthenticatedUser},
    models::{Employee, EmployeesByRoleQuery},
    AppResult, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub employee_id: i32,
    pub full_name: String,
    pub is_admin: bool,
    pub roles: Vec<String>,
}

/// GET /api/employees/me
#[utoipa::path(
    get,
    path = "/api/employees/me",
    responses(
        (status = 200, description = "The authenticated employee", body = MeResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "employees",
    security(("cookie_auth" = []))
)]
pub async fn get_me(State(state): State<Arc<AppState>>, auth: AuthenticatedUser) -> AppResult<Json<MeResponse>> {
    let roles = state.directory.roles_for(auth.employee_id).await?;

    Ok(Json(MeResponse {
        employee_id: auth.employee_id,
        full_name: auth.full_name,
        is_admin: auth.is_admin,
        roles,
    }))
}

/// GET /api/employees/by-role?role=
#[utoipa::path(
    get,
    path = "/api/employees/by-role",
    params(EmployeesByRoleQuery),
    responses(
        (status = 200, description = "Employees holding the role, by name", body = Vec<Employee>),
        (status = 403, description = "Administrator role required")
    ),
    tag = "employees",
    security(("cookie_auth" = []))
)]
pub async fn get_employees_by_role(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Query(query): Query<EmployeesByRoleQuery>,
) -> AppResult<Json<Vec<Employee>>> {
    require_admin(&auth)?;
    Ok(Json(state.directory.employees_with_role(&query.role).await?))
}
