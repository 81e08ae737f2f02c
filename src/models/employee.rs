use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// An employee as seen through the identity/role provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Employee {
    pub id: i32,
    pub full_name: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeesByRoleQuery {
    pub role: String,
}

/// A colleague sharing a role and a shift with someone on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CoveragePeer {
    pub employee_id: i32,
    pub full_name: String,
    pub schedule_id: Uuid,
}
