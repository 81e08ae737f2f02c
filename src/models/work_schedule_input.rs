use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Input for a direct (manual) assignment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignScheduleInput {
    pub employee_id: i32,
    pub work_date: NaiveDate,
    pub shift_id: i32,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ScheduleRangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(rename = "employeeId")]
    pub employee_id: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ScheduleDateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CoverageQuery {
    #[serde(rename = "employeeId")]
    pub employee_id: i32,
    pub date: NaiveDate,
    #[serde(rename = "shiftId")]
    pub shift_id: i32,
}

/// Response for work schedule mutations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduleMutationResponse {
    pub success: bool,
    pub message: Option<String>,
}
