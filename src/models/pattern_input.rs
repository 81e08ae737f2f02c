use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatternShiftInput {
    pub week_number: i16,
    pub day_of_week: i16,
    pub shift_id: i32,
}

/// Input for creating a schedule pattern
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePatternInput {
    pub employee_id: i32,
    pub name: String,
    pub shifts: Vec<PatternShiftInput>,
}

/// Input for replacing every cell of an existing pattern
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplacePatternShiftsInput {
    pub shifts: Vec<PatternShiftInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegenerateInput {
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct DeletePatternQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// Response for pattern mutations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatternMutationResponse {
    pub success: bool,
    pub affected: u64,
    pub message: Option<String>,
}
