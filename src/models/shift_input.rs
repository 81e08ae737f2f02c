use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::ShiftSort;

/// Input DTO for creating a catalog shift
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateShiftInput {
    pub name: String,
    #[schema(value_type = String, example = "07:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "15:00:00")]
    pub end_time: NaiveTime,
}

/// Input DTO for updating a catalog shift
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateShiftInput {
    pub name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    pub active: Option<bool>,
}

impl UpdateShiftInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.start_time.is_none() && self.end_time.is_none() && self.active.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListShiftsQuery {
    #[serde(default)]
    pub page: u32,
    pub size: Option<u32>,
    #[serde(default)]
    #[param(inline)]
    pub sort: ShiftSort,
}

/// Response after successful mutation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShiftMutationResponse {
    pub success: bool,
    pub shift_id: Option<i32>,
    pub message: Option<String>,
}
