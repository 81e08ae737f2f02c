use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A named time-of-day template. Work schedules reference it by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Shift {
    pub id: i32,
    pub name: String,
    #[schema(value_type = String, example = "07:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "15:00:00")]
    pub end_time: NaiveTime,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sort keys accepted by the catalog listing. Every key is tie-broken by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShiftSort {
    #[default]
    Name,
    Start,
    Id,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShiftPage {
    pub items: Vec<Shift>,
    pub page: u32,
    pub size: u32,
    pub total: i64,
}
