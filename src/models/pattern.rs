use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Weeks in one pattern cycle.
pub const CYCLE_WEEKS: i16 = 4;
pub const DAYS_PER_WEEK: i16 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SchedulePattern {
    pub id: i32,
    pub employee_id: i32,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One cell of the 4-week × 7-day template. `day_of_week` is ISO (1 = Monday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PatternShift {
    pub pattern_id: i32,
    pub week_number: i16,
    pub day_of_week: i16,
    pub shift_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatternWithShifts {
    #[serde(flatten)]
    pub pattern: SchedulePattern,
    pub shifts: Vec<PatternShift>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RegenerationConflict {
    pub work_date: NaiveDate,
    pub existing_schedule_id: Uuid,
    pub reason: String,
}

/// Outcome of one regeneration run. Conflicts are informational, never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RegenerationReport {
    pub pattern_id: i32,
    pub start_date: NaiveDate,
    /// Exclusive end of the horizon.
    pub end_date: NaiveDate,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub handed_off: usize,
    pub conflicts: Vec<RegenerationConflict>,
}
