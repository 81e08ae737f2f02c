use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{AppError, AppResult};

/// Where a work schedule row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleOrigin {
    Manual,
    Pattern {
        pattern_id: i32,
        week_number: i16,
        day_of_week: i16,
    },
}

impl ScheduleOrigin {
    pub fn pattern_id(&self) -> Option<i32> {
        match self {
            ScheduleOrigin::Manual => None,
            ScheduleOrigin::Pattern { pattern_id, .. } => Some(*pattern_id),
        }
    }

    pub fn is_pattern(&self, id: i32) -> bool {
        self.pattern_id() == Some(id)
    }

    /// Nullable column triple as stored in the work schedule table.
    pub fn to_columns(&self) -> (Option<i32>, Option<i16>, Option<i16>) {
        match *self {
            ScheduleOrigin::Manual => (None, None, None),
            ScheduleOrigin::Pattern {
                pattern_id,
                week_number,
                day_of_week,
            } => (Some(pattern_id), Some(week_number), Some(day_of_week)),
        }
    }

    pub fn from_columns(
        pattern_id: Option<i32>,
        week_number: Option<i16>,
        day_of_week: Option<i16>,
    ) -> AppResult<Self> {
        match (pattern_id, week_number, day_of_week) {
            (None, None, None) => Ok(ScheduleOrigin::Manual),
            (Some(pattern_id), Some(week_number), Some(day_of_week)) => Ok(ScheduleOrigin::Pattern {
                pattern_id,
                week_number,
                day_of_week,
            }),
            other => Err(AppError::Internal(format!(
                "Inconsistent schedule origin columns: {:?}",
                other
            ))),
        }
    }
}

/// One concrete (employee, date) → shift assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkSchedule {
    pub id: Uuid,
    pub employee_id: i32,
    pub shift_id: i32,
    pub work_date: NaiveDate,
    pub origin: ScheduleOrigin,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkSchedule {
    pub employee_id: i32,
    pub shift_id: i32,
    pub work_date: NaiveDate,
    pub origin: ScheduleOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_round_trips_through_columns() {
        let origin = ScheduleOrigin::Pattern {
            pattern_id: 3,
            week_number: 2,
            day_of_week: 5,
        };
        let (p, w, d) = origin.to_columns();
        assert_eq!(ScheduleOrigin::from_columns(p, w, d).unwrap(), origin);
        assert_eq!(
            ScheduleOrigin::from_columns(None, None, None).unwrap(),
            ScheduleOrigin::Manual
        );
    }

    #[test]
    fn partial_origin_columns_are_rejected() {
        assert!(ScheduleOrigin::from_columns(Some(1), None, Some(3)).is_err());
    }

    #[test]
    fn origin_serializes_as_tagged_object() {
        let json = serde_json::to_value(ScheduleOrigin::Manual).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "MANUAL"}));
    }
}
