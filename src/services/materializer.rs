//! Expansion of a 4-week pattern into dated work schedule rows.
//!
//! Planning is pure: it looks at the pattern cells and the rows already on
//! disk and decides what to insert, update and delete. The pattern service
//! applies the plan inside its transaction.

use chrono::{Datelike, Days, NaiveDate};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::{
    models::{
        NewWorkSchedule, PatternShift, RegenerationConflict, SchedulePattern, ScheduleOrigin, WorkSchedule,
        CYCLE_WEEKS, DAYS_PER_WEEK,
    },
    AppError, AppResult,
};

/// Cycle coordinates of `date` for a cycle anchored at `start`.
/// Week is 1..=4, day is the ISO weekday (Monday = 1).
pub fn cycle_position(start: NaiveDate, date: NaiveDate) -> (i16, i16) {
    let days = (date - start).num_days();
    let week = (days.div_euclid(DAYS_PER_WEEK as i64)).rem_euclid(CYCLE_WEEKS as i64) as i16 + 1;
    let day = date.weekday().number_from_monday() as i16;
    (week, day)
}

/// Exclusive end of a horizon of `weeks` weeks starting at `start`.
pub fn horizon_end(start: NaiveDate, weeks: u32) -> AppResult<NaiveDate> {
    start
        .checked_add_days(Days::new(u64::from(weeks) * DAYS_PER_WEEK as u64))
        .ok_or_else(|| AppError::Validation(format!("Regeneration horizon from {} is out of range", start)))
}

/// Everything regeneration needs to know about the current state.
pub struct PlanInput<'a> {
    pub pattern: &'a SchedulePattern,
    pub cells: &'a [PatternShift],
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    /// The pattern owner's rows in the horizon.
    pub employee_rows: &'a [WorkSchedule],
    /// Rows generated by this pattern in the horizon, whoever owns them now.
    pub pattern_rows: &'a [WorkSchedule],
    /// Rows referenced by open shift-change requests.
    pub locked: &'a HashSet<Uuid>,
}

#[derive(Debug, Default)]
pub struct RegenerationPlan {
    pub inserts: Vec<NewWorkSchedule>,
    pub updates: Vec<WorkSchedule>,
    pub deletes: Vec<Uuid>,
    pub unchanged: usize,
    pub handed_off: usize,
    pub conflicts: Vec<RegenerationConflict>,
}

pub fn plan_regeneration(input: &PlanInput<'_>) -> RegenerationPlan {
    let pattern_id = input.pattern.id;
    let employee_id = input.pattern.employee_id;

    let cells: HashMap<(i16, i16), i32> = input
        .cells
        .iter()
        .map(|c| ((c.week_number, c.day_of_week), c.shift_id))
        .collect();

    let owned: HashMap<NaiveDate, &WorkSchedule> = input
        .employee_rows
        .iter()
        .map(|row| (row.work_date, row))
        .collect();

    // Dates where a row from this pattern now belongs to someone else.
    let handed_off: HashSet<NaiveDate> = input
        .pattern_rows
        .iter()
        .filter(|row| row.employee_id != employee_id)
        .map(|row| row.work_date)
        .collect();

    let mut plan = RegenerationPlan::default();

    for date in input.start.iter_days().take_while(|d| *d < input.end) {
        let (week_number, day_of_week) = cycle_position(input.start, date);
        let origin = ScheduleOrigin::Pattern {
            pattern_id,
            week_number,
            day_of_week,
        };

        match (cells.get(&(week_number, day_of_week)), owned.get(&date)) {
            (Some(&shift_id), Some(row)) if row.origin.is_pattern(pattern_id) => {
                if row.shift_id == shift_id && row.origin == origin {
                    plan.unchanged += 1;
                } else if input.locked.contains(&row.id) {
                    plan.conflicts.push(conflict(row, "referenced by an open shift-change request"));
                } else {
                    plan.updates.push(WorkSchedule {
                        shift_id,
                        origin,
                        ..(*row).clone()
                    });
                }
            }
            (Some(_), Some(row)) => {
                let reason = match row.origin {
                    ScheduleOrigin::Manual => "manual assignment".to_string(),
                    ScheduleOrigin::Pattern { pattern_id, .. } => format!("generated by pattern {}", pattern_id),
                };
                plan.conflicts.push(conflict(row, &reason));
            }
            (Some(&shift_id), None) => {
                if handed_off.contains(&date) {
                    plan.handed_off += 1;
                } else {
                    plan.inserts.push(NewWorkSchedule {
                        employee_id,
                        shift_id,
                        work_date: date,
                        origin,
                    });
                }
            }
            (None, Some(row)) if row.origin.is_pattern(pattern_id) => {
                if input.locked.contains(&row.id) {
                    plan.conflicts.push(conflict(row, "referenced by an open shift-change request"));
                } else {
                    plan.deletes.push(row.id);
                }
            }
            (None, _) => {}
        }
    }

    plan
}

fn conflict(row: &WorkSchedule, reason: &str) -> RegenerationConflict {
    RegenerationConflict {
        work_date: row.work_date,
        existing_schedule_id: row.id,
        reason: reason.to_string(),
    }
}
