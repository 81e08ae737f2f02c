use chrono::NaiveDate;
use metrics::counter;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    catalog::require_usable_shift,
    materializer::{horizon_end, plan_regeneration, PlanInput},
    schedules::ensure_not_double_booked,
};
use crate::{
    directory::{require_employee, RoleDirectory},
    models::{
        CreatePatternInput, PatternShiftInput, PatternWithShifts, RegenerationReport, SchedulePattern, CYCLE_WEEKS,
        DAYS_PER_WEEK,
    },
    store::{RotaStore, RotaTx},
    AppError, AppResult,
};

/// Range and uniqueness of the cells, plus every referenced shift being usable.
async fn validate_cells(tx: &mut dyn RotaTx, cells: &[PatternShiftInput]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for cell in cells {
        if !(1..=CYCLE_WEEKS).contains(&cell.week_number) {
            return Err(AppError::Validation(format!(
                "Week number {} is outside 1..={}",
                cell.week_number, CYCLE_WEEKS
            )));
        }
        if !(1..=DAYS_PER_WEEK).contains(&cell.day_of_week) {
            return Err(AppError::Validation(format!(
                "Day of week {} is outside 1..={}",
                cell.day_of_week, DAYS_PER_WEEK
            )));
        }
        if !seen.insert((cell.week_number, cell.day_of_week)) {
            return Err(AppError::Validation(format!(
                "Week {} day {} appears more than once",
                cell.week_number, cell.day_of_week
            )));
        }
    }

    let shift_ids: HashSet<i32> = cells.iter().map(|c| c.shift_id).collect();
    for shift_id in shift_ids {
        require_usable_shift(tx, shift_id).await?;
    }
    Ok(())
}

async fn with_shifts(tx: &mut dyn RotaTx, pattern: SchedulePattern) -> AppResult<PatternWithShifts> {
    let shifts = tx.pattern_shifts(pattern.id).await?;
    Ok(PatternWithShifts { pattern, shifts })
}

#[derive(Clone)]
pub struct PatternService {
    store: Arc<dyn RotaStore>,
    directory: Arc<dyn RoleDirectory>,
    regeneration_weeks: u32,
}

impl PatternService {
    pub fn new(store: Arc<dyn RotaStore>, directory: Arc<dyn RoleDirectory>, regeneration_weeks: u32) -> Self {
        Self {
            store,
            directory,
            regeneration_weeks,
        }
    }

    /// Stores the pattern as the employee's active one. No rows are generated.
    pub async fn create(&self, input: CreatePatternInput) -> AppResult<PatternWithShifts> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Pattern name must not be empty".to_string()));
        }
        require_employee(self.directory.as_ref(), input.employee_id).await?;

        let mut tx = self.store.begin().await?;
        validate_cells(tx.as_mut(), &input.shifts).await?;

        let superseded = tx.deactivate_patterns(input.employee_id, None).await?;
        let pattern = tx.insert_pattern(input.employee_id, name).await?;
        let shifts = tx.replace_pattern_shifts(pattern.id, &input.shifts).await?;
        tx.commit().await?;

        tracing::info!(
            pattern_id = pattern.id,
            employee_id = pattern.employee_id,
            cells = shifts.len(),
            superseded,
            "Schedule pattern created"
        );
        Ok(PatternWithShifts { pattern, shifts })
    }

    pub async fn get(&self, id: i32) -> AppResult<PatternWithShifts> {
        let mut tx = self.store.begin().await?;
        let pattern = tx
            .find_pattern(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pattern {} not found", id)))?;
        with_shifts(tx.as_mut(), pattern).await
    }

    pub async fn active_pattern(&self, employee_id: i32) -> AppResult<Option<PatternWithShifts>> {
        let mut tx = self.store.begin().await?;
        match tx.active_pattern(employee_id).await? {
            Some(pattern) => Ok(Some(with_shifts(tx.as_mut(), pattern).await?)),
            None => Ok(None),
        }
    }

    /// Active and inactive, newest first.
    pub async fn patterns_for_employee(&self, employee_id: i32) -> AppResult<Vec<SchedulePattern>> {
        let mut tx = self.store.begin().await?;
        tx.patterns_for_employee(employee_id).await
    }

    pub async fn replace_shifts(&self, id: i32, cells: Vec<PatternShiftInput>) -> AppResult<PatternWithShifts> {
        let mut tx = self.store.begin().await?;
        let pattern = tx
            .lock_pattern(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pattern {} not found", id)))?;

        validate_cells(tx.as_mut(), &cells).await?;
        let shifts = tx.replace_pattern_shifts(id, &cells).await?;
        tx.commit().await?;

        tracing::info!(pattern_id = id, cells = shifts.len(), "Pattern cells replaced");
        Ok(PatternWithShifts { pattern, shifts })
    }

    pub async fn activate(&self, id: i32) -> AppResult<PatternWithShifts> {
        let mut tx = self.store.begin().await?;
        let mut pattern = tx
            .lock_pattern(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pattern {} not found", id)))?;

        tx.deactivate_patterns(pattern.employee_id, Some(id)).await?;
        tx.set_pattern_active(id, true).await?;
        pattern.active = true;
        let result = with_shifts(tx.as_mut(), pattern).await?;
        tx.commit().await?;

        tracing::info!(pattern_id = id, "Pattern activated");
        Ok(result)
    }

    /// Generated rows stay where they are.
    pub async fn deactivate_for_employee(&self, employee_id: i32) -> AppResult<u64> {
        require_employee(self.directory.as_ref(), employee_id).await?;

        let mut tx = self.store.begin().await?;
        let changed = tx.deactivate_patterns(employee_id, None).await?;
        tx.commit().await?;

        tracing::info!(employee_id, changed, "Patterns deactivated");
        Ok(changed)
    }

    /// An active pattern is only deleted with `confirm`. Cells go with it;
    /// generated rows keep their origin tag.
    pub async fn delete(&self, id: i32, confirm: bool) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let pattern = tx
            .lock_pattern(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pattern {} not found", id)))?;

        if pattern.active && !confirm {
            return Err(AppError::Conflict(format!(
                "Pattern {} is active; deactivate it first or confirm the delete",
                id
            )));
        }

        tx.delete_pattern(id).await?;
        tx.commit().await?;

        tracing::info!(pattern_id = id, was_active = pattern.active, "Pattern deleted");
        Ok(())
    }

    /// Brings the pattern's generated rows over the configured horizon in
    /// line with its cells. Conflicts are reported, never raised.
    pub async fn regenerate(&self, id: i32, start_date: NaiveDate) -> AppResult<RegenerationReport> {
        let end_date = horizon_end(start_date, self.regeneration_weeks)?;
        let last_day = end_date
            .pred_opt()
            .ok_or_else(|| AppError::Validation(format!("Invalid start date {}", start_date)))?;

        let mut tx = self.store.begin().await?;
        let pattern = tx
            .lock_pattern(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pattern {} not found", id)))?;

        if !pattern.active {
            tracing::warn!(pattern_id = id, "Refusing to regenerate inactive pattern");
            return Err(AppError::Inactive(format!("Pattern {} is inactive", id)));
        }

        let cells = tx.pattern_shifts(id).await?;
        let employee_rows = tx
            .schedules_for_employee(pattern.employee_id, start_date, last_day)
            .await?;
        let pattern_rows = tx.schedules_from_pattern(id, start_date, last_day).await?;

        let candidate_ids: Vec<Uuid> = employee_rows
            .iter()
            .chain(pattern_rows.iter())
            .map(|row| row.id)
            .collect();
        let locked: HashSet<Uuid> = tx
            .open_requests_for_schedules(&candidate_ids)
            .await?
            .iter()
            .flat_map(|r| [r.original_schedule_id, r.target_schedule_id])
            .collect();

        let plan = plan_regeneration(&PlanInput {
            pattern: &pattern,
            cells: &cells,
            start: start_date,
            end: end_date,
            employee_rows: &employee_rows,
            pattern_rows: &pattern_rows,
            locked: &locked,
        });

        for schedule_id in &plan.deletes {
            tx.delete_schedule(*schedule_id).await?;
        }
        for row in &plan.updates {
            tx.update_schedule(row).await?;
        }
        for new in &plan.inserts {
            ensure_not_double_booked(tx.as_mut(), new.employee_id, new.work_date, &[]).await?;
            tx.insert_schedule(new).await?;
        }
        tx.commit().await?;

        let report = RegenerationReport {
            pattern_id: id,
            start_date,
            end_date,
            created: plan.inserts.len(),
            updated: plan.updates.len(),
            unchanged: plan.unchanged,
            removed: plan.deletes.len(),
            handed_off: plan.handed_off,
            conflicts: plan.conflicts,
        };

        counter!("rota_regenerations_total").increment(1);
        counter!("rota_regeneration_conflicts_total").increment(report.conflicts.len() as u64);
        tracing::info!(
            pattern_id = id,
            employee_id = pattern.employee_id,
            %start_date,
            %end_date,
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            removed = report.removed,
            handed_off = report.handed_off,
            conflicts = report.conflicts.len(),
            "Pattern regenerated"
        );
        Ok(report)
    }
}
