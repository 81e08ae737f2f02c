use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::catalog::require_usable_shift;
use crate::{
    directory::{require_employee, RoleDirectory},
    models::{AssignScheduleInput, CoveragePeer, NewWorkSchedule, ScheduleOrigin, WorkSchedule},
    store::{RotaStore, RotaTx},
    AppError, AppResult,
};

/// The one (employee, date) check every write path runs inside its own
/// transaction before it gives `employee_id` a row on `date`. Rows listed
/// in `ignoring` are about to move and do not count.
pub async fn ensure_not_double_booked(
    tx: &mut dyn RotaTx,
    employee_id: i32,
    date: NaiveDate,
    ignoring: &[Uuid],
) -> AppResult<()> {
    let existing = tx.schedules_for_employee_on(employee_id, date).await?;
    match existing.iter().find(|row| !ignoring.contains(&row.id)) {
        Some(row) => Err(AppError::DoubleBooked(format!(
            "Employee {} already has a shift on {} (schedule {})",
            employee_id, date, row.id
        ))),
        None => Ok(()),
    }
}

fn check_range(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if start > end {
        return Err(AppError::Validation(format!(
            "Range start {} is after end {}",
            start, end
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct WorkScheduleService {
    store: Arc<dyn RotaStore>,
    directory: Arc<dyn RoleDirectory>,
}

impl WorkScheduleService {
    pub fn new(store: Arc<dyn RotaStore>, directory: Arc<dyn RoleDirectory>) -> Self {
        Self { store, directory }
    }

    /// Manual assignment by an administrator.
    pub async fn assign(&self, input: AssignScheduleInput) -> AppResult<WorkSchedule> {
        require_employee(self.directory.as_ref(), input.employee_id).await?;

        let mut tx = self.store.begin().await?;
        require_usable_shift(tx.as_mut(), input.shift_id).await?;
        ensure_not_double_booked(tx.as_mut(), input.employee_id, input.work_date, &[]).await?;

        let schedule = tx
            .insert_schedule(&NewWorkSchedule {
                employee_id: input.employee_id,
                shift_id: input.shift_id,
                work_date: input.work_date,
                origin: ScheduleOrigin::Manual,
            })
            .await?;
        tx.commit().await?;

        tracing::info!(
            schedule_id = %schedule.id,
            employee_id = schedule.employee_id,
            work_date = %schedule.work_date,
            "Work schedule assigned"
        );
        Ok(schedule)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<WorkSchedule> {
        let mut tx = self.store.begin().await?;
        tx.find_schedule(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work schedule {} not found", id)))
    }

    pub async fn unassign(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        tx.lock_schedule(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Work schedule {} not found", id)))?;

        let open = tx.open_requests_for_schedules(&[id]).await?;
        if let Some(request) = open.first() {
            return Err(AppError::Conflict(format!(
                "Work schedule {} is referenced by open shift change request {}",
                id, request.id
            )));
        }

        tx.delete_schedule(id).await?;
        tx.commit().await?;

        tracing::info!(schedule_id = %id, "Work schedule removed");
        Ok(())
    }

    pub async fn find_by_employee_and_range(
        &self,
        employee_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<WorkSchedule>> {
        check_range(start, end)?;
        let mut tx = self.store.begin().await?;
        tx.schedules_for_employee(employee_id, start, end).await
    }

    pub async fn find_by_range(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<WorkSchedule>> {
        check_range(start, end)?;
        let mut tx = self.store.begin().await?;
        tx.schedules_in_range(start, end).await
    }

    pub async fn find_by_date(&self, date: NaiveDate) -> AppResult<Vec<WorkSchedule>> {
        self.find_by_range(date, date).await
    }

    /// Employees holding any of `roles` who work `shift_id` on `date`,
    /// excluding `exclude_employee`. Ordered by name.
    pub async fn same_role_same_shift(
        &self,
        date: NaiveDate,
        shift_id: i32,
        roles: &[String],
        exclude_employee: i32,
    ) -> AppResult<Vec<CoveragePeer>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let rows = {
            let mut tx = self.store.begin().await?;
            tx.schedules_with_shift_on(date, shift_id).await?
        };
        let working: HashMap<i32, Uuid> = rows.iter().map(|row| (row.employee_id, row.id)).collect();

        let peers = self
            .directory
            .employees_with_any_role(roles)
            .await?
            .into_iter()
            .filter(|e| e.id != exclude_employee)
            .filter_map(|e| {
                working.get(&e.id).map(|schedule_id| CoveragePeer {
                    employee_id: e.id,
                    full_name: e.full_name,
                    schedule_id: *schedule_id,
                })
            })
            .collect();

        Ok(peers)
    }
}
