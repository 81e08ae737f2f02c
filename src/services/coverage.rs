use chrono::NaiveDate;
use std::sync::Arc;

use super::schedules::WorkScheduleService;
use crate::{
    directory::{require_employee, RoleDirectory},
    models::CoveragePeer,
    AppResult,
};

/// "Who else with my role works this shift today." Read-only.
#[derive(Clone)]
pub struct CoverageService {
    directory: Arc<dyn RoleDirectory>,
    schedules: WorkScheduleService,
}

impl CoverageService {
    pub fn new(directory: Arc<dyn RoleDirectory>, schedules: WorkScheduleService) -> Self {
        Self { directory, schedules }
    }

    pub async fn peers(&self, employee_id: i32, date: NaiveDate, shift_id: i32) -> AppResult<Vec<CoveragePeer>> {
        require_employee(self.directory.as_ref(), employee_id).await?;

        let roles = self.directory.roles_for(employee_id).await?;
        if roles.is_empty() {
            tracing::debug!(employee_id, "Employee holds no roles; no coverage peers");
            return Ok(Vec::new());
        }

        self.schedules
            .same_role_same_shift(date, shift_id, &roles, employee_id)
            .await
    }
}
