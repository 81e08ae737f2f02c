//! In-process backend. Transactions work on a private copy of the data and
//! publish it on commit; the store mutex is held for the whole transaction,
//! which serializes writers. Used by the test suites and local demos.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{RotaStore, RotaTx};
use crate::{
    directory::RoleDirectory,
    models::{
        ApprovalStatus, CreateShiftInput, Employee, NewShiftChangeRequest, NewWorkSchedule, PatternShift,
        PatternShiftInput, SchedulePattern, Shift, ShiftChangeRequest, ShiftSort, WorkSchedule,
    },
    AppError, AppResult,
};

#[derive(Debug, Clone, Default)]
struct MemoryData {
    shifts: BTreeMap<i32, Shift>,
    patterns: BTreeMap<i32, SchedulePattern>,
    pattern_shifts: Vec<PatternShift>,
    schedules: HashMap<Uuid, WorkSchedule>,
    requests: BTreeMap<i32, ShiftChangeRequest>,
    next_shift_id: i32,
    next_pattern_id: i32,
    next_request_id: i32,
}

#[derive(Debug, Default)]
struct People {
    employees: BTreeMap<i32, Employee>,
    roles: BTreeMap<i32, BTreeSet<String>>,
}

impl People {
    fn name_of(&self, id: i32) -> String {
        self.employees
            .get(&id)
            .map(|e| e.full_name.clone())
            .unwrap_or_default()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
    people: Arc<RwLock<People>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an employee with the built-in role directory.
    pub fn add_employee(&self, id: i32, full_name: &str, roles: &[&str]) {
        let mut people = self.people.write().unwrap_or_else(|e| e.into_inner());
        people.employees.insert(
            id,
            Employee {
                id,
                full_name: full_name.to_string(),
            },
        );
        people
            .roles
            .insert(id, roles.iter().map(|r| r.to_string()).collect());
    }
}

#[async_trait]
impl RotaStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn RotaTx>> {
        let guard = self.data.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            people: self.people.clone(),
        }))
    }
}

#[async_trait]
impl RoleDirectory for MemoryStore {
    async fn employee(&self, id: i32) -> AppResult<Option<Employee>> {
        let people = self.people.read().unwrap_or_else(|e| e.into_inner());
        Ok(people.employees.get(&id).cloned())
    }

    async fn roles_for(&self, employee_id: i32) -> AppResult<Vec<String>> {
        let people = self.people.read().unwrap_or_else(|e| e.into_inner());
        Ok(people
            .roles
            .get(&employee_id)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn employees_with_role(&self, role: &str) -> AppResult<Vec<Employee>> {
        let people = self.people.read().unwrap_or_else(|e| e.into_inner());
        let mut employees: Vec<Employee> = people
            .roles
            .iter()
            .filter(|(_, roles)| roles.contains(role))
            .filter_map(|(id, _)| people.employees.get(id).cloned())
            .collect();
        employees.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(employees)
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryData>,
    working: MemoryData,
    people: Arc<RwLock<People>>,
}

impl MemoryTx {
    fn sorted_by_date(&self, mut rows: Vec<WorkSchedule>) -> Vec<WorkSchedule> {
        let people = self.people.read().unwrap_or_else(|e| e.into_inner());
        rows.sort_by(|a, b| {
            a.work_date
                .cmp(&b.work_date)
                .then_with(|| people.name_of(a.employee_id).cmp(&people.name_of(b.employee_id)))
                .then_with(|| a.id.cmp(&b.id))
        });
        rows
    }

    fn requests_where(&self, keep: impl Fn(&ShiftChangeRequest) -> bool) -> Vec<ShiftChangeRequest> {
        let mut rows: Vec<ShiftChangeRequest> =
            self.working.requests.values().filter(|r| keep(r)).cloned().collect();
        rows.sort_by(|a, b| b.request_time.cmp(&a.request_time).then(b.id.cmp(&a.id)));
        rows
    }
}

#[async_trait]
impl RotaTx for MemoryTx {
    async fn insert_shift(&mut self, input: &CreateShiftInput) -> AppResult<Shift> {
        self.working.next_shift_id += 1;
        let now = Utc::now();
        let shift = Shift {
            id: self.working.next_shift_id,
            name: input.name.clone(),
            start_time: input.start_time,
            end_time: input.end_time,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.working.shifts.insert(shift.id, shift.clone());
        Ok(shift)
    }

    async fn find_shift(&mut self, id: i32) -> AppResult<Option<Shift>> {
        Ok(self.working.shifts.get(&id).cloned())
    }

    async fn find_shift_by_name(&mut self, name: &str) -> AppResult<Option<Shift>> {
        let wanted = name.to_lowercase();
        Ok(self
            .working
            .shifts
            .values()
            .find(|s| s.name.to_lowercase() == wanted)
            .cloned())
    }

    async fn save_shift(&mut self, shift: &Shift) -> AppResult<Shift> {
        let stored = self
            .working
            .shifts
            .get_mut(&shift.id)
            .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", shift.id)))?;
        *stored = Shift {
            updated_at: Utc::now(),
            ..shift.clone()
        };
        Ok(stored.clone())
    }

    async fn list_shifts(&mut self, sort: ShiftSort, offset: i64, limit: i64) -> AppResult<(Vec<Shift>, i64)> {
        let mut shifts: Vec<Shift> = self.working.shifts.values().cloned().collect();
        match sort {
            ShiftSort::Name => {
                shifts.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then(a.id.cmp(&b.id)))
            }
            ShiftSort::Start => shifts.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id))),
            ShiftSort::Id => shifts.sort_by_key(|s| s.id),
        }
        let total = shifts.len() as i64;
        let page = shifts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn shift_reference_count(&mut self, id: i32) -> AppResult<i64> {
        let schedules = self.working.schedules.values().filter(|s| s.shift_id == id).count();
        let cells = self.working.pattern_shifts.iter().filter(|c| c.shift_id == id).count();
        Ok((schedules + cells) as i64)
    }

    async fn delete_shift(&mut self, id: i32) -> AppResult<bool> {
        if self.shift_reference_count(id).await? > 0 {
            return Err(AppError::InUse(format!(
                "Shift {} is referenced by schedules or patterns",
                id
            )));
        }
        Ok(self.working.shifts.remove(&id).is_some())
    }

    async fn insert_pattern(&mut self, employee_id: i32, name: &str) -> AppResult<SchedulePattern> {
        self.working.next_pattern_id += 1;
        let now = Utc::now();
        let pattern = SchedulePattern {
            id: self.working.next_pattern_id,
            employee_id,
            name: name.to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.working.patterns.insert(pattern.id, pattern.clone());
        Ok(pattern)
    }

    async fn find_pattern(&mut self, id: i32) -> AppResult<Option<SchedulePattern>> {
        Ok(self.working.patterns.get(&id).cloned())
    }

    async fn lock_pattern(&mut self, id: i32) -> AppResult<Option<SchedulePattern>> {
        self.find_pattern(id).await
    }

    async fn patterns_for_employee(&mut self, employee_id: i32) -> AppResult<Vec<SchedulePattern>> {
        let mut patterns: Vec<SchedulePattern> = self
            .working
            .patterns
            .values()
            .filter(|p| p.employee_id == employee_id)
            .cloned()
            .collect();
        patterns.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(patterns)
    }

    async fn active_pattern(&mut self, employee_id: i32) -> AppResult<Option<SchedulePattern>> {
        Ok(self
            .working
            .patterns
            .values()
            .filter(|p| p.employee_id == employee_id && p.active)
            .max_by_key(|p| p.id)
            .cloned())
    }

    async fn set_pattern_active(&mut self, id: i32, active: bool) -> AppResult<()> {
        let pattern = self
            .working
            .patterns
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Pattern {} not found", id)))?;
        pattern.active = active;
        pattern.updated_at = Utc::now();
        Ok(())
    }

    async fn deactivate_patterns(&mut self, employee_id: i32, except: Option<i32>) -> AppResult<u64> {
        let now = Utc::now();
        let mut changed = 0;
        for pattern in self.working.patterns.values_mut() {
            if pattern.employee_id == employee_id && pattern.active && Some(pattern.id) != except {
                pattern.active = false;
                pattern.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_pattern(&mut self, id: i32) -> AppResult<bool> {
        let removed = self.working.patterns.remove(&id).is_some();
        if removed {
            self.working.pattern_shifts.retain(|c| c.pattern_id != id);
        }
        Ok(removed)
    }

    async fn pattern_shifts(&mut self, pattern_id: i32) -> AppResult<Vec<PatternShift>> {
        let mut cells: Vec<PatternShift> = self
            .working
            .pattern_shifts
            .iter()
            .filter(|c| c.pattern_id == pattern_id)
            .cloned()
            .collect();
        cells.sort_by_key(|c| (c.week_number, c.day_of_week));
        Ok(cells)
    }

    async fn replace_pattern_shifts(
        &mut self,
        pattern_id: i32,
        shifts: &[PatternShiftInput],
    ) -> AppResult<Vec<PatternShift>> {
        self.working.pattern_shifts.retain(|c| c.pattern_id != pattern_id);
        self.working
            .pattern_shifts
            .extend(shifts.iter().map(|input| PatternShift {
                pattern_id,
                week_number: input.week_number,
                day_of_week: input.day_of_week,
                shift_id: input.shift_id,
            }));
        if let Some(pattern) = self.working.patterns.get_mut(&pattern_id) {
            pattern.updated_at = Utc::now();
        }
        self.pattern_shifts(pattern_id).await
    }

    async fn find_schedule(&mut self, id: Uuid) -> AppResult<Option<WorkSchedule>> {
        Ok(self.working.schedules.get(&id).cloned())
    }

    async fn lock_schedule(&mut self, id: Uuid) -> AppResult<Option<WorkSchedule>> {
        self.find_schedule(id).await
    }

    async fn schedules_for_employee_on(&mut self, employee_id: i32, date: NaiveDate) -> AppResult<Vec<WorkSchedule>> {
        let rows = self
            .working
            .schedules
            .values()
            .filter(|s| s.employee_id == employee_id && s.work_date == date)
            .cloned()
            .collect();
        Ok(self.sorted_by_date(rows))
    }

    async fn schedules_for_employee(
        &mut self,
        employee_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<WorkSchedule>> {
        let rows = self
            .working
            .schedules
            .values()
            .filter(|s| s.employee_id == employee_id && s.work_date >= start && s.work_date <= end)
            .cloned()
            .collect();
        Ok(self.sorted_by_date(rows))
    }

    async fn schedules_in_range(&mut self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<WorkSchedule>> {
        let rows = self
            .working
            .schedules
            .values()
            .filter(|s| s.work_date >= start && s.work_date <= end)
            .cloned()
            .collect();
        Ok(self.sorted_by_date(rows))
    }

    async fn schedules_from_pattern(
        &mut self,
        pattern_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<WorkSchedule>> {
        let rows = self
            .working
            .schedules
            .values()
            .filter(|s| s.origin.is_pattern(pattern_id) && s.work_date >= start && s.work_date <= end)
            .cloned()
            .collect();
        Ok(self.sorted_by_date(rows))
    }

    async fn schedules_with_shift_on(&mut self, date: NaiveDate, shift_id: i32) -> AppResult<Vec<WorkSchedule>> {
        let rows = self
            .working
            .schedules
            .values()
            .filter(|s| s.work_date == date && s.shift_id == shift_id)
            .cloned()
            .collect();
        Ok(self.sorted_by_date(rows))
    }

    async fn insert_schedule(&mut self, new: &NewWorkSchedule) -> AppResult<WorkSchedule> {
        let taken = self
            .working
            .schedules
            .values()
            .any(|s| s.employee_id == new.employee_id && s.work_date == new.work_date);
        if taken {
            return Err(AppError::DoubleBooked(format!(
                "Employee {} already has a shift on {}",
                new.employee_id, new.work_date
            )));
        }

        let now = Utc::now();
        let schedule = WorkSchedule {
            id: Uuid::new_v4(),
            employee_id: new.employee_id,
            shift_id: new.shift_id,
            work_date: new.work_date,
            origin: new.origin,
            created_at: now,
            updated_at: now,
        };
        self.working.schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    async fn update_schedule(&mut self, schedule: &WorkSchedule) -> AppResult<WorkSchedule> {
        let stored = self
            .working
            .schedules
            .get_mut(&schedule.id)
            .ok_or_else(|| AppError::NotFound(format!("Work schedule {} not found", schedule.id)))?;
        *stored = WorkSchedule {
            updated_at: Utc::now(),
            ..schedule.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_schedule(&mut self, id: Uuid) -> AppResult<bool> {
        Ok(self.working.schedules.remove(&id).is_some())
    }

    async fn insert_request(&mut self, new: &NewShiftChangeRequest) -> AppResult<ShiftChangeRequest> {
        if let Some(open) = self
            .working
            .requests
            .values()
            .find(|r| r.original_schedule_id == new.original_schedule_id && r.is_open())
        {
            return Err(AppError::DuplicatePending(format!(
                "Request {} is already open for work schedule {}",
                open.id, new.original_schedule_id
            )));
        }
        self.working.next_request_id += 1;
        let request = ShiftChangeRequest {
            id: self.working.next_request_id,
            requester_id: new.requester_id,
            target_id: new.target_id,
            original_schedule_id: new.original_schedule_id,
            target_schedule_id: new.target_schedule_id,
            reason: new.reason.clone(),
            target_status: ApprovalStatus::Pending,
            admin_status: ApprovalStatus::Pending,
            status: ApprovalStatus::Pending,
            request_time: new.request_time,
            target_response_time: None,
            admin_response_time: None,
            target_response_message: None,
            admin_response_message: None,
        };
        self.working.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_request(&mut self, id: i32) -> AppResult<Option<ShiftChangeRequest>> {
        Ok(self.working.requests.get(&id).cloned())
    }

    async fn lock_request(&mut self, id: i32) -> AppResult<Option<ShiftChangeRequest>> {
        self.find_request(id).await
    }

    async fn save_request(&mut self, request: &ShiftChangeRequest) -> AppResult<()> {
        if !self.working.requests.contains_key(&request.id) {
            return Err(AppError::NotFound(format!("Shift change request {} not found", request.id)));
        }
        self.working.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn open_requests_for_schedules(&mut self, ids: &[Uuid]) -> AppResult<Vec<ShiftChangeRequest>> {
        Ok(self.requests_where(|r| {
            r.is_open() && (ids.contains(&r.original_schedule_id) || ids.contains(&r.target_schedule_id))
        }))
    }

    async fn requests_by_requester(&mut self, employee_id: i32) -> AppResult<Vec<ShiftChangeRequest>> {
        Ok(self.requests_where(|r| r.requester_id == employee_id))
    }

    async fn requests_awaiting_target(&mut self, employee_id: i32) -> AppResult<Vec<ShiftChangeRequest>> {
        Ok(self.requests_where(|r| {
            r.target_id == employee_id
                && r.target_status == ApprovalStatus::Pending
                && r.admin_status == ApprovalStatus::Pending
        }))
    }

    async fn requests_awaiting_admin(&mut self) -> AppResult<Vec<ShiftChangeRequest>> {
        Ok(self.requests_where(|r| {
            r.target_status == ApprovalStatus::Approved && r.admin_status == ApprovalStatus::Pending
        }))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }
}
