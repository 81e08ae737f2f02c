//! Persistence contract for the rota core.
//!
//! Every service call opens one [`RotaTx`], does its reads and writes through
//! it and commits. Dropping a transaction without committing rolls it back,
//! so an error returned half-way through an operation leaves nothing behind.
//! `lock_*` methods take a per-row write lock for the rest of the
//! transaction; that is how concurrent regeneration of one pattern, or
//! concurrent answers to one request, are serialized.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    models::{
        CreateShiftInput, NewShiftChangeRequest, NewWorkSchedule, PatternShift, PatternShiftInput, SchedulePattern,
        Shift, ShiftChangeRequest, ShiftSort, WorkSchedule,
    },
    AppResult,
};

pub use memory::MemoryStore;

#[async_trait]
pub trait RotaStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn RotaTx>>;
}

#[async_trait]
pub trait RotaTx: Send {
    // Shift catalog
    async fn insert_shift(&mut self, input: &CreateShiftInput) -> AppResult<Shift>;
    async fn find_shift(&mut self, id: i32) -> AppResult<Option<Shift>>;
    /// Case-insensitive lookup.
    async fn find_shift_by_name(&mut self, name: &str) -> AppResult<Option<Shift>>;
    async fn save_shift(&mut self, shift: &Shift) -> AppResult<Shift>;
    async fn list_shifts(&mut self, sort: ShiftSort, offset: i64, limit: i64) -> AppResult<(Vec<Shift>, i64)>;
    /// Work schedule rows plus pattern cells pointing at the shift.
    async fn shift_reference_count(&mut self, id: i32) -> AppResult<i64>;
    /// Fails with `InUse` while any schedule or pattern cell references it.
    async fn delete_shift(&mut self, id: i32) -> AppResult<bool>;

    // Schedule patterns
    async fn insert_pattern(&mut self, employee_id: i32, name: &str) -> AppResult<SchedulePattern>;
    async fn find_pattern(&mut self, id: i32) -> AppResult<Option<SchedulePattern>>;
    async fn lock_pattern(&mut self, id: i32) -> AppResult<Option<SchedulePattern>>;
    /// Newest first.
    async fn patterns_for_employee(&mut self, employee_id: i32) -> AppResult<Vec<SchedulePattern>>;
    async fn active_pattern(&mut self, employee_id: i32) -> AppResult<Option<SchedulePattern>>;
    async fn set_pattern_active(&mut self, id: i32, active: bool) -> AppResult<()>;
    /// Deactivates the employee's patterns, optionally sparing one.
    async fn deactivate_patterns(&mut self, employee_id: i32, except: Option<i32>) -> AppResult<u64>;
    /// Cascades to the pattern's cells.
    async fn delete_pattern(&mut self, id: i32) -> AppResult<bool>;
    async fn pattern_shifts(&mut self, pattern_id: i32) -> AppResult<Vec<PatternShift>>;
    async fn replace_pattern_shifts(
        &mut self,
        pattern_id: i32,
        shifts: &[PatternShiftInput],
    ) -> AppResult<Vec<PatternShift>>;

    // Work schedules
    async fn find_schedule(&mut self, id: Uuid) -> AppResult<Option<WorkSchedule>>;
    async fn lock_schedule(&mut self, id: Uuid) -> AppResult<Option<WorkSchedule>>;
    async fn schedules_for_employee_on(&mut self, employee_id: i32, date: NaiveDate) -> AppResult<Vec<WorkSchedule>>;
    /// Inclusive range, ordered by date.
    async fn schedules_for_employee(
        &mut self,
        employee_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<WorkSchedule>>;
    /// Inclusive range, ordered by date, employee name, id.
    async fn schedules_in_range(&mut self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<WorkSchedule>>;
    /// Rows generated by the pattern in the inclusive range, whoever owns them now.
    async fn schedules_from_pattern(
        &mut self,
        pattern_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<WorkSchedule>>;
    async fn schedules_with_shift_on(&mut self, date: NaiveDate, shift_id: i32) -> AppResult<Vec<WorkSchedule>>;
    /// Fails with `DoubleBooked` when the (employee, date) slot is taken.
    async fn insert_schedule(&mut self, new: &NewWorkSchedule) -> AppResult<WorkSchedule>;
    async fn update_schedule(&mut self, schedule: &WorkSchedule) -> AppResult<WorkSchedule>;
    async fn delete_schedule(&mut self, id: Uuid) -> AppResult<bool>;

    // Shift change requests
    /// Fails with `DuplicatePending` when an open request already holds the
    /// same original schedule.
    async fn insert_request(&mut self, new: &NewShiftChangeRequest) -> AppResult<ShiftChangeRequest>;
    async fn find_request(&mut self, id: i32) -> AppResult<Option<ShiftChangeRequest>>;
    async fn lock_request(&mut self, id: i32) -> AppResult<Option<ShiftChangeRequest>>;
    async fn save_request(&mut self, request: &ShiftChangeRequest) -> AppResult<()>;
    /// Non-terminal requests referencing any of the rows, on either side.
    async fn open_requests_for_schedules(&mut self, ids: &[Uuid]) -> AppResult<Vec<ShiftChangeRequest>>;
    async fn requests_by_requester(&mut self, employee_id: i32) -> AppResult<Vec<ShiftChangeRequest>>;
    async fn requests_awaiting_target(&mut self, employee_id: i32) -> AppResult<Vec<ShiftChangeRequest>>;
    async fn requests_awaiting_admin(&mut self) -> AppResult<Vec<ShiftChangeRequest>>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
