pub mod employee;
pub mod pattern;
pub mod pattern_input;
pub mod shift;
pub mod shift_change;
pub mod shift_change_input;
pub mod shift_input;
pub mod work_schedule;
pub mod work_schedule_input;

pub use employee::{CoveragePeer, Employee, EmployeesByRoleQuery};
pub use pattern::{
    PatternShift, PatternWithShifts, RegenerationConflict, RegenerationReport, SchedulePattern, CYCLE_WEEKS,
    DAYS_PER_WEEK,
};
pub use pattern_input::{
    CreatePatternInput, DeletePatternQuery, PatternMutationResponse, PatternShiftInput, RegenerateInput,
    ReplacePatternShiftsInput,
};
pub use shift::{Shift, ShiftPage, ShiftSort};
pub use shift_change::{derive_overall, ApprovalStatus, NewShiftChangeRequest, RequestState, ShiftChangeRequest};
pub use shift_change_input::{ApproveInput, CreateShiftChangeInput, RejectInput};
pub use shift_input::{CreateShiftInput, ListShiftsQuery, ShiftMutationResponse, UpdateShiftInput};
pub use work_schedule::{NewWorkSchedule, ScheduleOrigin, WorkSchedule};
pub use work_schedule_input::{
    AssignScheduleInput, CoverageQuery, ScheduleDateQuery, ScheduleMutationResponse, ScheduleRangeQuery,
};
