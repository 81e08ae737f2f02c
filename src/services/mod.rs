pub mod catalog;
pub mod coverage;
pub mod materializer;
pub mod patterns;
pub mod schedules;
pub mod shift_change;

use std::sync::Arc;

use crate::{directory::RoleDirectory, store::RotaStore};

pub use catalog::ShiftCatalog;
pub use coverage::CoverageService;
pub use patterns::PatternService;
pub use schedules::{ensure_not_double_booked, WorkScheduleService};
pub use shift_change::ShiftChangeWorkflow;

/// The rota core, wired over one store and one directory.
#[derive(Clone)]
pub struct RotaServices {
    pub catalog: ShiftCatalog,
    pub patterns: PatternService,
    pub schedules: WorkScheduleService,
    pub shift_changes: ShiftChangeWorkflow,
    pub coverage: CoverageService,
}

impl RotaServices {
    pub fn new(store: Arc<dyn RotaStore>, directory: Arc<dyn RoleDirectory>, regeneration_weeks: u32) -> Self {
        let schedules = WorkScheduleService::new(store.clone(), directory.clone());
        Self {
            catalog: ShiftCatalog::new(store.clone()),
            patterns: PatternService::new(store.clone(), directory.clone(), regeneration_weeks),
            coverage: CoverageService::new(directory, schedules.clone()),
            schedules,
            shift_changes: ShiftChangeWorkflow::new(store),
        }
    }
}
