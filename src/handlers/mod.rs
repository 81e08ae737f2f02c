pub mod employees_handler;
pub mod health;
pub mod metrics;
pub mod patterns_handler;
pub mod schedules_handler;
pub mod shift_changes_handler;
pub mod shifts_handler;

pub use health::health_check;
pub use metrics::{metrics_handler, setup_metrics_recorder, MetricsState};
