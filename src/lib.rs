pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod services;
pub mod startup;
pub mod store;

use std::sync::Arc;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use handlers::MetricsState;

use directory::RoleDirectory;
use services::RotaServices;
use store::RotaStore;

#[derive(Clone)]
pub struct AppState {
    pub services: RotaServices,
    pub directory: Arc<dyn RoleDirectory>,
    pub config: AppConfig,
    /// `None` when no Prometheus recorder is installed (tests).
    pub metrics: Option<Arc<MetricsState>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RotaStore>,
        directory: Arc<dyn RoleDirectory>,
        config: AppConfig,
        metrics: Option<Arc<MetricsState>>,
    ) -> Self {
        let services = RotaServices::new(store, directory.clone(), config.regeneration_weeks);
        Self {
            services,
            directory,
            config,
            metrics,
        }
    }
}
