//! School equipment lending server
//!
//! Users borrow items from a shared inventory through approval-gated
//! requests. Approving a request deducts its quantity from the equipment's
//! available stock and returning it restores the stock; both happen in the
//! same atomic store operation as the status change.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Build the state around an already constructed store
    pub fn new(config: AppConfig, store: Arc<dyn repository::LendingStore>) -> Self {
        Self {
            config: Arc::new(config),
            services: Arc::new(services::Services::new(store)),
        }
    }
}
