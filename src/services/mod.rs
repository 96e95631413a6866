//! Business logic services

pub mod equipment;
pub mod requests;
pub mod users;

use std::sync::Arc;

use crate::repository::LendingStore;

/// Container for all services, sharing one injected store
#[derive(Clone)]
pub struct Services {
    pub equipment: equipment::EquipmentService,
    pub users: users::UsersService,
    pub requests: requests::RequestsService,
    store: Arc<dyn LendingStore>,
}

impl Services {
    /// Create all services on top of the given store
    pub fn new(store: Arc<dyn LendingStore>) -> Self {
        Self {
            equipment: equipment::EquipmentService::new(store.clone()),
            users: users::UsersService::new(store.clone()),
            requests: requests::RequestsService::new(store.clone()),
            store,
        }
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.store.ping().await
    }
}
