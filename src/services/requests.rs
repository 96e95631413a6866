//! Lending workflow service
//!
//! Requests are created `pending`; approval deducts stock, return restores
//! it, rejection leaves it untouched. Each transition is one atomic store
//! call. Failures are surfaced, never retried: an ambiguous approve could
//! otherwise deduct twice.

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        enums::RequestStatus,
        request::{CreateRequest, LendingAction, LendingOutcome, Request, RequestQuery},
    },
    repository::LendingStore,
};

#[derive(Clone)]
pub struct RequestsService {
    store: Arc<dyn LendingStore>,
}

impl RequestsService {
    pub fn new(store: Arc<dyn LendingStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Request>> {
        self.store.requests_list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Request> {
        self.store.requests_get_by_id(id).await
    }

    /// Requests made by a user; the user must exist
    pub async fn list_by_user(&self, user_id: i32) -> AppResult<Vec<Request>> {
        self.store.users_get_by_id(user_id).await?;
        self.store.requests_list_by_user(user_id).await
    }

    pub async fn list_by_status(&self, status: RequestStatus) -> AppResult<Vec<Request>> {
        self.store.requests_list_by_status(status).await
    }

    /// List requests matching every filter that is set
    pub async fn search(&self, query: &RequestQuery) -> AppResult<Vec<Request>> {
        match (query.user_id, query.status) {
            (Some(user_id), status) => {
                let mut requests = self.list_by_user(user_id).await?;
                if let Some(status) = status {
                    requests.retain(|r| r.status == status);
                }
                Ok(requests)
            }
            (None, Some(status)) => self.list_by_status(status).await,
            (None, None) => self.list().await,
        }
    }

    /// Submit a new request. Stock is not checked until approval.
    pub async fn create(&self, data: CreateRequest) -> AppResult<Request> {
        data.validate()?;

        // Verify both references exist
        self.store.users_get_by_id(data.user_id).await?;
        self.store.equipment_get_by_id(data.equipment_id).await?;

        let request = self.store.requests_create(&data).await?;
        tracing::info!(
            request_id = request.id,
            user_id = request.user_id,
            equipment_id = request.equipment_id,
            quantity = request.quantity,
            "Lending request submitted"
        );
        Ok(request)
    }

    pub async fn approve(&self, id: i32) -> AppResult<LendingOutcome> {
        self.apply(id, LendingAction::Approve).await
    }

    pub async fn reject(&self, id: i32) -> AppResult<LendingOutcome> {
        self.apply(id, LendingAction::Reject).await
    }

    /// Record equipment handed back
    pub async fn return_request(&self, id: i32) -> AppResult<LendingOutcome> {
        self.apply(id, LendingAction::Return).await
    }

    /// Administrative removal; stock is not adjusted, so approved requests are refused
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.store.requests_delete(id).await?;
        tracing::info!(request_id = id, "Lending request deleted");
        Ok(())
    }

    async fn apply(&self, id: i32, action: LendingAction) -> AppResult<LendingOutcome> {
        match self.store.apply_action(id, action).await {
            Ok(outcome) => {
                tracing::info!(
                    request_id = id,
                    equipment_id = outcome.request.equipment_id,
                    quantity = outcome.request.quantity,
                    status = %outcome.request.status,
                    available_stock = ?outcome.available_stock,
                    %action,
                    "Lending request {}",
                    outcome.request.status
                );
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(request_id = id, %action, error = %e, "Lending action refused");
                Err(e)
            }
        }
    }
}
