//! Repository layer: the record store behind every service
//!
//! [`LendingStore`] is the seam; [`Repository`] is the PostgreSQL backend and
//! [`memory::MemoryStore`] the in-process one.

pub mod equipment;
pub mod memory;
pub mod requests;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::RequestStatus,
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
        request::{CreateRequest, LendingAction, LendingOutcome, Request},
        user::{CreateUser, UpdateUser, User},
    },
};

/// Persistence operations needed by the services.
///
/// `apply_action` and `equipment_update` are read-check-write units: an
/// implementation must hold the rows it reads exclusively until its writes
/// are committed, and must leave nothing written when it returns an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LendingStore: Send + Sync {
    /// Check that the store is reachable
    async fn ping(&self) -> AppResult<()>;

    async fn equipment_list(&self) -> AppResult<Vec<Equipment>>;
    async fn equipment_get_by_id(&self, id: i32) -> AppResult<Equipment>;
    async fn equipment_create(&self, data: &CreateEquipment, available_stock: i32) -> AppResult<Equipment>;
    async fn equipment_update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment>;
    async fn equipment_delete(&self, id: i32) -> AppResult<()>;

    async fn users_list(&self) -> AppResult<Vec<User>>;
    async fn users_get_by_id(&self, id: i32) -> AppResult<User>;
    async fn users_get_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn users_create(&self, data: &CreateUser, password_hash: String) -> AppResult<User>;
    async fn users_update(&self, id: i32, data: &UpdateUser, password_hash: Option<String>) -> AppResult<User>;
    async fn users_delete(&self, id: i32) -> AppResult<()>;

    async fn requests_list(&self) -> AppResult<Vec<Request>>;
    async fn requests_get_by_id(&self, id: i32) -> AppResult<Request>;
    async fn requests_list_by_user(&self, user_id: i32) -> AppResult<Vec<Request>>;
    async fn requests_list_by_status(&self, status: RequestStatus) -> AppResult<Vec<Request>>;
    async fn requests_create(&self, data: &CreateRequest) -> AppResult<Request>;
    async fn requests_delete(&self, id: i32) -> AppResult<()>;

    /// Lock the request (and its equipment when the action moves stock),
    /// plan the transition, and commit both writes together.
    async fn apply_action(&self, request_id: i32, action: LendingAction) -> AppResult<LendingOutcome>;
}

/// PostgreSQL-backed repository holding the connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

/// Translate constraint violations into domain errors, pass the rest through
pub(crate) fn map_constraint_error(err: sqlx::Error, context: &str) -> AppError {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.into_owned());
    match code.as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => AppError::StillReferenced(format!(
            "{} is referenced by lending requests",
            context
        )),
        Some(UNIQUE_VIOLATION) => AppError::Conflict(format!("{} already exists", context)),
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl LendingStore for Repository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn equipment_list(&self) -> AppResult<Vec<Equipment>> {
        self.equipment_list().await
    }

    async fn equipment_get_by_id(&self, id: i32) -> AppResult<Equipment> {
        self.equipment_get_by_id(id).await
    }

    async fn equipment_create(&self, data: &CreateEquipment, available_stock: i32) -> AppResult<Equipment> {
        self.equipment_create(data, available_stock).await
    }

    async fn equipment_update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment> {
        self.equipment_update(id, data).await
    }

    async fn equipment_delete(&self, id: i32) -> AppResult<()> {
        self.equipment_delete(id).await
    }

    async fn users_list(&self) -> AppResult<Vec<User>> {
        self.users_list().await
    }

    async fn users_get_by_id(&self, id: i32) -> AppResult<User> {
        self.users_get_by_id(id).await
    }

    async fn users_get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.users_get_by_email(email).await
    }

    async fn users_create(&self, data: &CreateUser, password_hash: String) -> AppResult<User> {
        self.users_create(data, password_hash).await
    }

    async fn users_update(&self, id: i32, data: &UpdateUser, password_hash: Option<String>) -> AppResult<User> {
        self.users_update(id, data, password_hash).await
    }

    async fn users_delete(&self, id: i32) -> AppResult<()> {
        self.users_delete(id).await
    }

    async fn requests_list(&self) -> AppResult<Vec<Request>> {
        self.requests_list().await
    }

    async fn requests_get_by_id(&self, id: i32) -> AppResult<Request> {
        self.requests_get_by_id(id).await
    }

    async fn requests_list_by_user(&self, user_id: i32) -> AppResult<Vec<Request>> {
        self.requests_list_by_user(user_id).await
    }

    async fn requests_list_by_status(&self, status: RequestStatus) -> AppResult<Vec<Request>> {
        self.requests_list_by_status(status).await
    }

    async fn requests_create(&self, data: &CreateRequest) -> AppResult<Request> {
        self.requests_create(data).await
    }

    async fn requests_delete(&self, id: i32) -> AppResult<()> {
        self.requests_delete(id).await
    }

    async fn apply_action(&self, request_id: i32, action: LendingAction) -> AppResult<LendingOutcome> {
        self.requests_apply_action(request_id, action).await
    }
}
