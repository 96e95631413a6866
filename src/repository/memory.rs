//! In-process record store
//!
//! Every operation runs under one async mutex, which makes each call a
//! serializable unit. Mirrors the PostgreSQL schema's constraints: stock
//! bounds, foreign keys with RESTRICT, and unique emails.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::LendingStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::RequestStatus,
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
        request::{CreateRequest, LendingAction, LendingOutcome, Request},
        user::{CreateUser, UpdateUser, User},
    },
};

#[derive(Default)]
struct Tables {
    equipment: BTreeMap<i32, Equipment>,
    users: BTreeMap<i32, User>,
    requests: BTreeMap<i32, Request>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn equipment(&self, id: i32) -> AppResult<&Equipment> {
        self.equipment
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    fn user(&self, id: i32) -> AppResult<&User> {
        self.users
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    fn request(&self, id: i32) -> AppResult<&Request> {
        self.requests
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
    }

    fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != exclude_id && u.email.eq_ignore_ascii_case(email))
    }

    fn requests_where(&self, predicate: impl Fn(&Request) -> bool) -> Vec<Request> {
        self.requests.values().filter(|r| predicate(r)).cloned().collect()
    }
}

/// Record store kept in process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LendingStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn equipment_list(&self) -> AppResult<Vec<Equipment>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Equipment> = tables.equipment.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn equipment_get_by_id(&self, id: i32) -> AppResult<Equipment> {
        self.tables.lock().await.equipment(id).cloned()
    }

    async fn equipment_create(&self, data: &CreateEquipment, available_stock: i32) -> AppResult<Equipment> {
        if available_stock < 0 || available_stock > data.total_stock {
            return Err(AppError::Validation(format!(
                "availableStock {} must be between 0 and totalStock {}",
                available_stock, data.total_stock
            )));
        }
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let row = Equipment {
            id: tables.next_id(),
            name: data.name.clone(),
            category: data.category.clone(),
            description: data.description.clone(),
            total_stock: data.total_stock,
            available_stock,
            created_at: now,
            updated_at: now,
        };
        tables.equipment.insert(row.id, row.clone());
        Ok(row)
    }

    async fn equipment_update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment> {
        let mut tables = self.tables.lock().await;
        let mut row = tables.equipment(id)?.clone();

        if let Some(total) = data.total_stock {
            row.available_stock = row.resized_available_stock(total)?;
            row.total_stock = total;
        }
        if let Some(ref name) = data.name {
            row.name = name.clone();
        }
        if let Some(ref category) = data.category {
            row.category = Some(category.clone());
        }
        if let Some(ref description) = data.description {
            row.description = Some(description.clone());
        }
        row.updated_at = Utc::now();

        tables.equipment.insert(id, row.clone());
        Ok(row)
    }

    async fn equipment_delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        tables.equipment(id)?;
        if tables.requests.values().any(|r| r.equipment_id == id) {
            return Err(AppError::StillReferenced(format!(
                "Equipment {} is referenced by lending requests",
                id
            )));
        }
        tables.equipment.remove(&id);
        Ok(())
    }

    async fn users_list(&self) -> AppResult<Vec<User>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<User> = tables.users.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn users_get_by_id(&self, id: i32) -> AppResult<User> {
        self.tables.lock().await.user(id).cloned()
    }

    async fn users_get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn users_create(&self, data: &CreateUser, password_hash: String) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.email_taken(&data.email, None) {
            return Err(AppError::Conflict(format!(
                "User with email {} already exists",
                data.email
            )));
        }
        let now = Utc::now();
        let row = User {
            id: tables.next_id(),
            name: data.name.clone(),
            email: data.email.clone(),
            password: password_hash,
            role: data.role.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn users_update(&self, id: i32, data: &UpdateUser, password_hash: Option<String>) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        let mut row = tables.user(id)?.clone();

        if let Some(ref email) = data.email {
            if tables.email_taken(email, Some(id)) {
                return Err(AppError::Conflict(format!("User with email {} already exists", email)));
            }
            row.email = email.clone();
        }
        if let Some(ref name) = data.name {
            row.name = name.clone();
        }
        if let Some(hash) = password_hash {
            row.password = hash;
        }
        if let Some(role) = data.role {
            row.role = role;
        }
        row.updated_at = Utc::now();

        tables.users.insert(id, row.clone());
        Ok(row)
    }

    async fn users_delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        tables.user(id)?;
        if tables.requests.values().any(|r| r.user_id == id) {
            return Err(AppError::StillReferenced(format!(
                "User {} is referenced by lending requests",
                id
            )));
        }
        tables.users.remove(&id);
        Ok(())
    }

    async fn requests_list(&self) -> AppResult<Vec<Request>> {
        Ok(self.tables.lock().await.requests_where(|_| true))
    }

    async fn requests_get_by_id(&self, id: i32) -> AppResult<Request> {
        self.tables.lock().await.request(id).cloned()
    }

    async fn requests_list_by_user(&self, user_id: i32) -> AppResult<Vec<Request>> {
        Ok(self.tables.lock().await.requests_where(|r| r.user_id == user_id))
    }

    async fn requests_list_by_status(&self, status: RequestStatus) -> AppResult<Vec<Request>> {
        Ok(self.tables.lock().await.requests_where(|r| r.status == status))
    }

    async fn requests_create(&self, data: &CreateRequest) -> AppResult<Request> {
        if data.quantity <= 0 {
            return Err(AppError::Validation("quantity must be greater than zero".to_string()));
        }
        let mut tables = self.tables.lock().await;
        tables.user(data.user_id)?;
        tables.equipment(data.equipment_id)?;

        let now = Utc::now();
        let row = Request {
            id: tables.next_id(),
            user_id: data.user_id,
            equipment_id: data.equipment_id,
            quantity: data.quantity,
            status: RequestStatus::Pending,
            borrow_date: data.borrow_date,
            remarks: data.remarks.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.requests.insert(row.id, row.clone());
        Ok(row)
    }

    async fn requests_delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        tables.request(id)?.ensure_deletable()?;
        tables.requests.remove(&id);
        Ok(())
    }

    async fn apply_action(&self, request_id: i32, action: LendingAction) -> AppResult<LendingOutcome> {
        let mut tables = self.tables.lock().await;

        let request = tables.request(request_id)?.clone();
        let equipment = if action.moves_stock() {
            Some(tables.equipment(request.equipment_id)?.clone())
        } else {
            None
        };

        // Nothing below may fail once planning succeeds, so both writes land together.
        let transition = action.plan(&request, equipment.as_ref())?;
        let now = Utc::now();

        if let (Some(mut equipment), Some(available_stock)) = (equipment, transition.available_stock) {
            equipment.available_stock = available_stock;
            equipment.updated_at = now;
            tables.equipment.insert(equipment.id, equipment);
        }

        let mut updated = request;
        updated.status = transition.status;
        updated.updated_at = now;
        tables.requests.insert(updated.id, updated.clone());

        Ok(LendingOutcome {
            request: updated,
            available_stock: transition.available_stock,
        })
    }
}
