//! User directory service

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, UpdateUser, User},
    repository::LendingStore,
};

#[derive(Clone)]
pub struct UsersService {
    store: Arc<dyn LendingStore>,
}

impl UsersService {
    pub fn new(store: Arc<dyn LendingStore>) -> Self {
        Self { store }
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.store.users_list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.store.users_get_by_id(id).await
    }

    pub async fn get_by_email(&self, email: &str) -> AppResult<User> {
        self.store
            .users_get_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with email {} not found", email)))
    }

    pub async fn create(&self, data: CreateUser) -> AppResult<User> {
        data.validate()?;

        if self.store.users_get_by_email(&data.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password = self.hash_password(&data.password)?;
        let user = self.store.users_create(&data, password).await?;
        tracing::info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn update(&self, id: i32, data: UpdateUser) -> AppResult<User> {
        data.validate()?;

        // Check if user exists
        self.store.users_get_by_id(id).await?;

        if let Some(ref email) = data.email {
            if let Some(other) = self.store.users_get_by_email(email).await? {
                if other.id != id {
                    return Err(AppError::Conflict("Email already exists".to_string()));
                }
            }
        }

        let password = match data.password {
            Some(ref password) => Some(self.hash_password(password)?),
            None => None,
        };

        self.store.users_update(id, &data, password).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.store.users_delete(id).await
    }
}
