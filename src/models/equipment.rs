//! Equipment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Lendable equipment with bounded stock
///
/// `0 <= available_stock <= total_stock` holds for every stored row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Physical unit count
    pub total_stock: i32,
    /// Units not allocated to an approved, unreturned request
    pub available_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    /// Units currently lent out
    pub fn lent_out(&self) -> i32 {
        self.total_stock - self.available_stock
    }

    /// Available stock after resizing the physical count to `new_total`.
    ///
    /// Lent-out units stay lent out, so available stock moves by the same
    /// delta as the total.
    pub fn resized_available_stock(&self, new_total: i32) -> AppResult<i32> {
        if new_total < 0 {
            return Err(AppError::Validation("totalStock must not be negative".to_string()));
        }
        let lent_out = self.lent_out();
        if new_total < lent_out {
            return Err(AppError::Validation(format!(
                "totalStock {} is below the {} unit(s) currently lent out",
                new_total, lent_out
            )));
        }
        Ok(new_total - lent_out)
    }
}

/// Create equipment request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquipment {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "totalStock must not be negative"))]
    pub total_stock: i32,
    /// Defaults to `totalStock`
    pub available_stock: Option<i32>,
}

impl CreateEquipment {
    /// Initial available stock, checked against the total
    pub fn initial_available_stock(&self) -> AppResult<i32> {
        let available = self.available_stock.unwrap_or(self.total_stock);
        if available < 0 || available > self.total_stock {
            return Err(AppError::Validation(format!(
                "availableStock {} must be between 0 and totalStock {}",
                available, self.total_stock
            )));
        }
        Ok(available)
    }
}

/// Update equipment request
///
/// Available stock is not directly writable; changing `totalStock` shifts it.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEquipment {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "totalStock must not be negative"))]
    pub total_stock: Option<i32>,
}
