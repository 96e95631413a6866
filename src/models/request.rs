//! Lending request model and the transition planning that drives it

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{enums::RequestStatus, equipment::Equipment};
use crate::error::{AppError, AppResult};

/// A borrower's request for some quantity of one equipment item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: i32,
    pub user_id: i32,
    pub equipment_id: i32,
    pub quantity: i32,
    pub status: RequestStatus,
    pub borrow_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create request body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub user_id: i32,
    pub equipment_id: i32,
    #[validate(range(min = 1, message = "quantity must be greater than zero"))]
    pub quantity: i32,
    pub borrow_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

/// Query parameters for listing requests
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RequestQuery {
    /// Only requests made by this user
    pub user_id: Option<i32>,
    /// Only requests in this status
    pub status: Option<RequestStatus>,
}

impl Request {
    /// An approved request is the only record of the units it holds, so it
    /// can only be deleted once it has been returned (or was never approved).
    pub fn ensure_deletable(&self) -> AppResult<()> {
        if self.status == RequestStatus::Approved {
            return Err(AppError::StillReferenced(format!(
                "Request {} still holds {} unit(s) of equipment {}; return it before deleting",
                self.id, self.quantity, self.equipment_id
            )));
        }
        Ok(())
    }
}

/// Workflow actions applied to an existing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendingAction {
    Approve,
    Reject,
    Return,
}

/// Writes decided by [`LendingAction::plan`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: RequestStatus,
    /// New equipment available stock, when the action moves stock
    pub available_stock: Option<i32>,
}

/// Result of a committed workflow action
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LendingOutcome {
    pub request: Request,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_stock: Option<i32>,
}

impl LendingAction {
    /// Status the request must be in
    pub fn required_status(self) -> RequestStatus {
        match self {
            LendingAction::Approve | LendingAction::Reject => RequestStatus::Pending,
            LendingAction::Return => RequestStatus::Approved,
        }
    }

    pub fn target_status(self) -> RequestStatus {
        match self {
            LendingAction::Approve => RequestStatus::Approved,
            LendingAction::Reject => RequestStatus::Rejected,
            LendingAction::Return => RequestStatus::Completed,
        }
    }

    /// Whether the action reads and writes the equipment row
    pub fn moves_stock(self) -> bool {
        !matches!(self, LendingAction::Reject)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LendingAction::Approve => "approve",
            LendingAction::Reject => "reject",
            LendingAction::Return => "return",
        }
    }

    /// Decide the writes for this action.
    ///
    /// Callers must hold the request row (and, when [`moves_stock`] is true,
    /// the equipment row) locked from before this call until the returned
    /// writes commit.
    ///
    /// [`moves_stock`]: LendingAction::moves_stock
    pub fn plan(self, request: &Request, equipment: Option<&Equipment>) -> AppResult<Transition> {
        let required = self.required_status();
        if request.status != required {
            return Err(AppError::InvalidState {
                request_id: request.id,
                current: request.status,
                expected: required,
            });
        }
        debug_assert!(request.status.can_transition_to(self.target_status()));

        let available_stock = if self.moves_stock() {
            let equipment = equipment.ok_or_else(|| {
                AppError::NotFound(format!("Equipment {} not found", request.equipment_id))
            })?;
            Some(self.next_available_stock(request, equipment)?)
        } else {
            None
        };

        Ok(Transition {
            status: self.target_status(),
            available_stock,
        })
    }

    fn next_available_stock(self, request: &Request, equipment: &Equipment) -> AppResult<i32> {
        match self {
            LendingAction::Approve => {
                if equipment.available_stock < request.quantity {
                    return Err(AppError::InsufficientStock {
                        equipment_id: equipment.id,
                        available: equipment.available_stock,
                        requested: request.quantity,
                    });
                }
                Ok(equipment.available_stock - request.quantity)
            }
            LendingAction::Return => {
                let restored = equipment.available_stock.saturating_add(request.quantity);
                if restored > equipment.total_stock {
                    // Total was shrunk while units were out; the units are back regardless.
                    tracing::warn!(
                        request_id = request.id,
                        equipment_id = equipment.id,
                        restored,
                        total_stock = equipment.total_stock,
                        "Returned stock exceeds total, capping at total"
                    );
                    Ok(equipment.total_stock)
                } else {
                    Ok(restored)
                }
            }
            LendingAction::Reject => Ok(equipment.available_stock),
        }
    }
}

impl std::fmt::Display for LendingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
