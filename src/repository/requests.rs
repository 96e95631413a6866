//! Lending request methods on Repository

use chrono::Utc;

use super::{map_constraint_error, Repository};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::RequestStatus,
        equipment::Equipment,
        request::{CreateRequest, LendingAction, LendingOutcome, Request},
    },
};

impl Repository {
    /// List all requests, oldest first
    pub async fn requests_list(&self) -> AppResult<Vec<Request>> {
        let rows = sqlx::query_as::<_, Request>("SELECT * FROM requests ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get request by ID
    pub async fn requests_get_by_id(&self, id: i32) -> AppResult<Request> {
        sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
    }

    /// List requests made by a user
    pub async fn requests_list_by_user(&self, user_id: i32) -> AppResult<Vec<Request>> {
        let rows = sqlx::query_as::<_, Request>(
            "SELECT * FROM requests WHERE user_id = $1 ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// List requests in a given status
    pub async fn requests_list_by_status(&self, status: RequestStatus) -> AppResult<Vec<Request>> {
        let rows = sqlx::query_as::<_, Request>(
            "SELECT * FROM requests WHERE status = $1 ORDER BY created_at, id",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert a new pending request
    pub async fn requests_create(&self, data: &CreateRequest) -> AppResult<Request> {
        let now = Utc::now();
        sqlx::query_as::<_, Request>(
            r#"
            INSERT INTO requests (user_id, equipment_id, quantity, status, borrow_date, remarks, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(data.equipment_id)
        .bind(data.quantity)
        .bind(RequestStatus::Pending)
        .bind(data.borrow_date)
        .bind(&data.remarks)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_constraint_error(e, "Request") {
            // The user or equipment vanished between the service check and the insert
            AppError::StillReferenced(_) => AppError::NotFound(format!(
                "User {} or equipment {} not found",
                data.user_id, data.equipment_id
            )),
            other => other,
        })
    }

    /// Delete a request (administrative; does not touch stock).
    ///
    /// Approved requests are refused: their units are still out on loan.
    pub async fn requests_delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;
        request.ensure_deletable()?;

        sqlx::query("DELETE FROM requests WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Apply a workflow action in a single transaction.
    ///
    /// Rows are locked request first, equipment second. Every caller takes
    /// them in that order, so two approvals against the same equipment
    /// serialize on the equipment row instead of deadlocking, and the second
    /// one re-reads the stock left by the first. Returning early drops `tx`,
    /// which rolls back.
    pub async fn requests_apply_action(&self, request_id: i32, action: LendingAction) -> AppResult<LendingOutcome> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1 FOR NO KEY UPDATE")
            .bind(request_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", request_id)))?;

        let equipment = if action.moves_stock() {
            let equipment = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1 FOR NO KEY UPDATE")
                .bind(request.equipment_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Equipment {} not found", request.equipment_id))
                })?;
            Some(equipment)
        } else {
            None
        };

        let transition = action.plan(&request, equipment.as_ref())?;
        let now = Utc::now();

        if let Some(available_stock) = transition.available_stock {
            sqlx::query("UPDATE equipment SET available_stock = $1, updated_at = $2 WHERE id = $3")
                .bind(available_stock)
                .bind(now)
                .bind(request.equipment_id)
                .execute(&mut *tx)
                .await?;
        }

        let updated = sqlx::query_as::<_, Request>(
            "UPDATE requests SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(transition.status)
        .bind(now)
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(LendingOutcome {
            request: updated,
            available_stock: transition.available_stock,
        })
    }
}
