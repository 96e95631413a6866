//! Lending request endpoints

use axum::{extract::State, http::StatusCode, Json};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::RequestStatus,
        request::{CreateRequest, LendingOutcome, Request, RequestQuery},
    },
    AppState,
};

/// List requests, optionally filtered by user and status
#[utoipa::path(
    get,
    path = "/requests",
    tag = "requests",
    params(RequestQuery),
    responses(
        (status = 200, description = "Matching lending requests", body = Vec<Request>),
        (status = 400, description = "Malformed filter", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RequestQuery>,
) -> AppResult<Json<Vec<Request>>> {
    let requests = state.services.requests.search(&query).await?;
    Ok(Json(requests))
}

/// Get a request by ID
#[utoipa::path(
    get,
    path = "/requests/{id}",
    tag = "requests",
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request details", body = Request),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Request>> {
    let request = state.services.requests.get_by_id(id).await?;
    Ok(Json(request))
}

/// List requests made by a user
#[utoipa::path(
    get,
    path = "/requests/user/{user_id}",
    tag = "requests",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "The user's requests", body = Vec<Request>),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_user_requests(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
) -> AppResult<Json<Vec<Request>>> {
    let requests = state.services.requests.list_by_user(user_id).await?;
    Ok(Json(requests))
}

/// List requests in a given status
#[utoipa::path(
    get,
    path = "/requests/status/{status}",
    tag = "requests",
    params(("status" = String, Path, description = "pending, approved, rejected or completed")),
    responses(
        (status = 200, description = "Requests in that status", body = Vec<Request>),
        (status = 400, description = "Unknown status", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_requests_by_status(
    State(state): State<AppState>,
    ApiPath(status): ApiPath<String>,
) -> AppResult<Json<Vec<Request>>> {
    let status: RequestStatus = status.parse().map_err(AppError::Validation)?;
    let requests = state.services.requests.list_by_status(status).await?;
    Ok(Json(requests))
}

/// Submit a lending request
#[utoipa::path(
    post,
    path = "/requests",
    tag = "requests",
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Request created as pending", body = Request),
        (status = 400, description = "Malformed body or invalid quantity", body = crate::error::ErrorResponse),
        (status = 404, description = "User or equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    ApiJson(data): ApiJson<CreateRequest>,
) -> AppResult<(StatusCode, Json<Request>)> {
    let request = state.services.requests.create(data).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Approve a pending request, deducting its quantity from available stock
#[utoipa::path(
    post,
    path = "/requests/{id}/approve",
    tag = "requests",
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request approved", body = LendingOutcome),
        (status = 400, description = "Not pending, or insufficient stock", body = crate::error::ErrorResponse),
        (status = 404, description = "Request or equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_request(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<LendingOutcome>> {
    let outcome = state.services.requests.approve(id).await?;
    Ok(Json(outcome))
}

/// Reject a pending request
#[utoipa::path(
    post,
    path = "/requests/{id}/reject",
    tag = "requests",
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request rejected", body = Request),
        (status = 400, description = "Not pending", body = crate::error::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_request(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Request>> {
    let outcome = state.services.requests.reject(id).await?;
    Ok(Json(outcome.request))
}

/// Mark an approved request's equipment as returned, restoring stock
#[utoipa::path(
    post,
    path = "/requests/{id}/return",
    tag = "requests",
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Equipment returned", body = LendingOutcome),
        (status = 400, description = "Not approved", body = crate::error::ErrorResponse),
        (status = 404, description = "Request or equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_request(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<LendingOutcome>> {
    let outcome = state.services.requests.return_request(id).await?;
    Ok(Json(outcome))
}

/// Delete a request (administrative; stock is not adjusted)
#[utoipa::path(
    delete,
    path = "/requests/{id}",
    tag = "requests",
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 204, description = "Request deleted"),
        (status = 409, description = "Request is approved and its equipment not yet returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_request(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<StatusCode> {
    state.services.requests.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
