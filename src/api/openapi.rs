//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{equipment, health, requests, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Lending API",
        version = "0.1.0",
        description = "Approval-gated lending of school equipment. `/equipments` is accepted as an alias of `/equipment`."
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        // Users
        users::list_users,
        users::get_user,
        users::get_user_by_email,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::list_requests_of_user,
        // Requests
        requests::list_requests,
        requests::get_request,
        requests::list_user_requests,
        requests::list_requests_by_status,
        requests::create_request,
        requests::approve_request,
        requests::reject_request,
        requests::return_request,
        requests::delete_request,
    ),
    components(
        schemas(
            // Equipment
            crate::models::equipment::Equipment,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            // Users
            crate::models::enums::UserRole,
            crate::models::user::User,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Requests
            crate::models::enums::RequestStatus,
            crate::models::request::Request,
            crate::models::request::CreateRequest,
            crate::models::request::LendingOutcome,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "equipment", description = "Equipment catalog"),
        (name = "users", description = "User directory"),
        (name = "requests", description = "Lending workflow")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
