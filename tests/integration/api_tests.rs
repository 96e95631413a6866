//! HTTP surface tests, driven in-process through the router

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::common::*;

#[tokio::test]
async fn test_health_check() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_borrow_and_return_cycle() {
    let app = app();
    let user = create_user(&app, "alice@school.test").await;
    let eq = create_equipment(&app, "Oscilloscope", 10, 10).await;
    let req = create_request(&app, user, eq, 3).await;

    // Submitting does not touch stock
    assert_eq!(available_stock(&app, eq).await, 10);

    let (status, body) = send(&app, Method::POST, &format!("/requests/{}/approve", req), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["request"]["status"], "approved");
    assert_eq!(body["availableStock"], 7);
    assert_eq!(available_stock(&app, eq).await, 7);

    let (status, body) = send(&app, Method::POST, &format!("/requests/{}/return", req), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["request"]["status"], "completed");
    assert_eq!(body["availableStock"], 10);
    assert_eq!(available_stock(&app, eq).await, 10);
}

#[tokio::test]
async fn test_approve_with_insufficient_stock() {
    let app = app();
    let user = create_user(&app, "bob@school.test").await;
    let eq = create_equipment(&app, "Telescope", 10, 2).await;
    let req = create_request(&app, user, eq, 5).await;

    let (status, body) = send(&app, Method::POST, &format!("/requests/{}/approve", req), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InsufficientStock");
    assert_eq!(body["details"]["available"], 2);
    assert_eq!(body["details"]["requested"], 5);

    assert_eq!(available_stock(&app, eq).await, 2);
    let (_, body) = send(&app, Method::GET, &format!("/requests/{}", req), None).await;
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_reject_keeps_stock_and_is_final() {
    let app = app();
    let user = create_user(&app, "carol@school.test").await;
    let eq = create_equipment(&app, "Globe", 4, 4).await;
    let req = create_request(&app, user, eq, 2).await;

    let (status, body) = send(&app, Method::POST, &format!("/requests/{}/reject", req), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(available_stock(&app, eq).await, 4);

    for action in ["approve", "reject", "return"] {
        let (status, body) =
            send(&app, Method::POST, &format!("/requests/{}/{}", req, action), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} after reject", action);
        assert_eq!(body["error"], "InvalidTransition");
        assert_eq!(body["details"]["currentStatus"], "rejected");
    }
    assert_eq!(available_stock(&app, eq).await, 4);
}

#[tokio::test]
async fn test_second_approve_and_return_fail_without_stock_change() {
    let app = app();
    let user = create_user(&app, "dan@school.test").await;
    let eq = create_equipment(&app, "Laptop", 5, 5).await;
    let req = create_request(&app, user, eq, 2).await;

    send(&app, Method::POST, &format!("/requests/{}/approve", req), None).await;
    let (status, body) = send(&app, Method::POST, &format!("/requests/{}/approve", req), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["currentStatus"], "approved");
    assert_eq!(available_stock(&app, eq).await, 3);

    send(&app, Method::POST, &format!("/requests/{}/return", req), None).await;
    let (status, body) = send(&app, Method::POST, &format!("/requests/{}/return", req), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["currentStatus"], "completed");
    assert_eq!(available_stock(&app, eq).await, 5);
}

#[tokio::test]
async fn test_return_requires_approval() {
    let app = app();
    let user = create_user(&app, "erin@school.test").await;
    let eq = create_equipment(&app, "Tripod", 2, 2).await;
    let req = create_request(&app, user, eq, 1).await;

    let (status, body) = send(&app, Method::POST, &format!("/requests/{}/return", req), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["expectedStatus"], "approved");
    assert_eq!(available_stock(&app, eq).await, 2);
}

#[tokio::test]
async fn test_unknown_ids_are_404() {
    let app = app();

    for uri in ["/requests/404", "/equipment/404", "/users/404"] {
        let (status, _) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
    for action in ["approve", "reject", "return"] {
        let (status, _) = send(&app, Method::POST, &format!("/requests/404/{}", action), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", action);
    }
}

#[tokio::test]
async fn test_create_request_validation() {
    let app = app();
    let user = create_user(&app, "finn@school.test").await;
    let eq = create_equipment(&app, "Microscope", 3, 3).await;

    // Zero quantity
    let (status, body) = send(
        &app,
        Method::POST,
        "/requests",
        Some(json!({"userId": user, "equipmentId": eq, "quantity": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    // Unknown equipment
    let (status, _) = send(
        &app,
        Method::POST,
        "/requests",
        Some(json!({"userId": user, "equipmentId": 999, "quantity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Missing field and broken JSON
    let (status, _) = send(
        &app,
        Method::POST,
        "/requests",
        Some(json!({"userId": user, "quantity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_raw(&app, Method::POST, "/requests", "{\"userId\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    // Requesting more than is in stock is allowed until approval
    let (status, _) = send(
        &app,
        Method::POST,
        "/requests",
        Some(json!({"userId": user, "equipmentId": eq, "quantity": 50})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_query_requests() {
    let app = app();
    let u1 = create_user(&app, "gina@school.test").await;
    let u2 = create_user(&app, "hal@school.test").await;
    let eq = create_equipment(&app, "Multimeter", 10, 10).await;

    let r1 = create_request(&app, u1, eq, 1).await;
    let _r2 = create_request(&app, u1, eq, 2).await;
    let r3 = create_request(&app, u2, eq, 3).await;
    send(&app, Method::POST, &format!("/requests/{}/approve", r1), None).await;
    send(&app, Method::POST, &format!("/requests/{}/reject", r3), None).await;

    let (_, all) = send(&app, Method::GET, "/requests", None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (status, mine) = send(&app, Method::GET, &format!("/requests/user/{}", u1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 2);
    assert!(mine.as_array().unwrap().iter().all(|r| r["userId"] == u1));

    let (_, nested) = send(&app, Method::GET, &format!("/users/{}/requests", u2), None).await;
    assert_eq!(nested.as_array().unwrap().len(), 1);

    let (_, pending) = send(&app, Method::GET, "/requests/status/pending", None).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    let (_, approved) = send(&app, Method::GET, "/requests/status/approved", None).await;
    assert_eq!(approved[0]["id"], r1);
    let (_, completed) = send(&app, Method::GET, "/requests/status/completed", None).await;
    assert!(completed.as_array().unwrap().is_empty());

    let (status, _) = send(&app, Method::GET, "/requests/status/borrowed", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/requests/user/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Query-string filters combine
    let (status, mine) = send(&app, Method::GET, &format!("/requests?userId={}", u1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 2);
    let (_, mine_approved) =
        send(&app, Method::GET, &format!("/requests?userId={}&status=approved", u1), None).await;
    assert_eq!(mine_approved.as_array().unwrap().len(), 1);
    assert_eq!(mine_approved[0]["id"], r1);
    let (_, rejected) = send(&app, Method::GET, "/requests?status=rejected", None).await;
    assert_eq!(rejected[0]["id"], r3);

    let (status, _) = send(&app, Method::GET, "/requests?status=borrowed", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::GET, "/requests?userId=999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_plural_equipment_path() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/equipments",
        Some(json!({"name": "Tripod", "totalStock": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let eq = body["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/equipment/{}", eq), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Tripod");

    let (_, list) = send(&app, Method::GET, "/equipments", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_equipment_crud_guards_stock() {
    let app = app();

    // availableStock above total is refused
    let (status, _) = send(
        &app,
        Method::POST,
        "/equipment",
        Some(json!({"name": "Ruler", "totalStock": 2, "availableStock": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // availableStock defaults to total
    let (status, body) = send(
        &app,
        Method::POST,
        "/equipment",
        Some(json!({"name": "Calculator", "totalStock": 6})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["availableStock"], 6);
    let eq = body["id"].as_i64().unwrap();

    let user = create_user(&app, "ivy@school.test").await;
    let req = create_request(&app, user, eq, 4).await;
    send(&app, Method::POST, &format!("/requests/{}/approve", req), None).await;

    // Shrinking below the 4 lent-out units is refused
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/equipment/{}", eq),
        Some(json!({"totalStock": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Growing the total grows availability by the same amount
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/equipment/{}", eq),
        Some(json!({"totalStock": 8, "description": "Graphing"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalStock"], 8);
    assert_eq!(body["availableStock"], 4);
    assert_eq!(body["description"], "Graphing");

    // Still referenced by a request
    let (status, _) = send(&app, Method::DELETE, &format!("/equipment/{}", eq), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The approved request still holds 4 units and cannot be deleted
    let (status, body) = send(&app, Method::DELETE, &format!("/requests/{}", req), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "StillReferenced");
    assert_eq!(available_stock(&app, eq).await, 4);

    send(&app, Method::POST, &format!("/requests/{}/return", req), None).await;
    assert_eq!(available_stock(&app, eq).await, 8);

    let (status, _) = send(&app, Method::DELETE, &format!("/requests/{}", req), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &format!("/equipment/{}", eq), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &format!("/equipment/{}", eq), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_crud() {
    let app = app();
    let id = create_user(&app, "jay@school.test").await;

    let (status, body) = send(&app, Method::GET, &format!("/users/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "borrower");
    assert!(body.get("password").is_none());

    let (status, body) = send(&app, Method::GET, "/users/by-email/JAY@school.test", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (status, _) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({"name": "Dup", "email": "jay@school.test", "password": "password"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{}", id),
        Some(json!({"role": "inventory"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "inventory");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/users/{}", id),
        Some(json!({"role": "superuser"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = send(&app, Method::GET, "/users", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/users/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &format!("/users/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/requests/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}
