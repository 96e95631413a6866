//! Lending workflow scenarios at the service layer

use school_lending_server::{
    error::AppError,
    models::{
        equipment::CreateEquipment, request::CreateRequest, user::CreateUser, RequestStatus,
    },
    services::Services,
};

use crate::common::state;

async fn seed(services: &Services, total: i32, available: i32) -> (i32, i32) {
    let user = services
        .users
        .create(CreateUser {
            name: "Morgan".to_string(),
            email: format!("morgan{}@school.test", total * 100 + available),
            password: "password".to_string(),
            role: None,
        })
        .await
        .unwrap();
    let equipment = services
        .equipment
        .create(&CreateEquipment {
            name: "Robot kit".to_string(),
            category: Some("robotics".to_string()),
            description: None,
            total_stock: total,
            available_stock: Some(available),
        })
        .await
        .unwrap();
    (user.id, equipment.id)
}

async fn submit(services: &Services, user_id: i32, equipment_id: i32, quantity: i32) -> i32 {
    services
        .requests
        .create(CreateRequest {
            user_id,
            equipment_id,
            quantity,
            borrow_date: None,
            remarks: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_approvals_for_last_unit() {
    let state = state();
    let services = state.services.clone();
    let (user, eq) = seed(&services, 1, 1).await;
    let a = submit(&services, user, eq, 1).await;
    let b = submit(&services, user, eq, 1).await;

    let (first, second) = tokio::join!(
        tokio::spawn({
            let services = services.clone();
            async move { services.requests.approve(a).await }
        }),
        tokio::spawn({
            let services = services.clone();
            async move { services.requests.approve(b).await }
        }),
    );
    let results = [first.unwrap(), second.unwrap()];

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let short = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::InsufficientStock { available: 0, requested: 1, .. })))
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(short, 1);

    assert_eq!(services.equipment.get_by_id(eq).await.unwrap().available_stock, 0);

    let statuses = [
        services.requests.get_by_id(a).await.unwrap().status,
        services.requests.get_by_id(b).await.unwrap().status,
    ];
    assert!(statuses.contains(&RequestStatus::Approved));
    assert!(statuses.contains(&RequestStatus::Pending));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stock_stays_in_bounds_under_mixed_load() {
    let state = state();
    let services = state.services.clone();
    let (user, eq) = seed(&services, 5, 5).await;

    let mut ids = Vec::new();
    for quantity in [1, 2, 3, 1, 2, 1] {
        ids.push(submit(&services, user, eq, quantity).await);
    }

    // Approve everything concurrently, then return whatever was approved
    let approvals: Vec<_> = ids
        .iter()
        .map(|&id| {
            let services = services.clone();
            tokio::spawn(async move { services.requests.approve(id).await })
        })
        .collect();

    let mut approved = Vec::new();
    let mut lent = 0;
    for handle in approvals {
        if let Ok(outcome) = handle.await.unwrap() {
            lent += outcome.request.quantity;
            approved.push(outcome.request.id);
        }
    }

    let equipment = services.equipment.get_by_id(eq).await.unwrap();
    assert!(lent <= 5);
    assert_eq!(equipment.available_stock, 5 - lent);

    let returns: Vec<_> = approved
        .into_iter()
        .map(|id| {
            let services = services.clone();
            tokio::spawn(async move { services.requests.return_request(id).await })
        })
        .collect();
    for handle in returns {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(services.equipment.get_by_id(eq).await.unwrap().available_stock, 5);
}

#[tokio::test]
async fn test_pending_requests_may_exceed_stock() {
    let state = state();
    let services = &state.services;
    let (user, eq) = seed(services, 3, 3).await;

    let big = submit(services, user, eq, 3).await;
    let small = submit(services, user, eq, 2).await;

    let outcome = services.requests.approve(big).await.unwrap();
    assert_eq!(outcome.available_stock, Some(0));

    let err = services.requests.approve(small).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { available: 0, requested: 2, .. }));

    // Rejecting the leftover needs no stock
    let rejected = services.requests.reject(small).await.unwrap();
    assert_eq!(rejected.request.status, RequestStatus::Rejected);

    services.requests.return_request(big).await.unwrap();
    assert_eq!(services.equipment.get_by_id(eq).await.unwrap().available_stock, 3);
}

#[tokio::test]
async fn test_deleted_request_cannot_transition() {
    let state = state();
    let services = &state.services;
    let (user, eq) = seed(services, 2, 2).await;
    let id = submit(services, user, eq, 1).await;

    services.requests.delete(id).await.unwrap();

    assert!(matches!(services.requests.approve(id).await, Err(AppError::NotFound(_))));
    assert_eq!(services.equipment.get_by_id(eq).await.unwrap().available_stock, 2);
}
