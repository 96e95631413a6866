//! Tests against a running server backed by PostgreSQL
//!
//! Start the server, then run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

async fn post(client: &Client, path: &str, body: Value) -> (u16, Value) {
    let response = client
        .post(format!("{}{}", BASE_URL, path))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status().as_u16();
    (status, response.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
#[ignore]
async fn test_live_ready() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_live_concurrent_approvals() {
    let client = Client::new();

    let (status, user) = post(
        &client,
        "/users",
        json!({
            "name": "Live Test",
            "email": format!("{}@school.test", unique("live")),
            "password": "password"
        }),
    )
    .await;
    assert_eq!(status, 201);

    let (status, equipment) = post(
        &client,
        "/equipment",
        json!({"name": unique("Camera"), "totalStock": 1}),
    )
    .await;
    assert_eq!(status, 201);

    let mut ids = Vec::new();
    for _ in 0..2 {
        let (status, request) = post(
            &client,
            "/requests",
            json!({"userId": user["id"], "equipmentId": equipment["id"], "quantity": 1}),
        )
        .await;
        assert_eq!(status, 201);
        ids.push(request["id"].as_i64().unwrap());
    }

    let first = format!("/requests/{}/approve", ids[0]);
    let second = format!("/requests/{}/approve", ids[1]);
    let (a, b) = tokio::join!(
        post(&client, &first, Value::Null),
        post(&client, &second, Value::Null),
    );
    let mut statuses = [a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, [200, 400]);

    let body: Value = client
        .get(format!("{}/equipment/{}", BASE_URL, equipment["id"]))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["availableStock"], 0);
}

#[tokio::test]
#[ignore]
async fn test_live_submissions_during_approvals() {
    let client = Client::new();

    let (_, user) = post(
        &client,
        "/users",
        json!({
            "name": "Live Submitter",
            "email": format!("{}@school.test", unique("submit")),
            "password": "password"
        }),
    )
    .await;
    let (_, equipment) = post(
        &client,
        "/equipment",
        json!({"name": unique("Projector"), "totalStock": 20}),
    )
    .await;
    let body = json!({"userId": user["id"], "equipmentId": equipment["id"], "quantity": 1});

    let mut pending = Vec::new();
    for _ in 0..5 {
        let (_, request) = post(&client, "/requests", body.clone()).await;
        pending.push(format!("/requests/{}/approve", request["id"]));
    }

    // New submissions against the same equipment proceed while it is being approved
    let approvals = approve_all(&client, &pending);
    let submissions = async {
        let mut statuses = Vec::new();
        for _ in 0..5 {
            statuses.push(post(&client, "/requests", body.clone()).await.0);
        }
        statuses
    };
    let (approved, submitted) = tokio::join!(approvals, submissions);

    assert!(approved.iter().all(|s| *s == 200));
    assert!(submitted.iter().all(|s| *s == 201));
}

async fn approve_all(client: &Client, paths: &[String]) -> Vec<u16> {
    let mut statuses = Vec::new();
    for path in paths {
        statuses.push(post(client, path, Value::Null).await.0);
    }
    statuses
}
