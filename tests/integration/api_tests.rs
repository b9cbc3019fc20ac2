//! API integration tests
//!
//! Black-box tests against a running server with a migrated database.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Unique address so repeated runs do not collide on the email constraint
fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

/// Register a user with the given role and return (user id, token)
async fn register_and_login(client: &Client, prefix: &str, role: &str) -> (i64, String) {
    let email = unique_email(prefix);

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": prefix,
            "email": email,
            "password": "secret1",
            "role": role
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201);
    let user: Value = response.json().await.expect("Failed to parse register response");

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "secret1" }))
        .send()
        .await
        .expect("Failed to send login request");
    let body: Value = response.json().await.expect("Failed to parse login response");

    (
        user["id"].as_i64().expect("No id in response"),
        body["token"].as_str().expect("No token in response").to_string(),
    )
}

async fn first_team_id(client: &Client) -> i64 {
    let teams: Value = client
        .get(format!("{}/teams", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    teams[0]["id"].as_i64().expect("No seeded team")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();
    let email = unique_email("login");

    client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({ "name": "Login", "email": email, "password": "secret1", "role": "Employee" }))
        .send()
        .await
        .expect("Failed to send request");

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "secret1" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["role"], "Employee");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "nobody@example.com",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/requests", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_default_teams_are_seeded() {
    let client = Client::new();

    let teams: Value = client
        .get(format!("{}/teams", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let names: Vec<&str> = teams
        .as_array()
        .expect("Expected array")
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"Mechanical Team"));
    assert!(names.contains(&"IT Support"));
}

#[tokio::test]
#[ignore]
async fn test_employee_cannot_create_equipment() {
    let client = Client::new();
    let (_, token) = register_and_login(&client, "emp", "Employee").await;
    let team_id = first_team_id(&client).await;

    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": "Drill", "maintenance_team_id": team_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_scrap_retires_equipment() {
    let client = Client::new();
    let (_, manager) = register_and_login(&client, "manager", "Manager").await;
    let (tech_id, tech) = register_and_login(&client, "tech", "Technician").await;
    let team_id = first_team_id(&client).await;

    let equipment: Value = client
        .post(format!("{}/equipment", BASE_URL))
        .bearer_auth(&manager)
        .json(&json!({
            "name": "Conveyor",
            "category": "Machinery",
            "maintenance_team_id": team_id,
            "default_technician_id": tech_id
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let created: Value = client
        .post(format!("{}/requests", BASE_URL))
        .bearer_auth(&manager)
        .json(&json!({
            "subject": "Belt torn",
            "type": "Corrective",
            "equipment_id": equipment["id"]
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(created["technician_id"], tech_id);
    assert_eq!(created["team_id"], team_id);

    let response = client
        .put(format!("{}/requests/{}", BASE_URL, created["id"]))
        .bearer_auth(&tech)
        .json(&json!({ "status": "Scrap" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let stored: Value = client
        .get(format!("{}/equipment/{}", BASE_URL, equipment["id"]))
        .bearer_auth(&manager)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(stored["is_usable"], false);
}

#[tokio::test]
#[ignore]
async fn test_dashboard_stats() {
    let client = Client::new();
    let (_, token) = register_and_login(&client, "viewer", "Employee").await;

    let response = client
        .get(format!("{}/dashboard/stats", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let rate = body["utilization_rate"].as_f64().expect("Missing utilization_rate");
    assert!((0.0..=100.0).contains(&rate));
}

#[tokio::test]
#[ignore]
async fn test_email_uniqueness_ignores_case() {
    let client = Client::new();
    let email = unique_email("casing");

    let register = |address: String| {
        client
            .post(format!("{}/auth/register", BASE_URL))
            .json(&json!({ "name": "Casing", "email": address, "password": "secret1", "role": "Employee" }))
            .send()
    };

    let first = register(email.clone()).await.expect("Failed to send request");
    assert_eq!(first.status(), 201);

    let second = register(email.to_uppercase()).await.expect("Failed to send request");
    assert_eq!(second.status(), 409);
    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Conflict");
}
