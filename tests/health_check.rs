//! Integration tests for the public endpoints

use std::net::TcpListener;
use jwt_gate::auth::{InMemoryCredentials, JwtAuth};
use jwt_gate::configuration::JwtSettings;
use jwt_gate::startup::run;

fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let auth = JwtAuth::builder(JwtSettings {
        realm: "test zone".to_string(),
        secret: "secret key".to_string(),
        ..JwtSettings::default()
    })
    .with_authenticator(InMemoryCredentials::new())
    .build()
    .expect("Failed to build gate");

    let server = run(listener, auth).expect("Failed to create server");

    let _ = tokio::spawn(async move {
        let _ = server.await;
    });

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn health_check_needs_no_token() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", addr))
        .header("Authorization", "Bearer garbage")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn login_with_no_users_configured_is_rejected() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .post(&format!("{}/auth/login", addr))
        .json(&serde_json::json!({ "username": "alice", "password": "correct" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(401, response.status().as_u16());
    assert_eq!(
        response.headers().get("WWW-Authenticate").unwrap(),
        "Basic realm=test zone"
    );
}
