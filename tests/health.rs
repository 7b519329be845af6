//! `GET /health` against a wiremock Vault.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use http_body_util::BodyExt;
use openvpn_authd::secrets::{HealthProbe, HealthStatus, VaultHealthProbe};
use openvpn_authd::{Error, VERSION};
use serde_json::json;
use tower::ServiceExt;
use wiremock::{MockServer, ResponseTemplate};

async fn get_health(gateway: &TestGateway) -> (StatusCode, String) {
    let response = gateway
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_health_passes_vault_document_through() {
    let gateway = TestGateway::start(&[INTERMEDIATE, ROOT]).await;
    mount_health(&gateway.vault, ResponseTemplate::new(200).set_body_json(health_document())).await;

    let (status, body) = get_health(&gateway).await;
    assert_eq!(status, StatusCode::OK);

    let health: HealthStatus = serde_json::from_str(&body).unwrap();
    assert!(health.initialized);
    assert!(!health.sealed);
    assert_eq!(health.version, "1.15.2");
    assert_eq!(health.cluster_name, "vault-cluster-e2e");
    assert_eq!(health.server_time_utc, 1_760_000_000);
    assert_eq!(health.app_version, VERSION);
    assert!(!health.app_version.is_empty());
}

#[tokio::test]
async fn test_sealed_vault_status_code_still_reports_document() {
    let gateway = TestGateway::start(&[INTERMEDIATE, ROOT]).await;
    let mut document = health_document();
    document["sealed"] = json!(true);
    mount_health(&gateway.vault, ResponseTemplate::new(503).set_body_json(document)).await;

    let (status, body) = get_health(&gateway).await;
    assert_eq!(status, StatusCode::OK);

    let health: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["sealed"], json!(true));
    assert_eq!(health["app_version"], json!(VERSION));
}

#[tokio::test]
async fn test_malformed_health_body_is_a_500_with_diagnostic() {
    let gateway = TestGateway::start(&[INTERMEDIATE, ROOT]).await;
    mount_health(&gateway.vault, ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .await;

    let (status, body) = get_health(&gateway).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.is_empty());
    assert!(body.contains("malformed health response"));
}

#[tokio::test]
async fn test_probe_queries_every_time() {
    let vault = MockServer::start().await;
    mount_health(&vault, ResponseTemplate::new(200).set_body_json(health_document())).await;

    let probe = VaultHealthProbe::new(&vault_config(&vault)).unwrap();
    probe.query().await.unwrap();
    probe.query().await.unwrap();

    let requests = vault.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_unreachable_vault_is_a_probe_error() {
    let vault = MockServer::start().await;
    let mut config = vault_config(&vault);
    drop(vault);
    config.timeout_seconds = 1;

    let probe = VaultHealthProbe::new(&config).unwrap();
    assert!(matches!(probe.query().await, Err(Error::Probe(_))));
}
