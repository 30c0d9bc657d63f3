//! Liveness and readiness checks.

use printloom_integration_tests::{base_url, client};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_readiness_sees_database() {
    let resp = client()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_security_headers_and_request_id() {
    let resp = client()
        .get(format!("{}/api/categories", base_url()))
        .header("x-request-id", "it-health-1")
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.headers()["x-request-id"], "it-health-1");
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
}
