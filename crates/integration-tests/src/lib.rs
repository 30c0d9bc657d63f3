//! Integration test helpers for the Printloom storefront.
//!
//! # Running Tests
//!
//! ```bash
//! pl-cli migrate && pl-cli seed
//! cargo run -p printloom-storefront &
//! cargo test -p printloom-integration-tests -- --ignored
//! ```
//!
//! Tests talk to the server over HTTP with a cookie-holding client, so each
//! registered shopper keeps their own session.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use uuid::Uuid;

/// Password that satisfies every registration rule.
pub const PASSWORD: &str = "Sup3r-secret!";

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps the session cookie between requests.
///
/// Each client claims its own forwarded address, so it gets its own rate
/// limit bucket.
#[must_use]
pub fn client() -> Client {
    let [a, b, c, ..] = *Uuid::new_v4().as_bytes();
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&format!("10.{a}.{b}.{c}")).unwrap(),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// A fresh, unique email address.
#[must_use]
pub fn unique_email() -> String {
    format!("shopper-{}@example.com", Uuid::new_v4().simple())
}

/// Register a new shopper and return a signed-in client plus its email.
pub async fn signed_in_shopper() -> (Client, String) {
    let client = client();
    let email = unique_email();
    let resp = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "name": "Test Shopper",
            "email": email,
            "password": PASSWORD,
            "confirmPassword": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);
    (client, email)
}

/// The seeded Padalustro T-Shirt.
pub async fn seeded_tee(client: &Client) -> Value {
    let resp = client
        .get(format!(
            "{}/api/categories/t-shirts/products/padalustro-t-shirt",
            base_url()
        ))
        .send()
        .await
        .expect("Failed to fetch product");
    assert_eq!(resp.status(), StatusCode::OK, "run `pl-cli seed` first");
    resp.json().await.unwrap()
}

/// The ID of the customizable area with the given type on a product.
#[must_use]
pub fn area_id(product: &Value, kind: &str) -> String {
    product["customizableAreas"]
        .as_array()
        .unwrap()
        .iter()
        .find(|area| area["type"] == kind)
        .and_then(|area| area["id"].as_str())
        .unwrap()
        .to_string()
}

/// Read a money field, which is serialized as a decimal string.
#[must_use]
pub fn money(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

/// Shipping details that pass validation.
#[must_use]
pub fn shipping_info() -> Value {
    json!({
        "fullName": "Ada Lovelace",
        "email": "ada@example.com",
        "address": "12 Analytical Row",
        "city": "London",
        "state": "LDN",
        "zipCode": "N1 9GU",
        "country": "UK",
        "phone": "+44 20 7946 0000",
    })
}
