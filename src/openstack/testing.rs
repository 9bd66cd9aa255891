// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Mock Keystone for OpenStack client tests.
//!
//! [`mock_keystone`] serves a token whose catalog points every service at the
//! same [`MockServer`] under `/network`, `/compute/v2.1` and `/image`.

use crate::openstack::config::{AuthConfig, CloudConfig};
use crate::openstack::CloudClients;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "test-token";
pub const TEST_REGION: &str = "RegionOne";
pub const TEST_PROJECT_ID: &str = "demo-project";

pub fn catalog(base: &str) -> Value {
    let endpoint = |url: String| {
        json!([{ "interface": "public", "region": TEST_REGION, "region_id": TEST_REGION, "url": url }])
    };
    json!([
        { "type": "identity", "endpoints": endpoint(format!("{base}/identity/v3")) },
        { "type": "network", "endpoints": endpoint(format!("{base}/network")) },
        { "type": "compute", "endpoints": endpoint(format!("{base}/compute/v2.1")) },
        { "type": "image", "endpoints": endpoint(format!("{base}/image")) },
    ])
}

pub fn token_response(base: &str) -> ResponseTemplate {
    ResponseTemplate::new(201)
        .insert_header("X-Subject-Token", TEST_TOKEN)
        .set_body_json(json!({
            "token": {
                "expires_at": "2099-01-01T00:00:00.000000Z",
                "catalog": catalog(base),
                "project": { "id": TEST_PROJECT_ID, "name": "demo" },
            }
        }))
}

/// Mount a Keystone token endpoint that always succeeds.
pub async fn mock_keystone(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(token_response(&server.uri()))
        .mount(server)
        .await;
}

pub fn password_config(server: &MockServer) -> CloudConfig {
    CloudConfig {
        auth: AuthConfig {
            auth_url: Some(format!("{}/identity", server.uri())),
            username: Some("demo".to_string()),
            password: Some("secret".to_string()),
            project_name: Some("demo".to_string()),
            user_domain_name: Some("Default".to_string()),
            project_domain_name: Some("Default".to_string()),
            ..AuthConfig::default()
        },
        region_name: Some(TEST_REGION.to_string()),
        ..CloudConfig::default()
    }
}

/// Clients for all services of the mock cloud.
pub async fn connect(server: &MockServer) -> CloudClients {
    mock_keystone(server).await;
    CloudClients::connect(password_config(server)).await.unwrap()
}
