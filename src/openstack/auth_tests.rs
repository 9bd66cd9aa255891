// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `auth.rs`

#[cfg(test)]
mod tests {
    use crate::openstack::auth::{auth_request_body, tokens_url, CatalogEntry, Session, Token};
    use crate::openstack::config::{AuthConfig, CloudConfig};
    use crate::openstack::testing::{
        catalog, password_config, token_response, TEST_PROJECT_ID, TEST_TOKEN,
    };
    use chrono::{Duration, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_tokens_url_appends_version_once() {
        assert_eq!(
            tokens_url("https://keystone:5000"),
            "https://keystone:5000/v3/auth/tokens"
        );
        assert_eq!(
            tokens_url("https://keystone:5000/v3/"),
            "https://keystone:5000/v3/auth/tokens"
        );
        assert_eq!(
            tokens_url("https://cloud/identity"),
            "https://cloud/identity/v3/auth/tokens"
        );
    }

    #[test]
    fn test_password_body_scopes_project() {
        let config = CloudConfig {
            auth: AuthConfig {
                auth_url: Some("https://keystone".to_string()),
                username: Some("demo".to_string()),
                password: Some("pw".to_string()),
                project_name: Some("proj".to_string()),
                user_domain_name: Some("Default".to_string()),
                project_domain_id: Some("default".to_string()),
                ..AuthConfig::default()
            },
            ..CloudConfig::default()
        };

        let body = auth_request_body(&config).unwrap();
        assert_eq!(
            body,
            json!({
                "auth": {
                    "identity": {
                        "methods": ["password"],
                        "password": {
                            "user": {
                                "name": "demo",
                                "domain": { "name": "Default" },
                                "password": "pw"
                            }
                        }
                    },
                    "scope": {
                        "project": { "name": "proj", "domain": { "id": "default" } }
                    }
                }
            })
        );
    }

    #[test]
    fn test_application_credential_body_has_no_scope() {
        let config = CloudConfig {
            auth_type: Some("v3applicationcredential".to_string()),
            auth: AuthConfig {
                auth_url: Some("https://keystone".to_string()),
                application_credential_id: Some("cred".to_string()),
                application_credential_secret: Some("s3cret".to_string()),
                project_name: Some("ignored".to_string()),
                ..AuthConfig::default()
            },
            ..CloudConfig::default()
        };

        let body = auth_request_body(&config).unwrap();
        assert_eq!(
            body,
            json!({
                "auth": {
                    "identity": {
                        "methods": ["application_credential"],
                        "application_credential": { "id": "cred", "secret": "s3cret" }
                    }
                }
            })
        );
    }

    #[test]
    fn test_token_freshness_keeps_margin() {
        let now = Utc::now();
        let token = |expires_in: i64| Token {
            value: "t".to_string(),
            expires_at: now + Duration::seconds(expires_in),
            catalog: Vec::new(),
            project_id: None,
        };

        assert!(token(3600).is_fresh(now));
        assert!(!token(30).is_fresh(now));
        assert!(!token(-10).is_fresh(now));
    }

    #[test]
    fn test_catalog_endpoint_selection() {
        let entries: Vec<CatalogEntry> = serde_json::from_value(json!([
            {
                "type": "network",
                "endpoints": [
                    { "interface": "internal", "region_id": "RegionOne", "url": "http://internal:9696" },
                    { "interface": "public", "region_id": "RegionTwo", "url": "http://public-two:9696" },
                    { "interface": "public", "region_id": "RegionOne", "url": "http://public-one:9696" }
                ]
            }
        ]))
        .unwrap();
        let token = Token {
            value: "t".to_string(),
            expires_at: Utc::now(),
            catalog: entries,
            project_id: None,
        };

        assert_eq!(
            token.endpoint("network", "public", Some("RegionOne")),
            Some("http://public-one:9696")
        );
        assert_eq!(
            token.endpoint("network", "internal", None),
            Some("http://internal:9696")
        );
        assert_eq!(token.endpoint("compute", "public", None), None);
    }

    #[tokio::test]
    async fn test_token_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/v3/auth/tokens"))
            .and(body_partial_json(json!({
                "auth": { "identity": { "methods": ["password"] } }
            })))
            .respond_with(token_response(&server.uri()))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::new(password_config(&server)).unwrap();
        assert_eq!(session.token().await.unwrap(), TEST_TOKEN);
        assert_eq!(session.token().await.unwrap(), TEST_TOKEN);
        assert_eq!(
            session.endpoint("network").await.unwrap(),
            format!("{}/network", server.uri())
        );
    }

    #[tokio::test]
    async fn test_project_id_from_token_scope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/v3/auth/tokens"))
            .respond_with(token_response(&server.uri()))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::new(password_config(&server)).unwrap();
        assert_eq!(
            session.project_id().await.unwrap().as_deref(),
            Some(TEST_PROJECT_ID)
        );
    }

    #[tokio::test]
    async fn test_unscoped_token_has_no_project() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/v3/auth/tokens"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("X-Subject-Token", TEST_TOKEN)
                    .set_body_json(json!({
                        "token": { "expires_at": "2099-01-01T00:00:00Z", "catalog": [] }
                    })),
            )
            .mount(&server)
            .await;

        let session = Session::new(password_config(&server)).unwrap();
        assert_eq!(session.project_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reauthentication() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/v3/auth/tokens"))
            .respond_with(token_response(&server.uri()))
            .expect(2)
            .mount(&server)
            .await;

        let session = Session::new(password_config(&server)).unwrap();
        session.token().await.unwrap();
        session.invalidate().await;
        session.token().await.unwrap();
    }

    #[tokio::test]
    async fn test_keystone_client_error_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "code": 401, "message": "The request you have made requires authentication." }
            })))
            .mount(&server)
            .await;

        let session = Session::new(password_config(&server)).unwrap();
        let err = session.authenticate().await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("requires authentication"));
    }

    #[tokio::test]
    async fn test_missing_subject_token_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "token": { "expires_at": "2099-01-01T00:00:00Z", "catalog": catalog(&server.uri()) }
            })))
            .mount(&server)
            .await;

        let session = Session::new(password_config(&server)).unwrap();
        let err = session.authenticate().await.unwrap_err();
        assert!(err.to_string().contains("X-Subject-Token"));
    }

    #[tokio::test]
    async fn test_endpoint_not_in_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/v3/auth/tokens"))
            .respond_with(token_response(&server.uri()))
            .mount(&server)
            .await;

        let session = Session::new(password_config(&server)).unwrap();
        let err = session.endpoint("baremetal").await.unwrap_err();
        assert!(err.to_string().contains("no baremetal endpoint"));
    }
}
