// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `client.rs`

#[cfg(test)]
mod tests {
    use crate::openstack::client::{
        error_message, normalize_opt_timestamp, normalize_timestamp, unwrap_key, Query,
    };
    use crate::openstack::testing::{connect, token_response, TEST_TOKEN};
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"NeutronError": {"type": "NetworkNotFound", "message": "Network x could not be found."}}"#),
            "Network x could not be found."
        );
        assert_eq!(
            error_message(r#"{"itemNotFound": {"code": 404, "message": "Flavor y could not be found."}}"#),
            "Flavor y could not be found."
        );
        assert_eq!(error_message(r#"{"message": "top level"}"#), "top level");
        assert_eq!(error_message("  plain text  "), "plain text");
    }

    #[test]
    fn test_error_message_truncates_long_bodies() {
        let body = "x".repeat(2000);
        let message = error_message(&body);
        assert!(message.ends_with("..."));
        assert!(message.len() < 600);
    }

    #[test]
    fn test_normalize_timestamp() {
        assert_eq!(normalize_timestamp("2024-03-01T10:20:30Z"), "2024-03-01T10:20:30Z");
        assert_eq!(
            normalize_timestamp("2024-03-01T12:20:30+02:00"),
            "2024-03-01T10:20:30Z"
        );
        assert_eq!(
            normalize_timestamp("2024-03-01T10:20:30.123456"),
            "2024-03-01T10:20:30Z"
        );
        assert_eq!(normalize_timestamp("not a time"), "not a time");
        assert_eq!(normalize_opt_timestamp(Some("")), None);
        assert_eq!(normalize_opt_timestamp(None), None);
    }

    #[test]
    fn test_query_builders() {
        let tags = vec!["a".to_string(), "b".to_string()];
        let query = Query::new()
            .push("name", "net")
            .opt::<String>("description", None)
            .opt("shared", Some(true))
            .tags("tags", &tags)
            .repeated("tag", &tags);

        assert_eq!(
            query.pairs(),
            &[
                ("name".to_string(), "net".to_string()),
                ("shared".to_string(), "true".to_string()),
                ("tags".to_string(), "a,b".to_string()),
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_unwrap_key() {
        let value = json!({ "network": { "id": "n1" } });
        let inner: Value = unwrap_key(value, "network").unwrap();
        assert_eq!(inner["id"], "n1");

        let missing: Result<Value, _> = unwrap_key(json!({}), "network");
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_requests_carry_token_and_map_not_found() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("GET"))
            .and(path("/network/v2.0/networks/missing"))
            .and(header("X-Auth-Token", TEST_TOKEN))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "NeutronError": { "message": "Network missing could not be found." }
            })))
            .mount(&server)
            .await;

        let err = clients
            .network()
            .unwrap()
            .get::<Value>(crate::openstack::network::collection::NETWORKS, "missing")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("could not be found"));
    }

    #[tokio::test]
    async fn test_conflict_is_mapped() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("DELETE"))
            .and(path("/network/v2.0/networks/busy"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "NeutronError": { "message": "One or more ports have an IP allocation" }
            })))
            .mount(&server)
            .await;

        let err = clients
            .network()
            .unwrap()
            .delete(crate::openstack::network::collection::NETWORKS, "busy")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("GET"))
            .and(path("/network/v2.0/networks/n1"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/network/v2.0/networks/n1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "network": { "id": "n1", "name": "net" }
            })))
            .mount(&server)
            .await;

        let network: Value = clients
            .network()
            .unwrap()
            .get(crate::openstack::network::collection::NETWORKS, "n1")
            .await
            .unwrap();
        assert_eq!(network["name"], "net");
    }

    #[tokio::test]
    async fn test_unauthorized_reauthenticates_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/identity/v3/auth/tokens"))
            .respond_with(token_response(&server.uri()))
            .expect(2)
            .mount(&server)
            .await;
        let clients = crate::openstack::CloudClients::connect(
            crate::openstack::testing::password_config(&server),
        )
        .await
        .unwrap();

        Mock::given(method("GET"))
            .and(path("/image/v2/images/i1"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/image/v2/images/i1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "i1", "name": "cirros", "status": "active"
            })))
            .mount(&server)
            .await;

        let image = clients.image().unwrap().get_image("i1").await.unwrap();
        assert_eq!(image.name, "cirros");
    }

    #[tokio::test]
    async fn test_neutron_pagination_follows_links() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;
        let uri = server.uri();

        Mock::given(method("GET"))
            .and(path("/network/v2.0/networks"))
            .and(query_param("marker", "n1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "networks": [{ "id": "n2" }],
                "networks_links": [{ "rel": "previous", "href": format!("{uri}/network/v2.0/networks") }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/network/v2.0/networks"))
            .and(query_param("name", "net"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "networks": [{ "id": "n1" }],
                "networks_links": [{
                    "rel": "next",
                    "href": format!("{uri}/network/v2.0/networks?name=net&marker=n1")
                }]
            })))
            .mount(&server)
            .await;

        let networks: Vec<crate::openstack::network::Network> = clients
            .network()
            .unwrap()
            .list(
                crate::openstack::network::collection::NETWORKS,
                &Query::new().push("name", "net"),
            )
            .await
            .unwrap();

        let ids: Vec<_> = networks.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n2"]);
    }

    #[tokio::test]
    async fn test_glance_pagination_follows_next() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("GET"))
            .and(path("/image/v2/images"))
            .and(query_param("marker", "i1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "images": [{ "id": "i2" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/image/v2/images"))
            .and(query_param("name", "cirros"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "images": [{ "id": "i1" }],
                "next": "/v2/images?marker=i1"
            })))
            .mount(&server)
            .await;

        let images = clients
            .image()
            .unwrap()
            .list_images(&Query::new().push("name", "cirros"))
            .await
            .unwrap();

        let ids: Vec<_> = images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["i1", "i2"]);
    }

    #[tokio::test]
    async fn test_compute_requests_pin_microversion() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("GET"))
            .and(path("/compute/v2.1/flavors/f1"))
            .and(header("X-OpenStack-Nova-API-Version", "2.55"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "flavor": { "id": "f1", "name": "m1.small", "ram": 2048, "vcpus": 1, "disk": 20, "swap": "" }
            })))
            .mount(&server)
            .await;

        let flavor = clients.compute().unwrap().get_flavor("f1").await.unwrap();
        assert_eq!(flavor.ram, 2048);
        assert_eq!(flavor.swap, 0);
    }
}
