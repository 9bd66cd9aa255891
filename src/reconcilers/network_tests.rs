// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `network.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{Network, NetworkResourceSpec};
    use crate::errors::TerminalReason;
    use crate::openstack::network as neutron;
    use crate::openstack::testing::{connect, TEST_PROJECT_ID};
    use crate::reconcilers::actuator::{Actuator, Lookup};
    use crate::reconcilers::network::{
        create_attributes, network_status, update_attributes, NetworkActuator,
    };
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn network(spec: Value) -> Network {
        serde_json::from_value(json!({
            "apiVersion": "openstack.k-orc.cloud/v1alpha1",
            "kind": "Network",
            "metadata": { "name": "n1", "namespace": "default" },
            "spec": spec,
        }))
        .unwrap()
    }

    async fn actuator(server: &MockServer, spec: Value) -> NetworkActuator {
        let clients = connect(server).await;
        NetworkActuator::new(Arc::new(network(spec)), clients.network().unwrap().clone())
    }

    fn observed(value: Value) -> neutron::Network {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_create_attributes_only_carry_set_fields() {
        let resource = NetworkResourceSpec {
            description: Some("tenant".to_string()),
            external: Some(true),
            mtu: Some(1450),
            ..Default::default()
        };
        assert_eq!(
            create_attributes("n1", &resource),
            json!({
                "name": "n1",
                "description": "tenant",
                "router:external": true,
                "mtu": 1450
            })
        );
    }

    #[test]
    fn test_update_attributes_ignore_unset_and_immutable_fields() {
        let resource = NetworkResourceSpec {
            mtu: Some(9000),
            ..Default::default()
        };
        let current = observed(json!({ "id": "x", "name": "n1", "mtu": 1500 }));
        assert_eq!(update_attributes("n1", &resource, &current), None);
    }

    #[test]
    fn test_update_attributes_collect_changes() {
        let resource = NetworkResourceSpec {
            description: Some("new".to_string()),
            admin_state_up: Some(false),
            port_security_enabled: Some(true),
            ..Default::default()
        };
        let current = observed(json!({
            "id": "x",
            "name": "old",
            "description": "old",
            "admin_state_up": true,
            "port_security_enabled": false
        }));
        assert_eq!(
            update_attributes("n1", &resource, &current),
            Some(json!({
                "name": "n1",
                "description": "new",
                "admin_state_up": false,
                "port_security_enabled": true
            }))
        );
    }

    #[test]
    fn test_network_status_normalizes_timestamps() {
        let status = network_status(&observed(json!({
            "id": "x",
            "name": "n1",
            "status": "ACTIVE",
            "dns_domain": "example.org.",
            "created_at": "2024-05-01T10:00:00"
        })));
        assert_eq!(status.name, "n1");
        assert_eq!(status.dns_domain, "example.org.");
        assert_eq!(status.created_at.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[tokio::test]
    async fn test_create_applies_tags_after_create() {
        let server = MockServer::start().await;
        let actuator = actuator(
            &server,
            json!({ "cloud": "c", "resource": { "tags": ["orc"] } }),
        )
        .await;

        Mock::given(method("POST"))
            .and(path("/network/v2.0/networks"))
            .and(body_json(json!({ "network": { "name": "n1" } })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "network": { "id": "net-1", "name": "n1", "status": "ACTIVE" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/network/v2.0/networks/net-1/tags"))
            .and(body_json(json!({ "tags": ["orc"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tags": ["orc"] })))
            .expect(1)
            .mount(&server)
            .await;

        let created = actuator.create().await.unwrap();
        let network = created.resource.unwrap();
        assert_eq!(network.tags, vec!["orc"]);
        assert!(actuator.is_ready(&network));
    }

    #[tokio::test]
    async fn test_get_by_spec_skips_claimed_and_mismatched() {
        let server = MockServer::start().await;
        let actuator = actuator(
            &server,
            json!({ "cloud": "c", "resource": { "mtu": 1450 } }),
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/network/v2.0/networks"))
            .and(query_param("name", "n1"))
            .and(query_param("project_id", TEST_PROJECT_ID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "networks": [
                    { "id": "claimed", "name": "n1", "mtu": 1450 },
                    { "id": "wrong-mtu", "name": "n1", "mtu": 1500 },
                    { "id": "orphan", "name": "n1", "mtu": 1450 }
                ]
            })))
            .mount(&server)
            .await;

        let claimed: HashSet<String> = ["claimed".to_string()].into_iter().collect();
        let found = actuator.get_by_spec(&claimed).await.unwrap().unwrap();
        assert_eq!(found.id, "orphan");
    }

    #[tokio::test]
    async fn test_get_by_spec_ignores_other_projects() {
        let server = MockServer::start().await;
        let actuator = actuator(&server, json!({ "cloud": "c", "resource": {} })).await;

        Mock::given(method("GET"))
            .and(path("/network/v2.0/networks"))
            .and(query_param("name", "n1"))
            .and(query_param("project_id", TEST_PROJECT_ID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "networks": [] })))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/network/v2.0/networks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "networks": [{
                    "id": "foreign-shared",
                    "name": "n1",
                    "project_id": "admin-project",
                    "shared": true,
                    "router:external": true
                }]
            })))
            .expect(0)
            .mount(&server)
            .await;

        assert!(actuator.get_by_spec(&HashSet::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_import_filter_ambiguous_is_terminal() {
        let server = MockServer::start().await;
        let actuator = actuator(
            &server,
            json!({
                "cloud": "c",
                "managementPolicy": "unmanaged",
                "import": { "filter": { "name": "public", "external": true } }
            }),
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/network/v2.0/networks"))
            .and(query_param("name", "public"))
            .and(query_param("router:external", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "networks": [{ "id": "a", "name": "public" }, { "id": "b", "name": "public" }]
            })))
            .mount(&server)
            .await;

        let err = actuator.get_by_import_filter().await.unwrap_err();
        assert_eq!(
            err.terminal_reason(),
            Some(TerminalReason::InvalidConfiguration)
        );
    }

    #[tokio::test]
    async fn test_import_filter_not_present_yet() {
        let server = MockServer::start().await;
        let actuator = actuator(
            &server,
            json!({
                "cloud": "c",
                "managementPolicy": "unmanaged",
                "import": { "filter": { "name": "public" } }
            }),
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/network/v2.0/networks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "networks": [] })))
            .mount(&server)
            .await;

        assert_eq!(actuator.get_by_import_filter().await.unwrap(), Lookup::Absent);
    }

    #[tokio::test]
    async fn test_planned_updates_rename_and_retag() {
        let server = MockServer::start().await;
        let actuator = actuator(
            &server,
            json!({ "cloud": "c", "resource": { "name": "renamed", "tags": ["a"] } }),
        )
        .await;
        let current = observed(json!({ "id": "net-1", "name": "n1", "tags": ["b"] }));

        Mock::given(method("PUT"))
            .and(path("/network/v2.0/networks/net-1"))
            .and(body_json(json!({ "network": { "name": "renamed" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "network": { "id": "net-1", "name": "renamed" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/network/v2.0/networks/net-1/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tags": ["a"] })))
            .expect(1)
            .mount(&server)
            .await;

        let steps = actuator.planned_updates(&current);
        assert_eq!(steps.len(), 2);
        for step in steps {
            step.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_referencing_kinds() {
        let server = MockServer::start().await;
        let actuator = actuator(&server, json!({ "cloud": "c", "resource": {} })).await;
        assert_eq!(
            actuator.referencing_kinds(),
            &["Subnet", "Port", "FloatingIP", "Router"]
        );
    }
}
