// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `server.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{Server, ServerResourceSpec};
    use crate::errors::TerminalReason;
    use crate::openstack::compute as nova;
    use crate::openstack::testing::connect;
    use crate::reconcilers::actuator::Actuator;
    use crate::reconcilers::kind::Reconcilable;
    use crate::reconcilers::server::{
        create_attributes, server_status, BootSource, ServerActuator, ServerDeps,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn server_object(resource: Value) -> Server {
        serde_json::from_value(json!({
            "apiVersion": "openstack.k-orc.cloud/v1alpha1",
            "kind": "Server",
            "metadata": { "name": "web", "namespace": "default" },
            "spec": { "cloud": "c", "resource": resource },
        }))
        .unwrap()
    }

    fn observed(value: Value) -> nova::Server {
        serde_json::from_value(value).unwrap()
    }

    fn resolved() -> ServerDeps {
        ServerDeps {
            image_id: Some("img-1".to_string()),
            flavor_id: Some("flv-1".to_string()),
            port_ids: Some(vec!["port-1".to_string()]),
            key_name: None,
        }
    }

    async fn actuator(server: &MockServer, resource: Value, deps: ServerDeps) -> ServerActuator {
        let clients = connect(server).await;
        ServerActuator::new(
            Arc::new(server_object(resource)),
            clients.compute().unwrap().clone(),
            deps,
        )
    }

    #[test]
    fn test_create_attributes_encode_user_data() {
        let resource = ServerResourceSpec {
            image_ref: "cirros".to_string(),
            flavor_ref: "small".to_string(),
            user_data: Some("#cloud-config\n".to_string()),
            ..Default::default()
        };
        let ports = vec!["port-1".to_string(), "port-2".to_string()];
        let boot = BootSource {
            image_id: "img-1",
            flavor_id: "flv-1",
            port_ids: &ports,
            key_name: Some("deployer"),
        };
        assert_eq!(
            create_attributes("web", &resource, &boot),
            json!({
                "name": "web",
                "imageRef": "img-1",
                "flavorRef": "flv-1",
                "networks": [{ "port": "port-1" }, { "port": "port-2" }],
                "key_name": "deployer",
                "user_data": "I2Nsb3VkLWNvbmZpZwo="
            })
        );
    }

    #[test]
    fn test_no_ports_requests_no_network() {
        let boot = BootSource {
            image_id: "img-1",
            flavor_id: "flv-1",
            port_ids: &[],
            key_name: None,
        };
        let attrs = create_attributes("web", &ServerResourceSpec::default(), &boot);
        assert_eq!(attrs["networks"], json!("none"));
    }

    #[test]
    fn test_server_status() {
        let status = server_status(&observed(json!({
            "id": "s1",
            "name": "web",
            "status": "ACTIVE",
            "tenant_id": "p1",
            "image": { "id": "img-1" },
            "flavor": { "original_name": "small" },
            "accessIPv4": ""
        })));
        assert_eq!(status.project_id, "p1");
        assert_eq!(status.image_id.as_deref(), Some("img-1"));
        assert_eq!(status.flavor_name.as_deref(), Some("small"));
        assert_eq!(status.access_ipv4, None);
    }

    #[test]
    fn test_dependency_refs() {
        let obj = server_object(json!({
            "imageRef": "cirros",
            "flavorRef": "small",
            "portRefs": ["p1", "p2"],
            "keyPairRef": "deployer"
        }));
        assert_eq!(
            obj.dependency_refs(),
            vec![
                ("image".to_string(), "cirros".to_string()),
                ("flavor".to_string(), "small".to_string()),
                ("port".to_string(), "p1".to_string()),
                ("port".to_string(), "p2".to_string()),
                ("keypair".to_string(), "deployer".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_error_state_is_unrecoverable() {
        let server = MockServer::start().await;
        let actuator = actuator(
            &server,
            json!({ "imageRef": "cirros", "flavorRef": "small" }),
            resolved(),
        )
        .await;
        let failed = observed(json!({
            "id": "s1",
            "status": "ERROR",
            "fault": { "code": 500, "message": "No valid host was found" }
        }));
        let err = actuator.progress(&failed).unwrap_err();
        assert_eq!(
            err.terminal_reason(),
            Some(TerminalReason::UnrecoverableError)
        );
        assert!(err.to_string().contains("No valid host was found"));

        let building = observed(json!({ "id": "s1", "status": "BUILD" }));
        assert_eq!(actuator.progress(&building).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_task_state() {
        let server = MockServer::start().await;
        let actuator = actuator(
            &server,
            json!({ "imageRef": "cirros", "flavorRef": "small" }),
            resolved(),
        )
        .await;
        let deleting = observed(json!({
            "id": "s1",
            "status": "ACTIVE",
            "OS-EXT-STS:task_state": "deleting"
        }));
        assert!(actuator.deletion_in_progress(&deleting));
        assert!(!actuator.deletion_in_progress(&observed(json!({ "id": "s1" }))));
    }

    #[tokio::test]
    async fn test_create_fetches_full_server() {
        let server = MockServer::start().await;
        let actuator = actuator(
            &server,
            json!({ "imageRef": "cirros", "flavorRef": "small", "portRefs": ["p1"] }),
            resolved(),
        )
        .await;

        Mock::given(method("POST"))
            .and(path("/compute/v2.1/servers"))
            .and(body_partial_json(json!({
                "server": { "name": "web", "networks": [{ "port": "port-1" }] }
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "server": { "id": "s1", "adminPass": "x" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/compute/v2.1/servers/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "server": { "id": "s1", "name": "web", "status": "BUILD" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = actuator.create().await.unwrap();
        let observed = created.resource.unwrap();
        assert_eq!(observed.status, "BUILD");
        assert!(!actuator.is_ready(&observed));
    }

    #[tokio::test]
    async fn test_create_without_flavor_is_transient() {
        let server = MockServer::start().await;
        let deps = ServerDeps {
            flavor_id: None,
            ..resolved()
        };
        let actuator = actuator(
            &server,
            json!({ "imageRef": "cirros", "flavorRef": "small" }),
            deps,
        )
        .await;

        let err = actuator.create().await.err().unwrap();
        assert!(!err.is_terminal());
        assert!(err.to_string().contains("Flavor small"));
    }
}
