// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `network.rs`

#[cfg(test)]
mod tests {
    use crate::openstack::network::{collection, Network, Port, Router, SecurityGroup};
    use crate::openstack::testing::connect;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_network_decodes_external_flag() {
        let network: Network = serde_json::from_value(json!({
            "id": "n1",
            "name": "public",
            "router:external": true,
            "status": "ACTIVE",
            "mtu": 1500,
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert!(network.external);
        assert_eq!(network.mtu, Some(1500));
        assert!(network.tags.is_empty());
    }

    #[test]
    fn test_security_group_decodes_embedded_rules() {
        let group: SecurityGroup = serde_json::from_value(json!({
            "id": "sg1",
            "name": "web",
            "security_group_rules": [
                { "id": "r1", "direction": "egress", "ethertype": "IPv4", "protocol": null }
            ]
        }))
        .unwrap();

        assert_eq!(group.security_group_rules.len(), 1);
        assert_eq!(group.security_group_rules[0].protocol, None);
    }

    #[tokio::test]
    async fn test_create_wraps_attributes() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("POST"))
            .and(path("/network/v2.0/networks"))
            .and(body_json(json!({ "network": { "name": "net", "admin_state_up": true } })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "network": { "id": "n1", "name": "net", "admin_state_up": true, "status": "BUILD" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let network: Network = clients
            .network()
            .unwrap()
            .create(
                collection::NETWORKS,
                json!({ "name": "net", "admin_state_up": true }),
            )
            .await
            .unwrap();
        assert_eq!(network.id, "n1");
        assert_eq!(network.status, "BUILD");
    }

    #[tokio::test]
    async fn test_security_group_list_uses_underscored_key() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("GET"))
            .and(path("/network/v2.0/security-groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "security_groups": [{ "id": "sg1", "name": "web" }]
            })))
            .mount(&server)
            .await;

        let groups: Vec<SecurityGroup> = clients
            .network()
            .unwrap()
            .list(collection::SECURITY_GROUPS, &crate::openstack::client::Query::new())
            .await
            .unwrap();
        assert_eq!(groups[0].name, "web");
    }

    #[tokio::test]
    async fn test_replace_tags() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("PUT"))
            .and(path("/network/v2.0/ports/p1/tags"))
            .and(body_json(json!({ "tags": ["a", "b"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tags": ["a", "b"] })))
            .expect(1)
            .mount(&server)
            .await;

        clients
            .network()
            .unwrap()
            .replace_tags(collection::PORTS, "p1", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_router_interface_ports_excludes_gateway() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("GET"))
            .and(path("/network/v2.0/ports"))
            .and(query_param("device_id", "r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ports": [
                    { "id": "p1", "device_id": "r1", "device_owner": "network:router_interface" },
                    { "id": "p2", "device_id": "r1", "device_owner": "network:router_gateway" },
                    { "id": "p3", "device_id": "r1", "device_owner": "network:router_interface_distributed" }
                ]
            })))
            .mount(&server)
            .await;

        let ports: Vec<Port> = clients
            .network()
            .unwrap()
            .router_interface_ports("r1")
            .await
            .unwrap();
        let ids: Vec<_> = ports.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn test_add_router_interface() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("PUT"))
            .and(path("/network/v2.0/routers/r1/add_router_interface"))
            .and(body_json(json!({ "port_id": "p1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "r1", "port_id": "p1", "subnet_id": "s1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        clients
            .network()
            .unwrap()
            .add_router_interface("r1", "p1")
            .await
            .unwrap();

        let router: Router = serde_json::from_value(json!({
            "id": "r1",
            "external_gateway_info": { "network_id": "ext" }
        }))
        .unwrap();
        assert_eq!(router.external_gateway_info.unwrap().network_id, "ext");
    }
}
