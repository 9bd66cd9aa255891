// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `port.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{AllowedAddressPair, Port, PortAddress, PortResourceSpec};
    use crate::openstack::network as neutron;
    use crate::openstack::testing::connect;
    use crate::reconcilers::actuator::Actuator;
    use crate::reconcilers::kind::Reconcilable;
    use crate::reconcilers::port::{
        address_pairs_match, create_attributes, port_status, update_attributes, PortActuator,
        PortDeps,
    };
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn port(spec: Value) -> Port {
        serde_json::from_value(json!({
            "apiVersion": "openstack.k-orc.cloud/v1alpha1",
            "kind": "Port",
            "metadata": { "name": "p1", "namespace": "default" },
            "spec": spec,
        }))
        .unwrap()
    }

    fn observed(value: Value) -> neutron::Port {
        serde_json::from_value(value).unwrap()
    }

    fn pair(ip: &str, mac: Option<&str>) -> AllowedAddressPair {
        AllowedAddressPair {
            ip: ip.to_string(),
            mac: mac.map(str::to_string),
        }
    }

    fn resolved_deps() -> PortDeps {
        PortDeps {
            network_id: Some("net-1".to_string()),
            subnet_ids: Some(vec![]),
            security_group_ids: Some(vec!["sg-1".to_string()]),
            filter_network_id: None,
        }
    }

    #[test]
    fn test_create_attributes_pair_addresses_with_subnets() {
        let resource = PortResourceSpec {
            network_ref: "n1".to_string(),
            addresses: vec![
                PortAddress {
                    subnet_ref: "s1".to_string(),
                    ip: Some("10.0.0.10".to_string()),
                },
                PortAddress {
                    subnet_ref: "s2".to_string(),
                    ip: None,
                },
            ],
            allowed_address_pairs: vec![pair("10.0.0.100", None)],
            ..Default::default()
        };
        let attrs = create_attributes(
            "p1",
            &resource,
            "net-1",
            &["sub-1".to_string(), "sub-2".to_string()],
            &["sg-1".to_string()],
        );
        assert_eq!(
            attrs,
            json!({
                "name": "p1",
                "network_id": "net-1",
                "fixed_ips": [
                    { "subnet_id": "sub-1", "ip_address": "10.0.0.10" },
                    { "subnet_id": "sub-2" }
                ],
                "security_groups": ["sg-1"],
                "allowed_address_pairs": [{ "ip_address": "10.0.0.100" }]
            })
        );
    }

    #[test]
    fn test_address_pairs_match_ignores_defaulted_mac() {
        let observed = vec![neutron::AddressPair {
            ip_address: "10.0.0.100".to_string(),
            mac_address: Some("fa:16:3e:00:00:01".to_string()),
        }];
        assert!(address_pairs_match(&[pair("10.0.0.100", None)], &observed));
        assert!(address_pairs_match(
            &[pair("10.0.0.100", Some("fa:16:3e:00:00:01"))],
            &observed
        ));
        assert!(!address_pairs_match(
            &[pair("10.0.0.100", Some("fa:16:3e:00:00:02"))],
            &observed
        ));
        assert!(!address_pairs_match(&[], &observed));
    }

    #[test]
    fn test_security_groups_unmanaged_when_spec_names_none() {
        let resource = PortResourceSpec {
            network_ref: "n1".to_string(),
            ..Default::default()
        };
        let current = observed(json!({ "id": "x", "name": "p1", "security_groups": ["default"] }));
        assert_eq!(update_attributes("p1", &resource, &[], &current), None);
        assert_eq!(
            update_attributes("p1", &resource, &["sg-1".to_string()], &current),
            Some(json!({ "security_groups": ["sg-1"] }))
        );
    }

    #[test]
    fn test_port_status() {
        let status = port_status(&observed(json!({
            "id": "x",
            "name": "p1",
            "status": "DOWN",
            "fixed_ips": [{ "subnet_id": "sub-1", "ip_address": "10.0.0.10" }]
        })));
        assert_eq!(status.status, "DOWN");
        assert_eq!(status.fixed_ips[0].ip, "10.0.0.10");
    }

    #[test]
    fn test_dependency_refs() {
        let obj = port(json!({
            "cloud": "c",
            "resource": {
                "networkRef": "n1",
                "addresses": [{ "subnetRef": "s1" }],
                "securityGroupRefs": ["web"]
            }
        }));
        assert_eq!(
            obj.dependency_refs(),
            vec![
                ("network".to_string(), "n1".to_string()),
                ("subnet".to_string(), "s1".to_string()),
                ("securitygroup".to_string(), "web".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_readiness_and_referencing_kinds() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;
        let obj = port(json!({ "cloud": "c", "resource": { "networkRef": "n1" } }));
        let actuator = PortActuator::new(
            Arc::new(obj),
            clients.network().unwrap().clone(),
            resolved_deps(),
        );

        assert!(actuator.is_ready(&observed(json!({ "id": "x", "status": "DOWN" }))));
        assert!(actuator.is_ready(&observed(json!({ "id": "x", "status": "ACTIVE" }))));
        assert!(!actuator.is_ready(&observed(json!({ "id": "x", "status": "BUILD" }))));
        assert_eq!(actuator.referencing_kinds(), &["FloatingIP", "Router", "Server"]);
    }

    #[tokio::test]
    async fn test_get_by_spec_requires_matching_security_groups() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;
        let obj = port(json!({
            "cloud": "c",
            "resource": { "networkRef": "n1", "securityGroupRefs": ["web"] }
        }));
        let actuator = PortActuator::new(
            Arc::new(obj),
            clients.network().unwrap().clone(),
            resolved_deps(),
        );

        Mock::given(method("GET"))
            .and(path("/network/v2.0/ports"))
            .and(query_param("name", "p1"))
            .and(query_param("network_id", "net-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ports": [
                    { "id": "other", "name": "p1", "security_groups": ["default"] },
                    { "id": "mine", "name": "p1", "security_groups": ["sg-1"] }
                ]
            })))
            .mount(&server)
            .await;

        let found = actuator.get_by_spec(&HashSet::new()).await.unwrap();
        assert_eq!(found.unwrap().id, "mine");
    }
}
