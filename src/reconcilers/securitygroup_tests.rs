// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `securitygroup.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{SecurityGroup, SecurityGroupResourceSpec};
    use crate::errors::TerminalReason;
    use crate::openstack::network as neutron;
    use crate::openstack::testing::{connect, TEST_PROJECT_ID};
    use crate::reconcilers::actuator::Actuator;
    use crate::reconcilers::securitygroup::{
        create_attributes, security_group_status, stateful_matches, update_attributes,
        SecurityGroupActuator,
    };
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn observed(value: Value) -> neutron::SecurityGroup {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_create_attributes() {
        let resource = SecurityGroupResourceSpec {
            stateful: Some(false),
            ..Default::default()
        };
        assert_eq!(
            create_attributes("web", &resource),
            json!({ "name": "web", "stateful": false })
        );
    }

    #[test]
    fn test_stateful_change_is_not_an_update() {
        let resource = SecurityGroupResourceSpec {
            stateful: Some(false),
            ..Default::default()
        };
        let current = observed(json!({ "id": "sg-1", "name": "web", "stateful": true }));
        assert_eq!(update_attributes("web", &resource, &current), None);
    }

    #[test]
    fn test_status_lists_rule_ids() {
        let status = security_group_status(&observed(json!({
            "id": "sg-1",
            "name": "web",
            "security_group_rules": [{ "id": "r1" }, { "id": "r2" }]
        })));
        assert_eq!(status.rule_ids, vec!["r1", "r2"]);
        assert!(status.stateful);
    }

    #[test]
    fn test_stateful_matches_defaults_to_stateful() {
        let unset = SecurityGroupResourceSpec::default();
        let stateless = SecurityGroupResourceSpec {
            stateful: Some(false),
            ..Default::default()
        };
        let stateful_group = observed(json!({ "id": "sg-1", "stateful": true }));
        let stateless_group = observed(json!({ "id": "sg-2", "stateful": false }));
        let no_extension = observed(json!({ "id": "sg-3" }));

        assert!(stateful_matches(&unset, &stateful_group));
        assert!(stateful_matches(&unset, &no_extension));
        assert!(!stateful_matches(&unset, &stateless_group));
        assert!(stateful_matches(&stateless, &stateless_group));
        assert!(!stateful_matches(&stateless, &stateful_group));
    }

    async fn actuator(server: &MockServer, resource: Value) -> SecurityGroupActuator {
        let clients = connect(server).await;
        let obj: SecurityGroup = serde_json::from_value(json!({
            "apiVersion": "openstack.k-orc.cloud/v1alpha1",
            "kind": "SecurityGroup",
            "metadata": { "name": "web", "namespace": "default" },
            "spec": { "cloud": "c", "resource": resource }
        }))
        .unwrap();
        SecurityGroupActuator::new(Arc::new(obj), clients.network().unwrap().clone())
    }

    #[tokio::test]
    async fn test_adoption_skips_stateless_group_for_stateful_spec() {
        let server = MockServer::start().await;
        let actuator = actuator(&server, json!({})).await;

        Mock::given(method("GET"))
            .and(path("/network/v2.0/security-groups"))
            .and(query_param("name", "web"))
            .and(query_param("project_id", TEST_PROJECT_ID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "security_groups": [{ "id": "sg-1", "name": "web", "stateful": false }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert!(actuator.get_by_spec(&HashSet::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ambiguous_adoption_is_terminal() {
        let server = MockServer::start().await;
        let actuator = actuator(&server, json!({})).await;

        Mock::given(method("GET"))
            .and(path("/network/v2.0/security-groups"))
            .and(query_param("name", "web"))
            .and(query_param("project_id", TEST_PROJECT_ID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "security_groups": [{ "id": "a", "name": "web" }, { "id": "b", "name": "web" }]
            })))
            .mount(&server)
            .await;

        let err = actuator.get_by_spec(&HashSet::new()).await.unwrap_err();
        assert_eq!(
            err.terminal_reason(),
            Some(TerminalReason::InvalidConfiguration)
        );
        assert_eq!(err.to_string(), "found more than one matching security group");

        let claimed: HashSet<String> = ["a".to_string()].into_iter().collect();
        let found = actuator.get_by_spec(&claimed).await.unwrap().unwrap();
        assert_eq!(found.id, "b");
    }
}
