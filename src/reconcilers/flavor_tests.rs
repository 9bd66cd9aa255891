// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `flavor.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{Flavor, FlavorFilter, FlavorResourceSpec};
    use crate::openstack::compute as nova;
    use crate::openstack::testing::connect;
    use crate::reconcilers::actuator::{Actuator, Lookup};
    use crate::reconcilers::flavor::{
        create_attributes, flavor_status, matches_filter, matches_spec, FlavorActuator,
    };
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn small() -> FlavorResourceSpec {
        FlavorResourceSpec {
            ram: 2048,
            vcpus: 2,
            disk: 20,
            ..Default::default()
        }
    }

    fn observed(value: Value) -> nova::Flavor {
        serde_json::from_value(value).unwrap()
    }

    async fn actuator(server: &MockServer, spec: Value) -> FlavorActuator {
        let clients = connect(server).await;
        let obj: Flavor = serde_json::from_value(json!({
            "apiVersion": "openstack.k-orc.cloud/v1alpha1",
            "kind": "Flavor",
            "metadata": { "name": "small", "namespace": "default" },
            "spec": spec,
        }))
        .unwrap();
        FlavorActuator::new(Arc::new(obj), clients.compute().unwrap().clone())
    }

    async fn mount_flavors(server: &MockServer, flavors: Value) {
        Mock::given(method("GET"))
            .and(path("/compute/v2.1/flavors/detail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "flavors": flavors })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_create_attributes_use_nova_extension_keys() {
        let resource = FlavorResourceSpec {
            ephemeral: Some(10),
            is_public: Some(false),
            ..small()
        };
        assert_eq!(
            create_attributes("small", &resource),
            json!({
                "name": "small",
                "ram": 2048,
                "vcpus": 2,
                "disk": 20,
                "OS-FLV-EXT-DATA:ephemeral": 10,
                "os-flavor-access:is_public": false
            })
        );
    }

    #[test]
    fn test_matches_spec_and_filter() {
        let flavor = observed(json!({ "id": "f1", "name": "small", "ram": 2048, "vcpus": 2, "disk": 20 }));
        assert!(matches_spec("small", &small(), &flavor));
        assert!(!matches_spec("medium", &small(), &flavor));

        let filter = FlavorFilter {
            vcpus: Some(2),
            ..Default::default()
        };
        assert!(matches_filter(&filter, &flavor));
        let filter = FlavorFilter {
            ram: Some(4096),
            ..Default::default()
        };
        assert!(!matches_filter(&filter, &flavor));
    }

    #[test]
    fn test_status_tolerates_empty_swap() {
        let status = flavor_status(&observed(json!({
            "id": "f1",
            "name": "small",
            "ram": 2048,
            "swap": "",
            "OS-FLV-EXT-DATA:ephemeral": 5
        })));
        assert_eq!(status.swap, 0);
        assert_eq!(status.ephemeral, 5);
        assert!(status.is_public);
    }

    #[tokio::test]
    async fn test_adoption_ignores_same_name_different_size() {
        let server = MockServer::start().await;
        let actuator = actuator(
            &server,
            json!({ "cloud": "c", "resource": { "ram": 2048, "vcpus": 2, "disk": 20 } }),
        )
        .await;
        mount_flavors(
            &server,
            json!([
                { "id": "f-big", "name": "small", "ram": 8192, "vcpus": 2, "disk": 20 },
                { "id": "f-ok", "name": "small", "ram": 2048, "vcpus": 2, "disk": 20 }
            ]),
        )
        .await;

        let found = actuator.get_by_spec(&HashSet::new()).await.unwrap().unwrap();
        assert_eq!(found.id, "f-ok");
        let claimed: HashSet<String> = ["f-ok".to_string()].into_iter().collect();
        assert!(actuator.get_by_spec(&claimed).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_import_filter_in_code() {
        let server = MockServer::start().await;
        let actuator = actuator(
            &server,
            json!({ "cloud": "c", "managementPolicy": "unmanaged", "import": { "filter": { "name": "m1.tiny" } } }),
        )
        .await;
        mount_flavors(
            &server,
            json!([
                { "id": "1", "name": "m1.tiny" },
                { "id": "2", "name": "m1.small" }
            ]),
        )
        .await;

        let Lookup::Found(flavor) = actuator.get_by_import_filter().await.unwrap() else {
            panic!("expected the filter to match");
        };
        assert_eq!(flavor.id, "1");
    }

    #[tokio::test]
    async fn test_create() {
        let server = MockServer::start().await;
        let actuator = actuator(
            &server,
            json!({ "cloud": "c", "resource": { "ram": 2048, "vcpus": 2, "disk": 20 } }),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/compute/v2.1/flavors"))
            .and(body_json(json!({
                "flavor": { "name": "small", "ram": 2048, "vcpus": 2, "disk": 20 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "flavor": { "id": "f-new", "name": "small", "ram": 2048, "vcpus": 2, "disk": 20 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = actuator.create().await.unwrap();
        assert_eq!(created.resource.unwrap().id, "f-new");
        assert_eq!(actuator.referencing_kinds(), &["Server"]);
    }
}
