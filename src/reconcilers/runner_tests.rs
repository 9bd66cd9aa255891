// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `runner.rs`

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::crd::{Network, Subnet};
    use crate::errors::OrcError;
    use crate::events::EventPublisher;
    use crate::labels::{field_owner, finalizer, TXN_FINALIZER, TXN_STATUS};
    use crate::reconcilers::actuator::ResourceStore;
    use crate::reconcilers::kind::OrcResource;
    use crate::reconcilers::runner::{
        conclude, desired_labels, now, reconcile_delete, reconcile_object, write_status,
        KubeResourceStore, Reconciled,
    };
    use crate::reconcilers::wait::{OpenStackPhase, SiblingPhase, WaitEvent};
    use async_trait::async_trait;
    use k8s_openapi::api::core::v1::ObjectReference;
    use kube::runtime::controller::Action;
    use kube::runtime::events::EventType;
    use kube::{Api, Client};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const NETWORK_PATH: &str = "/apis/openstack.k-orc.cloud/v1alpha1/namespaces/default/networks/n1";

    #[test]
    fn test_no_waits_is_done() {
        let reconciled = Reconciled::waiting(&[]);
        assert!(!reconciled.waiting);
        assert_eq!(reconciled.action, Action::await_change());
    }

    #[test]
    fn test_watch_driven_waits_await_change() {
        let waits = [WaitEvent::sibling("Network", "n1", SiblingPhase::Ready)];
        let reconciled = Reconciled::waiting(&waits);
        assert!(reconciled.waiting);
        assert_eq!(reconciled.action, Action::await_change());
    }

    #[test]
    fn test_polling_waits_requeue_after_longest_interval() {
        let waits = [
            WaitEvent::sibling("Network", "n1", SiblingPhase::Ready),
            WaitEvent::openstack(OpenStackPhase::Ready, Duration::from_secs(15)),
            WaitEvent::openstack(OpenStackPhase::Deleted, Duration::from_secs(1)),
        ];
        let reconciled = Reconciled::waiting(&waits);
        assert!(reconciled.waiting);
        assert_eq!(
            reconciled.action,
            Action::requeue(Duration::from_secs(15))
        );
    }

    #[test]
    fn test_conclude_terminal_error_does_not_requeue() {
        let result = conclude(
            "Network",
            "n1",
            Vec::new(),
            Some(OrcError::invalid_configuration("bad")),
        );
        let reconciled = result.unwrap();
        assert!(!reconciled.waiting);
        assert_eq!(reconciled.action, Action::await_change());
    }

    #[test]
    fn test_conclude_transient_error_is_returned() {
        let result = conclude(
            "Network",
            "n1",
            Vec::new(),
            Some(OrcError::from(anyhow::anyhow!("connection reset"))),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_conclude_waits() {
        let waits = vec![WaitEvent::openstack(
            OpenStackPhase::Create,
            Duration::from_secs(15),
        )];
        let reconciled = conclude("Network", "n1", waits, None).unwrap();
        assert!(reconciled.waiting);
    }

    #[test]
    fn test_desired_labels_cover_cloud_and_siblings() {
        let subnet: Subnet = serde_json::from_value(json!({
            "apiVersion": "openstack.k-orc.cloud/v1alpha1",
            "kind": "Subnet",
            "metadata": { "name": "s1", "namespace": "default" },
            "spec": {
                "cloud": "devstack",
                "resource": { "networkRef": "n1", "cidr": "10.0.0.0/24", "ipVersion": 4 }
            }
        }))
        .unwrap();

        let labels = desired_labels(&subnet);
        assert_eq!(labels.len(), 2);
        assert!(labels.contains_key("openstack.k-orc.cloud/cloud-devstack"));
        assert!(labels.contains_key("openstack.k-orc.cloud/network-n1"));
    }

    #[test]
    fn test_now_is_rfc3339_utc() {
        let ts = now();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    // ========================================================================
    // Writes against the Kubernetes API
    // ========================================================================

    #[derive(Default)]
    struct RecordingPublisher {
        reasons: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(
            &self,
            _resource_ref: &ObjectReference,
            _type_: EventType,
            reason: &str,
            _action: &str,
            _note: Option<String>,
        ) {
            self.reasons.lock().unwrap().push(reason.to_string());
        }
    }

    fn kube_client(server: &MockServer) -> Client {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let config = kube::Config::new(server.uri().parse().unwrap());
        Client::try_from(config).unwrap()
    }

    fn context(server: &MockServer) -> (Context, Arc<RecordingPublisher>) {
        let events = Arc::new(RecordingPublisher::default());
        (Context::new(kube_client(server), events.clone()), events)
    }

    fn network_json(metadata: Value, status: Value) -> Value {
        let mut metadata = metadata;
        metadata["name"] = json!("n1");
        metadata["namespace"] = json!("default");
        json!({
            "apiVersion": "openstack.k-orc.cloud/v1alpha1",
            "kind": "Network",
            "metadata": metadata,
            "spec": {
                "cloud": "devstack",
                "managedOptions": { "onDelete": "detach" },
                "resource": {}
            },
            "status": status
        })
    }

    fn network(metadata: Value, status: Value) -> Network {
        serde_json::from_value(network_json(metadata, status)).unwrap()
    }

    fn available_status() -> Value {
        json!({
            "id": "net-1",
            "conditions": [
                { "type": "Available", "status": "True", "reason": "Success", "observedGeneration": 1 },
                { "type": "Progressing", "status": "False", "reason": "Success", "observedGeneration": 1 }
            ]
        })
    }

    fn deleting_metadata() -> Value {
        json!({
            "generation": 1,
            "deletionTimestamp": "2025-01-01T00:00:00Z",
            "finalizers": ["openstack.k-orc.cloud/network"],
            "labels": { "openstack.k-orc.cloud/cloud-devstack": "" }
        })
    }

    fn not_found() -> ResponseTemplate {
        ResponseTemplate::new(404).set_body_json(json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": "networks.openstack.k-orc.cloud \"n1\" not found",
            "reason": "NotFound",
            "code": 404
        }))
    }

    async fn request_bodies(server: &MockServer) -> Vec<(String, Value)> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| (r.url.path().to_string(), serde_json::from_slice(&r.body).unwrap_or(Value::Null)))
            .collect()
    }

    #[tokio::test]
    async fn test_detach_releases_finalizer_without_status_write() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(NETWORK_PATH))
            .and(query_param(
                "fieldManager",
                field_owner("network", TXN_FINALIZER).as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(network_json(
                json!({ "deletionTimestamp": "2025-01-01T00:00:00Z" }),
                available_status(),
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(format!("{NETWORK_PATH}/status")))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (ctx, _) = context(&server);
        let obj = Arc::new(network(deleting_metadata(), available_status()));
        let api: Api<Network> = Api::namespaced(ctx.client.clone(), "default");
        let labels = desired_labels(obj.as_ref());

        let reconciled =
            reconcile_delete(obj, &ctx, &api, "default", &finalizer("network"), &labels)
                .await
                .unwrap();

        assert!(!reconciled.waiting);
        let requests = request_bodies(&server).await;
        assert_eq!(requests.len(), 1);
        let (_, body) = &requests[0];
        assert_eq!(body["metadata"]["finalizers"], json!([]));
        assert!(body.get("spec").is_none());
    }

    #[tokio::test]
    async fn test_finalizer_release_tolerates_vanished_object() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(NETWORK_PATH))
            .respond_with(not_found())
            .expect(1)
            .mount(&server)
            .await;

        let (ctx, _) = context(&server);
        let obj = Arc::new(network(deleting_metadata(), available_status()));
        let api: Api<Network> = Api::namespaced(ctx.client.clone(), "default");
        let labels = desired_labels(obj.as_ref());

        let reconciled =
            reconcile_delete(obj, &ctx, &api, "default", &finalizer("network"), &labels)
                .await
                .unwrap();

        assert!(!reconciled.waiting);
        assert_eq!(reconciled.action, Action::await_change());
    }

    #[tokio::test]
    async fn test_finalizer_and_labels_applied_in_one_patch_then_return() {
        let server = MockServer::start().await;
        let applied_metadata = json!({
            "generation": 1,
            "finalizers": ["openstack.k-orc.cloud/network"],
            "labels": { "openstack.k-orc.cloud/cloud-devstack": "" }
        });
        Mock::given(method("PATCH"))
            .and(path(NETWORK_PATH))
            .and(query_param(
                "fieldManager",
                field_owner("network", TXN_FINALIZER).as_str(),
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(network_json(applied_metadata, json!({}))),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(format!("{NETWORK_PATH}/status")))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (ctx, _) = context(&server);
        let obj = Arc::new(network(json!({ "generation": 1 }), json!({})));

        let reconciled = reconcile_object(obj, &ctx, "default").await.unwrap();

        assert!(!reconciled.waiting);
        let requests = request_bodies(&server).await;
        assert_eq!(requests.len(), 1);
        let (_, body) = &requests[0];
        assert_eq!(
            body["metadata"]["finalizers"],
            json!(["openstack.k-orc.cloud/network"])
        );
        assert_eq!(
            body["metadata"]["labels"],
            json!({ "openstack.k-orc.cloud/cloud-devstack": "" })
        );
    }

    #[tokio::test]
    async fn test_write_status_skips_unchanged_status() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (ctx, events) = context(&server);
        let obj = network(json!({ "generation": 1 }), available_status());
        let api: Api<Network> = Api::namespaced(ctx.client.clone(), "default");

        write_status(&ctx, &api, &obj, None, obj.conditions().to_vec())
            .await
            .unwrap();

        assert!(request_bodies(&server).await.is_empty());
        assert!(events.reasons.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_status_applies_changed_conditions() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(format!("{NETWORK_PATH}/status")))
            .and(query_param(
                "fieldManager",
                field_owner("network", TXN_STATUS).as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(network_json(
                json!({ "generation": 1 }),
                available_status(),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let (ctx, events) = context(&server);
        let obj = network(
            json!({ "generation": 1 }),
            json!({
                "conditions": [
                    { "type": "Available", "status": "False", "reason": "Progressing", "observedGeneration": 1 },
                    { "type": "Progressing", "status": "True", "reason": "Progressing", "observedGeneration": 1 }
                ]
            }),
        );
        let target = network(json!({}), available_status());
        let api: Api<Network> = Api::namespaced(ctx.client.clone(), "default");

        write_status(&ctx, &api, &obj, None, target.conditions().to_vec())
            .await
            .unwrap();

        let requests = request_bodies(&server).await;
        assert_eq!(requests.len(), 1);
        let (_, body) = &requests[0];
        assert_eq!(body["status"]["conditions"][0]["type"], "Available");
        assert_eq!(body["status"]["conditions"][0]["status"], "True");
        assert!(body.get("spec").is_none());
        assert!(!events.reasons.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_referencing_selects_by_dependency_label() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apis/openstack.k-orc.cloud/v1alpha1/namespaces/default/subnets"))
            .and(query_param("labelSelector", "openstack.k-orc.cloud/network-n1"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "apiVersion": "openstack.k-orc.cloud/v1alpha1",
                "kind": "SubnetList",
                "metadata": { "resourceVersion": "7" },
                "items": [{
                    "apiVersion": "openstack.k-orc.cloud/v1alpha1",
                    "kind": "Subnet",
                    "metadata": { "name": "s1", "namespace": "default" }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = kube_client(&server);
        let obj = network(json!({}), json!({}));
        let store = KubeResourceStore::<Network>::new(client, &obj, "default");

        let referencing = store.find_referencing(&["Subnet"]).await.unwrap();

        assert_eq!(referencing, vec![("Subnet".to_string(), "s1".to_string())]);
    }
}
