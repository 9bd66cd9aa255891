// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, DeleteParams, ObjectMeta, PostParams};
use kube::client::Client;
use orc::crd::{
    Cloud, CloudCredentials, CloudCredentialsSecretRef, CloudSpec, Network, NetworkResourceSpec,
    NetworkSpec,
};
use serde_json::json;

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

/// Create a test namespace
pub async fn create_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let ns: Namespace = serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "labels": {
                "test": "integration",
                "managed-by": "orc-test"
            }
        }
    }))?;

    match namespaces.create(&PostParams::default(), &ns).await {
        Ok(_) => {
            println!("Created test namespace: {name}");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            println!("Test namespace already exists: {name}");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Cleanup test namespace
pub async fn cleanup_test_namespace(client: &Client, name: &str) {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.delete(name, &DeleteParams::default()).await {
        Ok(_) => println!("Deleted test namespace: {name}"),
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            println!("Test namespace already deleted: {name}");
        }
        Err(e) => eprintln!("Failed to delete test namespace {name}: {e}"),
    }
}

/// A `Cloud` pointing at a clouds.yaml secret that need not exist.
pub fn cloud(namespace: &str, name: &str) -> Cloud {
    Cloud {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: CloudSpec {
            cloud: "devstack".to_string(),
            credentials: CloudCredentials {
                source: "secret".to_string(),
                secret_ref: CloudCredentialsSecretRef {
                    name: format!("{name}-clouds"),
                    key: "clouds.yaml".to_string(),
                },
            },
        },
        status: None,
    }
}

/// A managed `Network` using the given cloud.
pub fn network(namespace: &str, name: &str, cloud: &str) -> Network {
    Network {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: NetworkSpec {
            cloud: cloud.to_string(),
            management_policy: Default::default(),
            managed_options: None,
            resource: Some(NetworkResourceSpec {
                description: Some("integration test network".to_string()),
                ..Default::default()
            }),
            import: None,
        },
        status: None,
    }
}
