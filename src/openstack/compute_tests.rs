// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `compute.rs`

#[cfg(test)]
mod tests {
    use crate::openstack::compute::{Flavor, Server};
    use crate::openstack::testing::connect;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_flavor_swap_accepts_number_and_empty_string() {
        let with_number: Flavor =
            serde_json::from_value(json!({ "id": "f1", "swap": 512 })).unwrap();
        let with_empty: Flavor =
            serde_json::from_value(json!({ "id": "f2", "swap": "" })).unwrap();

        assert_eq!(with_number.swap, 512);
        assert_eq!(with_empty.swap, 0);
        assert!(with_empty.is_public);
    }

    #[test]
    fn test_server_decodes_extension_fields() {
        let server: Server = serde_json::from_value(json!({
            "id": "s1",
            "name": "vm",
            "status": "ACTIVE",
            "hostId": "h",
            "image": { "id": "img" },
            "flavor": { "original_name": "m1.small" },
            "OS-EXT-STS:task_state": "deleting",
            "accessIPv4": "",
            "tags": ["a"]
        }))
        .unwrap();

        assert_eq!(server.image_id(), Some("img"));
        assert_eq!(server.flavor.original_name, "m1.small");
        assert_eq!(server.task_state.as_deref(), Some("deleting"));

        let volume_backed: Server =
            serde_json::from_value(json!({ "id": "s2", "image": "" })).unwrap();
        assert_eq!(volume_backed.image_id(), None);
    }

    #[tokio::test]
    async fn test_list_servers_named_anchors_and_filters() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("GET"))
            .and(path("/compute/v2.1/servers/detail"))
            .and(query_param("name", "^web\\.1$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "servers": [
                    { "id": "s1", "name": "web.1" },
                    { "id": "s2", "name": "web.10" }
                ]
            })))
            .mount(&server)
            .await;

        let servers = clients
            .compute()
            .unwrap()
            .list_servers_named("web.1", &[])
            .await
            .unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].id, "s1");
    }

    #[tokio::test]
    async fn test_list_keypairs_unwraps_entries() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("GET"))
            .and(path("/compute/v2.1/os-keypairs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keypairs": [
                    { "keypair": { "name": "k1", "public_key": "ssh-ed25519 AAA", "fingerprint": "fp", "type": "ssh" } }
                ]
            })))
            .mount(&server)
            .await;

        let keypairs = clients.compute().unwrap().list_keypairs().await.unwrap();
        assert_eq!(keypairs[0].name, "k1");
        assert_eq!(keypairs[0].key_type, "ssh");
    }

    #[tokio::test]
    async fn test_create_server_returns_id() {
        let server = MockServer::start().await;
        let clients = connect(&server).await;

        Mock::given(method("POST"))
            .and(path("/compute/v2.1/servers"))
            .and(body_partial_json(json!({ "server": { "name": "vm" } })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "server": { "id": "s1", "adminPass": "x" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = clients
            .compute()
            .unwrap()
            .create_server(json!({ "name": "vm", "flavorRef": "f1" }))
            .await
            .unwrap();
        assert_eq!(id, "s1");
    }
}
