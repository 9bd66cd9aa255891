// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use crate::openstack::config::{AuthMethod, CloudConfig, CloudsYaml};

    const CLOUDS: &str = r"
clouds:
  devstack:
    auth:
      auth_url: https://keystone.example.com/identity
      username: demo
      password: secret
      project_name: demo
      user_domain_name: Default
      project_domain_name: Default
    region_name: RegionOne
    interface: internal
  appcred:
    auth_type: v3applicationcredential
    auth:
      auth_url: https://keystone.example.com/v3
      application_credential_id: abc
      application_credential_secret: xyz
    verify: false
";

    #[test]
    fn test_password_cloud_parsed() {
        let cloud = CloudConfig::from_clouds_yaml(CLOUDS, "devstack").unwrap();

        assert_eq!(cloud.auth_method().unwrap(), AuthMethod::Password);
        assert_eq!(cloud.region_name.as_deref(), Some("RegionOne"));
        assert_eq!(cloud.interface(), "internal");
        assert_eq!(cloud.user_domain(), (None, Some("Default")));
        assert_eq!(cloud.project_domain(), (None, Some("Default")));
    }

    #[test]
    fn test_application_credential_cloud_parsed() {
        let cloud = CloudConfig::from_clouds_yaml(CLOUDS, "appcred").unwrap();

        assert_eq!(cloud.auth_method().unwrap(), AuthMethod::ApplicationCredential);
        assert_eq!(cloud.interface(), "public");
        assert_eq!(cloud.verify, Some(false));
    }

    #[test]
    fn test_interface_url_suffix_is_stripped() {
        let cloud = CloudConfig {
            interface: Some("publicURL".to_string()),
            ..CloudConfig::default()
        };
        assert_eq!(cloud.interface(), "public");
    }

    #[test]
    fn test_missing_cloud_entry() {
        let err = CloudConfig::from_clouds_yaml(CLOUDS, "nope").unwrap_err();
        assert!(err.to_string().contains("\"nope\" not found"));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(CloudsYaml::parse("clouds: [unterminated").is_err());
    }

    #[test]
    fn test_password_required() {
        let doc = r"
clouds:
  broken:
    auth:
      auth_url: https://keystone.example.com
      username: demo
";
        let err = CloudConfig::from_clouds_yaml(doc, "broken").unwrap_err();
        assert!(err.to_string().contains("auth.password"));
    }

    #[test]
    fn test_auth_url_required() {
        let doc = r"
clouds:
  broken:
    auth:
      username: demo
      password: pw
";
        let err = CloudConfig::from_clouds_yaml(doc, "broken").unwrap_err();
        assert!(err.to_string().contains("auth.auth_url"));
    }

    #[test]
    fn test_unsupported_auth_type() {
        let doc = r"
clouds:
  token:
    auth_type: token
    auth:
      auth_url: https://keystone.example.com
";
        let err = CloudConfig::from_clouds_yaml(doc, "token").unwrap_err();
        assert!(err.to_string().contains("unsupported auth_type"));
    }

    #[test]
    fn test_generic_domain_is_fallback() {
        let doc = r"
clouds:
  c:
    auth:
      auth_url: https://keystone.example.com
      username: demo
      password: pw
      domain_id: default
";
        let cloud = CloudConfig::from_clouds_yaml(doc, "c").unwrap();
        assert_eq!(cloud.user_domain(), (Some("default"), None));
        assert_eq!(cloud.project_domain(), (Some("default"), None));
    }
}
