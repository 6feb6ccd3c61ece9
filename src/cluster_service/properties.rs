//! Provisioning properties
//!
//! Every cluster create request carries a property bag that switches on the
//! downstream provisioning steps of the Cluster Service. Development setups
//! can additionally pin clusters to a provision shard or short-circuit the
//! provision/deprovision flows.

use crate::domain::ports::{Cluster, PropertyBag};

pub const PROVISIONER_HOSTEDCLUSTER_STEP_ENABLED: &str = "provisioner_hostedcluster_step_enabled";
pub const PROVISIONER_MANAGEDCLUSTER_STEP_ENABLED: &str = "provisioner_managedcluster_step_enabled";
pub const NP_PROVISIONER_PROVISION_ENABLED: &str = "np_provisioner_provision_enabled";
pub const NP_PROVISIONER_DEPROVISION_ENABLED: &str = "np_provisioner_deprovision_enabled";

pub const PROVISION_SHARD_ID: &str = "provision_shard_id";
pub const PROVISIONER_NOOP_PROVISION: &str = "provisioner_noop_provision";
pub const PROVISIONER_NOOP_DEPROVISION: &str = "provisioner_noop_deprovision";

/// Baseline properties sent with every cluster create request
pub fn default_properties() -> PropertyBag {
    [
        PROVISIONER_HOSTEDCLUSTER_STEP_ENABLED,
        PROVISIONER_MANAGEDCLUSTER_STEP_ENABLED,
        NP_PROVISIONER_PROVISION_ENABLED,
        NP_PROVISIONER_DEPROVISION_ENABLED,
    ]
    .into_iter()
    .map(|key| (key.to_string(), "true".to_string()))
    .collect()
}

/// Per-client provisioning overrides, fixed at construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningOverrides {
    /// Pin all clusters to this provision shard
    pub provision_shard_id: Option<String>,
    /// Short-circuit the provision flow
    pub noop_provision: bool,
    /// Short-circuit the deprovision flow
    pub noop_deprovision: bool,
}

impl ProvisioningOverrides {
    /// Fresh property bag: the baseline plus these overrides
    pub fn properties(&self) -> PropertyBag {
        let mut properties = default_properties();
        if let Some(shard) = &self.provision_shard_id {
            properties.insert(PROVISION_SHARD_ID.to_string(), shard.clone());
        }
        if self.noop_provision {
            properties.insert(PROVISIONER_NOOP_PROVISION.to_string(), "true".to_string());
        }
        if self.noop_deprovision {
            properties.insert(PROVISIONER_NOOP_DEPROVISION.to_string(), "true".to_string());
        }
        properties
    }

    /// Copy of `cluster` with these properties merged over its own
    pub fn apply(&self, mut cluster: Cluster) -> Cluster {
        cluster.properties.extend(self.properties());
        cluster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASELINE: [&str; 4] = [
        PROVISIONER_HOSTEDCLUSTER_STEP_ENABLED,
        PROVISIONER_MANAGEDCLUSTER_STEP_ENABLED,
        NP_PROVISIONER_PROVISION_ENABLED,
        NP_PROVISIONER_DEPROVISION_ENABLED,
    ];

    #[test]
    fn test_default_properties() {
        let properties = default_properties();
        assert_eq!(properties.len(), 4);
        for key in BASELINE {
            assert_eq!(properties.get(key).map(String::as_str), Some("true"));
        }
    }

    #[test]
    fn test_baseline_always_present() {
        let configs = [
            ProvisioningOverrides::default(),
            ProvisioningOverrides {
                provision_shard_id: Some("shard-1".into()),
                ..Default::default()
            },
            ProvisioningOverrides {
                provision_shard_id: None,
                noop_provision: true,
                noop_deprovision: true,
            },
        ];
        for config in configs {
            let properties = config.properties();
            for key in BASELINE {
                assert_eq!(properties[key], "true", "{:?}", config);
            }
        }
    }

    #[test]
    fn test_shard_pin_only_adds_its_key() {
        let pinned = ProvisioningOverrides {
            provision_shard_id: Some("b3f1c2".into()),
            ..Default::default()
        }
        .properties();

        let mut expected = default_properties();
        expected.insert(PROVISION_SHARD_ID.into(), "b3f1c2".into());
        assert_eq!(pinned, expected);
    }

    #[test]
    fn test_noop_flags() {
        let properties = ProvisioningOverrides {
            noop_provision: true,
            ..Default::default()
        }
        .properties();
        assert_eq!(properties[PROVISIONER_NOOP_PROVISION], "true");
        assert!(!properties.contains_key(PROVISIONER_NOOP_DEPROVISION));
        assert!(!properties.contains_key(PROVISION_SHARD_ID));
    }

    #[test]
    fn test_fresh_bag_per_call() {
        let overrides = ProvisioningOverrides::default();
        let mut first = overrides.properties();
        first.insert("scratch".into(), "x".into());
        assert!(!overrides.properties().contains_key("scratch"));
    }

    #[test]
    fn test_apply_overrides_payload_keys() {
        let mut cluster = Cluster::new("dev");
        cluster.properties.insert("owner".into(), "team-a".into());
        cluster
            .properties
            .insert(PROVISIONER_HOSTEDCLUSTER_STEP_ENABLED.into(), "false".into());

        let applied = ProvisioningOverrides::default().apply(cluster.clone());
        assert_eq!(applied.properties["owner"], "team-a");
        assert_eq!(applied.properties[PROVISIONER_HOSTEDCLUSTER_STEP_ENABLED], "true");
        // the caller's payload is untouched
        assert_eq!(cluster.properties[PROVISIONER_HOSTEDCLUSTER_STEP_ENABLED], "false");
    }
}
