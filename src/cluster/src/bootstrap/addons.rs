/// Cluster addon definitions for single-node provisioning
///
/// Defines the addons applied after the control plane is up (CNI, ingress
/// controller, certificate manager) with their manifest locations and the
/// readiness condition each one is awaited on.
use crate::config::ClusterConfig;
use std::time::Duration;

/// How an addon's readiness is observed after its manifest is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddonProbe {
    /// Pod networking: the node flips to Ready once the CNI is functional.
    NodeReady,
    /// Wait for a deployment's Available condition.
    DeploymentAvailable {
        namespace: &'static str,
        deployment: &'static str,
    },
}

/// Cluster addon configuration
pub struct Addon {
    /// Short name, used for stage naming (e.g. "cni")
    pub name: &'static str,
    /// Manifest URL applied via the cluster API
    pub manifest_url: String,
    /// Readiness observation after apply
    pub probe: AddonProbe,
    /// Polling window for the probe
    pub probe_timeout: Duration,
    /// Polling interval for the probe
    pub probe_interval: Duration,
    pub description: &'static str,
}

/// Get addon configuration for a cluster
///
/// Returns addons in the correct application order:
/// 1. flannel (CNI; nothing schedules until pod networking exists)
/// 2. ingress-nginx (ingress controller)
/// 3. cert-manager (certificate automation)
pub fn get_addons(config: &ClusterConfig) -> Vec<Addon> {
    vec![
        Addon {
            name: "cni",
            manifest_url:
                "https://github.com/flannel-io/flannel/releases/latest/download/kube-flannel.yml"
                    .to_string(),
            probe: AddonProbe::NodeReady,
            probe_timeout: Duration::from_secs(120),
            probe_interval: Duration::from_secs(5),
            description: "flannel pod network",
        },
        Addon {
            name: "ingress",
            manifest_url: format!(
                "https://raw.githubusercontent.com/kubernetes/ingress-nginx/controller-{}/deploy/static/provider/cloud/deploy.yaml",
                config.ingress_nginx_version
            ),
            probe: AddonProbe::DeploymentAvailable {
                namespace: "ingress-nginx",
                deployment: "ingress-nginx-controller",
            },
            probe_timeout: Duration::from_secs(180),
            probe_interval: Duration::from_secs(5),
            description: "ingress-nginx controller",
        },
        Addon {
            name: "cert-manager",
            manifest_url: format!(
                "https://github.com/cert-manager/cert-manager/releases/download/{}/cert-manager.yaml",
                config.cert_manager_version
            ),
            probe: AddonProbe::DeploymentAvailable {
                namespace: "cert-manager",
                deployment: "cert-manager-webhook",
            },
            probe_timeout: Duration::from_secs(180),
            probe_interval: Duration::from_secs(5),
            description: "cert-manager",
        },
    ]
}
