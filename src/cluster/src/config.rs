//! Cluster bootstrap configuration
//! Loaded from kubeup.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_kubernetes_version() -> String {
    "1.30".to_string()
}

fn default_pod_network_cidr() -> String {
    "10.244.0.0/16".to_string()
}

fn default_service_cidr() -> String {
    "10.96.0.0/12".to_string()
}

fn default_cert_manager_version() -> String {
    "v1.15.3".to_string()
}

fn default_ingress_nginx_version() -> String {
    "v1.11.2".to_string()
}

fn default_admin_kubeconfig() -> PathBuf {
    PathBuf::from("/etc/kubernetes/admin.conf")
}

/// Cluster bootstrap configuration
/// Loaded from kubeup.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Kubernetes minor version; pins the package repository channel.
    #[serde(default = "default_kubernetes_version")]
    pub kubernetes_version: String,

    /// Pod network CIDR handed to the control-plane init and expected by the CNI.
    #[serde(default = "default_pod_network_cidr")]
    pub pod_network_cidr: String,

    /// Service CIDR for cluster-internal virtual IPs.
    #[serde(default = "default_service_cidr")]
    pub service_cidr: String,

    /// cert-manager release tag.
    #[serde(default = "default_cert_manager_version")]
    pub cert_manager_version: String,

    /// ingress-nginx controller version.
    #[serde(default = "default_ingress_nginx_version")]
    pub ingress_nginx_version: String,

    /// Admin credential file written by the control-plane init.
    #[serde(default = "default_admin_kubeconfig")]
    pub admin_kubeconfig: PathBuf,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            kubernetes_version: default_kubernetes_version(),
            pod_network_cidr: default_pod_network_cidr(),
            service_cidr: default_service_cidr(),
            cert_manager_version: default_cert_manager_version(),
            ingress_nginx_version: default_ingress_nginx_version(),
            admin_kubeconfig: default_admin_kubeconfig(),
        }
    }
}

impl ClusterConfig {
    /// Load configuration. An explicit path must exist; otherwise well-known
    /// locations are probed and missing files fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, String> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(format!("Config file {:?} not found", path));
            }
            return Self::from_file(path);
        }

        let config_paths = [
            PathBuf::from("kubeup.toml"),
            PathBuf::from("/etc/kubeup/kubeup.toml"),
        ];
        for path in &config_paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        tracing::warn!("No kubeup.toml found, using defaults");
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {:?}: {}", path, e))?;

        let config: ClusterConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {:?}: {}", path, e))?;

        tracing::info!("Loaded cluster config from {:?}", path);
        Ok(config)
    }
}
