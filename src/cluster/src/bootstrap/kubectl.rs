//! kubectl command builders: manifest application, taint removal, and
//! readiness condition probes.
//!
//! The admin credential path is threaded explicitly; nothing here relies on
//! an ambient KUBECONFIG.

use crate::bootstrap::stage::{ProbeExpect, ReadinessProbe};
use std::path::Path;
use std::time::Duration;

fn kubectl(kubeconfig: &Path) -> Vec<String> {
    vec![
        "kubectl".to_string(),
        "--kubeconfig".to_string(),
        kubeconfig.display().to_string(),
    ]
}

/// `kubectl apply -f <url>`. The API server's apply semantics make re-running
/// this safe without a guard on our side.
pub fn apply_manifest(kubeconfig: &Path, url: &str) -> Vec<String> {
    let mut argv = kubectl(kubeconfig);
    argv.extend(["apply".to_string(), "-f".to_string(), url.to_string()]);
    argv
}

/// Remove the control-plane scheduling taints so workloads schedule on the
/// single node. Covers the current key and the legacy `master` key.
pub fn remove_control_plane_taints(kubeconfig: &Path) -> Vec<String> {
    let mut argv = kubectl(kubeconfig);
    argv.extend([
        "taint".to_string(),
        "nodes".to_string(),
        "--all".to_string(),
        "node-role.kubernetes.io/control-plane-".to_string(),
        "node-role.kubernetes.io/master-".to_string(),
    ]);
    argv
}

/// Probe the single node's Ready condition via jsonpath.
pub fn node_ready_probe(kubeconfig: &Path, timeout: Duration, interval: Duration) -> ReadinessProbe {
    let mut argv = kubectl(kubeconfig);
    argv.extend([
        "get".to_string(),
        "nodes".to_string(),
        "-o".to_string(),
        r#"jsonpath={.items[0].status.conditions[?(@.type=="Ready")].status}"#.to_string(),
    ]);
    ReadinessProbe::new(
        "node-ready",
        argv,
        ProbeExpect::StdoutEquals("True".to_string()),
        timeout,
        interval,
    )
}

/// Probe a deployment's Available condition via jsonpath.
pub fn deployment_available_probe(
    kubeconfig: &Path,
    namespace: &str,
    deployment: &str,
    timeout: Duration,
    interval: Duration,
) -> ReadinessProbe {
    let mut argv = kubectl(kubeconfig);
    argv.extend([
        "-n".to_string(),
        namespace.to_string(),
        "get".to_string(),
        "deployment".to_string(),
        deployment.to_string(),
        "-o".to_string(),
        r#"jsonpath={.status.conditions[?(@.type=="Available")].status}"#.to_string(),
    ]);
    ReadinessProbe::new(
        format!("{}/{}-available", namespace, deployment),
        argv,
        ProbeExpect::StdoutEquals("True".to_string()),
        timeout,
        interval,
    )
}
