//! Package-manager command candidates per distribution family.
//!
//! Each installer is an ordered fallback chain: the primary tool first, then
//! an alternate tool for the same action (`apt-get` then `apt`, `dnf` then
//! `yum`). Installs are slow, so these tasks carry generous timeouts.

use crate::bootstrap::stage::HostTask;
use crate::os::OsFamily;
use std::time::Duration;

const INSTALL_TIMEOUT: Duration = Duration::from_secs(600);

/// Candidates for installing the container runtime.
pub fn containerd_install_tasks(os: OsFamily) -> Vec<HostTask> {
    match os {
        OsFamily::Debian => vec![
            HostTask::shell(
                "apt-get install containerd",
                "apt-get update -y && apt-get install -y containerd",
            )
            .with_timeout(INSTALL_TIMEOUT),
            HostTask::shell(
                "apt install containerd",
                "apt update -y && apt install -y containerd",
            )
            .with_timeout(INSTALL_TIMEOUT),
        ],
        OsFamily::Rhel => vec![
            HostTask::shell("dnf install containerd", "dnf install -y containerd")
                .with_timeout(INSTALL_TIMEOUT),
            HostTask::shell("yum install containerd", "yum install -y containerd")
                .with_timeout(INSTALL_TIMEOUT),
        ],
    }
}

/// Candidates for installing kubeadm, kubelet and kubectl from the pinned
/// minor-version repository, holding them against unintended upgrades, and
/// enabling the kubelet service.
///
/// The repository definition file is rendered separately and put in place
/// before these run; the Debian chain additionally fetches the signing key.
pub fn kube_tools_install_tasks(os: OsFamily, kubernetes_version: &str) -> Vec<HostTask> {
    match os {
        OsFamily::Debian => {
            let key_fetch = format!(
                "mkdir -p /etc/apt/keyrings && \
                 curl -fsSL https://pkgs.k8s.io/core:/stable:/v{version}/deb/Release.key \
                 | gpg --dearmor --yes -o /etc/apt/keyrings/kubernetes-apt-keyring.gpg",
                version = kubernetes_version
            );
            let install = "apt-get update -y && \
                 apt-get install -y kubelet kubeadm kubectl && \
                 apt-mark hold kubelet kubeadm kubectl && \
                 systemctl enable --now kubelet";
            vec![HostTask::shell(
                "apt-get install kube tools",
                format!("{} && {}", key_fetch, install),
            )
            .with_timeout(INSTALL_TIMEOUT)]
        }
        OsFamily::Rhel => vec![
            HostTask::shell(
                "dnf install kube tools",
                "dnf install -y kubelet kubeadm kubectl --disableexcludes=kubernetes && \
                 systemctl enable --now kubelet",
            )
            .with_timeout(INSTALL_TIMEOUT),
            HostTask::shell(
                "yum install kube tools",
                "yum install -y kubelet kubeadm kubectl --disableexcludes=kubernetes && \
                 systemctl enable --now kubelet",
            )
            .with_timeout(INSTALL_TIMEOUT),
        ],
    }
}
