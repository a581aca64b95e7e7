//! Embedded bootstrap templates - compiled into the binary so the tool is
//! self-contained on a fresh host.
//!
//! Templates are loaded at compile time via `include_str!` and registered with
//! the TemplateRenderer.

/// Container runtime config
pub static CONTAINERD_CONFIG: &str = include_str!("templates/containerd/config.toml.j2");

/// Control-plane init config
pub static KUBEADM_CONFIG: &str = include_str!("templates/kubeadm/kubeadm-config.yaml.j2");

/// Kernel prerequisites
pub static K8S_MODULES_CONF: &str = include_str!("templates/system/k8s-modules.conf.j2");
pub static K8S_SYSCTL_CONF: &str = include_str!("templates/system/k8s-sysctl.conf.j2");

/// Package repository definitions
pub static KUBERNETES_APT_LIST: &str = include_str!("templates/repos/kubernetes.list.j2");
pub static KUBERNETES_YUM_REPO: &str = include_str!("templates/repos/kubernetes.repo.j2");

/// All embedded templates as (name, content) pairs for registration with Tera.
pub const ALL_TEMPLATES: &[(&str, &str)] = &[
    ("containerd/config.toml.j2", CONTAINERD_CONFIG),
    ("kubeadm/kubeadm-config.yaml.j2", KUBEADM_CONFIG),
    ("system/k8s-modules.conf.j2", K8S_MODULES_CONF),
    ("system/k8s-sysctl.conf.j2", K8S_SYSCTL_CONF),
    ("repos/kubernetes.list.j2", KUBERNETES_APT_LIST),
    ("repos/kubernetes.repo.j2", KUBERNETES_YUM_REPO),
];
