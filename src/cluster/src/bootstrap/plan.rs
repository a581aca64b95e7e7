//! Plan construction - builds the fixed, ordered provisioning sequence
//!
//! Host preparation first (swap, kernel prerequisites, container runtime),
//! then the control plane, then addons. Later stages depend on the side
//! effects of earlier ones, so the order is load-bearing.

use crate::bootstrap::addons::{get_addons, AddonProbe};
use crate::bootstrap::credentials::{kubeconfig_install_task, InvokingUser};
use crate::bootstrap::kubectl;
use crate::bootstrap::packages;
use crate::bootstrap::stage::{FileWrite, HostTask, SkipCheck, Stage};
use crate::bootstrap::template_renderer::TemplateRenderer;
use crate::config::ClusterConfig;
use crate::os::OsFamily;
use crate::provisioner::BootstrapError;
use std::collections::HashMap;
use std::time::Duration;

const PAUSE_IMAGE: &str = "registry.k8s.io/pause:3.9";
const KUBEADM_CONFIG_PATH: &str = "/etc/kubeup/kubeadm-config.yaml";
const HELM_INSTALL_SCRIPT_URL: &str =
    "https://raw.githubusercontent.com/helm/helm/main/scripts/get-helm-3";

const INIT_TIMEOUT: Duration = Duration::from_secs(600);
const HELM_TIMEOUT: Duration = Duration::from_secs(300);

/// Build the full provisioning sequence for the given host.
pub fn build_stages(
    config: &ClusterConfig,
    os: OsFamily,
    user: &InvokingUser,
    renderer: &TemplateRenderer,
) -> Result<Vec<Stage>, BootstrapError> {
    let mut stages = Vec::new();

    stages.push(disable_swap_stage());
    stages.push(kernel_modules_stage(renderer)?);
    stages.push(sysctl_stage(renderer)?);
    stages.push(install_containerd_stage(os));
    stages.push(configure_containerd_stage(renderer)?);
    stages.push(install_kube_tools_stage(config, os, renderer)?);
    stages.push(init_control_plane_stage(config, renderer)?);
    stages.push(install_kubeconfig_stage(config, user));
    stages.push(remove_taints_stage(config));
    stages.extend(addon_stages(config));
    stages.push(install_helm_stage());

    tracing::info!("[Plan] Planned {} provisioning stages", stages.len());
    Ok(stages)
}

fn disable_swap_stage() -> Stage {
    Stage::new("disable-swap", "Disable swap (required by the kubelet)").with_action(
        HostTask::shell(
            "swapoff",
            r"swapoff -a && sed -ri 's/^([^#].*\sswap\s.*)$/#\1/' /etc/fstab",
        ),
    )
}

fn kernel_modules_stage(renderer: &TemplateRenderer) -> Result<Stage, BootstrapError> {
    let conf = renderer.render("system/k8s-modules.conf.j2", &HashMap::new())?;
    Ok(
        Stage::new("kernel-modules", "Load kernel modules for container networking")
            .with_file(FileWrite::new("/etc/modules-load.d/k8s.conf", conf))
            .with_action(HostTask::shell(
                "modprobe",
                "modprobe overlay && modprobe br_netfilter",
            )),
    )
}

fn sysctl_stage(renderer: &TemplateRenderer) -> Result<Stage, BootstrapError> {
    let conf = renderer.render("system/k8s-sysctl.conf.j2", &HashMap::new())?;
    Ok(
        Stage::new("sysctl", "Enable bridged traffic and IP forwarding")
            .with_file(FileWrite::new("/etc/sysctl.d/99-kubernetes.conf", conf))
            .with_action(HostTask::new(
                "sysctl --system",
                vec!["sysctl".to_string(), "--system".to_string()],
            )),
    )
}

fn install_containerd_stage(os: OsFamily) -> Stage {
    Stage::new("install-containerd", "Install the container runtime")
        .with_check(SkipCheck::CommandSucceeds(shell_check("command -v containerd")))
        .with_actions(packages::containerd_install_tasks(os))
}

fn configure_containerd_stage(renderer: &TemplateRenderer) -> Result<Stage, BootstrapError> {
    let mut vars = HashMap::new();
    vars.insert("pause_image".to_string(), PAUSE_IMAGE.to_string());
    let conf = renderer.render("containerd/config.toml.j2", &vars)?;

    Ok(
        Stage::new("configure-containerd", "Configure and restart the container runtime")
            .with_file(FileWrite::new("/etc/containerd/config.toml", conf))
            .with_action(HostTask::shell(
                "restart containerd",
                "systemctl enable --now containerd && systemctl restart containerd",
            )),
    )
}

fn install_kube_tools_stage(
    config: &ClusterConfig,
    os: OsFamily,
    renderer: &TemplateRenderer,
) -> Result<Stage, BootstrapError> {
    let mut vars = HashMap::new();
    vars.insert(
        "kubernetes_version".to_string(),
        config.kubernetes_version.clone(),
    );

    let repo_file = match os {
        OsFamily::Debian => FileWrite::new(
            "/etc/apt/sources.list.d/kubernetes.list",
            renderer.render("repos/kubernetes.list.j2", &vars)?,
        ),
        OsFamily::Rhel => FileWrite::new(
            "/etc/yum.repos.d/kubernetes.repo",
            renderer.render("repos/kubernetes.repo.j2", &vars)?,
        ),
    };

    Ok(
        Stage::new("install-kube-tools", "Install kubeadm, kubelet and kubectl")
            .with_check(SkipCheck::CommandSucceeds(shell_check("command -v kubeadm")))
            .with_file(repo_file)
            .with_actions(packages::kube_tools_install_tasks(
                os,
                &config.kubernetes_version,
            )),
    )
}

fn init_control_plane_stage(
    config: &ClusterConfig,
    renderer: &TemplateRenderer,
) -> Result<Stage, BootstrapError> {
    let mut vars = HashMap::new();
    vars.insert("pod_cidr".to_string(), config.pod_network_cidr.clone());
    vars.insert("service_cidr".to_string(), config.service_cidr.clone());
    let kubeadm_config = renderer.render("kubeadm/kubeadm-config.yaml.j2", &vars)?;

    Ok(
        Stage::new("init-control-plane", "Initialize the Kubernetes control plane")
            .with_check(SkipCheck::FileExists(config.admin_kubeconfig.clone()))
            .with_file(FileWrite::new(KUBEADM_CONFIG_PATH, kubeadm_config))
            .with_action(
                HostTask::new(
                    "kubeadm init",
                    vec![
                        "kubeadm".to_string(),
                        "init".to_string(),
                        "--config".to_string(),
                        KUBEADM_CONFIG_PATH.to_string(),
                    ],
                )
                .with_timeout(INIT_TIMEOUT),
            ),
    )
}

fn install_kubeconfig_stage(config: &ClusterConfig, user: &InvokingUser) -> Stage {
    Stage::new(
        "install-kubeconfig",
        "Install the admin credential into user home directories",
    )
    .with_action(kubeconfig_install_task(&config.admin_kubeconfig, user))
}

fn remove_taints_stage(config: &ClusterConfig) -> Stage {
    // Fails once the taints are already gone, so it must not abort the run.
    Stage::new("remove-taints", "Allow workloads on the control-plane node")
        .with_action(HostTask::new(
            "untaint node",
            kubectl::remove_control_plane_taints(&config.admin_kubeconfig),
        ))
        .optional()
}

fn addon_stages(config: &ClusterConfig) -> Vec<Stage> {
    get_addons(config)
        .into_iter()
        .map(|addon| {
            let apply = HostTask::new(
                format!("apply {}", addon.name),
                kubectl::apply_manifest(&config.admin_kubeconfig, &addon.manifest_url),
            );
            let probe = match addon.probe {
                AddonProbe::NodeReady => kubectl::node_ready_probe(
                    &config.admin_kubeconfig,
                    addon.probe_timeout,
                    addon.probe_interval,
                ),
                AddonProbe::DeploymentAvailable {
                    namespace,
                    deployment,
                } => kubectl::deployment_available_probe(
                    &config.admin_kubeconfig,
                    namespace,
                    deployment,
                    addon.probe_timeout,
                    addon.probe_interval,
                ),
            };
            Stage::new(
                format!("apply-{}", addon.name),
                format!("Deploy {}", addon.description),
            )
            .with_action(apply)
            .with_probe(probe)
        })
        .collect()
}

fn install_helm_stage() -> Stage {
    Stage::new("install-helm", "Install the helm CLI (optional)")
        .with_check(SkipCheck::CommandSucceeds(shell_check("command -v helm")))
        .with_action(
            HostTask::shell(
                "helm via curl",
                format!(
                    "curl -fsSL {} -o /tmp/get-helm-3.sh && bash /tmp/get-helm-3.sh",
                    HELM_INSTALL_SCRIPT_URL
                ),
            )
            .with_timeout(HELM_TIMEOUT),
        )
        .with_action(
            HostTask::shell(
                "helm via wget",
                format!(
                    "wget -qO /tmp/get-helm-3.sh {} && bash /tmp/get-helm-3.sh",
                    HELM_INSTALL_SCRIPT_URL
                ),
            )
            .with_timeout(HELM_TIMEOUT),
        )
        .optional()
}

fn shell_check(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}
