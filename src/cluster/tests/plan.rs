//! Integration tests for plan construction and addon definitions.

use cluster::{
    build_stages, get_addons, AddonProbe, ClusterConfig, InvokingUser, OsFamily, SkipCheck, Stage,
    TemplateRenderer,
};
use std::path::PathBuf;
use std::time::Duration;

fn test_user() -> InvokingUser {
    InvokingUser {
        home: PathBuf::from("/root"),
        sudo_user: None,
    }
}

fn plan_for(os: OsFamily) -> Vec<Stage> {
    let config = ClusterConfig::default();
    let renderer = TemplateRenderer::from_embedded().unwrap();
    build_stages(&config, os, &test_user(), &renderer).unwrap()
}

#[test]
fn test_stage_ordering() {
    let stages = plan_for(OsFamily::Debian);
    let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "disable-swap",
            "kernel-modules",
            "sysctl",
            "install-containerd",
            "configure-containerd",
            "install-kube-tools",
            "init-control-plane",
            "install-kubeconfig",
            "remove-taints",
            "apply-cni",
            "apply-ingress",
            "apply-cert-manager",
            "install-helm",
        ]
    );
}

#[test]
fn test_control_plane_init_is_guarded_by_credential_file() {
    let stages = plan_for(OsFamily::Debian);
    let init = stages
        .iter()
        .find(|s| s.name == "init-control-plane")
        .unwrap();

    match &init.check {
        Some(SkipCheck::FileExists(path)) => {
            assert_eq!(path, &PathBuf::from("/etc/kubernetes/admin.conf"));
        }
        other => panic!("expected credential-file guard, got {:?}", other),
    }

    // The rendered init config carries the pod network CIDR.
    assert_eq!(init.files.len(), 1);
    assert!(init.files[0].contents.contains("podSubnet: 10.244.0.0/16"));
}

#[test]
fn test_package_fallback_chains_per_family() {
    let debian = plan_for(OsFamily::Debian);
    let containerd = debian
        .iter()
        .find(|s| s.name == "install-containerd")
        .unwrap();
    let candidates: Vec<&str> = containerd.actions.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        candidates,
        vec!["apt-get install containerd", "apt install containerd"]
    );

    let rhel = plan_for(OsFamily::Rhel);
    let containerd = rhel
        .iter()
        .find(|s| s.name == "install-containerd")
        .unwrap();
    let candidates: Vec<&str> = containerd.actions.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        candidates,
        vec!["dnf install containerd", "yum install containerd"]
    );
}

#[test]
fn test_kube_tools_repo_file_per_family() {
    let debian = plan_for(OsFamily::Debian);
    let tools = debian
        .iter()
        .find(|s| s.name == "install-kube-tools")
        .unwrap();
    assert_eq!(
        tools.files[0].path,
        PathBuf::from("/etc/apt/sources.list.d/kubernetes.list")
    );
    assert!(tools.files[0].contents.contains("/v1.30/deb/"));

    let rhel = plan_for(OsFamily::Rhel);
    let tools = rhel
        .iter()
        .find(|s| s.name == "install-kube-tools")
        .unwrap();
    assert_eq!(
        tools.files[0].path,
        PathBuf::from("/etc/yum.repos.d/kubernetes.repo")
    );
    assert!(tools.files[0].contents.contains("/v1.30/rpm/"));
}

#[test]
fn test_degraded_stages_are_optional() {
    let stages = plan_for(OsFamily::Debian);

    for name in ["remove-taints", "install-helm"] {
        let stage = stages.iter().find(|s| s.name == name).unwrap();
        assert!(stage.optional, "{} should not abort the sequence", name);
    }

    let required = stages.iter().filter(|s| !s.optional).count();
    assert_eq!(required, stages.len() - 2);
}

#[test]
fn test_cni_stage_polls_node_readiness() {
    let stages = plan_for(OsFamily::Debian);
    let cni = stages.iter().find(|s| s.name == "apply-cni").unwrap();

    let probe = cni.probe.as_ref().unwrap();
    assert_eq!(probe.timeout, Duration::from_secs(120));
    assert_eq!(probe.interval, Duration::from_secs(5));
    assert!(probe.argv.join(" ").contains("get nodes"));
}

#[test]
fn test_addon_ordering_and_probes() {
    let config = ClusterConfig::default();
    let addons = get_addons(&config);

    assert_eq!(addons.len(), 3);
    assert_eq!(addons[0].name, "cni");
    assert_eq!(addons[1].name, "ingress");
    assert_eq!(addons[2].name, "cert-manager");

    assert_eq!(addons[0].probe, AddonProbe::NodeReady);
    assert_eq!(
        addons[1].probe,
        AddonProbe::DeploymentAvailable {
            namespace: "ingress-nginx",
            deployment: "ingress-nginx-controller",
        }
    );
    assert_eq!(addons[1].probe_timeout, Duration::from_secs(180));
}

#[test]
fn test_addon_urls_carry_configured_versions() {
    let config = ClusterConfig {
        cert_manager_version: "v1.16.0".to_string(),
        ingress_nginx_version: "v1.12.0".to_string(),
        ..ClusterConfig::default()
    };
    let addons = get_addons(&config);

    assert!(addons[1].manifest_url.contains("controller-v1.12.0"));
    assert!(addons[2].manifest_url.contains("v1.16.0/cert-manager.yaml"));
}

#[test]
fn test_kubeconfig_install_targets_sudo_user() {
    use cluster::SudoUser;

    let config = ClusterConfig::default();
    let renderer = TemplateRenderer::from_embedded().unwrap();
    let user = InvokingUser {
        home: PathBuf::from("/root"),
        sudo_user: Some(SudoUser {
            name: "alice".to_string(),
            home: PathBuf::from("/home/alice"),
        }),
    };

    let stages = build_stages(&config, OsFamily::Debian, &user, &renderer).unwrap();
    let install = stages
        .iter()
        .find(|s| s.name == "install-kubeconfig")
        .unwrap();
    let script = install.actions[0].argv.join(" ");

    assert!(script.contains("/root/.kube"));
    assert!(script.contains("/home/alice/.kube"));
    assert!(script.contains("chown -R alice:alice"));
    assert!(script.contains("install -m 600 /etc/kubernetes/admin.conf"));
}

#[test]
fn test_kubeconfig_install_without_sudo_user_does_not_chown() {
    let stages = plan_for(OsFamily::Debian);
    let install = stages
        .iter()
        .find(|s| s.name == "install-kubeconfig")
        .unwrap();
    let script = install.actions[0].argv.join(" ");

    assert!(script.contains("/root/.kube"));
    assert!(!script.contains("chown"));
}

#[test]
fn test_taint_removal_covers_both_taint_keys() {
    let stages = plan_for(OsFamily::Debian);
    let taints = stages.iter().find(|s| s.name == "remove-taints").unwrap();
    let argv = taints.actions[0].argv.join(" ");

    assert!(argv.contains("node-role.kubernetes.io/control-plane-"));
    assert!(argv.contains("node-role.kubernetes.io/master-"));
}
