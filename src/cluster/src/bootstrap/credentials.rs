//! Admin credential installation.
//!
//! After the control plane comes up, the admin credential is copied into the
//! invoking user's home and, when the tool ran under sudo, into the original
//! user's home with ownership handed back to them.

use crate::bootstrap::stage::HostTask;
use std::path::{Path, PathBuf};

/// Who invoked the tool, resolved once at startup.
#[derive(Debug, Clone)]
pub struct InvokingUser {
    /// Home of the effective user (root when run via sudo).
    pub home: PathBuf,
    /// Original account when run under a privilege-escalation wrapper.
    pub sudo_user: Option<SudoUser>,
}

#[derive(Debug, Clone)]
pub struct SudoUser {
    pub name: String,
    pub home: PathBuf,
}

impl InvokingUser {
    pub fn detect() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"));
        let sudo_user = std::env::var("SUDO_USER").ok().and_then(|name| {
            if name.is_empty() || name == "root" {
                None
            } else {
                let home = PathBuf::from("/home").join(&name);
                Some(SudoUser { name, home })
            }
        });
        Self { home, sudo_user }
    }
}

/// Build the credential-install command for every target home directory.
/// A single compound command: each copy must land, so this is not a fallback
/// chain.
pub fn kubeconfig_install_task(admin_kubeconfig: &Path, user: &InvokingUser) -> HostTask {
    let mut script = install_snippet(admin_kubeconfig, &user.home, None);
    if let Some(sudo_user) = &user.sudo_user {
        script.push_str(" && ");
        script.push_str(&install_snippet(
            admin_kubeconfig,
            &sudo_user.home,
            Some(&sudo_user.name),
        ));
    }
    HostTask::shell("install admin kubeconfig", script)
}

fn install_snippet(admin_kubeconfig: &Path, home: &Path, owner: Option<&str>) -> String {
    let kube_dir = home.join(".kube");
    let target = kube_dir.join("config");
    let mut script = format!(
        "mkdir -p {dir} && install -m 600 {src} {dst}",
        dir = kube_dir.display(),
        src = admin_kubeconfig.display(),
        dst = target.display(),
    );
    if let Some(owner) = owner {
        script.push_str(&format!(
            " && chown -R {owner}:{owner} {dir}",
            owner = owner,
            dir = kube_dir.display(),
        ));
    }
    script
}
