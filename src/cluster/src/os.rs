//! Operating system identification.
//!
//! Package names and repository layouts differ between the Debian and RHEL
//! families; everything else in the bootstrap sequence is family-agnostic.
//! Identification happens once at startup from `/etc/os-release`.

use crate::provisioner::BootstrapError;

const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Linux distribution family, as far as provisioning cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// Debian, Ubuntu and derivatives (apt).
    Debian,
    /// RHEL, CentOS, Rocky, Alma, Fedora and derivatives (dnf/yum).
    Rhel,
}

impl OsFamily {
    /// Identify the local host from `/etc/os-release`.
    pub fn detect() -> Result<Self, BootstrapError> {
        let content = std::fs::read_to_string(OS_RELEASE_PATH)?;
        match parse_os_release(&content) {
            Some(family) => {
                tracing::info!("[OsFamily] Detected {:?} family host", family);
                Ok(family)
            }
            None => {
                let id = os_release_value(&content, "ID").unwrap_or_else(|| "unknown".to_string());
                Err(BootstrapError::UnsupportedOs(id))
            }
        }
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsFamily::Debian => write!(f, "debian"),
            OsFamily::Rhel => write!(f, "rhel"),
        }
    }
}

/// Classify os-release content into a supported family, if any.
///
/// `ID` is consulted first, then every token of `ID_LIKE` (derivatives such as
/// Rocky set `ID=rocky` with `ID_LIKE="rhel centos fedora"`).
pub fn parse_os_release(content: &str) -> Option<OsFamily> {
    let mut candidates = Vec::new();
    if let Some(id) = os_release_value(content, "ID") {
        candidates.push(id);
    }
    if let Some(id_like) = os_release_value(content, "ID_LIKE") {
        candidates.extend(id_like.split_whitespace().map(str::to_string));
    }

    for candidate in candidates {
        match candidate.as_str() {
            "debian" | "ubuntu" | "raspbian" => return Some(OsFamily::Debian),
            "rhel" | "centos" | "fedora" | "rocky" | "almalinux" | "ol" => {
                return Some(OsFamily::Rhel)
            }
            _ => {}
        }
    }
    None
}

fn os_release_value(content: &str, key: &str) -> Option<String> {
    for line in content.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix(key) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value.trim_matches('"').to_string());
            }
        }
    }
    None
}
