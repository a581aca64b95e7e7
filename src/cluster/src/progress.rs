//! Progress types for cluster bootstrap.

use serde::{Deserialize, Serialize};

/// Progress event emitted while the bootstrap sequence runs.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct BootstrapProgress {
    pub percentage: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

impl BootstrapProgress {
    pub fn new(node_name: Option<String>, percentage: u32, message: String) -> Self {
        Self {
            percentage,
            message,
            stage: None,
            node_name,
        }
    }
}
