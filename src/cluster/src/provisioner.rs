//! Progress reporting and error types for bootstrap operations.

use crate::bootstrap::sequencer::BootstrapReport;
use crate::progress::BootstrapProgress;

/// Channel-based progress reporter.
pub struct ChannelProgressReporter {
    sender: tokio::sync::mpsc::Sender<BootstrapProgress>,
    node_name: Option<String>,
}

impl ChannelProgressReporter {
    pub fn new(sender: tokio::sync::mpsc::Sender<BootstrapProgress>) -> Self {
        Self {
            sender,
            node_name: None,
        }
    }

    pub fn with_node_name(
        sender: tokio::sync::mpsc::Sender<BootstrapProgress>,
        node_name: String,
    ) -> Self {
        Self {
            sender,
            node_name: Some(node_name),
        }
    }
}

impl ProgressReporter for ChannelProgressReporter {
    fn emit(&self, percentage: u32, message: String) {
        self.emit_detailed(percentage, message, None);
    }

    fn emit_detailed(&self, percentage: u32, message: String, stage: Option<String>) {
        let mut progress = BootstrapProgress::new(self.node_name.clone(), percentage, message);
        progress.stage = stage;
        let _ = self.sender.try_send(progress);
    }
}

/// Progress reporter for bootstrap operations.
pub trait ProgressReporter: Send + Sync + 'static {
    fn emit(&self, percentage: u32, message: String);

    /// Emit progress with stage metadata.
    fn emit_detailed(&self, percentage: u32, message: String, _stage: Option<String>) {
        self.emit(percentage, message);
    }
}

/// Error type for bootstrap operations.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Unsupported operating system: {0}")]
    UnsupportedOs(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Stage '{stage}' failed: {message}")]
    Stage {
        stage: String,
        message: String,
        /// Outcomes accumulated before and including the failing stage.
        report: BootstrapReport,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
