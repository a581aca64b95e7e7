//! Host command execution seam.
//!
//! Every side effect of the bootstrap sequence goes through the `HostRunner`
//! trait: process spawns, filesystem writes, existence checks. The sequencer
//! itself owns no durable state, so it can be restarted freely and pointed at
//! a fake host in tests.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Error from a host-level operation.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("empty command")]
    EmptyCommand,

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured output of a finished host command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last stderr line, for compact failure messages.
    pub fn last_stderr_line(&self) -> &str {
        self.stderr.lines().last().unwrap_or("No output available")
    }
}

/// Handle to the external system the bootstrap sequence mutates.
#[async_trait]
pub trait HostRunner: Send + Sync {
    /// Run a command to completion, capturing output. A nonzero exit status is
    /// not an error at this level; callers inspect `CommandOutput::success`.
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput, HostError>;

    /// Check whether a path exists on the host.
    async fn file_exists(&self, path: &Path) -> bool;

    /// Write a file on the host, creating parent directories, with the given
    /// Unix permission mode.
    async fn write_file(&self, path: &Path, contents: &str, mode: u32) -> Result<(), HostError>;
}

/// `HostRunner` backed by the local machine.
pub struct LocalHost;

#[async_trait]
impl HostRunner for LocalHost {
    async fn run(&self, argv: &[String], timeout: Duration) -> Result<CommandOutput, HostError> {
        let (program, args) = argv.split_first().ok_or(HostError::EmptyCommand)?;

        tracing::debug!("[LocalHost] Running: {}", argv.join(" "));

        let mut command = tokio::process::Command::new(program);
        command.args(args);

        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| HostError::Timeout(timeout))??;

        Ok(CommandOutput {
            // Killed by signal leaves no code; report -1 like a shell would report 128+n.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn file_exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn write_file(&self, path: &Path, contents: &str, mode: u32) -> Result<(), HostError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        tracing::info!(
            "[LocalHost] Wrote {} ({} bytes)",
            path.display(),
            contents.len()
        );
        Ok(())
    }
}
