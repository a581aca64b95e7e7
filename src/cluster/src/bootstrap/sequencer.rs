//! Ordered stage execution with fail-fast semantics.
//!
//! Each stage is skipped (skip check satisfied), executed, or executed and
//! then polled to readiness. A required stage whose every command candidate
//! fails aborts the whole sequence; a readiness timeout is a warning and the
//! sequence continues. The sequencer itself never retries: provisioning
//! actions are expensive and only safe to re-run behind their skip checks.

use crate::bootstrap::poll::{poll_probe, PollOutcome};
use crate::bootstrap::stage::{SkipCheck, Stage};
use crate::host::HostRunner;
use crate::provisioner::{BootstrapError, ProgressReporter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Terminal outcome of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    /// Skip check was satisfied; the action never ran.
    Skipped,
    Succeeded,
    /// Action succeeded but the readiness probe never reported ready.
    TimedOut,
    Failed,
}

/// Recorded outcome of one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    pub name: String,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub elapsed_ms: u64,
}

/// Accumulated outcomes of a bootstrap run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapReport {
    pub outcomes: Vec<StageOutcome>,
}

impl BootstrapReport {
    fn record(
        &mut self,
        stage: &Stage,
        status: StageStatus,
        detail: Option<String>,
        elapsed: Duration,
    ) {
        self.outcomes.push(StageOutcome {
            name: stage.name.to_string(),
            status,
            detail,
            elapsed_ms: elapsed.as_millis() as u64,
        });
    }

    /// Outcomes that completed the run in a degraded state.
    pub fn warnings(&self) -> Vec<&StageOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, StageStatus::TimedOut | StageStatus::Failed))
            .collect()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == StageStatus::Skipped)
            .count()
    }
}

/// Runs a fixed, ordered list of provisioning stages against a host.
pub struct ClusterBootstrapper {
    host: Arc<dyn HostRunner>,
    progress: Arc<dyn ProgressReporter>,
}

impl ClusterBootstrapper {
    pub fn new(host: Arc<dyn HostRunner>, progress: Arc<dyn ProgressReporter>) -> Self {
        Self { host, progress }
    }

    /// Execute the stages strictly in order.
    ///
    /// Returns the accumulated report, or a `BootstrapError::Stage` carrying
    /// the failing stage's identity plus every outcome recorded up to and
    /// including it.
    pub async fn run(&self, stages: &[Stage]) -> Result<BootstrapReport, BootstrapError> {
        let mut report = BootstrapReport::default();
        let total = stages.len() as u32;

        for (index, stage) in stages.iter().enumerate() {
            let percentage = 100u32.saturating_mul(index as u32) / total.max(1);
            self.progress.emit_detailed(
                percentage,
                stage.description.clone(),
                Some(stage.name.clone()),
            );

            if let Some(check) = &stage.check {
                if self.check_satisfied(check).await {
                    tracing::info!(
                        "[Bootstrapper] Stage '{}' already satisfied, skipping",
                        stage.name
                    );
                    report.record(stage, StageStatus::Skipped, None, Duration::ZERO);
                    continue;
                }
            }

            let stage_start = std::time::Instant::now();

            match self.execute_stage(stage).await {
                Ok(()) => {}
                Err(detail) => {
                    let elapsed = stage_start.elapsed();
                    tracing::warn!(
                        "[TIMING] Stage '{}' failed after {}ms",
                        stage.name,
                        elapsed.as_millis()
                    );
                    if stage.optional {
                        tracing::warn!(
                            "[Bootstrapper] Optional stage '{}' failed, continuing: {}",
                            stage.name,
                            detail
                        );
                        report.record(stage, StageStatus::Failed, Some(detail), elapsed);
                        continue;
                    }
                    report.record(stage, StageStatus::Failed, Some(detail.clone()), elapsed);
                    return Err(BootstrapError::Stage {
                        stage: stage.name.to_string(),
                        message: detail,
                        report,
                    });
                }
            }

            let (status, detail) = match &stage.probe {
                Some(probe) => match poll_probe(self.host.as_ref(), probe).await {
                    PollOutcome::Ready { evaluations } => (
                        StageStatus::Succeeded,
                        Some(format!(
                            "'{}' ready after {} evaluation(s)",
                            probe.name, evaluations
                        )),
                    ),
                    PollOutcome::TimedOut { evaluations } => (
                        StageStatus::TimedOut,
                        Some(format!(
                            "'{}' not ready after {} evaluations ({:?})",
                            probe.name, evaluations, probe.timeout
                        )),
                    ),
                },
                None => (StageStatus::Succeeded, None),
            };

            let elapsed = stage_start.elapsed();
            tracing::info!(
                "[TIMING] Stage '{}' completed in {}ms",
                stage.name,
                elapsed.as_millis()
            );
            report.record(stage, status, detail, elapsed);
        }

        self.progress
            .emit(100, "Bootstrap sequence complete".to_string());
        Ok(report)
    }

    async fn check_satisfied(&self, check: &SkipCheck) -> bool {
        match check {
            SkipCheck::FileExists(path) => self.host.file_exists(path).await,
            SkipCheck::CommandSucceeds(argv) => self
                .host
                .run(argv, Duration::from_secs(30))
                .await
                .map(|o| o.success())
                .unwrap_or(false),
        }
    }

    /// Put files in place, then run command candidates in order until one
    /// exits zero. Returns the last failure message when all are exhausted.
    async fn execute_stage(&self, stage: &Stage) -> Result<(), String> {
        for file in &stage.files {
            self.host
                .write_file(&file.path, &file.contents, file.mode)
                .await
                .map_err(|e| format!("writing {} failed: {}", file.path.display(), e))?;
        }

        if stage.actions.is_empty() {
            return Ok(());
        }

        let mut last_failure = String::new();
        for (index, task) in stage.actions.iter().enumerate() {
            tracing::info!(
                "[Bootstrapper] Stage '{}': running '{}' ({}/{})",
                stage.name,
                task.display_name(),
                index + 1,
                stage.actions.len()
            );

            match self.host.run(&task.argv, task.timeout).await {
                Ok(output) if output.success() => {
                    return Ok(());
                }
                Ok(output) => {
                    last_failure = format!(
                        "'{}' exited {}: {}",
                        task.display_name(),
                        output.exit_code,
                        output.last_stderr_line()
                    );
                    tracing::warn!("[Bootstrapper] {}", last_failure);
                }
                Err(e) => {
                    last_failure = format!("'{}' failed to run: {}", task.display_name(), e);
                    tracing::warn!("[Bootstrapper] {}", last_failure);
                }
            }
        }

        Err(last_failure)
    }
}
