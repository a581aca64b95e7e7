//! Fixed-interval readiness polling.

use crate::bootstrap::stage::{ProbeExpect, ReadinessProbe};
use crate::host::HostRunner;
use std::time::Duration;
use tokio::time::sleep;

/// Upper bound for a single probe invocation; a probe is a cheap query and a
/// hung one must not eat the whole polling window.
const PROBE_EXEC_TIMEOUT: Duration = Duration::from_secs(30);

/// Terminal result of polling a readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ready { evaluations: u32 },
    TimedOut { evaluations: u32 },
}

/// Number of probe evaluations that fit in the polling window.
pub fn max_evaluations(timeout: Duration, interval: Duration) -> u32 {
    let interval_ms = interval.as_millis().max(1);
    let timeout_ms = timeout.as_millis();
    (((timeout_ms + interval_ms - 1) / interval_ms) as u32).max(1)
}

/// Poll a probe at its fixed interval until it reports ready or the window
/// closes. Probe transport errors count as not-ready evaluations.
pub async fn poll_probe(host: &dyn HostRunner, probe: &ReadinessProbe) -> PollOutcome {
    let attempts = max_evaluations(probe.timeout, probe.interval);

    tracing::info!(
        "[Poll] Probe '{}': every {:?}, up to {} evaluations",
        probe.name,
        probe.interval,
        attempts
    );

    for attempt in 1..=attempts {
        match host.run(&probe.argv, PROBE_EXEC_TIMEOUT).await {
            Ok(output) => {
                let ready = match &probe.expect {
                    ProbeExpect::ExitSuccess => output.success(),
                    ProbeExpect::StdoutEquals(expected) => {
                        // jsonpath output may come back single-quoted.
                        output.stdout.trim().trim_matches('\'') == expected
                    }
                };
                if ready {
                    tracing::info!(
                        "[Poll] Probe '{}' ready after {} evaluation(s)",
                        probe.name,
                        attempt
                    );
                    return PollOutcome::Ready {
                        evaluations: attempt,
                    };
                }
                tracing::debug!(
                    "[Poll] Probe '{}' not ready ({}/{})",
                    probe.name,
                    attempt,
                    attempts
                );
            }
            Err(e) => {
                tracing::warn!("[Poll] Probe '{}' check failed (retrying): {}", probe.name, e);
            }
        }

        if attempt < attempts {
            sleep(probe.interval).await;
        }
    }

    tracing::warn!(
        "[Poll] Probe '{}' timed out after {} evaluations ({:?})",
        probe.name,
        attempts,
        probe.timeout
    );
    PollOutcome::TimedOut {
        evaluations: attempts,
    }
}
