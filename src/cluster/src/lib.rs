//! Single-node Kubernetes bootstrap engine.
//!
//! This crate converges a Linux host into a one-node Kubernetes cluster by
//! running a fixed, ordered list of provisioning stages against external
//! collaborators (package managers, the container runtime's service manager,
//! `kubeadm`, `kubectl`). Stages are guarded by idempotency checks and
//! followed by readiness polling where their effects are asynchronous; the
//! sequencer holds no durable state of its own.

pub mod bootstrap;
pub mod config;
pub mod host;
pub mod os;
pub mod progress;
pub mod provisioner;

pub use bootstrap::{
    build_stages, get_addons, max_evaluations, poll_probe, Addon, AddonProbe, BootstrapReport,
    ClusterBootstrapper, FileWrite, HostTask, InvokingUser, PollOutcome, ProbeExpect,
    ReadinessProbe, SkipCheck, Stage, StageOutcome, StageStatus, SudoUser, TemplateRenderer,
};
pub use config::ClusterConfig;
pub use host::{CommandOutput, HostError, HostRunner, LocalHost};
pub use os::OsFamily;
pub use progress::BootstrapProgress;
pub use provisioner::{BootstrapError, ChannelProgressReporter, ProgressReporter};
