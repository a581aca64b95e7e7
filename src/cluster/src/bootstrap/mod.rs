/// Cluster bootstrap: stage model, sequencer, plan, and supporting pieces.
pub mod addons;
pub mod credentials;
pub mod embedded_templates;
pub mod kubectl;
pub mod packages;
pub mod plan;
pub mod poll;
pub mod sequencer;
pub mod stage;
pub mod template_renderer;

pub use addons::{get_addons, Addon, AddonProbe};
pub use credentials::{InvokingUser, SudoUser};
pub use plan::build_stages;
pub use poll::{max_evaluations, poll_probe, PollOutcome};
pub use sequencer::{BootstrapReport, ClusterBootstrapper, StageOutcome, StageStatus};
pub use stage::{FileWrite, HostTask, ProbeExpect, ReadinessProbe, SkipCheck, Stage};
pub use template_renderer::TemplateRenderer;
