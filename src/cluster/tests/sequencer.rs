//! Integration tests for the bootstrap sequencer: ordering, skip checks,
//! fallback chains, fatal propagation, and readiness polling.

use async_trait::async_trait;
use cluster::{
    BootstrapError, ClusterBootstrapper, CommandOutput, FileWrite, HostError, HostRunner, HostTask,
    ProbeExpect, ProgressReporter, ReadinessProbe, SkipCheck, Stage, StageStatus,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted host double. Commands are keyed by their joined argv; the last
/// queued response for a key sticks, so a probe that should stay not-ready
/// only needs one entry.
#[derive(Default)]
struct FakeHost {
    calls: Mutex<Vec<String>>,
    files: Mutex<HashSet<PathBuf>>,
    writes: Mutex<Vec<(PathBuf, String)>>,
    responses: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
}

impl FakeHost {
    fn ok() -> CommandOutput {
        CommandOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    fn fail(exit_code: i32) -> CommandOutput {
        CommandOutput {
            exit_code,
            stdout: String::new(),
            stderr: "boom".to_string(),
        }
    }

    fn stdout(text: &str) -> CommandOutput {
        CommandOutput {
            exit_code: 0,
            stdout: text.to_string(),
            stderr: String::new(),
        }
    }

    fn respond(&self, key: &str, outputs: Vec<CommandOutput>) {
        self.responses
            .lock()
            .unwrap()
            .insert(key.to_string(), outputs.into());
    }

    fn set_file(&self, path: &str) {
        self.files.lock().unwrap().insert(PathBuf::from(path));
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn call_count(&self, key: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == key).count()
    }
}

#[async_trait]
impl HostRunner for FakeHost {
    async fn run(&self, argv: &[String], _timeout: Duration) -> Result<CommandOutput, HostError> {
        let key = argv.join(" ");
        self.calls.lock().unwrap().push(key.clone());

        let mut responses = self.responses.lock().unwrap();
        if let Some(queue) = responses.get_mut(&key) {
            if queue.len() > 1 {
                if let Some(output) = queue.pop_front() {
                    return Ok(output);
                }
            }
            if let Some(output) = queue.front() {
                return Ok(output.clone());
            }
        }
        Ok(Self::ok())
    }

    async fn file_exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains(path)
    }

    async fn write_file(&self, path: &Path, contents: &str, _mode: u32) -> Result<(), HostError> {
        self.files.lock().unwrap().insert(path.to_path_buf());
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), contents.to_string()));
        Ok(())
    }
}

struct NullReporter;

impl ProgressReporter for NullReporter {
    fn emit(&self, _percentage: u32, _message: String) {}
}

fn bootstrapper(host: Arc<FakeHost>) -> ClusterBootstrapper {
    ClusterBootstrapper::new(host, Arc::new(NullReporter))
}

fn simple_stage(name: &str, command: &str) -> Stage {
    Stage::new(name.to_string(), format!("run {}", name))
        .with_action(HostTask::new(command, vec![command.to_string()]))
}

fn fast_probe(command: &str, timeout_ms: u64, interval_ms: u64) -> ReadinessProbe {
    ReadinessProbe::new(
        "probe",
        vec![command.to_string()],
        ProbeExpect::StdoutEquals("True".to_string()),
        Duration::from_millis(timeout_ms),
        Duration::from_millis(interval_ms),
    )
}

#[tokio::test]
async fn stages_run_in_declared_order() {
    let host = Arc::new(FakeHost::default());
    let stages = vec![
        simple_stage("first", "cmd-a"),
        simple_stage("second", "cmd-b"),
        simple_stage("third", "cmd-c"),
    ];

    let report = bootstrapper(host.clone()).run(&stages).await.unwrap();

    assert_eq!(host.calls(), vec!["cmd-a", "cmd-b", "cmd-c"]);
    assert_eq!(report.outcomes.len(), 3);
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.status == StageStatus::Succeeded));
}

#[tokio::test]
async fn satisfied_check_skips_the_action() {
    let host = Arc::new(FakeHost::default());
    host.set_file("/etc/kubernetes/admin.conf");

    let stage = simple_stage("init", "kubeadm-init")
        .with_check(SkipCheck::FileExists(PathBuf::from(
            "/etc/kubernetes/admin.conf",
        )));

    let report = bootstrapper(host.clone()).run(&[stage]).await.unwrap();

    assert_eq!(report.outcomes[0].status, StageStatus::Skipped);
    assert_eq!(host.call_count("kubeadm-init"), 0);
    assert_eq!(report.skipped(), 1);
}

#[tokio::test]
async fn command_check_skips_when_it_exits_zero() {
    let host = Arc::new(FakeHost::default());
    host.respond("which-tool", vec![FakeHost::ok()]);

    let stage = simple_stage("install", "install-tool")
        .with_check(SkipCheck::CommandSucceeds(vec!["which-tool".to_string()]));

    let report = bootstrapper(host.clone()).run(&[stage]).await.unwrap();

    assert_eq!(report.outcomes[0].status, StageStatus::Skipped);
    assert_eq!(host.call_count("install-tool"), 0);
}

#[tokio::test]
async fn fallback_candidates_try_in_order_until_one_succeeds() {
    let host = Arc::new(FakeHost::default());
    host.respond("tool-a", vec![FakeHost::fail(1)]);

    let stage = Stage::new("install", "install something")
        .with_action(HostTask::new("tool-a", vec!["tool-a".to_string()]))
        .with_action(HostTask::new("tool-b", vec!["tool-b".to_string()]))
        .with_action(HostTask::new("tool-c", vec!["tool-c".to_string()]));

    let report = bootstrapper(host.clone()).run(&[stage]).await.unwrap();

    assert_eq!(report.outcomes[0].status, StageStatus::Succeeded);
    assert_eq!(host.calls(), vec!["tool-a", "tool-b"]);
    assert_eq!(host.call_count("tool-c"), 0);
}

#[tokio::test]
async fn required_stage_failure_aborts_before_later_stages() {
    let host = Arc::new(FakeHost::default());
    host.respond("cmd-b", vec![FakeHost::fail(2)]);

    let stages = vec![
        simple_stage("first", "cmd-a"),
        simple_stage("second", "cmd-b"),
        simple_stage("third", "cmd-c"),
    ];

    let err = bootstrapper(host.clone()).run(&stages).await.unwrap_err();

    match err {
        BootstrapError::Stage {
            stage,
            message,
            report,
        } => {
            assert_eq!(stage, "second");
            assert!(message.contains("exited 2"), "message: {}", message);
            let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status).collect();
            assert_eq!(statuses, vec![StageStatus::Succeeded, StageStatus::Failed]);
        }
        other => panic!("expected stage failure, got {:?}", other),
    }
    assert_eq!(host.call_count("cmd-c"), 0);
}

#[tokio::test]
async fn optional_stage_failure_is_a_warning_not_an_abort() {
    let host = Arc::new(FakeHost::default());
    host.respond("flaky", vec![FakeHost::fail(1)]);

    let stages = vec![
        Stage::new("extras", "install extras")
            .with_action(HostTask::new("flaky", vec!["flaky".to_string()]))
            .optional(),
        simple_stage("after", "cmd-after"),
    ];

    let report = bootstrapper(host.clone()).run(&stages).await.unwrap();

    assert_eq!(report.outcomes[0].status, StageStatus::Failed);
    assert_eq!(report.outcomes[1].status, StageStatus::Succeeded);
    assert_eq!(report.warnings().len(), 1);
    assert_eq!(host.call_count("cmd-after"), 1);
}

#[tokio::test]
async fn files_are_written_before_the_action_runs() {
    let host = Arc::new(FakeHost::default());

    let stage = Stage::new("configure", "write config then restart")
        .with_file(FileWrite::new("/etc/thing/config.toml", "key = 1\n"))
        .with_action(HostTask::new("restart", vec!["restart".to_string()]));

    bootstrapper(host.clone()).run(&[stage]).await.unwrap();

    let writes = host.writes.lock().unwrap().clone();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, PathBuf::from("/etc/thing/config.toml"));
    assert_eq!(host.call_count("restart"), 1);
}

#[tokio::test]
async fn probe_ready_after_k_intervals_takes_k_plus_one_evaluations() {
    let host = Arc::new(FakeHost::default());
    // Not ready twice, then ready: 3 evaluations total.
    host.respond(
        "check-ready",
        vec![
            FakeHost::stdout("False"),
            FakeHost::stdout("False"),
            FakeHost::stdout("True"),
        ],
    );

    let stage = simple_stage("apply", "apply-manifest")
        .with_probe(fast_probe("check-ready", 1_000, 10));

    let report = bootstrapper(host.clone()).run(&[stage]).await.unwrap();

    assert_eq!(report.outcomes[0].status, StageStatus::Succeeded);
    assert_eq!(host.call_count("check-ready"), 3);
}

#[tokio::test]
async fn probe_timeout_is_recorded_and_the_sequence_continues() {
    let host = Arc::new(FakeHost::default());
    host.respond("check-ready", vec![FakeHost::stdout("False")]);

    // ceil(50 / 20) = 3 evaluations, never ready.
    let stages = vec![
        simple_stage("apply", "apply-manifest").with_probe(fast_probe("check-ready", 50, 20)),
        simple_stage("after", "cmd-after"),
    ];

    let report = bootstrapper(host.clone()).run(&stages).await.unwrap();

    assert_eq!(report.outcomes[0].status, StageStatus::TimedOut);
    assert_eq!(host.call_count("check-ready"), 3);
    assert_eq!(report.outcomes[1].status, StageStatus::Succeeded);
    assert_eq!(report.warnings().len(), 1);
}

#[tokio::test]
async fn exit_success_probe_accepts_any_zero_exit() {
    let host = Arc::new(FakeHost::default());
    host.respond(
        "health",
        vec![FakeHost::fail(1), FakeHost::ok()],
    );

    let probe = ReadinessProbe::new(
        "health",
        vec!["health".to_string()],
        ProbeExpect::ExitSuccess,
        Duration::from_millis(100),
        Duration::from_millis(10),
    );
    let stage = simple_stage("apply", "apply-manifest").with_probe(probe);

    let report = bootstrapper(host.clone()).run(&[stage]).await.unwrap();

    assert_eq!(report.outcomes[0].status, StageStatus::Succeeded);
    assert_eq!(host.call_count("health"), 2);
}

/// Re-running the sequence against an already-provisioned host: the guarded
/// stage skips, unguarded stages re-execute (the cluster API's apply semantics
/// make that safe), and the readiness probe is satisfied immediately.
#[tokio::test]
async fn second_run_converges_without_repeating_guarded_work() {
    let host = Arc::new(FakeHost::default());
    host.respond("node-ready", vec![FakeHost::stdout("True")]);

    let stages = vec![
        simple_stage("init-control-plane", "kubeadm-init").with_check(SkipCheck::FileExists(
            PathBuf::from("/etc/kubernetes/admin.conf"),
        )),
        simple_stage("remove-taints", "kubectl-taint"),
        simple_stage("apply-cni", "kubectl-apply").with_probe(fast_probe("node-ready", 120, 5)),
    ];

    let sequencer = bootstrapper(host.clone());

    let first = sequencer.run(&stages).await.unwrap();
    assert!(first
        .outcomes
        .iter()
        .all(|o| o.status == StageStatus::Succeeded));
    assert_eq!(host.call_count("kubeadm-init"), 1);

    // The control plane now exists.
    host.set_file("/etc/kubernetes/admin.conf");

    let second = sequencer.run(&stages).await.unwrap();
    assert_eq!(second.outcomes[0].status, StageStatus::Skipped);
    assert_eq!(second.outcomes[1].status, StageStatus::Succeeded);
    assert_eq!(second.outcomes[2].status, StageStatus::Succeeded);

    // Guarded work did not repeat; unguarded work did.
    assert_eq!(host.call_count("kubeadm-init"), 1);
    assert_eq!(host.call_count("kubectl-taint"), 2);
    assert_eq!(host.call_count("kubectl-apply"), 2);
}

#[tokio::test]
async fn stage_with_files_only_succeeds_without_actions() {
    let host = Arc::new(FakeHost::default());

    let stage = Stage::new("drop-config", "write a config file")
        .with_file(FileWrite::new("/etc/only/file.conf", "x\n"));

    let report = bootstrapper(host.clone()).run(&[stage]).await.unwrap();

    assert_eq!(report.outcomes[0].status, StageStatus::Succeeded);
    assert!(host.calls().is_empty());
}

mod polling_math {
    use cluster::max_evaluations;
    use std::time::Duration;

    #[test]
    fn exact_multiple() {
        assert_eq!(
            max_evaluations(Duration::from_secs(120), Duration::from_secs(5)),
            24
        );
    }

    #[test]
    fn rounds_up_on_remainder() {
        assert_eq!(
            max_evaluations(Duration::from_secs(50), Duration::from_secs(20)),
            3
        );
    }

    #[test]
    fn never_less_than_one() {
        assert_eq!(
            max_evaluations(Duration::from_millis(1), Duration::from_secs(5)),
            1
        );
    }
}
