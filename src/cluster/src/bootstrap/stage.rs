//! Stage model: one named, ordered unit of provisioning work.
//!
//! A stage carries an ordered fallback chain of command candidates (the first
//! that exits zero wins), optional files to put in place beforehand, an
//! optional skip check that detects already-provisioned hosts, and an optional
//! readiness probe polled after the action completes.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(120);

/// One external command candidate.
#[derive(Debug, Clone)]
pub struct HostTask {
    pub name: String,
    pub argv: Vec<String>,
    pub timeout: Duration,
}

impl HostTask {
    pub fn new(name: impl Into<String>, argv: Vec<String>) -> Self {
        Self {
            name: name.into(),
            argv,
            timeout: DEFAULT_TASK_TIMEOUT,
        }
    }

    /// Convenience for `sh -c` compound commands.
    pub fn shell(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self::new(
            name,
            vec!["sh".to_string(), "-c".to_string(), script.into()],
        )
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn display_name(&self) -> String {
        self.name.clone()
    }
}

/// A file to put in place on the host before the stage action runs.
#[derive(Debug, Clone)]
pub struct FileWrite {
    pub path: PathBuf,
    pub contents: String,
    pub mode: u32,
}

impl FileWrite {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            mode: 0o644,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }
}

/// Predicate deciding whether a stage's effect is already in place.
#[derive(Debug, Clone)]
pub enum SkipCheck {
    /// Satisfied when the path exists (e.g. an admin credential file).
    FileExists(PathBuf),
    /// Satisfied when the command exits zero (e.g. `command -v kubeadm`).
    CommandSucceeds(Vec<String>),
}

/// Expected probe result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeExpect {
    /// Probe command exits zero.
    ExitSuccess,
    /// Probe stdout, trimmed, equals the given value.
    StdoutEquals(String),
}

/// A polling predicate checked at a fixed interval up to a timeout.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    pub name: String,
    pub argv: Vec<String>,
    pub expect: ProbeExpect,
    pub timeout: Duration,
    pub interval: Duration,
}

impl ReadinessProbe {
    pub fn new(
        name: impl Into<String>,
        argv: Vec<String>,
        expect: ProbeExpect,
        timeout: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            argv,
            expect,
            timeout,
            interval,
        }
    }
}

/// One named, ordered unit of provisioning work.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,
    pub description: String,
    /// Files put in place before the action runs.
    pub files: Vec<FileWrite>,
    /// Ordered command candidates; the first that exits zero wins.
    pub actions: Vec<HostTask>,
    pub check: Option<SkipCheck>,
    pub probe: Option<ReadinessProbe>,
    /// Degraded components: failure is recorded as a warning, not fatal.
    pub optional: bool,
}

impl Stage {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            files: Vec::new(),
            actions: Vec::new(),
            check: None,
            probe: None,
            optional: false,
        }
    }

    pub fn with_file(mut self, file: FileWrite) -> Self {
        self.files.push(file);
        self
    }

    pub fn with_action(mut self, task: HostTask) -> Self {
        self.actions.push(task);
        self
    }

    pub fn with_actions(mut self, tasks: Vec<HostTask>) -> Self {
        self.actions.extend(tasks);
        self
    }

    pub fn with_check(mut self, check: SkipCheck) -> Self {
        self.check = Some(check);
        self
    }

    pub fn with_probe(mut self, probe: ReadinessProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}
