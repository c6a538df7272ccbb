use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of request an event describes.
///
/// Commands report as `DOCKER`; HTTP steps report their method.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestType {
    Docker,
    Get,
    Put,
    Post,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docker => "DOCKER",
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single step or command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    Success,
    Failure(String),
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn failure_detail(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failure(detail) => Some(detail),
        }
    }
}

/// One entry of the metrics stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestEvent {
    pub request_type: RequestType,
    pub name: String,
    /// Wall-clock time in milliseconds, rounded to 5 decimal places.
    pub response_time_ms: f64,
    /// Bytes of output (stdout for commands, body for HTTP).
    pub response_length: usize,
    pub outcome: StepOutcome,
}

/// Top-level tasks, in the order a virtual user runs them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskName {
    CreateRepo,
    VerifyRepo,
    DockerPlugin,
    CreateAndApplyPolicyAndWatch,
}

impl TaskName {
    pub const ALL: [TaskName; 4] = [
        TaskName::CreateRepo,
        TaskName::VerifyRepo,
        TaskName::DockerPlugin,
        TaskName::CreateAndApplyPolicyAndWatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateRepo => "create_repo",
            Self::VerifyRepo => "verify_repo",
            Self::DockerPlugin => "docker_plugin",
            Self::CreateAndApplyPolicyAndWatch => "create_and_apply_policy_and_watch",
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a named step, as seen by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepReport {
    pub name: String,
    pub outcome: StepOutcome,
}

impl StepReport {
    pub fn new(name: impl Into<String>, outcome: StepOutcome) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }
}

/// Step reports of one top-level task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskReport {
    pub task: TaskName,
    pub steps: Vec<StepReport>,
}

impl TaskReport {
    /// True when every attempted step succeeded.
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.outcome.is_success())
    }

    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// One pass of a virtual user through the task set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IterationReport {
    pub tasks: Vec<TaskReport>,
}

impl IterationReport {
    /// Failed steps across every task of the pass.
    pub fn failures(&self) -> usize {
        self.tasks
            .iter()
            .flat_map(|t| t.steps.iter())
            .filter(|s| !s.outcome.is_success())
            .count()
    }
}
