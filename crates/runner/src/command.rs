use std::future::Future;
use std::io;
use std::process::Stdio;
use std::time::Instant;

use tracing::{debug, warn};
use xray_load_core::{elapsed_ms, RequestEvent, RequestType, StepOutcome};

use crate::events::EventSink;

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Starts a process and waits for it. `argv[0]` is the program.
pub trait Spawn: Send + Sync {
    fn output(&self, argv: &[String]) -> impl Future<Output = io::Result<CommandOutput>> + Send;
}

/// Runs real processes via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSpawner;

impl Spawn for ProcessSpawner {
    async fn output(&self, argv: &[String]) -> io::Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty argv"))?;

        let out = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(CommandOutput {
            success: out.status.success(),
            exit_code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        })
    }
}

/// Times external commands and reports them as `DOCKER` events.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner<S = ProcessSpawner> {
    spawner: S,
}

impl<S: Spawn> CommandRunner<S> {
    pub fn new(spawner: S) -> Self {
        Self { spawner }
    }

    /// Run `argv` to completion. Returns `true` on exit status 0.
    pub async fn run(&self, argv: &[String], task_name: &str, sink: &dyn EventSink) -> bool {
        self.run_with_outcome(argv, task_name, sink)
            .await
            .is_success()
    }

    /// Like [`run`](Self::run), keeping the failure detail for the caller.
    ///
    /// Exactly one event is fired per call, whatever the outcome.
    pub async fn run_with_outcome(
        &self,
        argv: &[String],
        task_name: &str,
        sink: &dyn EventSink,
    ) -> StepOutcome {
        let started = Instant::now();
        let result = self.spawner.output(argv).await;
        let response_time_ms = elapsed_ms(started.elapsed());

        let (outcome, response_length) = match result {
            Ok(out) if out.success => (StepOutcome::Success, out.stdout.len()),
            Ok(out) => {
                let status = out
                    .exit_code
                    .map_or_else(|| "terminated by signal".to_string(), |c| c.to_string());
                let detail = format!(
                    "command {} returned non-zero exit status {status}: {}",
                    display_argv(argv),
                    out.stderr.trim()
                );
                (StepOutcome::Failure(detail), out.stdout.len())
            }
            Err(e) => (
                StepOutcome::Failure(format!("failed to run {}: {e}", display_argv(argv))),
                0,
            ),
        };

        match &outcome {
            StepOutcome::Success => debug!(task = task_name, response_time_ms, "command succeeded"),
            StepOutcome::Failure(detail) => warn!(task = task_name, response_time_ms, "{detail}"),
        }

        sink.fire(RequestEvent {
            request_type: RequestType::Docker,
            name: task_name.to_string(),
            response_time_ms,
            response_length,
            outcome: outcome.clone(),
        });
        outcome
    }
}

/// Argument list for messages, with password values masked.
pub fn display_argv(argv: &[String]) -> String {
    let mut parts = Vec::with_capacity(argv.len());
    let mut mask_next = false;
    for arg in argv {
        if mask_next {
            parts.push("****".to_string());
            mask_next = false;
            continue;
        }
        if let Some((flag, _)) = arg.split_once('=') {
            if flag == "--password" {
                parts.push(format!("{flag}=****"));
                continue;
            }
        }
        mask_next = arg == "-p" || arg == "--password";
        parts.push(arg.clone());
    }
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{drain_ready, ChannelSink};

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn display_masks_passwords() {
        let a = argv(&["docker", "login", "host", "-u", "admin", "-p", "hunter2"]);
        assert_eq!(display_argv(&a), "[docker, login, host, -u, admin, -p, ****]");
        let b = argv(&["docker", "login", "--password=hunter2"]);
        assert_eq!(display_argv(&b), "[docker, login, --password=****]");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_command_reports_stdout_length() {
        let (sink, mut rx) = ChannelSink::new();
        let runner = CommandRunner::new(ProcessSpawner);
        let ok = runner.run(&argv(&["echo", "hello"]), "echo", &sink).await;
        assert!(ok);

        let events = drain_ready(&mut rx);
        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert_eq!(ev.request_type, RequestType::Docker);
        assert_eq!(ev.name, "echo");
        assert_eq!(ev.response_length, "hello\n".len());
        assert!(ev.response_time_ms >= 0.0);
        assert!(ev.outcome.is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_reports_failure() {
        let (sink, mut rx) = ChannelSink::new();
        let runner = CommandRunner::new(ProcessSpawner);
        let outcome = runner
            .run_with_outcome(&argv(&["sh", "-c", "echo nope >&2; exit 3"]), "failing", &sink)
            .await;
        let detail = outcome.failure_detail().unwrap();
        assert!(detail.contains("exit status 3"), "{detail}");
        assert!(detail.contains("nope"), "{detail}");

        let events = drain_ready(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, outcome);
    }

    #[tokio::test]
    async fn missing_program_reports_failure() {
        let (sink, mut rx) = ChannelSink::new();
        let runner = CommandRunner::new(ProcessSpawner);
        let ok = runner
            .run(&argv(&["xray-load-definitely-not-installed"]), "missing", &sink)
            .await;
        assert!(!ok);
        let events = drain_ready(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].response_length, 0);
        assert!(!events[0].outcome.is_success());
    }

    #[tokio::test]
    async fn empty_argv_is_a_failure() {
        let (sink, mut rx) = ChannelSink::new();
        let runner = CommandRunner::new(ProcessSpawner);
        assert!(!runner.run(&[], "empty", &sink).await);
        assert_eq!(drain_ready(&mut rx).len(), 1);
    }
}
