use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;
use xray_load_core::{IterationReport, TaskName};

use crate::command::Spawn;
use crate::taskset::TaskSet;

/// Uniform pause between two bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTime {
    min: Duration,
    max: Duration,
}

impl WaitTime {
    /// Bounds are swapped if given in the wrong order.
    pub fn between(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn none() -> Self {
        Self::between(Duration::ZERO, Duration::ZERO)
    }

    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        // f64 rounding can land just past `max`.
        Duration::try_from_secs_f64(secs).map_or(self.max, |d| d.min(self.max))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub user_id: Uuid,
    pub iterations: u64,
    pub failed_steps: u64,
}

/// One simulated client running the task set in a loop.
pub struct VirtualUser<S> {
    id: Uuid,
    tasks: TaskSet<S>,
    wait: WaitTime,
}

impl<S: Spawn> VirtualUser<S> {
    pub fn new(tasks: TaskSet<S>, wait: WaitTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            tasks,
            wait,
        }
    }

    /// Loop until `stop` flips, or `iterations` passes complete.
    ///
    /// The stop flag is checked between tasks and interrupts pauses.
    pub async fn run(self, iterations: Option<u64>, mut stop: watch::Receiver<bool>) -> UserSummary {
        let span = info_span!("user", user_id = %self.id);
        async move {
            info!("user started");
            let mut summary = UserSummary {
                user_id: self.id,
                iterations: 0,
                failed_steps: 0,
            };

            while iterations.map_or(true, |n| summary.iterations < n) {
                let mut report = IterationReport::default();
                let mut stopped = false;
                for (i, task) in TaskName::ALL.into_iter().enumerate() {
                    if *stop.borrow() {
                        stopped = true;
                        break;
                    }
                    let task_report = self.tasks.run_task(task).await;
                    debug!(task = %task, succeeded = task_report.succeeded(), "task finished");
                    report.tasks.push(task_report);

                    if pauses_after(i, summary.iterations, iterations)
                        && pause(self.wait.sample(), &mut stop).await
                    {
                        stopped = true;
                        break;
                    }
                }

                let failed = report.failures();
                summary.failed_steps += failed as u64;
                if report.tasks.len() == TaskName::ALL.len() {
                    summary.iterations += 1;
                    debug!(iteration = summary.iterations, failed, "iteration finished");
                }
                if stopped {
                    break;
                }
            }

            info!(iterations = summary.iterations, failed_steps = summary.failed_steps, "user stopped");
            summary
        }
        .instrument(span)
        .await
    }
}

/// No pause follows the last task of the last pass.
fn pauses_after(task_index: usize, pass: u64, iterations: Option<u64>) -> bool {
    let last_task = task_index + 1 == TaskName::ALL.len();
    let last_pass = iterations.is_some_and(|n| pass + 1 >= n);
    !(last_task && last_pass)
}

/// Sleep for `d`. Returns `true` if stopped while waiting.
pub(crate) async fn pause(d: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    if d.is_zero() {
        return *stop.borrow();
    }
    let closed = tokio::select! {
        _ = tokio::time::sleep(d) => false,
        res = stop.changed() => res.is_err(),
    };
    closed || *stop.borrow()
}
