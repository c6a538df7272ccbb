//! Minimal host runtime: spawns virtual users, stops them, aggregates events.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};
use xray_load_core::{LoadProfile, ScenarioConfig};

use crate::command::{CommandRunner, Spawn};
use crate::events::{ChannelSink, EventSink};
use crate::http::Session;
use crate::stats::{StatsCollector, StatsSnapshot};
use crate::taskset::TaskSet;
use crate::user::{pause, UserSummary, VirtualUser, WaitTime};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every user finished its iterations.
    Completed,
    RunTimeElapsed,
    Interrupted,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub stop_reason: StopReason,
    pub elapsed_secs: f64,
    pub users: Vec<UserSummary>,
    pub stats: StatsSnapshot,
}

impl RunSummary {
    pub fn iterations(&self) -> u64 {
        self.users.iter().map(|u| u.iterations).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.stats.total.failures > 0
    }
}

/// Run the scenario under `profile` until done, timed out, or `shutdown` resolves.
///
/// Users are started `1 / spawn_rate` seconds apart. Stopping lets each user
/// finish its current task; nothing is cancelled mid-request.
pub async fn run_load<S, F>(
    config: Arc<ScenarioConfig>,
    profile: &LoadProfile,
    request_timeout: Duration,
    spawner: S,
    shutdown: F,
) -> Result<RunSummary>
where
    S: Spawn + Clone + 'static,
    F: Future<Output = ()>,
{
    config.validate().context("invalid scenario config")?;
    profile.validate().context("invalid load profile")?;

    let (sink, mut rx) = ChannelSink::new();
    let collector = tokio::spawn(async move {
        let mut stats = StatsCollector::new();
        while let Some(ev) = rx.recv().await {
            stats.record(&ev);
        }
        stats
    });

    let sink: Arc<dyn EventSink> = Arc::new(sink);
    let (stop_tx, stop_rx) = watch::channel(false);
    let wait = WaitTime::between(profile.min_wait, profile.max_wait);

    info!(
        users = profile.users,
        spawn_rate = profile.spawn_rate,
        run_time = ?profile.run_time,
        iterations = ?profile.iterations,
        host = %config.base_url,
        "starting load"
    );
    if profile.run_time.is_none() && profile.iterations.is_none() {
        info!("no run time or iteration limit; running until interrupted");
    }

    let started = Instant::now();
    let mut users = JoinSet::new();
    for i in 0..profile.users {
        let session = Session::new(&config, request_timeout)?;
        let tasks = TaskSet::new(
            Arc::clone(&config),
            session,
            CommandRunner::new(spawner.clone()),
            Arc::clone(&sink),
        );
        let user = VirtualUser::new(tasks, wait);
        let delay = profile.start_delay(i).context("invalid load profile")?;
        let iterations = profile.iterations;
        let mut stop = stop_rx.clone();

        users.spawn(async move {
            if pause(delay, &mut stop).await {
                return None;
            }
            Some(user.run(iterations, stop).await)
        });
    }
    drop(sink);

    let run_time = profile.run_time;
    let deadline = async move {
        match run_time {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };

    let mut summaries = Vec::with_capacity(profile.users);
    let stop_reason = tokio::select! {
        _ = join_users(&mut users, &mut summaries) => StopReason::Completed,
        _ = deadline => StopReason::RunTimeElapsed,
        _ = shutdown => StopReason::Interrupted,
    };

    info!(?stop_reason, "stopping users");
    let _ = stop_tx.send(true);
    join_users(&mut users, &mut summaries).await;

    let stats = collector.await.context("stats collector task")?.snapshot();
    let elapsed_secs = started.elapsed().as_secs_f64();
    info!(
        elapsed_secs,
        requests = stats.total.requests,
        failures = stats.total.failures,
        "load finished"
    );

    Ok(RunSummary {
        stop_reason,
        elapsed_secs,
        users: summaries,
        stats,
    })
}

async fn join_users(users: &mut JoinSet<Option<UserSummary>>, out: &mut Vec<UserSummary>) {
    while let Some(res) = users.join_next().await {
        match res {
            Ok(Some(summary)) => out.push(summary),
            Ok(None) => {}
            Err(e) => warn!("virtual user task failed: {e}"),
        }
    }
}
