use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xray_load::{report, run_load, ProcessSpawner};
use xray_load_core::{
    duration_from_secs, ConfigError, Credentials, DateRange, ImageSpec, LoadProfile,
    ScenarioConfig, DEFAULT_IMAGE, DEFAULT_REPO_NAME, DEFAULT_TAG, DEFAULT_VERSION, DEFAULT_WATCH_END, DEFAULT_WATCH_START,
};

#[derive(Parser, Debug)]
#[command(name = "xray-load", version, about = "Load scenario for Artifactory + Xray")]
struct Args {
    /// Platform hostname, e.g. acme.jfrog.io. Also used as the docker registry.
    #[arg(long, env = "XRAY_LOAD_HOSTNAME")]
    hostname: String,

    /// Repository key to create and push into.
    #[arg(long, env = "XRAY_LOAD_REPO", default_value = DEFAULT_REPO_NAME)]
    repo_name: String,

    /// Base URL override. Defaults to https://<hostname>.
    #[arg(long)]
    host: Option<String>,

    #[arg(long, env = "USERNAME", default_value = "", hide_env_values = true)]
    username: String,

    #[arg(long, env = "PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Access token for the Authorization header.
    #[arg(long, env = "TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Image pulled, tagged and pushed.
    #[arg(long, default_value = DEFAULT_IMAGE)]
    image: String,

    #[arg(long, default_value = DEFAULT_TAG)]
    tag: String,

    #[arg(long, default_value = DEFAULT_VERSION)]
    version_tag: String,

    /// Program used for docker commands.
    #[arg(long, default_value = "docker")]
    docker_bin: String,

    /// apply_watch window start (RFC 3339).
    #[arg(long, default_value = DEFAULT_WATCH_START)]
    watch_start: String,

    /// apply_watch window end (RFC 3339).
    #[arg(long, default_value = DEFAULT_WATCH_END)]
    watch_end: String,

    /// Number of concurrent virtual users.
    #[arg(long, short = 'u', default_value_t = 1)]
    users: usize,

    /// Users started per second.
    #[arg(long, short = 'r', default_value_t = 1.0)]
    spawn_rate: f64,

    /// Stop after this many seconds.
    #[arg(long)]
    run_time_secs: Option<u64>,

    /// Stop each user after this many passes over the task set.
    #[arg(long)]
    iterations: Option<u64>,

    #[arg(long, default_value_t = 1.0)]
    min_wait_secs: f64,

    #[arg(long, default_value_t = 3.0)]
    max_wait_secs: f64,

    #[arg(long, default_value_t = 60)]
    request_timeout_secs: u64,

    /// Also write the final statistics as JSON.
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Log level (env-filter syntax).
    #[arg(long, default_value = "info")]
    log: String,
}

impl Args {
    fn scenario(&self) -> ScenarioConfig {
        let credentials = Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            token: self.token.clone(),
        };
        let mut cfg = ScenarioConfig::new(&self.hostname, &self.repo_name, credentials);
        if let Some(host) = &self.host {
            cfg = cfg.with_base_url(host);
        }
        cfg.image = ImageSpec {
            image: self.image.clone(),
            tag: self.tag.clone(),
            version: self.version_tag.clone(),
        };
        cfg.watch_window = DateRange {
            start_date: self.watch_start.clone(),
            end_date: self.watch_end.clone(),
        };
        cfg.docker_bin = self.docker_bin.clone();
        cfg
    }

    fn profile(&self) -> Result<LoadProfile, ConfigError> {
        Ok(LoadProfile {
            users: self.users,
            spawn_rate: self.spawn_rate,
            run_time: self.run_time_secs.map(Duration::from_secs),
            iterations: self.iterations,
            min_wait: duration_from_secs(self.min_wait_secs)?,
            max_wait: duration_from_secs(self.max_wait_secs)?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials usually live in .env; a missing file is fine.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Arc::new(args.scenario());
    let profile = args.profile().context("invalid load profile")?;
    if config.credentials.token.is_empty() {
        warn!("TOKEN is not set; platform calls will likely be rejected");
    }

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    };

    let summary = run_load(
        config,
        &profile,
        Duration::from_secs(args.request_timeout_secs),
        ProcessSpawner,
        shutdown,
    )
    .await?;

    report::print_report(&summary);
    if let Some(path) = &args.json_report {
        report::write_json(path, &summary).await?;
        info!("wrote {}", path.display());
    }

    Ok(())
}
