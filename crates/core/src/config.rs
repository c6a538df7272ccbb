use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_REPO_NAME: &str = "test-repo";
pub const DEFAULT_IMAGE: &str = "alpine:3.9";
pub const DEFAULT_TAG: &str = "new-image";
pub const DEFAULT_VERSION: &str = "latest";

/// Fixed apply-watch window. Kept as literals so runs are comparable; override per run.
pub const DEFAULT_WATCH_START: &str = "2025-05-10T00:00:00+05:00";
pub const DEFAULT_WATCH_END: &str = "2025-05-15T00:00:00+05:30";

const MAX_REPO_KEY_LEN: usize = 64;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("hostname must not be empty")]
    EmptyHostname,
    #[error("hostname must be a bare host[:port], got: {0}")]
    InvalidHostname(String),
    #[error("base url must start with http:// or https://, got: {0}")]
    InvalidBaseUrl(String),
    #[error("repository key must not be empty")]
    EmptyRepoName,
    #[error("invalid repository key: {0}")]
    InvalidRepoName(String),
    #[error("image reference must not be empty")]
    EmptyImage,
    #[error("min wait ({min:?}) is greater than max wait ({max:?})")]
    WaitBounds { min: Duration, max: Duration },
    #[error("at least one user is required")]
    NoUsers,
    #[error("spawn rate must be positive, got: {0}")]
    SpawnRate(f64),
    #[error("starting {users} users at {spawn_rate}/s does not fit in a duration")]
    SpawnSchedule { users: usize, spawn_rate: f64 },
    #[error("not a valid number of seconds: {0}")]
    Seconds(f64),
}

/// Platform credentials. `Debug` never prints secrets.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub token: String,
}

impl Credentials {
    /// Value for the `Authorization` header.
    ///
    /// A token already carrying a scheme (`Bearer ...`, `Basic ...`) is sent as-is.
    pub fn authorization(&self) -> String {
        let token = self.token.trim();
        if token.contains(' ') {
            token.to_string()
        } else {
            format!("Bearer {token}")
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Image pushed by the docker task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageSpec {
    /// Source image pulled from the public registry.
    pub image: String,
    pub tag: String,
    pub version: String,
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            tag: DEFAULT_TAG.to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

impl ImageSpec {
    /// `<host>/<repo>/<tag>/<version>`
    pub fn target_ref(&self, hostname: &str, repo: &str) -> String {
        format!("{hostname}/{repo}/{}/{}", self.tag, self.version)
    }

    /// Path of the pushed manifest inside the repository.
    pub fn manifest_path(&self) -> String {
        format!("/{}/{}/manifest.json", self.tag, self.version)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start_date: DEFAULT_WATCH_START.to_string(),
            end_date: DEFAULT_WATCH_END.to_string(),
        }
    }
}

/// Everything a virtual user needs to talk to the platform.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Base URL for HTTP calls, e.g. `https://acme.jfrog.io`.
    pub base_url: String,
    /// Registry host used for docker login/tag/push.
    pub hostname: String,
    pub repo_name: String,
    pub credentials: Credentials,
    pub image: ImageSpec,
    pub watch_window: DateRange,
    /// Program invoked for docker commands.
    pub docker_bin: String,
}

impl ScenarioConfig {
    /// Config targeting `https://<hostname>` with default image and watch window.
    pub fn new(hostname: impl Into<String>, repo_name: impl Into<String>, credentials: Credentials) -> Self {
        let hostname = hostname.into();
        Self {
            base_url: format!("https://{hostname}"),
            hostname,
            repo_name: repo_name.into(),
            credentials,
            image: ImageSpec::default(),
            watch_window: DateRange::default(),
            docker_bin: "docker".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn target_ref(&self) -> String {
        self.image.target_ref(&self.hostname, &self.repo_name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_hostname(&self.hostname)?;
        validate_repo_key(&self.repo_name)?;
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.image.image.trim().is_empty() {
            return Err(ConfigError::EmptyImage);
        }
        Ok(())
    }
}

/// How many users to run and how they pace themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProfile {
    pub users: usize,
    /// Users started per second.
    pub spawn_rate: f64,
    pub run_time: Option<Duration>,
    /// Iterations per user; `None` runs until stopped.
    pub iterations: Option<u64>,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for LoadProfile {
    fn default() -> Self {
        Self {
            users: 1,
            spawn_rate: 1.0,
            run_time: None,
            iterations: None,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(3),
        }
    }
}

impl LoadProfile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.users == 0 {
            return Err(ConfigError::NoUsers);
        }
        if !self.spawn_rate.is_finite() || self.spawn_rate <= 0.0 {
            return Err(ConfigError::SpawnRate(self.spawn_rate));
        }
        self.start_delay(self.users - 1)?;
        if self.min_wait > self.max_wait {
            return Err(ConfigError::WaitBounds {
                min: self.min_wait,
                max: self.max_wait,
            });
        }
        Ok(())
    }

    /// Delay before user `index` starts: `index / spawn_rate` seconds.
    pub fn start_delay(&self, index: usize) -> Result<Duration, ConfigError> {
        let overflow = || ConfigError::SpawnSchedule {
            users: self.users,
            spawn_rate: self.spawn_rate,
        };
        let interval = duration_from_secs(1.0 / self.spawn_rate).map_err(|_| overflow())?;
        u32::try_from(index)
            .ok()
            .and_then(|n| interval.checked_mul(n))
            .ok_or_else(overflow)
    }
}

/// Seconds as a `Duration`. Negative, NaN and out-of-range values are rejected.
pub fn duration_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::Seconds(secs))
}

pub fn validate_hostname(hostname: &str) -> Result<(), ConfigError> {
    let h = hostname.trim();
    if h.is_empty() {
        return Err(ConfigError::EmptyHostname);
    }
    if h.contains("://") || h.contains('/') || h.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidHostname(hostname.to_string()));
    }
    Ok(())
}

/// Repository keys: ASCII letters, digits, `-`, `_` and `.`; at most 64 chars.
pub fn validate_repo_key(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::EmptyRepoName);
    }
    let ok_chars = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !ok_chars || key.len() > MAX_REPO_KEY_LEN || key.starts_with('.') {
        return Err(ConfigError::InvalidRepoName(key.to_string()));
    }
    Ok(())
}
