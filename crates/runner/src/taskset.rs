//! The scenario: an ordered set of tasks run by every virtual user.
//!
//! Tasks never return errors. Each step reports its own outcome to the
//! event sink and to the caller, and the sequence always moves on to the
//! next task.

use std::sync::Arc;

use tracing::info;
use xray_load_core::api::{
    self, ApplyWatchRequest, ArtifactRef, CreateRepoRequest, PolicyRequest, ViolationsRequest,
    WatchRequest,
};
use xray_load_core::{
    classify_create_repo, classify_response, ScanNames, ScenarioConfig, StepOutcome, StepReport,
    TaskName, TaskReport,
};

use crate::command::{CommandRunner, ProcessSpawner, Spawn};
use crate::events::EventSink;
use crate::http::Session;

pub const DOCKER_PULL: &str = "docker pull";
pub const DOCKER_LOGIN: &str = "docker login";
pub const DOCKER_TAG: &str = "docker tag";
pub const DOCKER_PUSH: &str = "docker push";

pub const CREATE_POLICY: &str = "create_policy";
pub const CREATE_WATCH: &str = "create_watch";
pub const APPLY_WATCH: &str = "apply_watch";
pub const CHECK_SCAN_STATUS: &str = "check_scan_status";
pub const VERIFY_VIOLATIONS: &str = "verify_violations";

pub struct TaskSet<S = ProcessSpawner> {
    config: Arc<ScenarioConfig>,
    session: Session,
    runner: CommandRunner<S>,
    sink: Arc<dyn EventSink>,
}

impl<S: Spawn> TaskSet<S> {
    pub fn new(
        config: Arc<ScenarioConfig>,
        session: Session,
        runner: CommandRunner<S>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            session,
            runner,
            sink,
        }
    }

    pub async fn run_task(&self, task: TaskName) -> TaskReport {
        match task {
            TaskName::CreateRepo => self.create_repo().await,
            TaskName::VerifyRepo => self.verify_repo().await,
            TaskName::DockerPlugin => self.docker_plugin().await,
            TaskName::CreateAndApplyPolicyAndWatch => {
                self.create_and_apply_policy_and_watch().await
            }
        }
    }

    /// Create the docker repository. A 400 for an existing key counts as success.
    pub async fn create_repo(&self) -> TaskReport {
        let repo = &self.config.repo_name;
        let outcome = self
            .session
            .put_json(
                &api::repository_path(repo),
                TaskName::CreateRepo.as_str(),
                &CreateRepoRequest::docker_local(repo),
                create_repo_verdict,
                self.sink.as_ref(),
            )
            .await;
        single(TaskName::CreateRepo, outcome)
    }

    pub async fn verify_repo(&self) -> TaskReport {
        let outcome = self
            .session
            .get(
                api::REPOSITORIES_PATH,
                TaskName::VerifyRepo.as_str(),
                classify_response,
                self.sink.as_ref(),
            )
            .await;
        single(TaskName::VerifyRepo, outcome)
    }

    /// pull -> login -> tag -> push, stopping at the first failing command.
    pub async fn docker_plugin(&self) -> TaskReport {
        let cfg = &self.config;
        let docker = cfg.docker_bin.as_str();
        let target = cfg.target_ref();

        let chain: [(&str, Vec<String>); 4] = [
            (DOCKER_PULL, argv(&[docker, "pull", &cfg.image.image])),
            (
                DOCKER_LOGIN,
                argv(&[
                    docker,
                    "login",
                    &cfg.hostname,
                    "-u",
                    &cfg.credentials.username,
                    "-p",
                    &cfg.credentials.password,
                ]),
            ),
            (DOCKER_TAG, argv(&[docker, "tag", &cfg.image.image, &target])),
            (DOCKER_PUSH, argv(&[docker, "push", &target])),
        ];

        let mut steps = Vec::with_capacity(chain.len());
        for (name, cmd) in &chain {
            let outcome = self
                .runner
                .run_with_outcome(cmd, name, self.sink.as_ref())
                .await;
            let ok = outcome.is_success();
            steps.push(StepReport::new(*name, outcome));
            if !ok {
                break;
            }
        }

        TaskReport {
            task: TaskName::DockerPlugin,
            steps,
        }
    }

    pub async fn create_and_apply_policy_and_watch(&self) -> TaskReport {
        let names = ScanNames::generate();
        self.create_and_apply_with(&names).await
    }

    /// Runs all five calls with the given names. A failed call does not stop the rest.
    pub async fn create_and_apply_with(&self, names: &ScanNames) -> TaskReport {
        let steps = vec![
            self.create_policy(&names.policy).await,
            self.create_watch(&names.policy, &names.watch).await,
            self.apply_watch(&names.watch).await,
            self.check_scan_status().await,
            self.verify_violations(&names.watch).await,
        ];
        TaskReport {
            task: TaskName::CreateAndApplyPolicyAndWatch,
            steps,
        }
    }

    pub async fn create_policy(&self, policy_name: &str) -> StepReport {
        self.post(
            api::POLICIES_PATH,
            CREATE_POLICY,
            &PolicyRequest::high_severity(policy_name),
        )
        .await
    }

    pub async fn create_watch(&self, policy_name: &str, watch_name: &str) -> StepReport {
        let body = WatchRequest::repository(watch_name, policy_name, &self.config.repo_name);
        self.post(api::WATCHES_PATH, CREATE_WATCH, &body).await
    }

    pub async fn apply_watch(&self, watch_name: &str) -> StepReport {
        let body = ApplyWatchRequest::single(watch_name, &self.config.watch_window);
        self.post(api::APPLY_WATCH_PATH, APPLY_WATCH, &body).await
    }

    pub async fn check_scan_status(&self) -> StepReport {
        let body = ArtifactRef::pushed_manifest(&self.config);
        self.post(api::ARTIFACT_STATUS_PATH, CHECK_SCAN_STATUS, &body)
            .await
    }

    pub async fn verify_violations(&self, watch_name: &str) -> StepReport {
        let body =
            ViolationsRequest::for_watch(watch_name, ArtifactRef::pushed_manifest(&self.config));
        self.post(api::VIOLATIONS_PATH, VERIFY_VIOLATIONS, &body)
            .await
    }

    async fn post<B: serde::Serialize>(&self, path: &str, name: &str, body: &B) -> StepReport {
        let outcome = self
            .session
            .post_json(path, name, body, classify_response, self.sink.as_ref())
            .await;
        StepReport::new(name, outcome)
    }
}

fn create_repo_verdict(status: u16, body: &str) -> StepOutcome {
    let outcome = classify_create_repo(status, body);
    if reused_existing_repo(status, &outcome) {
        info!("repository already created");
    }
    outcome
}

/// An error status that still counts as success means the key was already taken.
fn reused_existing_repo(status: u16, outcome: &StepOutcome) -> bool {
    status >= 400 && outcome.is_success()
}

fn single(task: TaskName, outcome: StepOutcome) -> TaskReport {
    TaskReport {
        task,
        steps: vec![StepReport::new(task.as_str(), outcome)],
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
