//! Request bodies for the Artifactory and Xray endpoints the scenario calls.

use serde::{Deserialize, Serialize};

use crate::config::{DateRange, ScenarioConfig};

pub const REPOSITORIES_PATH: &str = "/artifactory/api/repositories";
pub const POLICIES_PATH: &str = "/xray/api/v2/policies";
pub const WATCHES_PATH: &str = "/xray/api/v2/watches";
pub const APPLY_WATCH_PATH: &str = "/xray/api/v1/applyWatch";
pub const ARTIFACT_STATUS_PATH: &str = "/xray/api/v1/artifact/status";
pub const VIOLATIONS_PATH: &str = "/xray/api/v1/violations";

pub fn repository_path(repo: &str) -> String {
    format!("{REPOSITORIES_PATH}/{repo}")
}

/// `PUT /artifactory/api/repositories/{repo}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepoRequest {
    pub key: String,
    pub project_key: String,
    pub package_type: String,
    pub rclass: String,
    pub xray_index: bool,
}

impl CreateRepoRequest {
    pub fn docker_local(repo: &str) -> Self {
        Self {
            key: repo.to_string(),
            project_key: String::new(),
            package_type: "docker".to_string(),
            rclass: "local".to_string(),
            xray_index: true,
        }
    }
}

/// `POST /xray/api/v2/policies`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRequest {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    pub rules: Vec<PolicyRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRule {
    pub name: String,
    pub criteria: PolicyCriteria,
    pub actions: PolicyActions,
    pub priority: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyCriteria {
    pub malicious_package: bool,
    pub fix_version_dependant: bool,
    pub min_severity: String,
}

/// Automated responses to a violation. All off for this scenario.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyActions {
    pub mails: Vec<String>,
    pub webhooks: Vec<String>,
    pub fail_build: bool,
    pub block_release_bundle_distribution: bool,
    pub block_release_bundle_promotion: bool,
    pub notify_deployer: bool,
    pub notify_watch_recipients: bool,
    pub create_ticket_enabled: bool,
    pub block_download: BlockDownload,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockDownload {
    pub active: bool,
    pub unscanned: bool,
}

impl PolicyRequest {
    /// Security policy with a single high-severity rule and no automated actions.
    pub fn high_severity(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: "This is a specific CVEs security policy".to_string(),
            policy_type: "security".to_string(),
            rules: vec![PolicyRule {
                name: "some_rule".to_string(),
                criteria: PolicyCriteria {
                    malicious_package: false,
                    fix_version_dependant: false,
                    min_severity: "high".to_string(),
                },
                actions: PolicyActions::default(),
                priority: 1,
            }],
        }
    }
}

/// `POST /xray/api/v2/watches`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchRequest {
    pub general_data: WatchGeneralData,
    pub project_resources: ProjectResources,
    pub assigned_policies: Vec<AssignedPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchGeneralData {
    pub name: String,
    pub description: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectResources {
    pub resources: Vec<WatchResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub bin_mgr_id: String,
    pub name: String,
    pub filters: Vec<ResourceFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceFilter {
    #[serde(rename = "type")]
    pub filter_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignedPolicy {
    pub name: String,
    #[serde(rename = "type")]
    pub policy_type: String,
}

impl WatchRequest {
    /// Watch over every path of `repo`, bound to `policy_name`.
    pub fn repository(watch_name: &str, policy_name: &str, repo: &str) -> Self {
        Self {
            general_data: WatchGeneralData {
                name: watch_name.to_string(),
                description: "This is an example watch #1".to_string(),
                active: true,
            },
            project_resources: ProjectResources {
                resources: vec![WatchResource {
                    resource_type: "repository".to_string(),
                    bin_mgr_id: "default".to_string(),
                    name: repo.to_string(),
                    filters: vec![ResourceFilter {
                        filter_type: "regex".to_string(),
                        value: ".*".to_string(),
                    }],
                }],
            },
            assigned_policies: vec![AssignedPolicy {
                name: policy_name.to_string(),
                policy_type: "security".to_string(),
            }],
        }
    }
}

/// `POST /xray/api/v1/applyWatch`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyWatchRequest {
    pub watch_names: Vec<String>,
    pub date_range: DateRange,
}

impl ApplyWatchRequest {
    pub fn single(watch_name: &str, date_range: &DateRange) -> Self {
        Self {
            watch_names: vec![watch_name.to_string()],
            date_range: date_range.clone(),
        }
    }
}

/// `POST /xray/api/v1/artifact/status`, also the artifact filter in violation queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactRef {
    pub repo: String,
    pub path: String,
}

impl ArtifactRef {
    /// Manifest of the image the docker task pushes.
    pub fn pushed_manifest(cfg: &ScenarioConfig) -> Self {
        Self {
            repo: cfg.repo_name.clone(),
            path: cfg.image.manifest_path(),
        }
    }
}

/// `POST /xray/api/v1/violations`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViolationsRequest {
    pub filters: ViolationFilters,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViolationFilters {
    pub watch_name: String,
    pub violation_type: String,
    pub min_severity: String,
    pub resources: ViolationResources,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViolationResources {
    pub artifacts: Vec<ArtifactRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub order_by: String,
    pub direction: String,
    pub limit: u32,
    pub offset: u32,
}

impl ViolationsRequest {
    /// High-severity security violations reported by `watch_name` for `artifact`.
    pub fn for_watch(watch_name: &str, artifact: ArtifactRef) -> Self {
        Self {
            filters: ViolationFilters {
                watch_name: watch_name.to_string(),
                violation_type: "Security".to_string(),
                min_severity: "High".to_string(),
                resources: ViolationResources {
                    artifacts: vec![artifact],
                },
            },
            pagination: Pagination {
                order_by: "created".to_string(),
                direction: "asc".to_string(),
                limit: 100,
                offset: 1,
            },
        }
    }
}
