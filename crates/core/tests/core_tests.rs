//! Integration tests for the core crate.

use serde_json::json;
use xray_load_core::api::{
    repository_path, ApplyWatchRequest, ArtifactRef, CreateRepoRequest, PolicyRequest,
    ViolationsRequest, WatchRequest,
};
use xray_load_core::{
    Credentials, DateRange, RequestEvent, RequestType, ScenarioConfig, StepOutcome, TaskName,
};

#[test]
fn test_create_repo_body() {
    let body = serde_json::to_value(CreateRepoRequest::docker_local("test-repo")).unwrap();
    assert_eq!(
        body,
        json!({
            "key": "test-repo",
            "projectKey": "",
            "packageType": "docker",
            "rclass": "local",
            "xrayIndex": true
        })
    );
    assert_eq!(repository_path("test-repo"), "/artifactory/api/repositories/test-repo");
}

#[test]
fn test_policy_body() {
    let body = serde_json::to_value(PolicyRequest::high_severity("sec_policy_12345")).unwrap();
    assert_eq!(body["name"], "sec_policy_12345");
    assert_eq!(body["type"], "security");
    let rule = &body["rules"][0];
    assert_eq!(rule["criteria"]["min_severity"], "high");
    assert_eq!(rule["priority"], 1);
    assert_eq!(rule["actions"]["fail_build"], false);
    assert_eq!(rule["actions"]["block_download"], json!({"active": false, "unscanned": false}));
    assert_eq!(rule["actions"]["mails"], json!([]));
}

#[test]
fn test_watch_body() {
    let body =
        serde_json::to_value(WatchRequest::repository("watch55555", "sec_policy_1", "test-repo"))
            .unwrap();
    assert_eq!(body["general_data"]["name"], "watch55555");
    assert_eq!(body["general_data"]["active"], true);
    let res = &body["project_resources"]["resources"][0];
    assert_eq!(res["type"], "repository");
    assert_eq!(res["bin_mgr_id"], "default");
    assert_eq!(res["name"], "test-repo");
    assert_eq!(res["filters"], json!([{"type": "regex", "value": ".*"}]));
    assert_eq!(
        body["assigned_policies"],
        json!([{"name": "sec_policy_1", "type": "security"}])
    );
}

#[test]
fn test_apply_watch_body_uses_fixed_window() {
    let body = serde_json::to_value(ApplyWatchRequest::single("watch1", &DateRange::default()))
        .unwrap();
    assert_eq!(
        body,
        json!({
            "watch_names": ["watch1"],
            "date_range": {
                "start_date": "2025-05-10T00:00:00+05:00",
                "end_date": "2025-05-15T00:00:00+05:30"
            }
        })
    );
}

#[test]
fn test_violations_body() {
    let cfg = ScenarioConfig::new("acme.jfrog.io", "test-repo", Credentials::default());
    let req = ViolationsRequest::for_watch("watch1", ArtifactRef::pushed_manifest(&cfg));
    let body = serde_json::to_value(req).unwrap();
    assert_eq!(body["filters"]["watch_name"], "watch1");
    assert_eq!(body["filters"]["violation_type"], "Security");
    assert_eq!(body["filters"]["min_severity"], "High");
    assert_eq!(
        body["filters"]["resources"]["artifacts"],
        json!([{"repo": "test-repo", "path": "/new-image/latest/manifest.json"}])
    );
    assert_eq!(
        body["pagination"],
        json!({"order_by": "created", "direction": "asc", "limit": 100, "offset": 1})
    );
}

#[test]
fn test_request_type_serde() {
    assert_eq!(serde_json::to_string(&RequestType::Docker).unwrap(), r#""DOCKER""#);
    assert_eq!(RequestType::Post.to_string(), "POST");
}

#[test]
fn test_request_event_serde() {
    let ev = RequestEvent {
        request_type: RequestType::Docker,
        name: "docker pull".into(),
        response_time_ms: 12.5,
        response_length: 3,
        outcome: StepOutcome::Failure("exit 1".into()),
    };
    let v = serde_json::to_value(&ev).unwrap();
    assert_eq!(v["outcome"], json!({"status": "failure", "detail": "exit 1"}));
    let back: RequestEvent = serde_json::from_value(v).unwrap();
    assert_eq!(back, ev);
}

#[test]
fn test_task_order() {
    let names: Vec<_> = TaskName::ALL.iter().map(TaskName::as_str).collect();
    assert_eq!(
        names,
        [
            "create_repo",
            "verify_repo",
            "docker_plugin",
            "create_and_apply_policy_and_watch"
        ]
    );
}
