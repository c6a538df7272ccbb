//! Success rules for platform responses.

use serde::Deserialize;

use crate::model::StepOutcome;

const ALREADY_EXISTS: &str = "repository key already exists";

/// Artifactory error body: `{"errors":[{"status":400,"message":"..."}]}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEntry {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: String,
}

/// `status < 400` succeeds, anything else fails with status and body attached.
pub fn classify_response(status: u16, body: &str) -> StepOutcome {
    if status < 400 {
        StepOutcome::Success
    } else {
        StepOutcome::Failure(failure_message(status, body))
    }
}

/// Repository creation also tolerates a 400 saying the key already exists.
pub fn classify_create_repo(status: u16, body: &str) -> StepOutcome {
    if status == 400 && is_already_exists(body) {
        return StepOutcome::Success;
    }
    classify_response(status, body)
}

pub fn failure_message(status: u16, body: &str) -> String {
    format!("Return status code: {status} Return response : {body}")
}

/// Checks the structured error list first; non-JSON bodies fall back to a substring match.
pub fn is_already_exists(body: &str) -> bool {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.iter().any(|e| {
            e.status.map_or(true, |s| s == 400)
                && e.message.to_ascii_lowercase().contains(ALREADY_EXISTS)
        }),
        _ => body.to_ascii_lowercase().contains(ALREADY_EXISTS),
    }
}
