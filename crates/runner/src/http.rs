use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::Serialize;
use tracing::{debug, warn};
use xray_load_core::{elapsed_ms, RequestEvent, RequestType, ScenarioConfig, StepOutcome};

use crate::events::EventSink;

/// Decides whether a status/body pair counts as success.
pub type Classifier = fn(u16, &str) -> StepOutcome;

/// HTTP client bound to the platform base URL with auth headers preset.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    base_url: String,
}

impl Session {
    pub fn new(cfg: &ScenarioConfig, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&cfg.credentials.authorization())
            .context("token is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get(
        &self,
        path: &str,
        name: &str,
        classify: Classifier,
        sink: &dyn EventSink,
    ) -> StepOutcome {
        self.send(Verb::Get, path, name, None, classify, sink).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        name: &str,
        body: &B,
        classify: Classifier,
        sink: &dyn EventSink,
    ) -> StepOutcome {
        let body = encode(body);
        self.send(Verb::Put, path, name, Some(body), classify, sink).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        name: &str,
        body: &B,
        classify: Classifier,
        sink: &dyn EventSink,
    ) -> StepOutcome {
        let body = encode(body);
        self.send(Verb::Post, path, name, Some(body), classify, sink).await
    }

    /// Issue one request and fire exactly one event for it.
    ///
    /// Response time covers the full body download.
    async fn send(
        &self,
        verb: Verb,
        path: &str,
        name: &str,
        body: Option<Result<Vec<u8>, String>>,
        classify: Classifier,
        sink: &dyn EventSink,
    ) -> StepOutcome {
        let request_type = verb.request_type();
        let started = Instant::now();
        let (outcome, response_length) = match body {
            Some(Err(e)) => (StepOutcome::Failure(format!("encode request body: {e}")), 0),
            Some(Ok(bytes)) => self.exchange(verb, path, Some(bytes), classify).await,
            None => self.exchange(verb, path, None, classify).await,
        };
        let response_time_ms = elapsed_ms(started.elapsed());

        match &outcome {
            StepOutcome::Success => debug!(step = name, %request_type, response_time_ms, "request succeeded"),
            StepOutcome::Failure(detail) => warn!(step = name, %request_type, response_time_ms, "{detail}"),
        }

        sink.fire(RequestEvent {
            request_type,
            name: name.to_string(),
            response_time_ms,
            response_length,
            outcome: outcome.clone(),
        });
        outcome
    }

    async fn exchange(
        &self,
        verb: Verb,
        path: &str,
        body: Option<Vec<u8>>,
        classify: Classifier,
    ) -> (StepOutcome, usize) {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(verb.method(), &url);
        if let Some(bytes) = body {
            req = req.body(bytes);
        }

        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => return (StepOutcome::Failure(format!("request to {url} failed: {e}")), 0),
        };
        let status = resp.status().as_u16();
        match resp.bytes().await {
            Ok(bytes) => (classify(status, &String::from_utf8_lossy(&bytes)), bytes.len()),
            Err(e) => (
                StepOutcome::Failure(format!("read response from {url} (status {status}): {e}")),
                0,
            ),
        }
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>, String> {
    serde_json::to_vec(body).map_err(|e| e.to_string())
}

/// HTTP methods the scenario issues.
#[derive(Debug, Clone, Copy)]
enum Verb {
    Get,
    Put,
    Post,
}

impl Verb {
    fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Put => Method::PUT,
            Verb::Post => Method::POST,
        }
    }

    fn request_type(self) -> RequestType {
        match self {
            Verb::Get => RequestType::Get,
            Verb::Put => RequestType::Put,
            Verb::Post => RequestType::Post,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_map_to_matching_request_types() {
        for verb in [Verb::Get, Verb::Put, Verb::Post] {
            assert_eq!(verb.method().as_str(), verb.request_type().as_str());
        }
    }
}
