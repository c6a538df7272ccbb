//! Per-request statistics aggregated from the event stream.

use std::collections::BTreeMap;

use serde::Serialize;
use xray_load_core::{RequestEvent, RequestType, StepOutcome};

#[derive(Debug, Default)]
struct Entry {
    requests: u64,
    failures: u64,
    total_bytes: u64,
    response_times: Vec<f64>,
    errors: BTreeMap<String, u64>,
}

impl Entry {
    fn record(&mut self, ev: &RequestEvent) {
        self.requests += 1;
        self.total_bytes += ev.response_length as u64;
        self.response_times.push(ev.response_time_ms);
        if let StepOutcome::Failure(detail) = &ev.outcome {
            self.failures += 1;
            *self.errors.entry(detail.clone()).or_default() += 1;
        }
    }
}

/// Aggregates events keyed by (request type, name).
#[derive(Debug, Default)]
pub struct StatsCollector {
    entries: BTreeMap<(RequestType, String), Entry>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, ev: &RequestEvent) {
        self.entries
            .entry((ev.request_type, ev.name.clone()))
            .or_default()
            .record(ev);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let mut entries = Vec::with_capacity(self.entries.len());
        let mut all = Entry::default();
        let mut errors = Vec::new();

        for ((request_type, name), e) in &self.entries {
            entries.push(summarize(request_type.as_str(), name, e));
            all.requests += e.requests;
            all.failures += e.failures;
            all.total_bytes += e.total_bytes;
            all.response_times.extend_from_slice(&e.response_times);
            for (detail, occurrences) in &e.errors {
                errors.push(ErrorSummary {
                    request_type: request_type.as_str().to_string(),
                    name: name.clone(),
                    error: detail.clone(),
                    occurrences: *occurrences,
                });
            }
        }
        errors.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));

        StatsSnapshot {
            entries,
            total: summarize("", "Aggregated", &all),
            errors,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntrySummary {
    pub request_type: String,
    pub name: String,
    pub requests: u64,
    pub failures: u64,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
    pub avg_bytes: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorSummary {
    pub request_type: String,
    pub name: String,
    pub error: String,
    pub occurrences: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsSnapshot {
    pub entries: Vec<EntrySummary>,
    pub total: EntrySummary,
    pub errors: Vec<ErrorSummary>,
}

impl StatsSnapshot {
    pub fn entry(&self, request_type: RequestType, name: &str) -> Option<&EntrySummary> {
        self.entries
            .iter()
            .find(|e| e.request_type == request_type.as_str() && e.name == name)
    }
}

fn summarize(request_type: &str, name: &str, e: &Entry) -> EntrySummary {
    let mut times = e.response_times.clone();
    times.sort_by(f64::total_cmp);

    let (min_ms, max_ms, avg_ms) = if times.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let sum: f64 = times.iter().sum();
        (times[0], times[times.len() - 1], sum / times.len() as f64)
    };
    let avg_bytes = if e.requests == 0 {
        0.0
    } else {
        e.total_bytes as f64 / e.requests as f64
    };

    EntrySummary {
        request_type: request_type.to_string(),
        name: name.to_string(),
        requests: e.requests,
        failures: e.failures,
        min_ms,
        avg_ms,
        median_ms: percentile(&times, 0.50),
        p95_ms: percentile(&times, 0.95),
        max_ms,
        avg_bytes,
    }
}

/// Nearest-rank percentile over sorted samples.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(name: &str, ms: f64, outcome: StepOutcome) -> RequestEvent {
        RequestEvent {
            request_type: RequestType::Post,
            name: name.into(),
            response_time_ms: ms,
            response_length: 10,
            outcome,
        }
    }

    #[test]
    fn aggregates_per_name() {
        let mut c = StatsCollector::new();
        for ms in [1.0, 2.0, 3.0, 4.0] {
            c.record(&ev("create_policy", ms, StepOutcome::Success));
        }
        c.record(&ev("create_watch", 9.0, StepOutcome::Failure("boom".into())));

        let snap = c.snapshot();
        let policy = snap.entry(RequestType::Post, "create_policy").unwrap();
        assert_eq!(policy.requests, 4);
        assert_eq!(policy.failures, 0);
        assert_eq!(policy.min_ms, 1.0);
        assert_eq!(policy.max_ms, 4.0);
        assert_eq!(policy.avg_ms, 2.5);
        assert_eq!(policy.median_ms, 2.0);
        assert_eq!(policy.avg_bytes, 10.0);

        assert_eq!(snap.total.requests, 5);
        assert_eq!(snap.total.failures, 1);
        assert_eq!(snap.errors.len(), 1);
        assert_eq!(snap.errors[0].error, "boom");
    }

    #[test]
    fn empty_snapshot_is_zeroed() {
        let snap = StatsCollector::new().snapshot();
        assert!(snap.entries.is_empty());
        assert_eq!(snap.total.requests, 0);
        assert_eq!(snap.total.p95_ms, 0.0);
    }

    #[test]
    fn percentile_nearest_rank() {
        let v: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(percentile(&v, 0.95), 95.0);
        assert_eq!(percentile(&v, 0.50), 50.0);
        assert_eq!(percentile(&[7.0], 0.95), 7.0);
    }
}
