use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use serde::Serialize;
use uuid::Uuid;

const LATENCY_WINDOW: usize = 1000;

/// Request correlation ID for tracing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Arc<str>);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Default)]
struct MetricsInner {
    requests_total: u64,
    requests_succeeded: u64,
    errors_by_type: HashMap<&'static str, u64>,
    latencies_ms: Vec<u64>,
}

/// Request counters for the /metrics endpoint
pub struct RequestMetrics {
    inner: RwLock<MetricsInner>,
    started: Instant,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MetricsInner::default()),
            started: Instant::now(),
        }
    }

    pub async fn record_request(&self) {
        let mut inner = self.inner.write().await;
        inner.requests_total += 1;
    }

    pub async fn record_success(&self, latency_ms: u64) {
        let mut inner = self.inner.write().await;
        inner.requests_succeeded += 1;
        if inner.latencies_ms.len() >= LATENCY_WINDOW {
            inner.latencies_ms.remove(0);
        }
        inner.latencies_ms.push(latency_ms);
    }

    pub async fn record_error(&self, error: &crate::Error) {
        let mut inner = self.inner.write().await;
        *inner.errors_by_type.entry(error.error_type()).or_insert(0) += 1;
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.read().await;
        let avg_latency_ms = if inner.latencies_ms.is_empty() {
            0
        } else {
            inner.latencies_ms.iter().sum::<u64>() / inner.latencies_ms.len() as u64
        };

        MetricsSnapshot {
            uptime_seconds: self.started.elapsed().as_secs(),
            requests_total: inner.requests_total,
            requests_succeeded: inner.requests_succeeded,
            avg_latency_ms,
            errors_by_type: inner
                .errors_by_type
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the counters
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub requests_total: u64,
    pub requests_succeeded: u64,
    pub avg_latency_ms: u64,
    pub errors_by_type: HashMap<String, u64>,
}
