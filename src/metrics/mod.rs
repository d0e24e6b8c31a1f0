//! In-process service metrics.
//!
//! A handful of named counter and gauge series, exposed as a JSON snapshot
//! on the ops endpoint. Series names are the constants in [`metric_names`];
//! nothing else is ever passed in, so the maps stay small and the `'static`
//! bound keeps arbitrary strings out of the registry.

use std::collections::BTreeMap;
use std::time::Instant;
use tokio::sync::RwLock;

/// Counter and gauge registry shared across handlers.
pub struct MetricsRegistry {
    started: Instant,
    counters: RwLock<BTreeMap<&'static str, u64>>,
    gauges: RwLock<BTreeMap<&'static str, u64>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            counters: RwLock::new(BTreeMap::new()),
            gauges: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn inc_counter(&self, series: &'static str) {
        self.add_counter(series, 1).await;
    }

    pub async fn add_counter(&self, series: &'static str, by: u64) {
        let mut counters = self.counters.write().await;
        *counters.entry(series).or_insert(0) += by;
    }

    pub async fn set_gauge(&self, series: &'static str, value: u64) {
        self.gauges.write().await.insert(series, value);
    }

    pub async fn counter(&self, series: &str) -> u64 {
        self.counters.read().await.get(series).copied().unwrap_or(0)
    }

    pub async fn gauge(&self, series: &str) -> u64 {
        self.gauges.read().await.get(series).copied().unwrap_or(0)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Snapshot every series for the `/metrics` endpoint.
    pub async fn to_json(&self) -> serde_json::Value {
        let counters = self.counters.read().await.clone();
        let gauges = self.gauges.read().await.clone();
        serde_json::json!({
            "uptime_seconds": self.uptime_seconds(),
            "counters": counters,
            "gauges": gauges,
        })
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The series this service tracks.
pub mod metric_names {
    pub const REGISTRATIONS: &str = "clinic.auth.registrations";
    pub const LOGINS_SUCCEEDED: &str = "clinic.auth.logins.succeeded";
    pub const LOGINS_FAILED: &str = "clinic.auth.logins.failed";

    pub const PROFILE_UPDATES: &str = "clinic.patients.profile_updates";

    pub const DB_POOL_SIZE: &str = "clinic.db.pool_size";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counters_accumulate() {
        let registry = MetricsRegistry::new();

        registry.inc_counter("test.counter").await;
        registry.inc_counter("test.counter").await;
        registry.add_counter("test.counter", 5).await;

        assert_eq!(registry.counter("test.counter").await, 7);
        assert_eq!(registry.counter("test.other").await, 0);
    }

    #[tokio::test]
    async fn test_gauges_overwrite() {
        let registry = MetricsRegistry::new();

        registry.set_gauge("test.gauge", 100).await;
        registry.set_gauge("test.gauge", 50).await;

        assert_eq!(registry.gauge("test.gauge").await, 50);
    }

    #[tokio::test]
    async fn test_snapshot_lists_every_series() {
        let registry = MetricsRegistry::new();

        registry.inc_counter(metric_names::REGISTRATIONS).await;
        registry.set_gauge(metric_names::DB_POOL_SIZE, 5).await;

        let json = registry.to_json().await;
        assert_eq!(json["counters"][metric_names::REGISTRATIONS], 1);
        assert_eq!(json["gauges"][metric_names::DB_POOL_SIZE], 5);
        assert!(json["uptime_seconds"].as_u64().is_some());
    }
}
