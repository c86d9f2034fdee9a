//! Router counters.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use offline_core::{CacheStatus, RouterEvent, RouterObserver};
use serde::{Deserialize, Serialize};

/// Counters for one strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyMetrics {
    /// Requests answered.
    pub requests: u64,
    /// Served from the store.
    pub hits: u64,
    /// Served from the network with the store involved.
    pub misses: u64,
    /// Served from the network without the store.
    pub bypasses: u64,
    /// Served from the store after a network failure.
    pub fallbacks: u64,
    /// Failures handed to the caller.
    pub failures: u64,
    /// Total time spent routing (microseconds).
    pub total_us: u64,
}

impl StrategyMetrics {
    /// Average routing time in microseconds.
    pub fn avg_us(&self) -> u64 {
        let count = self.requests + self.failures;
        if count == 0 {
            0
        } else {
            self.total_us / count
        }
    }
}

/// Point-in-time copy of the router counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Per-strategy counters, keyed by strategy name.
    pub strategies: BTreeMap<String, StrategyMetrics>,
    /// Seeds stored during install.
    pub seeds_cached: u64,
    /// Seeds that failed during install.
    pub seeds_failed: u64,
    /// Generations deleted on activation.
    pub generations_evicted: u64,
    /// Store writes that failed.
    pub store_write_failures: u64,
}

impl MetricsSnapshot {
    /// Total requests answered, across strategies.
    pub fn requests(&self) -> u64 {
        self.strategies.values().map(|s| s.requests).sum()
    }

    /// Total failures, across strategies.
    pub fn failures(&self) -> u64 {
        self.strategies.values().map(|s| s.failures).sum()
    }

    /// Share of store-backed requests served from the store (hits and fallbacks).
    pub fn hit_ratio(&self) -> f64 {
        let (served, total) = self.strategies.values().fold((0, 0), |(served, total), s| {
            (
                served + s.hits + s.fallbacks,
                total + s.hits + s.fallbacks + s.misses,
            )
        });
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as JSON (pretty printed).
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Requests: {} ({} failed, hit ratio {:.1}%)",
            self.requests(),
            self.failures(),
            self.hit_ratio() * 100.0
        ));

        if !self.strategies.is_empty() {
            lines.push("  Strategies:".to_string());
            for (name, s) in &self.strategies {
                lines.push(format!(
                    "    {}: {} ok / {} failed, hit={} miss={} bypass={} fallback={}, avg {}us",
                    name,
                    s.requests,
                    s.failures,
                    s.hits,
                    s.misses,
                    s.bypasses,
                    s.fallbacks,
                    s.avg_us()
                ));
            }
        }

        if self.seeds_cached + self.seeds_failed > 0 {
            lines.push(format!(
                "  Seeds: {} cached, {} failed",
                self.seeds_cached, self.seeds_failed
            ));
        }

        if self.generations_evicted > 0 {
            lines.push(format!("  Evicted generations: {}", self.generations_evicted));
        }

        if self.store_write_failures > 0 {
            lines.push(format!("  Store write failures: {}", self.store_write_failures));
        }

        lines.join("\n")
    }
}

/// Router observer that aggregates counters.
#[derive(Debug, Default)]
pub struct RouterMetrics {
    inner: Mutex<MetricsSnapshot>,
}

impl RouterMetrics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reset all counters.
    pub fn reset(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = MetricsSnapshot::default();
    }
}

impl RouterObserver for RouterMetrics {
    fn on_event(&self, event: &RouterEvent) {
        let mut m = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        match event {
            RouterEvent::SeedCached { .. } => m.seeds_cached += 1,
            RouterEvent::SeedFailed { .. } => m.seeds_failed += 1,
            RouterEvent::GenerationEvicted { .. } => m.generations_evicted += 1,
            RouterEvent::StoreWriteFailed { .. } => m.store_write_failures += 1,
            RouterEvent::Routed {
                strategy,
                status,
                elapsed,
                ..
            } => {
                let s = m.strategies.entry(strategy.as_str().to_string()).or_default();
                s.requests += 1;
                s.total_us += elapsed.as_micros() as u64;
                match status {
                    CacheStatus::Hit => s.hits += 1,
                    CacheStatus::Miss => s.misses += 1,
                    CacheStatus::Bypass => s.bypasses += 1,
                    CacheStatus::Fallback => s.fallbacks += 1,
                }
            }
            RouterEvent::RouteFailed {
                strategy, elapsed, ..
            } => {
                let s = m.strategies.entry(strategy.as_str().to_string()).or_default();
                s.failures += 1;
                s.total_us += elapsed.as_micros() as u64;
            }
            RouterEvent::Installing { .. }
            | RouterEvent::Installed { .. }
            | RouterEvent::Activated { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use offline_core::{RequestId, Strategy};

    fn routed(strategy: Strategy, status: CacheStatus) -> RouterEvent {
        RouterEvent::Routed {
            request_id: RequestId::generate(),
            method: "GET".into(),
            url: "https://shop.example.com/x".into(),
            rule: "static",
            strategy,
            status,
            elapsed: Duration::from_micros(100),
        }
    }

    #[test]
    fn test_counts_by_strategy() {
        let metrics = RouterMetrics::new();
        metrics.on_event(&routed(Strategy::CacheFirst, CacheStatus::Miss));
        metrics.on_event(&routed(Strategy::CacheFirst, CacheStatus::Hit));
        metrics.on_event(&routed(Strategy::CacheFirst, CacheStatus::Hit));
        metrics.on_event(&routed(Strategy::NetworkOnly, CacheStatus::Bypass));
        metrics.on_event(&RouterEvent::RouteFailed {
            request_id: RequestId::generate(),
            url: "https://shop.example.com/api/x".into(),
            rule: "dynamic-api",
            strategy: Strategy::NetworkOnly,
            error: "offline".into(),
            elapsed: Duration::from_micros(300),
        });

        let snapshot = metrics.snapshot();
        let cache_first = &snapshot.strategies["cache-first"];
        assert_eq!(cache_first.requests, 3);
        assert_eq!(cache_first.hits, 2);
        assert_eq!(cache_first.avg_us(), 100);

        let network_only = &snapshot.strategies["network-only"];
        assert_eq!(network_only.bypasses, 1);
        assert_eq!(network_only.failures, 1);
        assert_eq!(network_only.avg_us(), 200);

        assert_eq!(snapshot.requests(), 4);
        assert_eq!(snapshot.failures(), 1);
        assert!((snapshot.hit_ratio() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_lifecycle_counters_and_reset() {
        let metrics = RouterMetrics::new();
        metrics.on_event(&RouterEvent::SeedCached { url: "/".into() });
        metrics.on_event(&RouterEvent::SeedFailed {
            url: "/index.html".into(),
            reason: "404".into(),
        });
        metrics.on_event(&RouterEvent::GenerationEvicted {
            generation: "shop-v1".into(),
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.seeds_cached, 1);
        assert_eq!(snapshot.seeds_failed, 1);
        assert_eq!(snapshot.generations_evicted, 1);
        assert!(snapshot.to_summary().contains("Seeds: 1 cached, 1 failed"));

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
