//! Router lifecycle tracking.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::RequestId;
use crate::strategy::{CacheStatus, Strategy};

/// Lifecycle state of a router instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Constructed, not yet installed.
    Parsed,
    /// Seeding the store.
    Installing,
    /// Seeded and waiting to activate.
    Installed,
    /// Evicting stale generations.
    Activating,
    /// Controlling clients.
    Activated,
    /// Installation failed; this instance will never activate.
    Redundant,
}

impl WorkerState {
    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Parsed, Installing)
                | (Installing, Installed)
                | (Installing, Redundant)
                | (Installed, Activating)
                | (Activated, Activating)
                | (Activating, Activated)
                | (Activating, Redundant)
        )
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// Events emitted by the router.
#[derive(Debug, Clone)]
pub enum RouterEvent {
    /// Install started.
    Installing { generation: String, seeds: usize },
    /// A seed URL was fetched and stored.
    SeedCached { url: String },
    /// A seed URL failed; installation continues.
    SeedFailed { url: String, reason: String },
    /// Install finished.
    Installed {
        generation: String,
        cached: usize,
        failed: usize,
    },
    /// A retired generation was deleted.
    GenerationEvicted { generation: String },
    /// Activation finished and clients were claimed.
    Activated {
        generation: String,
        claimed_clients: usize,
    },
    /// A request was answered.
    Routed {
        request_id: RequestId,
        method: String,
        url: String,
        rule: &'static str,
        strategy: Strategy,
        status: CacheStatus,
        elapsed: Duration,
    },
    /// A request failed and the failure was handed to the caller.
    RouteFailed {
        request_id: RequestId,
        url: String,
        rule: &'static str,
        strategy: Strategy,
        error: String,
        elapsed: Duration,
    },
    /// A cache write failed; the response was still returned.
    StoreWriteFailed { url: String, reason: String },
}

/// Observer trait for router events.
pub trait RouterObserver: Send + Sync {
    /// Called for every event the router emits.
    fn on_event(&self, event: &RouterEvent);
}
