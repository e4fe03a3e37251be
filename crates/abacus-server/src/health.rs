//! Health and readiness probes.
//!
//! - `/health` - Liveness: the process is up. Always `{"status":"healthy"}`.
//! - `/ready` - Readiness: the server accepts traffic and every registered
//!   check passes. Turns false once graceful shutdown begins.
//!
//! # Example
//!
//! ```rust
//! use abacus_server::{HealthCheck, ReadinessCheck};
//!
//! let health = HealthCheck::new();
//! assert!(health.status().is_healthy());
//!
//! let readiness = ReadinessCheck::new().add_check("evaluator", || true);
//! assert!(readiness.is_ready());
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Health status response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    status: String,
}

impl HealthStatus {
    /// Creates a healthy status.
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }

    /// Returns the status string.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns whether the status is healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Liveness probe.
///
/// The process is healthy for as long as it can answer.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    start_time: Instant,
}

impl HealthCheck {
    /// Creates a health check, starting the uptime clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Returns the current health status.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus::healthy()
    }

    /// Returns the time since the check was created.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new()
    }
}

/// Readiness status response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessStatus {
    ready: bool,
    checks: BTreeMap<String, bool>,
}

impl ReadinessStatus {
    /// Returns whether the service is ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Returns the result of a specific check.
    #[must_use]
    pub fn check(&self, name: &str) -> Option<bool> {
        self.checks.get(name).copied()
    }
}

type ReadinessCheckFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// Readiness probe with named checks.
///
/// ```rust
/// use abacus_server::ReadinessCheck;
///
/// let readiness = ReadinessCheck::new()
///     .add_check("config", || true)
///     .add_check("warmup", || false);
///
/// let status = readiness.status();
/// assert!(!status.is_ready());
/// assert_eq!(status.check("warmup"), Some(false));
/// ```
#[derive(Clone)]
pub struct ReadinessCheck {
    checks: Vec<(String, ReadinessCheckFn)>,

    /// Cleared when graceful shutdown begins
    ready_override: Arc<AtomicBool>,
}

impl std::fmt::Debug for ReadinessCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessCheck")
            .field("checks", &self.checks.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("ready_override", &self.ready_override)
            .finish()
    }
}

impl ReadinessCheck {
    /// Creates a readiness check with no checks. It starts out ready.
    #[must_use]
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            ready_override: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Adds a named check that returns `true` when its component is ready.
    #[must_use]
    pub fn add_check<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.checks.push((name.into(), Arc::new(check)));
        self
    }

    /// Returns whether the service is ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready_override.load(Ordering::SeqCst) && self.checks.iter().all(|(_, check)| check())
    }

    /// Returns the full readiness status with individual check results.
    #[must_use]
    pub fn status(&self) -> ReadinessStatus {
        let checks: BTreeMap<String, bool> = self
            .checks
            .iter()
            .map(|(name, check)| (name.clone(), check()))
            .collect();

        let ready = self.ready_override.load(Ordering::SeqCst) && checks.values().all(|&v| v);

        ReadinessStatus { ready, checks }
    }

    /// Overrides readiness, e.g. to drain traffic during shutdown.
    pub fn set_ready(&self, ready: bool) {
        self.ready_override.store(ready, Ordering::SeqCst);
    }
}

impl Default for ReadinessCheck {
    fn default() -> Self {
        Self::new()
    }
}
