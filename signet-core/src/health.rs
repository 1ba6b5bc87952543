//! Shared connectivity state for the backing store.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

/// Cheaply cloneable handle onto the store's connectivity state.
///
/// Bring-up and failed probes flip it; request gating and the health
/// probe read it. Starts disconnected until the first successful probe.
#[derive(Debug, Clone, Default)]
pub struct Health {
    inner: Arc<RwLock<HealthInner>>,
}

#[derive(Debug, Default)]
struct HealthInner {
    connected: bool,
    last_error: Option<String>,
}

/// Point-in-time view of the store's connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    /// Whether the store answered its most recent probe.
    pub connected: bool,
    /// Error recorded by the most recent failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Health {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful probe; clears any recorded error.
    pub fn mark_connected(&self) {
        let mut inner = self.inner.write();
        inner.connected = true;
        inner.last_error = None;
    }

    /// Record a failed probe along with its error.
    pub fn mark_disconnected(&self, error: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.connected = false;
        inner.last_error = Some(error.into());
    }

    pub fn is_connected(&self) -> bool {
        self.inner.read().connected
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let inner = self.inner.read();
        HealthSnapshot {
            connected: inner.connected,
            last_error: inner.last_error.clone(),
        }
    }
}
