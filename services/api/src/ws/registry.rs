//! Process-wide bookkeeping of live calls.
//!
//! Entries are inserted when a telephony connection is accepted and removed
//! when its [`CallHandle`] is dropped at teardown. The relay itself never
//! reads the registry.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// What the registry knows about one live call.
#[derive(Debug, Clone)]
pub struct CallEntry {
    pub endpoint: &'static str,
    pub accepted_at: DateTime<Utc>,
    pub stream_sid: Option<String>,
    pub call_sid: Option<String>,
}

impl CallEntry {
    /// Time since the telephony connection was accepted.
    pub fn elapsed(&self) -> TimeDelta {
        Utc::now() - self.accepted_at
    }
}

/// Table of active calls keyed by connection id.
#[derive(Clone, Default)]
pub struct CallRegistry {
    calls: Arc<DashMap<Uuid, CallEntry>>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly accepted telephony connection.
    pub fn register(&self, endpoint: &'static str) -> CallHandle {
        let id = Uuid::new_v4();
        self.calls.insert(
            id,
            CallEntry {
                endpoint,
                accepted_at: Utc::now(),
                stream_sid: None,
                call_sid: None,
            },
        );
        debug!(connection_id = %id, endpoint, "Call registered.");
        CallHandle {
            id,
            calls: self.calls.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, id: Uuid) -> bool {
        self.calls.contains_key(&id)
    }

    #[cfg(test)]
    pub fn get(&self, id: Uuid) -> Option<CallEntry> {
        self.calls.get(&id).map(|entry| entry.value().clone())
    }
}

/// Owning registration of one call. Dropping it removes the entry.
pub struct CallHandle {
    id: Uuid,
    calls: Arc<DashMap<Uuid, CallEntry>>,
}

impl CallHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Records the identifiers delivered by the telephony `start` event.
    pub fn record_start(&self, stream_sid: &str, call_sid: Option<&str>) {
        if let Some(mut entry) = self.calls.get_mut(&self.id) {
            entry.stream_sid = Some(stream_sid.to_string());
            entry.call_sid = call_sid.map(str::to_string);
        }
    }
}

impl Drop for CallHandle {
    fn drop(&mut self) {
        if let Some((id, entry)) = self.calls.remove(&self.id) {
            info!(
                connection_id = %id,
                endpoint = entry.endpoint,
                stream_sid = ?entry.stream_sid,
                call_sid = ?entry.call_sid,
                duration_ms = entry.elapsed().num_milliseconds(),
                "Call removed from registry."
            );
        }
    }
}
