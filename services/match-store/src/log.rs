//! Event log backends for the match store

use crate::events::StoreEvent;
use persistence::JournalWriter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use types::errors::ReservationError;

/// Durable sink for store mutations.
///
/// `append` returns only once the event is as durable as the backend can
/// make it. An error means the event was not recorded and the caller must
/// not apply the mutation.
pub trait EventLog: Send + Sync {
    fn append(&self, event: &StoreEvent) -> Result<(), ReservationError>;
}

/// Keeps nothing; for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryLog {
    appended: AtomicU64,
}

impl MemoryLog {
    pub fn appended(&self) -> u64 {
        self.appended.load(Ordering::Relaxed)
    }
}

impl EventLog for MemoryLog {
    fn append(&self, _event: &StoreEvent) -> Result<(), ReservationError> {
        self.appended.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Journal-backed log
pub struct JournalLog {
    writer: Mutex<JournalWriter>,
}

impl JournalLog {
    pub fn new(writer: JournalWriter) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl EventLog for JournalLog {
    fn append(&self, event: &StoreEvent) -> Result<(), ReservationError> {
        let payload = event
            .encode()
            .map_err(|e| ReservationError::storage(format!("encode {}: {}", event.kind(), e)))?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ReservationError::storage("journal writer poisoned"))?;

        let entry = writer
            .append(types::now_nanos(), event.kind(), payload)
            .map_err(|e| {
                tracing::error!(kind = event.kind(), error = %e, "journal append failed");
                ReservationError::storage(e)
            })?;

        tracing::trace!(sequence = entry.sequence, kind = %entry.kind, "journal append");
        Ok(())
    }
}
