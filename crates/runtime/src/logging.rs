use std::sync::{Arc, Mutex};

use tracing::debug;
use wagers::WagerId;

use crate::events::SessionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLogEventKind {
    SessionStarted,
    PriceTicked,
    CandleAppended,
    WagerSubmitted,
    WagerSettled,
    WagerExpired,
    AssetSwitched,
    SessionStopped,
    JournalWritten,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLogEvent {
    pub time_ms: i64,
    pub kind: RunLogEventKind,
    pub wager_id: Option<WagerId>,
}

impl RunLogEvent {
    pub fn new(time_ms: i64, kind: RunLogEventKind, wager_id: Option<WagerId>) -> Self {
        Self {
            time_ms,
            kind,
            wager_id,
        }
    }
}

impl From<&SessionEvent> for RunLogEvent {
    fn from(event: &SessionEvent) -> Self {
        let kind = match event {
            SessionEvent::SessionStarted { .. } => RunLogEventKind::SessionStarted,
            SessionEvent::PriceTicked { .. } => RunLogEventKind::PriceTicked,
            SessionEvent::CandleAppended { .. } => RunLogEventKind::CandleAppended,
            SessionEvent::WagerSubmitted { .. } => RunLogEventKind::WagerSubmitted,
            SessionEvent::WagerSettled { .. } => RunLogEventKind::WagerSettled,
            SessionEvent::WagerExpired { .. } => RunLogEventKind::WagerExpired,
            SessionEvent::AssetSwitched { .. } => RunLogEventKind::AssetSwitched,
            SessionEvent::SessionStopped { .. } => RunLogEventKind::SessionStopped,
        };

        Self::new(event.time_ms(), kind, event.wager_id())
    }
}

pub trait RunLogWriter {
    fn write(&mut self, event: RunLogEvent);
}

#[derive(Debug, Default)]
pub struct InMemoryRunLogWriter {
    events: Vec<RunLogEvent>,
}

impl InMemoryRunLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RunLogEvent] {
        &self.events
    }

    pub fn kinds(&self) -> Vec<RunLogEventKind> {
        self.events.iter().map(|event| event.kind).collect()
    }
}

impl RunLogWriter for InMemoryRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        self.events.push(event);
    }
}

/// Forwards run log entries to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunLogWriter;

impl RunLogWriter for TracingRunLogWriter {
    fn write(&mut self, event: RunLogEvent) {
        debug!(
            time_ms = event.time_ms,
            kind = ?event.kind,
            wager_id = ?event.wager_id,
            "run log"
        );
    }
}

/// Lets a writer be shared between a driver task and an observer.
impl<W: RunLogWriter> RunLogWriter for Arc<Mutex<W>> {
    fn write(&mut self, event: RunLogEvent) {
        // Entries are append-only, so a poisoned log is still consistent.
        let mut guard = match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.write(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn session_events_map_to_run_log_kinds() {
        let event = SessionEvent::WagerExpired {
            time_ms: 120_000,
            wager_id: 3,
        };

        let entry = RunLogEvent::from(&event);

        assert_eq!(entry.kind, RunLogEventKind::WagerExpired);
        assert_eq!(entry.time_ms, 120_000);
        assert_eq!(entry.wager_id, Some(3));
    }

    #[test]
    fn shared_writer_records_through_clones() {
        let shared = Arc::new(Mutex::new(InMemoryRunLogWriter::new()));
        let mut writer = Arc::clone(&shared);

        writer.write(RunLogEvent::new(1, RunLogEventKind::SessionStarted, None));
        writer.write(RunLogEvent::new(2, RunLogEventKind::SessionStopped, None));

        assert_eq!(
            shared.lock().unwrap().kinds(),
            vec![RunLogEventKind::SessionStarted, RunLogEventKind::SessionStopped]
        );
    }
}
