//! Session runtime: the schedulable market/wager session, its event log and
//! CSV journal, and the tokio driver that hosts it.

pub mod events;
pub mod live_runner;
pub mod logging;
pub mod metrics;
pub mod replay;
pub mod schedule;
pub mod session;

pub use events::SessionEvent;
pub use live_runner::{spawn_session, DriverError, DriverOptions, SessionClock, SessionHandle};
pub use session::{Session, SessionConfig, SessionError, SessionSnapshot};

#[cfg(test)]
mod tests {
    use crate::logging::{InMemoryRunLogWriter, RunLogEvent, RunLogEventKind, RunLogWriter};
    use crate::{Session, SessionConfig};

    #[test]
    fn session_events_feed_the_run_log_in_order() {
        let (mut session, started) =
            Session::start(SessionConfig::default(), "ETH", 1_000_000, 7).unwrap();
        let mut log = InMemoryRunLogWriter::new();

        log.write(RunLogEvent::from(&started));
        for event in session.advance(1_001_000) {
            log.write(RunLogEvent::from(&event));
        }
        if let Some(stopped) = session.stop(1_001_500) {
            log.write(RunLogEvent::from(&stopped));
        }

        assert_eq!(
            log.kinds(),
            vec![
                RunLogEventKind::SessionStarted,
                RunLogEventKind::PriceTicked,
                RunLogEventKind::CandleAppended,
                RunLogEventKind::SessionStopped,
            ]
        );
    }
}
