use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use core_sim::AssetQuote;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use wagers::{Direction, Wager};

use crate::events::SessionEvent;
use crate::logging::{RunLogEvent, RunLogWriter, TracingRunLogWriter};
use crate::metrics::TickLatencyMetrics;
use crate::replay::JournalCsvWriter;
use crate::session::{Session, SessionError, SessionSnapshot};

const COMMAND_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("session driver has shut down")]
    Closed,

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug)]
pub enum SessionCommand {
    SubmitWager {
        direction: Direction,
        amount: f64,
        reply: oneshot::Sender<Result<Wager, SessionError>>,
    },
    SwitchAsset {
        symbol: String,
        reply: oneshot::Sender<Result<AssetQuote, SessionError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// Milliseconds since the Unix epoch, advanced by the tokio clock so paused
/// test time drives the session too.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    origin_ms: i64,
    origin: Instant,
}

impl SessionClock {
    pub fn starting_at(origin_ms: i64) -> Self {
        Self {
            origin_ms,
            origin: Instant::now(),
        }
    }

    pub fn wall() -> Self {
        Self::starting_at(wall_clock_ms())
    }

    pub fn now_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.origin_ms.saturating_add(elapsed)
    }
}

pub fn wall_clock_ms() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(nanos).unwrap_or(i64::MAX)
}

pub struct DriverOptions {
    pub clock: SessionClock,
    pub journal: Option<JournalCsvWriter<Box<dyn Write + Send>>>,
    pub run_log: Box<dyn RunLogWriter + Send>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            clock: SessionClock::wall(),
            journal: None,
            run_log: Box::new(TracingRunLogWriter),
        }
    }
}

/// Cloneable access to a running session driver. The driver exits once every
/// handle is dropped or `stop` is called.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<Arc<SessionSnapshot>>,
    events: broadcast::Sender<SessionEvent>,
    catalogue: Arc<[AssetQuote]>,
}

impl SessionHandle {
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    pub fn watch_snapshots(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        self.snapshots.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn catalogue(&self) -> &[AssetQuote] {
        &self.catalogue
    }

    pub async fn submit_wager(&self, direction: Direction, amount: f64) -> Result<Wager, DriverError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::SubmitWager {
            direction,
            amount,
            reply,
        })
        .await?;
        Ok(response.await.map_err(|_| DriverError::Closed)??)
    }

    pub async fn switch_asset(&self, symbol: impl Into<String>) -> Result<AssetQuote, DriverError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::SwitchAsset {
            symbol: symbol.into(),
            reply,
        })
        .await?;
        Ok(response.await.map_err(|_| DriverError::Closed)??)
    }

    pub async fn stop(&self) -> Result<(), DriverError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Stop { reply }).await?;
        response.await.map_err(|_| DriverError::Closed)
    }

    async fn send(&self, command: SessionCommand) -> Result<(), DriverError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DriverError::Closed)
    }
}

/// Moves `session` onto a tokio task that advances it every tick interval.
pub fn spawn_session(session: Session, options: DriverOptions) -> (SessionHandle, JoinHandle<()>) {
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
    let (snapshots_tx, snapshots_rx) = watch::channel(Arc::new(session.snapshot()));

    let handle = SessionHandle {
        commands: commands_tx,
        snapshots: snapshots_rx,
        events: events_tx.clone(),
        catalogue: session.catalogue().to_vec().into(),
    };

    let driver = SessionDriver {
        session,
        options,
        events: events_tx,
        snapshots: snapshots_tx,
        latency: TickLatencyMetrics::new(),
    };
    let task = tokio::spawn(driver.run(commands_rx));

    (handle, task)
}

struct SessionDriver {
    session: Session,
    options: DriverOptions,
    events: broadcast::Sender<SessionEvent>,
    snapshots: watch::Sender<Arc<SessionSnapshot>>,
    latency: TickLatencyMetrics,
}

impl SessionDriver {
    async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        let period_ms = u64::try_from(self.session.config().tick_interval_ms).unwrap_or(1_000);
        let period = Duration::from_millis(period_ms.max(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(asset = %self.session.asset(), period_ms, "session driver running");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = self.options.clock.now_ms();
                    let started = std::time::Instant::now();
                    let events = self.session.advance(now);
                    let elapsed = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
                    self.latency.record_latency_micros(elapsed);
                    self.publish(events);
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("all session handles dropped");
                        break;
                    };
                    if self.handle_command(command) {
                        break;
                    }
                }
            }
        }

        let now = self.options.clock.now_ms();
        if let Some(event) = self.session.stop(now) {
            self.publish(vec![event]);
        }
        info!("session driver stopped");
    }

    /// Applies one command. Returns `true` when the driver should exit.
    fn handle_command(&mut self, command: SessionCommand) -> bool {
        let now = self.options.clock.now_ms();
        match command {
            SessionCommand::SubmitWager {
                direction,
                amount,
                reply,
            } => {
                let result = match self.session.submit_wager(direction, amount, now) {
                    Ok((wager, event)) => {
                        self.publish(vec![event]);
                        Ok(wager)
                    }
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
                false
            }
            SessionCommand::SwitchAsset { symbol, reply } => {
                let result = match self.session.switch_asset(&symbol, now) {
                    Ok(event) => {
                        self.publish(vec![event]);
                        self.session
                            .catalogue()
                            .iter()
                            .find(|quote| quote.symbol == symbol)
                            .cloned()
                            .ok_or(SessionError::UnknownAsset(symbol))
                    }
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
                false
            }
            SessionCommand::Stop { reply } => {
                if let Some(event) = self.session.stop(now) {
                    self.publish(vec![event]);
                }
                let _ = reply.send(());
                true
            }
        }
    }

    fn publish(&mut self, events: Vec<SessionEvent>) {
        if events.is_empty() {
            return;
        }

        for event in &events {
            self.options.run_log.write(RunLogEvent::from(event));
        }
        if let Some(journal) = self.options.journal.as_mut() {
            if let Err(err) = journal.append_events(&events) {
                warn!(%err, "journal write failed; disabling journal");
                self.options.journal = None;
            }
        }

        let mut snapshot = self.session.snapshot();
        snapshot.tick_latency = self.latency.percentiles();
        self.snapshots.send_replace(Arc::new(snapshot));

        for event in events {
            // No subscribers is not an error.
            let _ = self.events.send(event);
        }
    }
}
