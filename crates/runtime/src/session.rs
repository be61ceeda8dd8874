use std::collections::HashMap;
use std::sync::Arc;

use core_sim::{
    default_catalogue, generate_asset_series, AssetQuote, Candle, GeneratorConfig, Level,
    LiveTicker, PriceTick, SeriesError,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use wagers::{Direction, Wager, WagerBook, WagerConfig, WagerConfigError, WagerRejection};

use crate::events::SessionEvent;
use crate::metrics::{LatencyPercentiles, SessionCounters};
use crate::schedule::{Scheduler, TaskKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub tick_interval_ms: i64,
    pub candle_interval_ms: i64,
    pub settlement_interval_ms: i64,
    /// Most candles kept; the oldest is evicted first.
    pub candle_capacity: usize,
    /// Candles generated when an asset is loaded.
    pub history_len: usize,
    pub initial_balance: f64,
    pub wager: WagerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            candle_interval_ms: 1_000,
            settlement_interval_ms: 1_000,
            candle_capacity: 90,
            history_len: 61,
            initial_balance: 1_000.0,
            wager: WagerConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        for (name, value) in [
            ("tick_interval_ms", self.tick_interval_ms),
            ("candle_interval_ms", self.candle_interval_ms),
            ("settlement_interval_ms", self.settlement_interval_ms),
        ] {
            if value <= 0 {
                return Err(SessionError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.candle_capacity == 0 {
            return Err(SessionError::InvalidConfig(
                "candle_capacity must be positive".to_string(),
            ));
        }
        if self.history_len == 0 {
            return Err(SessionError::InvalidConfig(
                "history_len must be positive".to_string(),
            ));
        }

        Ok(())
    }

    fn generator(&self) -> GeneratorConfig {
        GeneratorConfig::new(self.history_len, self.candle_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("session is stopped")]
    Stopped,

    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    WagerConfig(#[from] WagerConfigError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("wager rejected: {0}")]
    Rejected(#[from] WagerRejection),
}

/// Point-in-time view of a session. Candles and levels are shared with the
/// session until its next change replaces them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub time_ms: i64,
    pub running: bool,
    pub asset: String,
    pub live_price: f64,
    pub last_tick: PriceTick,
    pub candles: Arc<[Candle]>,
    pub levels: Arc<[Level]>,
    pub balance: f64,
    pub wagers: Vec<Wager>,
    pub counters: SessionCounters,
    pub tick_latency: Option<LatencyPercentiles>,
}

/// Market state for the selected asset. Replaced as one value on asset switch.
#[derive(Debug, Clone)]
struct Market {
    asset: AssetQuote,
    candles: Arc<[Candle]>,
    levels: Arc<[Level]>,
    ticker: LiveTicker,
}

/// One simulated trading session: a market for the selected asset, the wager
/// book and the periodic tasks that drive them. Time only moves through
/// `advance`, so any host clock (or none) can drive it.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    catalogue: Vec<AssetQuote>,
    market: Market,
    /// Last live price of assets switched away from, for their open wagers.
    frozen_prices: HashMap<String, f64>,
    book: WagerBook,
    scheduler: Scheduler,
    rng: StdRng,
    counters: SessionCounters,
    running: bool,
    now_ms: i64,
}

impl Session {
    pub fn start(
        config: SessionConfig,
        asset: &str,
        now_ms: i64,
        seed: u64,
    ) -> Result<(Self, SessionEvent), SessionError> {
        Self::start_with_catalogue(config, default_catalogue(), asset, now_ms, seed)
    }

    pub fn start_with_catalogue(
        config: SessionConfig,
        catalogue: Vec<AssetQuote>,
        asset: &str,
        now_ms: i64,
        seed: u64,
    ) -> Result<(Self, SessionEvent), SessionError> {
        config.validate()?;
        let quote = find_asset(&catalogue, asset)?;
        let book = WagerBook::new(config.wager, config.initial_balance)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut counters = SessionCounters::default();
        let market = build_market(&config, quote, now_ms, &mut rng, &mut counters)?;

        let mut scheduler = Scheduler::new();
        scheduler.register(TaskKind::PriceTick, config.tick_interval_ms, now_ms);
        scheduler.register(TaskKind::CandleTick, config.candle_interval_ms, now_ms);
        scheduler.register(
            TaskKind::SettlementScan,
            config.settlement_interval_ms,
            now_ms,
        );

        let event = SessionEvent::SessionStarted {
            time_ms: now_ms,
            asset: market.asset.symbol.clone(),
            price: market.ticker.price(),
            candles: market.candles.len(),
        };
        info!(
            asset = %market.asset.symbol,
            price = market.ticker.price(),
            candles = market.candles.len(),
            seed,
            "session started"
        );

        Ok((
            Self {
                config,
                catalogue,
                market,
                frozen_prices: HashMap::new(),
                book,
                scheduler,
                rng,
                counters,
                running: true,
                now_ms,
            },
            event,
        ))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn catalogue(&self) -> &[AssetQuote] {
        &self.catalogue
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn asset(&self) -> &str {
        &self.market.asset.symbol
    }

    pub fn live_price(&self) -> f64 {
        self.market.ticker.price()
    }

    pub fn candles(&self) -> Arc<[Candle]> {
        Arc::clone(&self.market.candles)
    }

    pub fn levels(&self) -> Arc<[Level]> {
        Arc::clone(&self.market.levels)
    }

    pub fn balance(&self) -> f64 {
        self.book.balance()
    }

    pub fn wagers(&self) -> &[Wager] {
        self.book.wagers()
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Runs every task whose deadline is at or before `now_ms`. Returns no
    /// events once the session is stopped.
    pub fn advance(&mut self, now_ms: i64) -> Vec<SessionEvent> {
        if !self.running {
            return Vec::new();
        }
        self.now_ms = self.now_ms.max(now_ms);

        let mut events = Vec::new();
        for (id, kind) in self.scheduler.due(now_ms) {
            self.scheduler.mark_running(id);
            match kind {
                TaskKind::PriceTick => events.push(self.tick_price(now_ms)),
                TaskKind::CandleTick => events.push(self.append_candle(now_ms)),
                TaskKind::SettlementScan => events.extend(self.settle(now_ms)),
            }
            self.scheduler.complete(id, now_ms);
        }
        events
    }

    /// Opens a wager at the current live price.
    pub fn submit_wager(
        &mut self,
        direction: Direction,
        amount: f64,
        now_ms: i64,
    ) -> Result<(Wager, SessionEvent), SessionError> {
        if !self.running {
            return Err(SessionError::Stopped);
        }
        self.now_ms = self.now_ms.max(now_ms);

        let price = self.market.ticker.price();
        match self
            .book
            .submit(&self.market.asset.symbol, direction, amount, price, now_ms)
        {
            Ok(wager) => {
                self.counters.wagers_submitted += 1;
                let event = SessionEvent::WagerSubmitted {
                    time_ms: now_ms,
                    wager: wager.clone(),
                    balance: self.book.balance(),
                };
                Ok((wager, event))
            }
            Err(rejection) => {
                self.counters.wagers_rejected += 1;
                info!(%rejection, amount, "wager rejected");
                Err(rejection.into())
            }
        }
    }

    /// Loads a fresh market for `symbol`. Open wagers on the previous asset keep
    /// settling against its last live price.
    pub fn switch_asset(&mut self, symbol: &str, now_ms: i64) -> Result<SessionEvent, SessionError> {
        if !self.running {
            return Err(SessionError::Stopped);
        }
        let quote = find_asset(&self.catalogue, symbol)?;
        let market = build_market(
            &self.config,
            quote,
            now_ms,
            &mut self.rng,
            &mut self.counters,
        )?;
        self.now_ms = self.now_ms.max(now_ms);

        let previous = std::mem::replace(&mut self.market, market);
        self.frozen_prices
            .insert(previous.asset.symbol.clone(), previous.ticker.price());
        self.frozen_prices.remove(&self.market.asset.symbol);
        self.counters.asset_switches += 1;

        info!(
            from = %previous.asset.symbol,
            to = %self.market.asset.symbol,
            price = self.market.ticker.price(),
            "switched asset"
        );
        Ok(SessionEvent::AssetSwitched {
            time_ms: now_ms,
            asset: self.market.asset.symbol.clone(),
            price: self.market.ticker.price(),
        })
    }

    /// Cancels every periodic task. Idempotent; only the first call reports.
    pub fn stop(&mut self, now_ms: i64) -> Option<SessionEvent> {
        if !self.running {
            return None;
        }
        self.running = false;
        self.scheduler.cancel_all();
        self.now_ms = self.now_ms.max(now_ms);

        info!(
            asset = %self.market.asset.symbol,
            balance = self.book.balance(),
            "session stopped"
        );
        Some(SessionEvent::SessionStopped { time_ms: now_ms })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            time_ms: self.now_ms,
            running: self.running,
            asset: self.market.asset.symbol.clone(),
            live_price: self.market.ticker.price(),
            last_tick: self.market.ticker.last_tick(),
            candles: Arc::clone(&self.market.candles),
            levels: Arc::clone(&self.market.levels),
            balance: self.book.balance(),
            wagers: self.book.wagers().to_vec(),
            counters: self.counters,
            tick_latency: None,
        }
    }

    fn tick_price(&mut self, now_ms: i64) -> SessionEvent {
        let tick = self.market.ticker.advance(&mut self.rng);
        let mut candles = self.market.candles.to_vec();
        if let Some(last) = candles.last_mut() {
            *last = last.refreshed(tick.price).rounded();
        }
        self.market.candles = candles.into();
        self.counters.price_ticks += 1;

        debug!(
            asset = %self.market.asset.symbol,
            price = tick.price,
            change = tick.change,
            "price tick"
        );
        SessionEvent::PriceTicked {
            time_ms: now_ms,
            asset: self.market.asset.symbol.clone(),
            tick,
        }
    }

    fn append_candle(&mut self, now_ms: i64) -> SessionEvent {
        let price = self.market.ticker.price();
        let next = match self.market.candles.last() {
            Some(last) => Candle::flat(
                last.time.saturating_add(self.config.candle_interval_ms),
                last.close,
            ),
            None => Candle::flat(now_ms, price),
        };

        let overflow = (self.market.candles.len() + 1).saturating_sub(self.config.candle_capacity);
        let candles: Vec<Candle> = self
            .market
            .candles
            .iter()
            .skip(overflow)
            .copied()
            .chain(std::iter::once(next))
            .collect();
        self.market.candles = candles.into();
        self.counters.candles_appended += 1;

        debug!(
            asset = %self.market.asset.symbol,
            time = next.time,
            open = next.open,
            "candle appended"
        );
        SessionEvent::CandleAppended {
            time_ms: now_ms,
            asset: self.market.asset.symbol.clone(),
            candle: next,
        }
    }

    fn settle(&mut self, now_ms: i64) -> Vec<SessionEvent> {
        let market = &self.market;
        let frozen = &self.frozen_prices;
        let pass = self.book.settle_due(now_ms, |wager| {
            if wager.asset == market.asset.symbol {
                Some(market.ticker.price())
            } else {
                frozen.get(&wager.asset).copied()
            }
        });

        self.counters.wagers_settled += pass.settled.len() as u64;
        self.counters.wagers_expired += pass.expired.len() as u64;

        let balance = self.book.balance();
        let settled = pass
            .settled
            .into_iter()
            .map(|wager| SessionEvent::WagerSettled {
                time_ms: now_ms,
                wager,
                balance,
            });
        let expired = pass
            .expired
            .into_iter()
            .map(|wager_id| SessionEvent::WagerExpired {
                time_ms: now_ms,
                wager_id,
            });
        settled.chain(expired).collect()
    }
}

fn find_asset(catalogue: &[AssetQuote], symbol: &str) -> Result<AssetQuote, SessionError> {
    catalogue
        .iter()
        .find(|quote| quote.symbol == symbol)
        .cloned()
        .ok_or_else(|| SessionError::UnknownAsset(symbol.to_string()))
}

fn build_market(
    config: &SessionConfig,
    asset: AssetQuote,
    now_ms: i64,
    rng: &mut StdRng,
    counters: &mut SessionCounters,
) -> Result<Market, SessionError> {
    let series = generate_asset_series(&asset, &config.generator(), now_ms, rng)?;
    counters.degenerate_values += u64::from(series.degenerate_values);

    let mut candles = series.candles;
    let overflow = candles.len().saturating_sub(config.candle_capacity);
    candles.drain(..overflow);
    let live_price = candles.last().map_or(asset.price, |candle| candle.close);

    Ok(Market {
        asset,
        candles: candles.into(),
        levels: series.levels.into(),
        ticker: LiveTicker::new(live_price),
    })
}
