use core_sim::{Candle, PriceTick};
use serde::{Deserialize, Serialize};
use wagers::{Wager, WagerId};

/// Everything a session reports to its hosts, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        time_ms: i64,
        asset: String,
        price: f64,
        candles: usize,
    },
    PriceTicked {
        time_ms: i64,
        asset: String,
        tick: PriceTick,
    },
    CandleAppended {
        time_ms: i64,
        asset: String,
        candle: Candle,
    },
    WagerSubmitted {
        time_ms: i64,
        wager: Wager,
        balance: f64,
    },
    WagerSettled {
        time_ms: i64,
        wager: Wager,
        balance: f64,
    },
    WagerExpired {
        time_ms: i64,
        wager_id: WagerId,
    },
    AssetSwitched {
        time_ms: i64,
        asset: String,
        price: f64,
    },
    SessionStopped {
        time_ms: i64,
    },
}

impl SessionEvent {
    pub fn time_ms(&self) -> i64 {
        match self {
            Self::SessionStarted { time_ms, .. }
            | Self::PriceTicked { time_ms, .. }
            | Self::CandleAppended { time_ms, .. }
            | Self::WagerSubmitted { time_ms, .. }
            | Self::WagerSettled { time_ms, .. }
            | Self::WagerExpired { time_ms, .. }
            | Self::AssetSwitched { time_ms, .. }
            | Self::SessionStopped { time_ms } => *time_ms,
        }
    }

    pub fn wager_id(&self) -> Option<WagerId> {
        match self {
            Self::WagerSubmitted { wager, .. } | Self::WagerSettled { wager, .. } => Some(wager.id),
            Self::WagerExpired { wager_id, .. } => Some(*wager_id),
            _ => None,
        }
    }
}
