use serde::{Deserialize, Serialize};

use crate::config::WagerConfig;

/// The side a wager takes is the same up/down the market moves in.
pub use core_sim::Direction;

pub type WagerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
}

/// A timed up/down wager. Settlement fields are `None` until `settled` flips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wager {
    pub id: WagerId,
    pub asset: String,
    pub direction: Direction,
    pub amount: f64,
    pub entry_price: f64,
    pub start_time: i64,
    pub settled: bool,
    pub result: Option<Outcome>,
    pub profit: Option<f64>,
    pub settlement_price: Option<f64>,
    pub settlement_time: Option<i64>,
}

impl Wager {
    pub fn open(
        id: WagerId,
        asset: impl Into<String>,
        direction: Direction,
        amount: f64,
        entry_price: f64,
        start_time: i64,
    ) -> Self {
        Self {
            id,
            asset: asset.into(),
            direction,
            amount,
            entry_price,
            start_time,
            settled: false,
            result: None,
            profit: None,
            settlement_price: None,
            settlement_time: None,
        }
    }

    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.start_time)
    }

    pub fn is_due(&self, now_ms: i64, config: &WagerConfig) -> bool {
        !self.settled && self.elapsed_ms(now_ms) >= config.trade_duration_ms
    }

    pub fn is_expired(&self, now_ms: i64, config: &WagerConfig) -> bool {
        self.elapsed_ms(now_ms) >= config.expiry_ms
    }
}

/// Strict comparison: an unchanged price loses in both directions.
pub fn resolve_outcome(direction: Direction, entry_price: f64, settlement_price: f64) -> Outcome {
    let won = match direction {
        Direction::Up => settlement_price > entry_price,
        Direction::Down => settlement_price < entry_price,
    };

    if won {
        Outcome::Win
    } else {
        Outcome::Loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_wins_only_on_strictly_higher_price() {
        assert_eq!(resolve_outcome(Direction::Up, 100.0, 100.01), Outcome::Win);
        assert_eq!(resolve_outcome(Direction::Up, 100.0, 99.99), Outcome::Loss);
    }

    #[test]
    fn down_wins_only_on_strictly_lower_price() {
        assert_eq!(resolve_outcome(Direction::Down, 100.0, 99.99), Outcome::Win);
        assert_eq!(resolve_outcome(Direction::Down, 100.0, 100.01), Outcome::Loss);
    }

    #[test]
    fn unchanged_price_loses_in_both_directions() {
        assert_eq!(resolve_outcome(Direction::Up, 100.0, 100.0), Outcome::Loss);
        assert_eq!(resolve_outcome(Direction::Down, 100.0, 100.0), Outcome::Loss);
    }

    #[test]
    fn wager_side_and_market_move_share_one_direction() {
        let regime = core_sim::Regime::Trending {
            direction: Direction::Down,
            strength: 0.5,
            duration: 10,
        };
        let wager = Wager::open(3, "BTC", Direction::Down, 10.0, 100.0, 0);

        assert!(matches!(
            regime,
            core_sim::Regime::Trending { direction, .. } if direction == wager.direction
        ));
        assert_eq!(wager.direction.sign(), -1.0);
        assert_eq!(resolve_outcome(wager.direction, 100.0, 99.0), Outcome::Win);
        assert_eq!(
            serde_json::to_value(Direction::Up).unwrap(),
            serde_json::json!("up")
        );
    }

    #[test]
    fn due_boundary_is_inclusive() {
        let config = WagerConfig::default();
        let wager = Wager::open(1, "BTC", Direction::Up, 10.0, 100.0, 1_000);

        assert!(!wager.is_due(1_000 + 59_999, &config));
        assert!(wager.is_due(1_000 + 60_000, &config));
        assert!(!wager.is_expired(1_000 + 119_999, &config));
        assert!(wager.is_expired(1_000 + 120_000, &config));
    }

    #[test]
    fn open_wager_serializes_with_empty_settlement_fields() {
        let wager = Wager::open(7, "ETH", Direction::Down, 5.0, 3_650.0, 42);
        let json = serde_json::to_value(&wager).unwrap();

        assert_eq!(json["direction"], "down");
        assert_eq!(json["settled"], false);
        assert!(json["result"].is_null());
        assert!(json["settlement_price"].is_null());
    }
}
