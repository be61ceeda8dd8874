use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest single-tick fall as a fraction of the previous price.
const MAX_TICK_DROP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl PriceTick {
    pub fn unchanged(price: f64) -> Self {
        Self {
            price,
            change: 0.0,
            change_percent: 0.0,
        }
    }
}

/// Per-tick step bound as a fraction of price.
pub fn tick_step_fraction(price: f64) -> f64 {
    if price > 50_000.0 {
        0.0005
    } else if price > 1_000.0 {
        0.001
    } else if price > 10.0 {
        0.002
    } else {
        0.003
    }
}

/// One bounded random-walk step. The floor at 99% of `prev_price` caps the
/// downside only; the upside is bounded by the step alone.
pub fn tick_live_price<R: Rng + ?Sized>(prev_price: f64, rng: &mut R) -> PriceTick {
    if !prev_price.is_finite() || prev_price <= 0.0 {
        return PriceTick::unchanged(prev_price);
    }

    let step = tick_step_fraction(prev_price);
    let delta = (rng.random::<f64>() * 2.0 - 1.0) * step * prev_price;
    let price = (prev_price + delta).max(prev_price * (1.0 - MAX_TICK_DROP));
    let change = price - prev_price;

    PriceTick {
        price,
        change,
        change_percent: change / prev_price * 100.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveTicker {
    last: PriceTick,
}

impl LiveTicker {
    pub fn new(start_price: f64) -> Self {
        Self {
            last: PriceTick::unchanged(start_price),
        }
    }

    pub fn price(&self) -> f64 {
        self.last.price
    }

    pub fn last_tick(&self) -> PriceTick {
        self.last
    }

    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> PriceTick {
        self.last = tick_live_price(self.last.price, rng);
        self.last
    }
}
