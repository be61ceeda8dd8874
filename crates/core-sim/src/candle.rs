use serde::{Deserialize, Serialize};

pub const PRICE_DECIMALS: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Unix epoch milliseconds of the candle open.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
        }
    }

    /// A candle with all four prices at `price`, used to open a forming bar.
    pub fn flat(time: i64, price: f64) -> Self {
        Self::new(time, price, price, price, price)
    }

    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    pub fn is_green(&self) -> bool {
        self.close > self.open
    }

    /// Checks `low <= min(open, close) <= max(open, close) <= high` with finite,
    /// strictly positive prices.
    pub fn is_well_formed(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|price| !price.is_finite() || *price <= 0.0) {
            return false;
        }

        self.low <= self.body_bottom() && self.body_top() <= self.high
    }

    pub fn rounded(self) -> Self {
        Self {
            time: self.time,
            open: round_price(self.open),
            high: round_price(self.high),
            low: round_price(self.low),
            close: round_price(self.close),
        }
    }

    /// Folds a live price into a forming candle: `close` follows the price and the
    /// extremes widen to contain it.
    pub fn refreshed(self, price: f64) -> Self {
        if !price.is_finite() || price <= 0.0 {
            return self;
        }

        Self {
            time: self.time,
            open: self.open,
            high: self.high.max(price),
            low: self.low.min(price),
            close: price,
        }
    }
}

pub fn round_price(value: f64) -> f64 {
    let scale = 10_f64.powi(PRICE_DECIMALS);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::{round_price, Candle};

    #[test]
    fn well_formed_requires_body_inside_wicks() {
        assert!(Candle::new(0, 100.0, 101.0, 99.0, 100.5).is_well_formed());
        assert!(!Candle::new(0, 100.0, 100.2, 99.0, 100.5).is_well_formed());
        assert!(!Candle::new(0, 100.0, 101.0, 100.1, 100.5).is_well_formed());
    }

    #[test]
    fn well_formed_rejects_non_finite_and_non_positive_prices() {
        assert!(!Candle::new(0, f64::NAN, 101.0, 99.0, 100.0).is_well_formed());
        assert!(!Candle::new(0, 1.0, f64::INFINITY, 0.5, 1.0).is_well_formed());
        assert!(!Candle::new(0, 1.0, 1.0, 0.0, 1.0).is_well_formed());
    }

    #[test]
    fn rounding_keeps_eight_decimals() {
        assert_eq!(round_price(1.234_567_891_23), 1.234_567_89);
        assert_eq!(round_price(118_735.0), 118_735.0);
    }

    #[test]
    fn refresh_widens_extremes_and_moves_close() {
        let candle = Candle::flat(1_000, 50.0);

        let up = candle.refreshed(52.0);
        assert_eq!((up.open, up.high, up.low, up.close), (50.0, 52.0, 50.0, 52.0));

        let down = up.refreshed(49.0);
        assert_eq!((down.high, down.low, down.close), (52.0, 49.0, 49.0));
        assert!(down.is_well_formed());
    }

    #[test]
    fn refresh_ignores_degenerate_prices() {
        let candle = Candle::flat(1_000, 50.0);

        assert_eq!(candle.refreshed(f64::NAN), candle);
        assert_eq!(candle.refreshed(-3.0), candle);
    }
}
