use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapBand {
    Large,
    Mid,
    Small,
    Micro,
}

/// Volatility profile for a price level. Volatilities are fractions of price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketCharacteristics {
    pub band: CapBand,
    pub base_volatility: f64,
    pub max_volatility: f64,
    pub trend_persistence: f64,
    pub level_count: usize,
}

const LARGE_CAP: MarketCharacteristics = MarketCharacteristics {
    band: CapBand::Large,
    base_volatility: 0.0012,
    max_volatility: 0.004,
    trend_persistence: 0.75,
    level_count: 5,
};

const MID_CAP: MarketCharacteristics = MarketCharacteristics {
    band: CapBand::Mid,
    base_volatility: 0.002,
    max_volatility: 0.007,
    trend_persistence: 0.65,
    level_count: 4,
};

const SMALL_CAP: MarketCharacteristics = MarketCharacteristics {
    band: CapBand::Small,
    base_volatility: 0.004,
    max_volatility: 0.012,
    trend_persistence: 0.55,
    level_count: 3,
};

const MICRO_CAP: MarketCharacteristics = MarketCharacteristics {
    band: CapBand::Micro,
    base_volatility: 0.008,
    max_volatility: 0.025,
    trend_persistence: 0.45,
    level_count: 2,
};

pub fn market_characteristics(price: f64) -> MarketCharacteristics {
    if price > 50_000.0 {
        LARGE_CAP
    } else if price > 1_000.0 {
        MID_CAP
    } else if price > 10.0 {
        SMALL_CAP
    } else {
        MICRO_CAP
    }
}

#[cfg(test)]
mod tests {
    use super::{market_characteristics, CapBand};

    #[test]
    fn band_edges_belong_to_the_lower_band() {
        assert_eq!(market_characteristics(50_000.0).band, CapBand::Mid);
        assert_eq!(market_characteristics(50_000.01).band, CapBand::Large);
        assert_eq!(market_characteristics(1_000.0).band, CapBand::Small);
        assert_eq!(market_characteristics(10.0).band, CapBand::Micro);
        assert_eq!(market_characteristics(10.5).band, CapBand::Small);
    }

    #[test]
    fn large_cap_profile_matches_table() {
        let profile = market_characteristics(118_735.0);

        assert_eq!(profile.base_volatility, 0.0012);
        assert_eq!(profile.max_volatility, 0.004);
        assert_eq!(profile.trend_persistence, 0.75);
        assert_eq!(profile.level_count, 5);
    }

    #[test]
    fn micro_cap_profile_matches_table() {
        let profile = market_characteristics(0.42);

        assert_eq!(profile.base_volatility, 0.008);
        assert_eq!(profile.max_volatility, 0.025);
        assert_eq!(profile.trend_persistence, 0.45);
        assert_eq!(profile.level_count, 2);
    }

    #[test]
    fn nan_price_falls_into_micro_band() {
        assert_eq!(market_characteristics(f64::NAN).band, CapBand::Micro);
    }
}
