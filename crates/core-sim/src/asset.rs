use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::candle::Candle;
use crate::config::GeneratorConfig;
use crate::error::SeriesError;
use crate::series::{generate_series, GeneratedSeries};

const WICK_EXTENSION: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetQuote {
    pub symbol: String,
    pub price: f64,
}

impl AssetQuote {
    pub fn new(symbol: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetProfile {
    pub volatility_multiplier: f64,
    pub trend_strength: f64,
}

impl Default for AssetProfile {
    fn default() -> Self {
        Self {
            volatility_multiplier: 1.0,
            trend_strength: 1.0,
        }
    }
}

pub fn asset_profile(symbol: &str) -> AssetProfile {
    let (volatility_multiplier, trend_strength) = match symbol {
        "BTC" => (0.8, 1.2),
        "ETH" => (1.0, 1.0),
        "BNB" => (1.2, 0.9),
        "SOL" => (1.5, 0.8),
        "TRUMP" => (2.0, 0.6),
        _ => return AssetProfile::default(),
    };

    AssetProfile {
        volatility_multiplier,
        trend_strength,
    }
}

/// Assets offered by a fresh session, with their reference prices.
pub fn default_catalogue() -> Vec<AssetQuote> {
    vec![
        AssetQuote::new("BTC", 118_735.3),
        AssetQuote::new("ETH", 3_650.0),
        AssetQuote::new("BNB", 720.0),
        AssetQuote::new("SOL", 180.0),
        AssetQuote::new("TRUMP", 9.5),
    ]
}

/// Series for a specific asset: trending drift scaled by the asset's trend
/// strength, then every open-to-close move scaled by its volatility multiplier.
pub fn generate_asset_series<R: Rng + ?Sized>(
    asset: &AssetQuote,
    config: &GeneratorConfig,
    end_time_ms: i64,
    rng: &mut R,
) -> Result<GeneratedSeries, SeriesError> {
    let profile = asset_profile(&asset.symbol);
    let mut series = generate_series(
        asset.price,
        config,
        end_time_ms,
        profile.trend_strength,
        rng,
    )?;

    for candle in series.candles.iter_mut().skip(1) {
        *candle = scale_body(*candle, profile.volatility_multiplier, rng);
    }

    Ok(series)
}

fn scale_body<R: Rng + ?Sized>(candle: Candle, multiplier: f64, rng: &mut R) -> Candle {
    let adjusted = (candle.close - candle.open) * multiplier;
    let close = candle.open + adjusted;
    let upper = adjusted.abs() * WICK_EXTENSION * rng.random::<f64>();
    let lower = adjusted.abs() * WICK_EXTENSION * rng.random::<f64>();

    Candle::new(
        candle.time,
        candle.open,
        candle.open.max(close) + upper,
        candle.open.min(close) - lower,
        close,
    )
    .rounded()
}
