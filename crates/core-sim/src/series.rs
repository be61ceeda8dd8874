use rand::Rng;
use tracing::{debug, warn};

use crate::candle::Candle;
use crate::characteristics::{market_characteristics, MarketCharacteristics};
use crate::config::GeneratorConfig;
use crate::error::SeriesError;
use crate::levels::{generate_levels, jitter_levels, Level};
use crate::patterns::{detect_chart_pattern, ChartPattern};
use crate::regime::RegimeMachine;
use crate::synthesizer::{synthesize_candle, SynthesisContext};

const LEVEL_JITTER_EVERY: usize = 20;
const SEED_VOLATILITY_FACTOR: f64 = 0.5;
const PATTERN_NUDGE: f64 = 0.002;
const PATTERN_INFLUENCE: f64 = 0.3;

/// Smallest accepted base price. Leaves ten thousand price units of
/// `PRICE_DECIMALS` resolution so candles never round to zero.
pub const MIN_BASE_PRICE: f64 = 1e-4;

/// Candles plus the support/resistance levels they were generated against.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSeries {
    pub candles: Vec<Candle>,
    pub levels: Vec<Level>,
    /// Non-finite intermediates replaced during synthesis.
    pub degenerate_values: u32,
}

/// Builds `config.candle_count` candles whose last one opens at `end_time_ms`.
pub fn generate_series<R: Rng + ?Sized>(
    base_price: f64,
    config: &GeneratorConfig,
    end_time_ms: i64,
    trend_scale: f64,
    rng: &mut R,
) -> Result<GeneratedSeries, SeriesError> {
    if !base_price.is_finite() || base_price < MIN_BASE_PRICE {
        return Err(SeriesError::InvalidBasePrice(base_price));
    }
    if config.interval_ms <= 0 {
        return Err(SeriesError::InvalidInterval(config.interval_ms));
    }
    let start_time_ms = series_start(config, end_time_ms)
        .ok_or(SeriesError::InvalidInterval(config.interval_ms))?;

    let characteristics = market_characteristics(base_price);
    let mut levels = generate_levels(base_price, &characteristics, rng);
    if config.candle_count == 0 {
        return Ok(GeneratedSeries {
            candles: Vec::new(),
            levels,
            degenerate_values: 0,
        });
    }

    let mut machine = RegimeMachine::new(base_price, &levels, rng);
    let mut candles = Vec::with_capacity(config.candle_count);
    let mut degenerate_values = 0;

    candles.push(seed_candle(
        base_price,
        start_time_ms,
        &characteristics,
        rng,
    ));

    for index in 1..config.candle_count {
        let prev = candles[candles.len() - 1];
        let pattern = detect_chart_pattern(&candles, rng);
        machine.step(prev.close, &levels, pattern.as_ref(), rng);

        let context = SynthesisContext {
            characteristics: &characteristics,
            levels: &levels,
            interval_ms: config.interval_ms,
            trend_scale,
        };
        let synthesized = synthesize_candle(&prev, machine.regime(), &context, rng);
        degenerate_values += synthesized.fallbacks;

        let candle = match pattern {
            Some(pattern) => nudge_toward_pattern(synthesized.candle, &pattern),
            None => synthesized.candle,
        };
        candles.push(candle);

        if index % LEVEL_JITTER_EVERY == 0 {
            jitter_levels(&mut levels, rng);
        }
    }

    if degenerate_values > 0 {
        warn!(
            base_price,
            degenerate_values, "replaced non-finite values while generating series"
        );
    }
    debug!(
        base_price,
        candles = candles.len(),
        levels = levels.len(),
        "generated historical series"
    );

    Ok(GeneratedSeries {
        candles,
        levels,
        degenerate_values,
    })
}

/// `count` candles at `interval_ms` spacing ending at `end_time_ms`.
pub fn generate_historical_series<R: Rng + ?Sized>(
    base_price: f64,
    count: usize,
    interval_ms: i64,
    end_time_ms: i64,
    rng: &mut R,
) -> Result<Vec<Candle>, SeriesError> {
    let config = GeneratorConfig::new(count, interval_ms);
    generate_series(base_price, &config, end_time_ms, 1.0, rng).map(|series| series.candles)
}

/// Open time of the first candle, `None` when the span leaves the i64 range.
fn series_start(config: &GeneratorConfig, end_time_ms: i64) -> Option<i64> {
    let gaps = i64::try_from(config.candle_count.saturating_sub(1)).ok()?;
    let span = config.interval_ms.checked_mul(gaps)?;
    end_time_ms.checked_sub(span)
}

fn seed_candle<R: Rng + ?Sized>(
    base_price: f64,
    time: i64,
    characteristics: &MarketCharacteristics,
    rng: &mut R,
) -> Candle {
    let volatility = characteristics.base_volatility * SEED_VOLATILITY_FACTOR;
    let high = base_price * (1.0 + rng.random::<f64>() * volatility);
    let low = base_price * (1.0 - rng.random::<f64>() * volatility);
    let close = base_price * (1.0 + (rng.random::<f64>() - 0.5) * volatility * 0.5);

    Candle::new(
        time,
        base_price,
        high.max(close).max(base_price),
        low.min(close).min(base_price),
        close,
    )
    .rounded()
}

fn nudge_toward_pattern(candle: Candle, pattern: &ChartPattern) -> Candle {
    let direction = if pattern.target_price > candle.close {
        1.0
    } else {
        -1.0
    };
    let adjustment = candle.close * PATTERN_NUDGE * direction * pattern.strength * PATTERN_INFLUENCE;
    let close = candle.close + adjustment;

    Candle::new(
        candle.time,
        candle.open,
        candle.high.max(close),
        candle.low.min(close),
        close,
    )
    .rounded()
}
