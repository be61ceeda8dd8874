use rand::Rng;

use crate::activity::activity_multiplier;
use crate::candle::Candle;
use crate::characteristics::MarketCharacteristics;
use crate::levels::{nearest_level, Level, LevelKind};
use crate::regime::{Direction, Regime};

const REGIME_LEVEL_PCT: f64 = 0.015;
const WICK_LEVEL_PCT: f64 = 0.02;
const LEVEL_TREND_DAMPING: f64 = 0.7;
const RANGE_REVERSION_GAIN: f64 = 1.5;
const BOUNCE_PROBABILITY: f64 = 0.68;
const FALSE_BREAKOUT_PROBABILITY: f64 = 0.25;
const FALSE_BREAKOUT_FACTOR: f64 = -0.6;
const NOISE_SCALE: f64 = 0.3;
const MAX_BODY_CHANGE: f64 = 0.05;
const MIN_CLOSE_FRACTION: f64 = 0.01;
const MAX_EXCURSION: f64 = 0.08;
const LEVEL_WICK_RETAIN: f64 = 0.3;

/// Everything a candle draw needs besides the previous candle and the regime.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisContext<'a> {
    pub characteristics: &'a MarketCharacteristics,
    pub levels: &'a [Level],
    pub interval_ms: i64,
    /// Scales trending drift; asset-specific, `1.0` by default.
    pub trend_scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesizedCandle {
    pub candle: Candle,
    /// Number of non-finite intermediates replaced by a fallback.
    pub fallbacks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RegimeMove {
    delta: f64,
    volatility: f64,
}

/// Draws the candle following `prev` under `regime`.
pub fn synthesize_candle<R: Rng + ?Sized>(
    prev: &Candle,
    regime: &Regime,
    context: &SynthesisContext<'_>,
    rng: &mut R,
) -> SynthesizedCandle {
    let open = prev.close;
    let time = prev.time.saturating_add(context.interval_ms);
    let activity = activity_multiplier(time);
    let mut fallbacks = 0;

    let regime_move = regime_move(open, regime, context, activity, rng);

    let noise_intensity = 0.3 + rng.random::<f64>() * 0.4;
    let noise = (rng.random::<f64>() - 0.5) * 2.0 * noise_intensity;
    let raw_close = open + regime_move.delta + noise * open * regime_move.volatility * NOISE_SCALE;

    let close = if raw_close.is_finite() {
        let max_change = open * MAX_BODY_CHANGE;
        raw_close
            .clamp(open - max_change, open + max_change)
            .max(open * MIN_CLOSE_FRACTION)
    } else {
        fallbacks += 1;
        open
    };

    let body = (close - open).abs();
    let is_green = close > open;
    let wick_intensity = 0.8 + rng.random::<f64>() * 1.4;
    let base_wick = (body * wick_intensity).max(open * regime_move.volatility * 0.5);
    let (upper_bias, lower_bias) = if is_green { (0.6, 1.4) } else { (1.4, 0.6) };

    let body_top = open.max(close);
    let body_bottom = open.min(close);
    let mut high = body_top + rng.random::<f64>() * base_wick * upper_bias;
    let mut low = body_bottom - rng.random::<f64>() * base_wick * lower_bias;

    for level in context.levels {
        if level.distance_pct(open) >= WICK_LEVEL_PCT {
            continue;
        }
        match level.kind {
            LevelKind::Resistance if high > level.price => {
                if rng.random::<f64>() < level.strength {
                    high = level.price + (high - level.price) * LEVEL_WICK_RETAIN;
                }
            }
            LevelKind::Support if low < level.price => {
                if rng.random::<f64>() < level.strength {
                    low = level.price - (level.price - low) * LEVEL_WICK_RETAIN;
                }
            }
            _ => {}
        }
    }

    high = high.min(open * (1.0 + MAX_EXCURSION)).max(body_top);
    low = low.max(open * (1.0 - MAX_EXCURSION)).min(body_bottom);

    if !high.is_finite() {
        fallbacks += 1;
        high = body_top;
    }
    if !low.is_finite() {
        fallbacks += 1;
        low = body_bottom;
    }
    if low > high {
        std::mem::swap(&mut low, &mut high);
    }

    SynthesizedCandle {
        candle: Candle::new(time, open, high, low, close).rounded(),
        fallbacks,
    }
}

fn regime_move<R: Rng + ?Sized>(
    price: f64,
    regime: &Regime,
    context: &SynthesisContext<'_>,
    activity: f64,
    rng: &mut R,
) -> RegimeMove {
    let base_volatility = context.characteristics.base_volatility * activity;
    let max_volatility = context.characteristics.max_volatility * activity;
    let near = nearest_level(context.levels, price, REGIME_LEVEL_PCT);

    match *regime {
        Regime::Trending {
            direction,
            strength,
            ..
        } => {
            let mut delta =
                price * base_volatility * strength * direction.sign() * context.trend_scale;
            let opposing = near.filter(|level| {
                matches!(
                    (level.kind, direction),
                    (LevelKind::Resistance, Direction::Up) | (LevelKind::Support, Direction::Down)
                )
            });
            if let Some(level) = opposing {
                delta *= 1.0 - level.strength * LEVEL_TREND_DAMPING;
            }

            RegimeMove {
                delta,
                volatility: base_volatility * (1.0 + strength * 0.4),
            }
        }
        Regime::Ranging { center, range, .. } => {
            let max_range = center * range;
            let position = ((price - center) / max_range).clamp(-1.0, 1.0);
            let reversion_strength = position.abs() * RANGE_REVERSION_GAIN;
            let mut delta = -position * price * base_volatility * reversion_strength;

            if let Some(level) = near {
                if rng.random::<f64>() < BOUNCE_PROBABILITY {
                    let away = match level.kind {
                        LevelKind::Support => 1.0,
                        LevelKind::Resistance => -1.0,
                    };
                    delta += price * base_volatility * 0.5 * away * level.strength;
                }
            }

            RegimeMove {
                delta,
                volatility: base_volatility * 0.7,
            }
        }
        Regime::Breakout {
            direction,
            intensity,
            ..
        } => {
            let mut delta = price * max_volatility * intensity * direction.sign();
            if rng.random::<f64>() < FALSE_BREAKOUT_PROBABILITY {
                delta *= FALSE_BREAKOUT_FACTOR;
            }

            RegimeMove {
                delta,
                volatility: max_volatility * 0.8,
            }
        }
    }
}
