use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::levels::{nearest_level, Level};
use crate::patterns::ChartPattern;

const TRENDING_WEIGHT: f64 = 0.25;
const RANGING_WEIGHT: f64 = 0.60;
const NEAR_LEVEL_PCT: f64 = 0.01;
const NEAR_LEVEL_RANGING_BONUS: f64 = 0.3;
const MOMENTUM_CARRY_PROBABILITY: f64 = 0.7;
const EARLY_TRANSITION_PROBABILITY: f64 = 0.08;
const EARLY_TRANSITION_MIN_ELAPSED: u32 = 3;
const PATTERN_TRANSITION_PROBABILITY: f64 = 0.3;
const TRIANGLE_RANGE_FACTOR: f64 = 0.8;

/// Up or down; shared by regimes and by wagers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Self::Up => 1.0,
            Self::Down => -1.0,
        }
    }

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random::<f64>() > 0.5 {
            Self::Up
        } else {
            Self::Down
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "regime", rename_all = "snake_case")]
pub enum Regime {
    Trending {
        direction: Direction,
        /// In `0.4..1.0`.
        strength: f64,
        duration: u32,
    },
    Ranging {
        center: f64,
        /// Half-width of the range as a fraction of `center`.
        range: f64,
        duration: u32,
    },
    Breakout {
        direction: Direction,
        /// In `1.2..3.0`.
        intensity: f64,
        duration: u32,
    },
}

impl Regime {
    /// Planned lifetime in candles.
    pub fn duration(&self) -> u32 {
        match self {
            Self::Trending { duration, .. }
            | Self::Ranging { duration, .. }
            | Self::Breakout { duration, .. } => *duration,
        }
    }

    pub fn is_trending(&self) -> bool {
        matches!(self, Self::Trending { .. })
    }
}

/// Weighted draw of the next regime. Proximity to a level shifts mass from
/// trending to ranging; a trending predecessor passes on its direction 70% of
/// the time.
pub fn draw_regime<R: Rng + ?Sized>(
    price: f64,
    levels: &[Level],
    previous: Option<&Regime>,
    rng: &mut R,
) -> Regime {
    let bonus = if nearest_level(levels, price, NEAR_LEVEL_PCT).is_some() {
        NEAR_LEVEL_RANGING_BONUS
    } else {
        0.0
    };
    let trending_threshold = TRENDING_WEIGHT * (1.0 - bonus);
    let ranging_threshold = trending_threshold + RANGING_WEIGHT * (1.0 + bonus);

    let draw = rng.random::<f64>();
    if draw < trending_threshold {
        let mut direction = Direction::random(rng);
        if let Some(Regime::Trending {
            direction: previous_direction,
            ..
        }) = previous
        {
            if rng.random::<f64>() < MOMENTUM_CARRY_PROBABILITY {
                direction = *previous_direction;
            }
        }

        Regime::Trending {
            direction,
            strength: 0.4 + rng.random::<f64>() * 0.6,
            duration: rng.random_range(5..20),
        }
    } else if draw < ranging_threshold {
        ranging(price, rng)
    } else {
        Regime::Breakout {
            direction: Direction::random(rng),
            intensity: 1.2 + rng.random::<f64>() * 1.8,
            duration: rng.random_range(3..10),
        }
    }
}

fn ranging<R: Rng + ?Sized>(center: f64, rng: &mut R) -> Regime {
    Regime::Ranging {
        center,
        range: 0.008 + rng.random::<f64>() * 0.015,
        duration: rng.random_range(10..30),
    }
}

/// Regime state carried across candles of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeMachine {
    regime: Regime,
    elapsed: u32,
}

impl RegimeMachine {
    pub fn new<R: Rng + ?Sized>(price: f64, levels: &[Level], rng: &mut R) -> Self {
        Self {
            regime: draw_regime(price, levels, None, rng),
            elapsed: 0,
        }
    }

    pub fn from_regime(regime: Regime) -> Self {
        Self { regime, elapsed: 0 }
    }

    pub fn regime(&self) -> &Regime {
        &self.regime
    }

    /// Candles spent in the current regime.
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Advances one candle and transitions when the regime has run its course,
    /// on an early 8% draw, or on a 30% draw while a chart pattern is detected.
    /// Returns `true` on transition.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        price: f64,
        levels: &[Level],
        pattern: Option<&ChartPattern>,
        rng: &mut R,
    ) -> bool {
        self.elapsed += 1;

        let expired = self.elapsed >= self.regime.duration();
        let early = self.elapsed > EARLY_TRANSITION_MIN_ELAPSED
            && rng.random::<f64>() < EARLY_TRANSITION_PROBABILITY;
        let pattern_forced =
            pattern.is_some() && rng.random::<f64>() < PATTERN_TRANSITION_PROBABILITY;

        if !(expired || early || pattern_forced) {
            return false;
        }

        let mut next = draw_regime(price, levels, Some(&self.regime), rng);
        if pattern.is_some_and(|pattern| pattern.kind.is_triangle()) {
            next = contract_to_range(next, price, rng);
        }

        self.regime = next;
        self.elapsed = 0;
        true
    }
}

/// Triangles compress price action: the next regime becomes a narrower range
/// around the current price, keeping the drawn lifetime.
fn contract_to_range<R: Rng + ?Sized>(regime: Regime, price: f64, rng: &mut R) -> Regime {
    match regime {
        Regime::Ranging {
            center,
            range,
            duration,
        } => Regime::Ranging {
            center,
            range: range * TRIANGLE_RANGE_FACTOR,
            duration,
        },
        other => match ranging(price, rng) {
            Regime::Ranging { center, range, .. } => Regime::Ranging {
                center,
                range: range * TRIANGLE_RANGE_FACTOR,
                duration: other.duration(),
            },
            fallback => fallback,
        },
    }
}
