use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::candle::Candle;

/// Number of trailing candles inspected for chart formations.
pub const PATTERN_WINDOW: usize = 10;

const DOUBLE_TOP_PROBABILITY: f64 = 0.15;
const TRIANGLE_PROBABILITY: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartPatternKind {
    DoubleTop,
    AscendingTriangle,
    DescendingTriangle,
}

impl ChartPatternKind {
    pub fn is_triangle(self) -> bool {
        matches!(self, Self::AscendingTriangle | Self::DescendingTriangle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPattern {
    pub kind: ChartPatternKind,
    pub target_price: f64,
    pub strength: f64,
}

/// Stochastic pattern scan over the last [`PATTERN_WINDOW`] candles. Each check
/// only runs with its own probability, so an existing formation is not always
/// reported.
pub fn detect_chart_pattern<R: Rng + ?Sized>(
    candles: &[Candle],
    rng: &mut R,
) -> Option<ChartPattern> {
    if candles.len() < PATTERN_WINDOW {
        return None;
    }

    let recent = &candles[candles.len() - PATTERN_WINDOW..];
    let current_price = recent[PATTERN_WINDOW - 1].close;

    if rng.random::<f64>() < DOUBLE_TOP_PROBABILITY && is_double_top(recent) {
        return Some(ChartPattern {
            kind: ChartPatternKind::DoubleTop,
            target_price: current_price * 0.95,
            strength: 0.8,
        });
    }

    if rng.random::<f64>() < TRIANGLE_PROBABILITY {
        if let Some(kind) = triangle_kind(recent) {
            let target_factor = match kind {
                ChartPatternKind::AscendingTriangle => 1.03,
                _ => 0.97,
            };
            return Some(ChartPattern {
                kind,
                target_price: current_price * target_factor,
                strength: 0.6,
            });
        }
    }

    None
}

fn is_double_top(recent: &[Candle]) -> bool {
    let max_high = recent
        .iter()
        .map(|candle| candle.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let second_high = recent
        .iter()
        .map(|candle| candle.high)
        .filter(|high| *high < max_high * 0.99)
        .fold(0.0, f64::max);

    second_high > max_high * 0.95
}

fn triangle_kind(recent: &[Candle]) -> Option<ChartPatternKind> {
    let first = recent.first()?;
    let last = recent.last()?;

    let ascending = last.low > first.low && last.high < first.high * 1.02;
    let descending = last.high < first.high && last.low > first.low * 0.98;

    if ascending {
        Some(ChartPatternKind::AscendingTriangle)
    } else if descending {
        Some(ChartPatternKind::DescendingTriangle)
    } else {
        None
    }
}
