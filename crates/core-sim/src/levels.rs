use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::characteristics::MarketCharacteristics;

const PSYCHOLOGICAL_STRENGTH: f64 = 0.8;
const LEVEL_JITTER_FRACTION: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Support,
    Resistance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelCategory {
    Psychological,
    Technical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: f64,
    pub kind: LevelKind,
    /// In `0.0..=1.0`.
    pub strength: f64,
    pub category: LevelCategory,
}

impl Level {
    pub fn distance_pct(&self, price: f64) -> f64 {
        (price - self.price).abs() / price
    }
}

pub fn psychological_interval(price: f64) -> f64 {
    if price > 100_000.0 {
        10_000.0
    } else if price > 10_000.0 {
        1_000.0
    } else if price > 1_000.0 {
        100.0
    } else if price > 100.0 {
        10.0
    } else {
        1.0
    }
}

/// Round-number levels two steps either side of the nearest round number, which
/// itself is skipped.
pub fn psychological_levels(base_price: f64) -> Vec<Level> {
    let interval = psychological_interval(base_price);
    let anchor = (base_price / interval).round() * interval;

    [-2.0, -1.0, 1.0, 2.0]
        .into_iter()
        .map(|step| anchor + step * interval)
        .filter(|price| *price > 0.0)
        .map(|price| Level {
            price,
            kind: if price > base_price {
                LevelKind::Resistance
            } else {
                LevelKind::Support
            },
            strength: PSYCHOLOGICAL_STRENGTH,
            category: LevelCategory::Psychological,
        })
        .collect()
}

/// Psychological levels plus technical levels 2%-10% away until the band's level
/// count is reached. Sorted by price ascending.
pub fn generate_levels<R: Rng + ?Sized>(
    base_price: f64,
    characteristics: &MarketCharacteristics,
    rng: &mut R,
) -> Vec<Level> {
    let mut levels = psychological_levels(base_price);
    let technical_count = characteristics.level_count.saturating_sub(levels.len());

    for _ in 0..technical_count {
        let distance = (0.02 + rng.random::<f64>() * 0.08) * base_price;
        let is_support = rng.random::<f64>() > 0.5;
        let strength = 0.5 + rng.random::<f64>() * 0.5;

        levels.push(Level {
            price: if is_support {
                base_price - distance
            } else {
                base_price + distance
            },
            kind: if is_support {
                LevelKind::Support
            } else {
                LevelKind::Resistance
            },
            strength,
            category: LevelCategory::Technical,
        });
    }

    sort_levels(&mut levels);
    levels
}

/// First level (in price order) within `max_distance_pct` of `price`.
pub fn nearest_level(levels: &[Level], price: f64, max_distance_pct: f64) -> Option<&Level> {
    levels
        .iter()
        .find(|level| level.distance_pct(price) < max_distance_pct)
}

/// Drifts every level by up to ±0.25% of its price.
pub fn jitter_levels<R: Rng + ?Sized>(levels: &mut [Level], rng: &mut R) {
    for level in levels.iter_mut() {
        let adjustment = level.price * (rng.random::<f64>() - 0.5) * LEVEL_JITTER_FRACTION;
        level.price += adjustment;
    }
    sort_levels(levels);
}

fn sort_levels(levels: &mut [Level]) {
    levels.sort_by(|left, right| left.price.total_cmp(&right.price));
}
