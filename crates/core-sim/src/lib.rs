//! Synthetic market generation: price-level profiles, support/resistance
//! levels, regime switching, OHLC candle synthesis and the live price walk.

mod activity;
mod asset;
mod candle;
mod characteristics;
mod config;
mod error;
mod levels;
mod patterns;
mod regime;
mod series;
mod synthesizer;
mod ticker;

pub use activity::activity_multiplier;
pub use asset::{asset_profile, default_catalogue, generate_asset_series, AssetProfile, AssetQuote};
pub use candle::{round_price, Candle, PRICE_DECIMALS};
pub use characteristics::{market_characteristics, CapBand, MarketCharacteristics};
pub use config::GeneratorConfig;
pub use error::SeriesError;
pub use levels::{
    generate_levels, jitter_levels, nearest_level, psychological_interval, psychological_levels,
    Level, LevelCategory, LevelKind,
};
pub use patterns::{detect_chart_pattern, ChartPattern, ChartPatternKind, PATTERN_WINDOW};
pub use regime::{draw_regime, Direction, Regime, RegimeMachine};
pub use series::{generate_historical_series, generate_series, GeneratedSeries, MIN_BASE_PRICE};
pub use synthesizer::{synthesize_candle, SynthesisContext, SynthesizedCandle};
pub use ticker::{tick_live_price, tick_step_fraction, LiveTicker, PriceTick};
