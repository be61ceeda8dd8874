use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SeriesError {
    #[error("base price must be finite and at least 0.0001, got {0}")]
    InvalidBasePrice(f64),

    #[error("candle interval must be positive and fit the series span, got {0}ms")]
    InvalidInterval(i64),
}
