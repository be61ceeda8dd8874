#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub candle_count: usize,
    pub interval_ms: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            candle_count: 61,
            interval_ms: 2_000,
        }
    }
}

impl GeneratorConfig {
    pub fn new(candle_count: usize, interval_ms: i64) -> Self {
        Self {
            candle_count,
            interval_ms,
        }
    }
}
