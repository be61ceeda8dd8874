use crate::error::WagerConfigError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WagerConfig {
    /// Time from submission to settlement.
    pub trade_duration_ms: i64,
    /// Time from submission until a wager leaves the active set.
    pub expiry_ms: i64,
    /// Profit on a win as a multiple of the stake.
    pub payout_multiplier: f64,
}

impl Default for WagerConfig {
    fn default() -> Self {
        Self {
            trade_duration_ms: 60_000,
            expiry_ms: 120_000,
            payout_multiplier: 1.75,
        }
    }
}

impl WagerConfig {
    pub fn validate(&self) -> Result<(), WagerConfigError> {
        if self.trade_duration_ms <= 0 {
            return Err(WagerConfigError::InvalidTradeDuration(
                self.trade_duration_ms,
            ));
        }
        if self.expiry_ms < self.trade_duration_ms {
            return Err(WagerConfigError::ExpiryBeforeSettlement {
                trade_duration_ms: self.trade_duration_ms,
                expiry_ms: self.expiry_ms,
            });
        }
        if !self.payout_multiplier.is_finite() || self.payout_multiplier < 0.0 {
            return Err(WagerConfigError::InvalidPayoutMultiplier(
                self.payout_multiplier,
            ));
        }

        Ok(())
    }
}
