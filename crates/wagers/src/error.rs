use thiserror::Error;

/// Why a wager submission was refused. No state changes on rejection.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WagerRejection {
    #[error("wager amount must be a positive number, got {0}")]
    NonPositiveAmount(f64),

    #[error("insufficient balance: wager of {amount} exceeds balance of {balance}")]
    InsufficientBalance { amount: f64, balance: f64 },

    #[error("entry price must be finite and positive, got {0}")]
    InvalidEntryPrice(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WagerConfigError {
    #[error("trade duration must be positive, got {0}ms")]
    InvalidTradeDuration(i64),

    #[error("expiry ({expiry_ms}ms) must not precede the trade duration ({trade_duration_ms}ms)")]
    ExpiryBeforeSettlement {
        trade_duration_ms: i64,
        expiry_ms: i64,
    },

    #[error("payout multiplier must be finite and non-negative, got {0}")]
    InvalidPayoutMultiplier(f64),

    #[error("initial balance must be finite and non-negative, got {0}")]
    InvalidInitialBalance(f64),
}
