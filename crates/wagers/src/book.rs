use std::collections::HashSet;

use tracing::info;

use crate::config::WagerConfig;
use crate::error::{WagerConfigError, WagerRejection};
use crate::settle::{drop_expired, settle_due};
use crate::wager::{Direction, Wager, WagerId};

/// Result of one settlement pass over the book.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettlementPass {
    pub settled: Vec<Wager>,
    pub expired: Vec<WagerId>,
}

/// Active wagers plus the balance they draw on.
#[derive(Debug, Clone, PartialEq)]
pub struct WagerBook {
    config: WagerConfig,
    balance: f64,
    wagers: Vec<Wager>,
    next_id: WagerId,
}

impl WagerBook {
    pub fn new(config: WagerConfig, initial_balance: f64) -> Result<Self, WagerConfigError> {
        config.validate()?;
        if !initial_balance.is_finite() || initial_balance < 0.0 {
            return Err(WagerConfigError::InvalidInitialBalance(initial_balance));
        }

        Ok(Self {
            config,
            balance: initial_balance,
            wagers: Vec::new(),
            next_id: 1,
        })
    }

    pub fn config(&self) -> &WagerConfig {
        &self.config
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn wagers(&self) -> &[Wager] {
        &self.wagers
    }

    pub fn open_count(&self) -> usize {
        self.wagers.iter().filter(|wager| !wager.settled).count()
    }

    /// Opens a wager and debits its stake.
    pub fn submit(
        &mut self,
        asset: &str,
        direction: Direction,
        amount: f64,
        entry_price: f64,
        now_ms: i64,
    ) -> Result<Wager, WagerRejection> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(WagerRejection::NonPositiveAmount(amount));
        }
        if amount > self.balance {
            return Err(WagerRejection::InsufficientBalance {
                amount,
                balance: self.balance,
            });
        }
        if !entry_price.is_finite() || entry_price <= 0.0 {
            return Err(WagerRejection::InvalidEntryPrice(entry_price));
        }

        let wager = Wager::open(
            self.next_id,
            asset,
            direction,
            amount,
            entry_price,
            now_ms,
        );
        self.next_id += 1;
        self.balance -= amount;
        self.wagers.push(wager.clone());

        info!(
            id = wager.id,
            asset,
            ?direction,
            amount,
            entry_price,
            balance = self.balance,
            "wager submitted"
        );
        Ok(wager)
    }

    /// Settles due wagers, credits each profit once, and drops expired ones.
    pub fn settle_due<F>(&mut self, now_ms: i64, live_price: F) -> SettlementPass
    where
        F: FnMut(&Wager) -> Option<f64>,
    {
        let previously_settled: HashSet<WagerId> = self
            .wagers
            .iter()
            .filter(|wager| wager.settled)
            .map(|wager| wager.id)
            .collect();

        let mut updated = settle_due(&self.wagers, now_ms, &self.config, live_price);
        let settled: Vec<Wager> = updated
            .iter()
            .filter(|wager| wager.settled && !previously_settled.contains(&wager.id))
            .cloned()
            .collect();

        for wager in &settled {
            let profit = wager.profit.unwrap_or(0.0);
            self.balance += profit;
            info!(
                id = wager.id,
                asset = %wager.asset,
                result = ?wager.result,
                profit,
                balance = self.balance,
                "wager settled"
            );
        }

        let expired = drop_expired(&mut updated, now_ms, &self.config)
            .into_iter()
            .map(|wager| wager.id)
            .collect();
        self.wagers = updated;

        SettlementPass { settled, expired }
    }
}
