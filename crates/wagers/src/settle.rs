use crate::config::WagerConfig;
use crate::wager::{resolve_outcome, Outcome, Wager};

/// Settles a single wager at `settlement_price`. Already settled wagers are
/// returned unchanged.
pub fn settle_wager(
    wager: &Wager,
    settlement_price: f64,
    now_ms: i64,
    config: &WagerConfig,
) -> Wager {
    if wager.settled {
        return wager.clone();
    }

    let result = resolve_outcome(wager.direction, wager.entry_price, settlement_price);
    let profit = match result {
        Outcome::Win => wager.amount * config.payout_multiplier,
        Outcome::Loss => -wager.amount,
    };

    Wager {
        settled: true,
        result: Some(result),
        profit: Some(profit),
        settlement_price: Some(settlement_price),
        settlement_time: Some(now_ms),
        ..wager.clone()
    }
}

/// Settles every due wager and drops expired ones.
///
/// The check is level-triggered on elapsed time, so a late pass settles exactly
/// once and a repeated pass with the same `now_ms` returns the same list. A
/// wager whose price lookup yields nothing usable stays open until a later
/// pass. Settlement runs before expiry, so a wager first seen past its expiry
/// is still settled by the pass that removes it.
pub fn settle_due_wagers<F>(
    wagers: &[Wager],
    now_ms: i64,
    config: &WagerConfig,
    live_price: F,
) -> Vec<Wager>
where
    F: FnMut(&Wager) -> Option<f64>,
{
    let mut settled = settle_due(wagers, now_ms, config, live_price);
    drop_expired(&mut settled, now_ms, config);
    settled
}

/// Settles due wagers without removing anything.
pub fn settle_due<F>(
    wagers: &[Wager],
    now_ms: i64,
    config: &WagerConfig,
    mut live_price: F,
) -> Vec<Wager>
where
    F: FnMut(&Wager) -> Option<f64>,
{
    wagers
        .iter()
        .map(|wager| {
            if !wager.is_due(now_ms, config) {
                return wager.clone();
            }
            match live_price(wager).filter(|price| price.is_finite() && *price > 0.0) {
                Some(price) => settle_wager(wager, price, now_ms, config),
                None => wager.clone(),
            }
        })
        .collect()
}

/// Removes settled wagers past their expiry and returns them.
pub fn drop_expired(wagers: &mut Vec<Wager>, now_ms: i64, config: &WagerConfig) -> Vec<Wager> {
    let (expired, kept): (Vec<Wager>, Vec<Wager>) = std::mem::take(wagers)
        .into_iter()
        .partition(|wager| wager.settled && wager.is_expired(now_ms, config));
    *wagers = kept;
    expired
}
