//! Timed up/down wagers: submission checks, settlement against a live price,
//! and balance accounting.

mod book;
mod config;
mod error;
mod settle;
mod wager;

pub use book::{SettlementPass, WagerBook};
pub use config::WagerConfig;
pub use error::{WagerConfigError, WagerRejection};
pub use settle::{drop_expired, settle_due, settle_due_wagers, settle_wager};
pub use wager::{resolve_outcome, Direction, Outcome, Wager, WagerId};
