//! # EMBER Trade
//!
//! Player-to-player trading with all-or-nothing settlement. A trade is a
//! negotiation (offers of items and gold, edited until both sides confirm)
//! followed by a commit through an [`AtomicTransaction`]: the first failing
//! transfer unwinds everything already applied, in reverse order, so the
//! world is always either fully pre-trade or fully post-trade.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod ledger;
pub mod session;
pub mod transaction;

pub use error::{TradeError, TradeResult};
pub use ledger::TradeLedger;
pub use session::{TradeOffer, TradeSession};
pub use transaction::{AtomicTransaction, CommitError};
