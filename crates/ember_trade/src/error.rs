//! Trade-specific errors.

use ember_core::{CoreError, EntityId, ItemId};
use thiserror::Error;

use crate::transaction::CommitError;

/// Errors surfaced by trade commands.
#[derive(Debug, Error)]
pub enum TradeError {
    /// World-level failure: unknown entity, missing holdings.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The trade commit failed; the world was restored to its pre-trade
    /// state unless the variant says otherwise.
    #[error(transparent)]
    Commit(#[from] CommitError),

    /// A party cannot trade with themselves.
    #[error("entity {0} cannot trade with itself")]
    SelfTrade(EntityId),

    /// The party is already in another trade.
    #[error("entity {0} is already trading")]
    PartyBusy(EntityId),

    /// No trade session involves this party.
    #[error("entity {0} has no open trade")]
    NoSession(EntityId),

    /// Only the receiving party may accept a proposal.
    #[error("entity {0} proposed this trade and cannot accept it")]
    ProposerCannotAccept(EntityId),

    /// Offers cannot be edited before the proposal is accepted.
    #[error("trade not yet accepted")]
    NotAccepted,

    /// The item is not part of the party's offer.
    #[error("item {item} is not offered by entity {party}")]
    NotOffered {
        /// The editing party.
        party: EntityId,
        /// The item instance.
        item: ItemId,
    },
}

/// Convenience alias for trade results.
pub type TradeResult<T> = Result<T, TradeError>;
