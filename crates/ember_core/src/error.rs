//! # World Model Error Types
//!
//! All errors that can occur while reading or mutating world state.

use thiserror::Error;

use crate::entity::EntityId;
use crate::item::ItemId;
use crate::location::LocationId;

/// Errors that can occur in the world model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Entity id is not present in the world.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Location id is not present in the world.
    #[error("location not found: {0}")]
    LocationNotFound(LocationId),

    /// Entity exists but carries no combatant component.
    #[error("entity {0} is not a combatant")]
    NotACombatant(EntityId),

    /// Entity exists but carries no holdings component.
    #[error("entity {0} has no holdings")]
    NoHoldings(EntityId),

    /// Item is not in the owner's holdings.
    #[error("entity {owner} does not hold item {item}")]
    ItemNotFound {
        /// The holder that was searched.
        owner: EntityId,
        /// The missing item.
        item: ItemId,
    },

    /// Item id already present in the receiver's holdings.
    #[error("entity {owner} already holds item {item}")]
    DuplicateItem {
        /// The holder that was checked.
        owner: EntityId,
        /// The duplicate item.
        item: ItemId,
    },

    /// Gold debit exceeds the purse.
    #[error("entity {owner} holds {available} gold, {needed} needed")]
    InsufficientGold {
        /// The purse owner.
        owner: EntityId,
        /// The amount required.
        needed: u64,
        /// The amount available.
        available: u64,
    },

    /// World-data seed failed referential validation.
    #[error("invalid world seed: {0}")]
    InvalidSeed(String),
}

/// Result type for world model operations.
pub type CoreResult<T> = Result<T, CoreError>;
