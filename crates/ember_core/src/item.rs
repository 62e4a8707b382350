//! # Items and Holdings
//!
//! Items are a tagged-variant type selected by discriminator - no subclass
//! ladder. `Holdings` is the capability component for anything that can own
//! gold and items (players, lootable NPCs, containers).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};

/// Unique identifier for an item instance.
pub type ItemId = u64;

/// What an item is, selected by discriminator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// A weapon with a flat damage bonus.
    Weapon {
        /// Damage added to the wielder's attack power.
        damage: u32,
    },
    /// A consumable restoring health on use.
    Consumable {
        /// Health restored when consumed.
        restores: u32,
    },
    /// A container that can hold other items.
    Container {
        /// Maximum number of contained items.
        capacity: u32,
    },
    /// An item with no mechanical effect.
    Trinket,
}

/// A concrete item instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique instance identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Variant payload.
    pub kind: ItemKind,
    /// Base value in gold.
    pub value: u64,
}

impl Item {
    /// Creates a new item.
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>, kind: ItemKind, value: u64) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            value,
        }
    }
}

/// Gold and items owned by one entity.
///
/// Ordered by item id so iteration (and therefore trade commit order) is
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Holdings {
    /// Gold in the purse.
    pub gold: u64,
    /// Items keyed by instance id.
    pub items: BTreeMap<ItemId, Item>,
}

impl Holdings {
    /// Creates holdings with the given gold and no items.
    #[must_use]
    pub fn with_gold(gold: u64) -> Self {
        Self {
            gold,
            items: BTreeMap::new(),
        }
    }

    /// Adds an item at construction time, replacing any same-id entry.
    #[must_use]
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.insert(item.id, item);
        self
    }

    /// Adds an item, rejecting duplicate instance ids.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateItem`] if the id is already held.
    pub fn add_item(&mut self, owner: EntityId, item: Item) -> CoreResult<()> {
        if self.items.contains_key(&item.id) {
            return Err(CoreError::DuplicateItem {
                owner,
                item: item.id,
            });
        }
        self.items.insert(item.id, item);
        Ok(())
    }

    /// Removes and returns an item.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ItemNotFound`] if the id is not held.
    pub fn remove_item(&mut self, owner: EntityId, item: ItemId) -> CoreResult<Item> {
        self.items
            .remove(&item)
            .ok_or(CoreError::ItemNotFound { owner, item })
    }

    /// Credits gold to the purse (saturating).
    pub fn credit_gold(&mut self, amount: u64) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Debits gold from the purse.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InsufficientGold`] if the purse cannot cover it.
    pub fn debit_gold(&mut self, owner: EntityId, amount: u64) -> CoreResult<()> {
        if self.gold < amount {
            return Err(CoreError::InsufficientGold {
                owner,
                needed: amount,
                available: self.gold,
            });
        }
        self.gold -= amount;
        Ok(())
    }

    /// Returns true if the item instance is held.
    #[must_use]
    pub fn holds(&self, item: ItemId) -> bool {
        self.items.contains_key(&item)
    }
}
