//! # The World Container
//!
//! Owns every entity record, capability component and location, and exposes
//! the narrow mutation surface the managers are built on: lookups, movement,
//! and the item/gold transfer primitives trade and loot are composed from.
//!
//! Construction goes through [`WorldSeed`]: the world-data collaborator
//! hands over maps keyed by id, and `World::from_seed` validates every
//! cross-reference before anything runs.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::entity::{Combatant, Entity, EntityId};
use crate::error::{CoreError, CoreResult};
use crate::item::{Holdings, ItemId};
use crate::location::{Location, LocationId};
use crate::sinks::EntitySnapshot;

/// Thread-safe shared handle to the world.
pub type SharedWorld = Arc<RwLock<World>>;

/// One entity plus its optional capability components, as produced by the
/// world-data source.
#[derive(Clone, Debug)]
pub struct ActorSeed {
    /// The entity record.
    pub entity: Entity,
    /// Combat capability, if any.
    pub combatant: Option<Combatant>,
    /// Gold and items, if any.
    pub holdings: Option<Holdings>,
}

/// Validated world-data input: maps of location and actor records keyed by
/// id, as delivered by the data-loading collaborator.
#[derive(Clone, Debug, Default)]
pub struct WorldSeed {
    /// Locations keyed by id.
    pub locations: HashMap<LocationId, Location>,
    /// Actors keyed by entity id.
    pub actors: HashMap<EntityId, ActorSeed>,
}

impl WorldSeed {
    /// Adds a location, keyed by its own id.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.insert(location.id, location);
        self
    }

    /// Adds an actor, keyed by its entity id.
    #[must_use]
    pub fn with_actor(
        mut self,
        entity: Entity,
        combatant: Option<Combatant>,
        holdings: Option<Holdings>,
    ) -> Self {
        self.actors.insert(
            entity.id,
            ActorSeed {
                entity,
                combatant,
                holdings,
            },
        );
        self
    }
}

/// All mutable world state.
#[derive(Debug, Default)]
pub struct World {
    locations: HashMap<LocationId, Location>,
    entities: HashMap<EntityId, Entity>,
    combatants: HashMap<EntityId, Combatant>,
    holdings: HashMap<EntityId, Holdings>,
}

impl World {
    /// Builds a world from a seed, validating every cross-reference.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSeed`] if an exit points at an unknown
    /// location or an actor stands in one.
    pub fn from_seed(seed: WorldSeed) -> CoreResult<Self> {
        for location in seed.locations.values() {
            for exit in &location.exits {
                if !seed.locations.contains_key(&exit.to) {
                    return Err(CoreError::InvalidSeed(format!(
                        "location {} exit {} points at unknown location {}",
                        location.id,
                        exit.direction.name(),
                        exit.to
                    )));
                }
            }
        }

        let mut world = Self {
            locations: seed.locations,
            ..Self::default()
        };
        // Occupant sets are derived state; rebuild them from scratch.
        for location in world.locations.values_mut() {
            location.occupants.clear();
        }

        for (id, actor) in seed.actors {
            let at = actor.entity.location;
            let Some(location) = world.locations.get_mut(&at) else {
                return Err(CoreError::InvalidSeed(format!(
                    "entity {id} stands in unknown location {at}"
                )));
            };
            location.occupants.insert(id);
            world.entities.insert(id, actor.entity);
            if let Some(combatant) = actor.combatant {
                world.combatants.insert(id, combatant);
            }
            if let Some(holdings) = actor.holdings {
                world.holdings.insert(id, holdings);
            }
        }
        Ok(world)
    }

    /// Wraps a world in the shared handle.
    #[must_use]
    pub fn into_shared(self) -> SharedWorld {
        Arc::new(RwLock::new(self))
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Looks up an entity record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityNotFound`] for unknown ids.
    pub fn entity(&self, id: EntityId) -> CoreResult<&Entity> {
        self.entities.get(&id).ok_or(CoreError::EntityNotFound(id))
    }

    /// Looks up a combatant component.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityNotFound`] or [`CoreError::NotACombatant`].
    pub fn combatant(&self, id: EntityId) -> CoreResult<&Combatant> {
        self.entity(id)?;
        self.combatants.get(&id).ok_or(CoreError::NotACombatant(id))
    }

    /// Mutable combatant lookup.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityNotFound`] or [`CoreError::NotACombatant`].
    pub fn combatant_mut(&mut self, id: EntityId) -> CoreResult<&mut Combatant> {
        if !self.entities.contains_key(&id) {
            return Err(CoreError::EntityNotFound(id));
        }
        self.combatants
            .get_mut(&id)
            .ok_or(CoreError::NotACombatant(id))
    }

    /// Looks up holdings.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityNotFound`] or [`CoreError::NoHoldings`].
    pub fn holdings(&self, id: EntityId) -> CoreResult<&Holdings> {
        self.entity(id)?;
        self.holdings.get(&id).ok_or(CoreError::NoHoldings(id))
    }

    /// Mutable holdings lookup.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityNotFound`] or [`CoreError::NoHoldings`].
    pub fn holdings_mut(&mut self, id: EntityId) -> CoreResult<&mut Holdings> {
        if !self.entities.contains_key(&id) {
            return Err(CoreError::EntityNotFound(id));
        }
        self.holdings.get_mut(&id).ok_or(CoreError::NoHoldings(id))
    }

    /// Looks up a location.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LocationNotFound`] for unknown ids.
    pub fn location(&self, id: LocationId) -> CoreResult<&Location> {
        self.locations
            .get(&id)
            .ok_or(CoreError::LocationNotFound(id))
    }

    /// Entity ids present in a location, in unspecified order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LocationNotFound`] for unknown ids.
    pub fn occupants(&self, id: LocationId) -> CoreResult<Vec<EntityId>> {
        Ok(self.location(id)?.occupants.iter().copied().collect())
    }

    /// Iterates over all combatant ids.
    pub fn combatant_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.combatants.keys().copied()
    }

    /// Iterates over all player entity ids.
    pub fn player_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .values()
            .filter(|e| e.kind == crate::entity::EntityKind::Player)
            .map(|e| e.id)
    }

    /// Finds an entity in a location by case-insensitive name prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LocationNotFound`] for unknown locations.
    pub fn find_by_name(&self, at: LocationId, name: &str) -> CoreResult<Option<EntityId>> {
        let needle = name.to_lowercase();
        let mut ids: Vec<EntityId> = self.location(at)?.occupants.iter().copied().collect();
        ids.sort_unstable();
        Ok(ids.into_iter().find(|id| {
            self.entities
                .get(id)
                .is_some_and(|e| e.name.to_lowercase().starts_with(&needle))
        }))
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Moves an entity to another location, updating both occupant sets.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityNotFound`] or
    /// [`CoreError::LocationNotFound`]; on error nothing has moved.
    pub fn move_entity(&mut self, id: EntityId, dest: LocationId) -> CoreResult<()> {
        let from = self.entity(id)?.location;
        if !self.locations.contains_key(&dest) {
            return Err(CoreError::LocationNotFound(dest));
        }
        if let Some(old) = self.locations.get_mut(&from) {
            old.occupants.remove(&id);
        }
        if let Some(new) = self.locations.get_mut(&dest) {
            new.occupants.insert(id);
        }
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.location = dest;
        }
        Ok(())
    }

    /// Removes an entity and its components from the world entirely.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityNotFound`] for unknown ids.
    pub fn remove_entity(&mut self, id: EntityId) -> CoreResult<()> {
        let at = self.entity(id)?.location;
        if let Some(location) = self.locations.get_mut(&at) {
            location.occupants.remove(&id);
        }
        self.entities.remove(&id);
        self.combatants.remove(&id);
        self.holdings.remove(&id);
        Ok(())
    }

    /// Moves one item instance between two holders.
    ///
    /// # Errors
    ///
    /// Fails without side effects if the sender does not hold the item or
    /// the receiver already does.
    pub fn transfer_item(&mut self, from: EntityId, to: EntityId, item: ItemId) -> CoreResult<()> {
        if !self.holdings(from)?.holds(item) {
            return Err(CoreError::ItemNotFound { owner: from, item });
        }
        if self.holdings(to)?.holds(item) {
            return Err(CoreError::DuplicateItem { owner: to, item });
        }
        let moved = self.holdings_mut(from)?.remove_item(from, item)?;
        self.holdings_mut(to)?.add_item(to, moved)?;
        Ok(())
    }

    /// Moves gold between two purses.
    ///
    /// # Errors
    ///
    /// Fails without side effects if the sender cannot cover the amount.
    pub fn transfer_gold(&mut self, from: EntityId, to: EntityId, amount: u64) -> CoreResult<()> {
        // Validate both sides before debiting so failure never half-applies.
        self.holdings(to)?;
        let purse = self.holdings(from)?;
        if purse.gold < amount {
            return Err(CoreError::InsufficientGold {
                owner: from,
                needed: amount,
                available: purse.gold,
            });
        }
        self.holdings_mut(from)?.debit_gold(from, amount)?;
        self.holdings_mut(to)?.credit_gold(amount);
        Ok(())
    }

    /// Builds a persistence snapshot for one entity.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityNotFound`] for unknown ids.
    pub fn snapshot(&self, id: EntityId) -> CoreResult<EntitySnapshot> {
        let entity = self.entity(id)?;
        let combatant = self.combatants.get(&id);
        let holdings = self.holdings.get(&id);
        Ok(EntitySnapshot {
            id,
            name: entity.name.clone(),
            location: entity.location,
            health: combatant.map(|c| c.health),
            experience: combatant.map(|c| c.experience),
            gold: holdings.map(|h| h.gold),
            items: holdings
                .map(|h| h.items.values().cloned().collect())
                .unwrap_or_default(),
        })
    }
}
