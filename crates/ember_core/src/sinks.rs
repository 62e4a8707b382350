//! # Collaborator Sinks
//!
//! The simulation core never parses files or touches sockets. Everything
//! that leaves the core goes through these two seams: notifications to
//! players/locations, and typed entity snapshots to persistence. The
//! surrounding application injects implementations at construction time.
//!
//! In-memory implementations are provided for tests and headless runs.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::CoreResult;
use crate::item::Item;
use crate::location::LocationId;

/// Addressee of an outbound notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotifyTarget {
    /// One entity (normally a player).
    Entity(EntityId),
    /// Every occupant of a location.
    Location(LocationId),
}

/// Outbound message seam.
///
/// Implementations must be cheap and non-blocking; the core calls this
/// from timer tasks.
pub trait NotificationSink: Send + Sync {
    /// Delivers one message to a player or broadcasts it to a location.
    fn notify(&self, target: NotifyTarget, message: &str);
}

/// Typed persistence payload for one entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Current location.
    pub location: LocationId,
    /// Current health, if the entity is a combatant.
    pub health: Option<u32>,
    /// Accumulated experience, if the entity is a combatant.
    pub experience: Option<u64>,
    /// Gold, if the entity has holdings.
    pub gold: Option<u64>,
    /// Held items, empty if the entity has no holdings.
    pub items: Vec<Item>,
}

/// Durable storage seam.
pub trait PersistenceSink: Send + Sync {
    /// Persists one entity snapshot.
    ///
    /// # Errors
    ///
    /// Implementations surface their own storage failures.
    fn save(&self, snapshot: &EntitySnapshot) -> CoreResult<()>;

    /// Loads the last persisted snapshot for an entity, if any.
    ///
    /// # Errors
    ///
    /// Implementations surface their own storage failures.
    fn load(&self, id: EntityId) -> CoreResult<Option<EntitySnapshot>>;
}

/// Notification sink that records every message in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<(NotifyTarget, String)>>,
}

impl MemoryNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns every recorded message in delivery order.
    #[must_use]
    pub fn drain(&self) -> Vec<(NotifyTarget, String)> {
        std::mem::take(&mut self.messages.lock())
    }

    /// Returns true if any recorded message contains `needle`.
    #[must_use]
    pub fn saw(&self, needle: &str) -> bool {
        self.messages.lock().iter().any(|(_, m)| m.contains(needle))
    }
}

impl NotificationSink for MemoryNotifier {
    fn notify(&self, target: NotifyTarget, message: &str) {
        self.messages.lock().push((target, message.to_string()));
    }
}

/// Persistence sink backed by an in-memory map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<HashMap<EntityId, EntitySnapshot>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities with a stored snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.saved.lock().len()
    }

    /// Returns true if nothing has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saved.lock().is_empty()
    }
}

impl PersistenceSink for MemoryStore {
    fn save(&self, snapshot: &EntitySnapshot) -> CoreResult<()> {
        self.saved.lock().insert(snapshot.id, snapshot.clone());
        Ok(())
    }

    fn load(&self, id: EntityId) -> CoreResult<Option<EntitySnapshot>> {
        Ok(self.saved.lock().get(&id).cloned())
    }
}
