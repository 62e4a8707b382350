//! # Combat Sessions
//!
//! One session per engaging player: the ordered live opponents, the ids
//! already defeated within this fight, the ids the player attacked first,
//! and the player's single round-timer handle.

use std::collections::HashSet;

use ember_core::EntityId;
use tokio::task::JoinHandle;

/// Per-player combat bookkeeping.
///
/// An NPC id lives in at most one session at a time (the engine enforces
/// this across sessions); within a session, an id moved to the defeated
/// set is never re-admitted to the live order.
#[derive(Debug, Default)]
pub struct CombatSession {
    /// Live opponents in engagement order; rounds iterate this.
    pub(crate) order: Vec<EntityId>,
    /// Opponents defeated during this fight.
    pub(crate) defeated: HashSet<EntityId>,
    /// Opponents this player struck first, for remainder attribution.
    pub(crate) initiated: HashSet<EntityId>,
    /// The player's round timer. At most one exists per session.
    pub(crate) timer: Option<JoinHandle<()>>,
}

impl CombatSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an opponent to the live order. Returns false without change if
    /// the id is already present or was already defeated in this fight.
    pub fn engage(&mut self, npc: EntityId, player_initiated: bool) -> bool {
        if self.defeated.contains(&npc) || self.order.contains(&npc) {
            return false;
        }
        self.order.push(npc);
        if player_initiated {
            self.initiated.insert(npc);
        }
        true
    }

    /// Moves an opponent from the live order to the defeated set.
    pub fn defeat(&mut self, npc: EntityId) {
        self.order.retain(|id| *id != npc);
        self.defeated.insert(npc);
    }

    /// Drops an opponent from all tracking, as when it leaves the world.
    pub fn forget(&mut self, npc: EntityId) {
        self.order.retain(|id| *id != npc);
        self.initiated.remove(&npc);
    }

    /// The live opponents in engagement order.
    #[must_use]
    pub fn order(&self) -> &[EntityId] {
        &self.order
    }

    /// True if no live opponents remain.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.order.is_empty()
    }
}

impl Drop for CombatSession {
    fn drop(&mut self) {
        // A session never outlives its timer.
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defeated_never_readmitted() {
        let mut session = CombatSession::new();
        assert!(session.engage(7, true));
        session.defeat(7);
        assert!(!session.engage(7, true));
        assert!(session.is_over());
    }

    #[test]
    fn test_engage_is_idempotent_per_opponent() {
        let mut session = CombatSession::new();
        assert!(session.engage(7, true));
        assert!(!session.engage(7, false));
        assert_eq!(session.order(), &[7]);
        assert!(session.initiated.contains(&7));
    }

    #[test]
    fn test_order_preserved_across_defeat() {
        let mut session = CombatSession::new();
        session.engage(1, true);
        session.engage(2, false);
        session.engage(3, false);
        session.defeat(2);
        assert_eq!(session.order(), &[1, 3]);
    }
}
