//! # Entities and Capability Components
//!
//! An entity is a plain record: identity, name, kind, position. Everything
//! else is a capability component attached in the [`crate::world::World`]
//! maps. There is no inheritance tree - a player and an NPC differ only by
//! discriminator and by which components they carry.

use serde::{Deserialize, Serialize};

use crate::location::LocationId;

/// Unique identifier for an entity (player or NPC).
pub type EntityId = u64;

// ============================================================================
// ENTITY RECORD
// ============================================================================

/// Discriminator for entity records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A connected player character.
    Player,
    /// A non-player character.
    Npc,
}

/// A plain entity record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// Display name, used in notifications.
    pub name: String,
    /// Player or NPC.
    pub kind: EntityKind,
    /// Current location.
    pub location: LocationId,
}

impl Entity {
    /// Creates a new entity record.
    #[must_use]
    pub fn new(id: EntityId, name: impl Into<String>, kind: EntityKind, location: LocationId) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            location,
        }
    }
}

// ============================================================================
// POSTURE STATE MACHINE
// ============================================================================

/// Physical state of a combatant.
///
/// Legal transitions:
/// `Standing -> Engaged -> {LyingUnconscious | LyingDead} -> Standing`.
/// `Sleeping` is entered and left by outer-layer commands and only matters
/// to regeneration here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Posture {
    /// Upright and idle.
    #[default]
    Standing,
    /// Asleep; regenerates fastest.
    Sleeping,
    /// In active combat.
    Engaged,
    /// Knocked out at zero health; recovers over time.
    LyingUnconscious,
    /// Dead; does not regenerate.
    LyingDead,
}

impl Posture {
    /// Health regenerated per world tick in this posture.
    ///
    /// Sleeping and unconscious are distinct rows on purpose; the two
    /// rates were collapsed in one draft of the design and that was a slip.
    #[inline]
    #[must_use]
    pub const fn regen_per_tick(self) -> u32 {
        match self {
            Self::Standing => 2,
            Self::Sleeping => 4,
            Self::Engaged | Self::LyingUnconscious => 1,
            Self::LyingDead => 0,
        }
    }

    /// Returns true if this posture forbids voluntary movement.
    #[inline]
    #[must_use]
    pub const fn immobilized(self) -> bool {
        matches!(self, Self::Engaged | Self::LyingUnconscious | Self::LyingDead)
    }
}

// ============================================================================
// COMBATANT COMPONENT
// ============================================================================

/// Fraction of max health at which an unconscious combatant stands up.
pub const RECOVERY_DIVISOR: u32 = 4;

/// Combat capability component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combatant {
    /// Character level, used for roll adjustment and destination gates.
    pub level: u8,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Base damage dealt per landed attack.
    pub attack_power: u32,
    /// Flat damage mitigation.
    pub defense_power: u32,
    /// Combat proficiency added to the attack roll.
    pub combo_skill: u8,
    /// Killer mode: defeated opponents die instead of falling unconscious.
    pub killer: bool,
    /// Hostile flag: engages qualifying players on sight.
    pub aggro: bool,
    /// Experience awarded to whoever defeats this combatant.
    pub xp_value: u64,
    /// Experience accumulated by this combatant.
    pub experience: u64,
    /// Current posture.
    pub posture: Posture,
}

impl Combatant {
    /// Creates a standing combatant at full health.
    #[must_use]
    pub const fn new(level: u8, max_health: u32, attack_power: u32, defense_power: u32) -> Self {
        Self {
            level,
            health: max_health,
            max_health,
            attack_power,
            defense_power,
            combo_skill: 0,
            killer: false,
            aggro: false,
            xp_value: 0,
            experience: 0,
            posture: Posture::Standing,
        }
    }

    /// Sets the combo skill level.
    #[must_use]
    pub const fn with_combo_skill(mut self, combo_skill: u8) -> Self {
        self.combo_skill = combo_skill;
        self
    }

    /// Enables killer mode.
    #[must_use]
    pub const fn with_killer(mut self) -> Self {
        self.killer = true;
        self
    }

    /// Marks the combatant as aggressive.
    #[must_use]
    pub const fn with_aggro(mut self) -> Self {
        self.aggro = true;
        self
    }

    /// Sets the experience award for defeating this combatant.
    #[must_use]
    pub const fn with_xp_value(mut self, xp_value: u64) -> Self {
        self.xp_value = xp_value;
        self
    }

    /// Returns true if the combatant is neither dead nor unconscious.
    #[inline]
    #[must_use]
    pub const fn is_up(&self) -> bool {
        !matches!(self.posture, Posture::LyingUnconscious | Posture::LyingDead)
    }

    /// Applies one tick of posture-based regeneration, capped at max health.
    ///
    /// An unconscious combatant that reaches the recovery threshold stands
    /// back up. Returns true if the posture changed.
    pub fn regenerate(&mut self) -> bool {
        let amount = self.posture.regen_per_tick();
        if amount == 0 {
            return false;
        }
        self.health = (self.health + amount).min(self.max_health);
        if self.posture == Posture::LyingUnconscious
            && self.health >= self.max_health / RECOVERY_DIVISOR
        {
            self.posture = Posture::Standing;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regen_rates_distinct() {
        assert_eq!(Posture::Sleeping.regen_per_tick(), 4);
        assert_eq!(Posture::LyingUnconscious.regen_per_tick(), 1);
        assert_eq!(Posture::LyingDead.regen_per_tick(), 0);
    }

    #[test]
    fn test_regen_caps_at_max() {
        let mut c = Combatant::new(5, 10, 3, 0);
        c.health = 9;
        c.regenerate();
        assert_eq!(c.health, 10);
        c.regenerate();
        assert_eq!(c.health, 10);
    }

    #[test]
    fn test_unconscious_recovery() {
        let mut c = Combatant::new(5, 40, 3, 0);
        c.health = 0;
        c.posture = Posture::LyingUnconscious;

        // 40 / RECOVERY_DIVISOR = 10 health needed, 1 per tick.
        for _ in 0..9 {
            assert!(!c.regenerate());
            assert_eq!(c.posture, Posture::LyingUnconscious);
        }
        assert!(c.regenerate());
        assert_eq!(c.posture, Posture::Standing);
        assert_eq!(c.health, 10);
    }

    #[test]
    fn test_dead_stays_dead() {
        let mut c = Combatant::new(5, 40, 3, 0);
        c.health = 0;
        c.posture = Posture::LyingDead;
        for _ in 0..100 {
            assert!(!c.regenerate());
        }
        assert_eq!(c.health, 0);
        assert_eq!(c.posture, Posture::LyingDead);
    }

    #[test]
    fn test_immobilized_postures() {
        assert!(Posture::Engaged.immobilized());
        assert!(Posture::LyingDead.immobilized());
        assert!(Posture::LyingUnconscious.immobilized());
        assert!(!Posture::Standing.immobilized());
        assert!(!Posture::Sleeping.immobilized());
    }
}
