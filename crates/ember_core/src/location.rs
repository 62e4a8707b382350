//! # Locations, Zones and Exits
//!
//! The world map is a graph of locations connected by directed exits. Each
//! location belongs to exactly one zone; zones and minimum levels gate where
//! mobile NPCs may wander.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Unique identifier for a location.
pub type LocationId = u32;

/// Identifier for a named zone grouping locations.
pub type ZoneId = u16;

/// Compass direction of an exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// North.
    North,
    /// South.
    South,
    /// East.
    East,
    /// West.
    West,
    /// Up.
    Up,
    /// Down.
    Down,
}

impl Direction {
    /// Lower-case display name, used in movement notifications.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// The direction an arrival comes from after leaving through `self`.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// A directed exit to another location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    /// Direction of travel.
    pub direction: Direction,
    /// Destination location.
    pub to: LocationId,
}

impl Exit {
    /// Creates a new exit.
    #[must_use]
    pub const fn new(direction: Direction, to: LocationId) -> Self {
        Self { direction, to }
    }
}

/// One location in the world graph.
#[derive(Clone, Debug)]
pub struct Location {
    /// Unique identifier.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Zone this location belongs to.
    pub zone: ZoneId,
    /// Minimum level required to enter.
    pub min_level: u8,
    /// Outgoing exits.
    pub exits: Vec<Exit>,
    /// Entities currently present. Maintained by `World::move_entity`.
    pub occupants: HashSet<EntityId>,
}

impl Location {
    /// Creates a new empty location.
    #[must_use]
    pub fn new(id: LocationId, name: impl Into<String>, zone: ZoneId) -> Self {
        Self {
            id,
            name: name.into(),
            zone,
            min_level: 0,
            exits: Vec::new(),
            occupants: HashSet::new(),
        }
    }

    /// Sets the minimum entry level.
    #[must_use]
    pub fn with_min_level(mut self, min_level: u8) -> Self {
        self.min_level = min_level;
        self
    }

    /// Adds an exit.
    #[must_use]
    pub fn with_exit(mut self, direction: Direction, to: LocationId) -> Self {
        self.exits.push(Exit::new(direction, to));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_round_trips() {
        for dir in [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
            Direction::Up,
            Direction::Down,
        ] {
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }

    #[test]
    fn test_location_builder() {
        let loc = Location::new(1, "Gatehouse", 3)
            .with_min_level(5)
            .with_exit(Direction::North, 2);
        assert_eq!(loc.zone, 3);
        assert_eq!(loc.min_level, 5);
        assert_eq!(loc.exits, vec![Exit::new(Direction::North, 2)]);
    }
}
