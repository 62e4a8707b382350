//! # EMBER World Model
//!
//! Shared world state for the EMBER simulation core.
//!
//! ## Design Principles
//!
//! 1. **Composition over inheritance** - an entity is a plain record plus
//!    orthogonal capability components (`Combatant`, `Holdings`)
//! 2. **Narrow mutation surface** - all state changes go through validated
//!    `World` methods
//! 3. **Collaborators behind traits** - notification and persistence are
//!    sinks injected by the surrounding application
//!
//! ## Thread Safety
//!
//! The world lives behind a [`SharedWorld`] handle. Locks are plain
//! `parking_lot` locks and are never held across a suspension point;
//! managers that must span one use their own ticket mutex.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod entity;
pub mod error;
pub mod item;
pub mod location;
pub mod sinks;
pub mod world;

pub use entity::{Combatant, Entity, EntityId, EntityKind, Posture};
pub use error::{CoreError, CoreResult};
pub use item::{Holdings, Item, ItemId, ItemKind};
pub use location::{Direction, Exit, Location, LocationId, ZoneId};
pub use sinks::{
    EntitySnapshot, MemoryNotifier, MemoryStore, NotificationSink, NotifyTarget, PersistenceSink,
};
pub use world::{ActorSeed, SharedWorld, World, WorldSeed};
