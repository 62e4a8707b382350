//! # EMBER NPC Movement
//!
//! Periodic random wandering for registered NPCs. A single scan timer
//! enqueues a movement pass into the task queue at a fixed interval; each
//! pass gives every registered NPC one chance to step through an eligible
//! exit, where eligibility is gated by posture, zone membership, and the
//! destination's minimum level.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod mover;

pub use mover::{MobileNpc, MoverConfig, NpcMover};
