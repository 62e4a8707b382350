//! # EMBER Combat Engine
//!
//! Turn-based combat resolution for the EMBER simulation core.
//!
//! ## The Round
//!
//! Each engaging player owns exactly one recurring round timer. Every round
//! walks the player's combat order: the player strikes the NPC, then the
//! NPC retaliates if still up. Resolution is a d20 roll plus combo skill,
//! adjusted by the level difference, mapped through seven ordered outcome
//! buckets. The 19/20 special cases sit ahead of the general `>= 13` hit
//! rule; that anomaly is inherited source behavior and is kept on purpose.
//!
//! ## Safety Properties
//!
//! - an NPC fights in at most one session at a time
//! - a defeated NPC is never re-added to the live order of its session
//! - a failing round tears combat down defensively instead of leaving the
//!   player wedged in a broken state

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod dice;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod session;

pub use dice::{Dice, FixedDice, SeededDice};
pub use engine::{CombatConfig, CombatEngine};
pub use error::{CombatError, CombatResult};
pub use outcome::{attack_value, compute_damage, AttackOutcome};
pub use session::CombatSession;
