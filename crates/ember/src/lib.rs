//! # EMBER
//!
//! The assembled simulation core: a persistent, tick-driven world where a
//! bounded-concurrency task queue carries every unit of work, a fixed-rate
//! clock advances world time, and the combat, movement and trade managers
//! share one validated world behind explicit collaborator seams.
//!
//! ## Design Principles
//!
//! 1. **Explicit wiring** - [`Simulation::new`] injects every collaborator;
//!    there are no globals and no service locator
//! 2. **One timer per concern** - the clock, each engaged player's round
//!    loop, and the movement scan are independently start/stoppable
//! 3. **All-or-nothing effects** - trades settle through reversible
//!    transactions; a failed round or scan never wedges the world

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bus;
pub mod config;
pub mod error;
pub mod sim;

pub use bus::{Notification, NotificationBus};
pub use config::SimulationConfig;
pub use error::{SimError, SimResult};
pub use sim::Simulation;
