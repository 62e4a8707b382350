//! # EMBER Scheduler
//!
//! The heartbeat of the simulation: a bounded-concurrency task queue and the
//! fixed-rate world clock that feeds it.
//!
//! ## Design Principles
//!
//! 1. **Explicit results, no callbacks** - a task resolves to a
//!    [`TaskResult`] delivered through its [`TaskHandle`]
//! 2. **Failure is contained** - a throwing task body is logged and reported,
//!    the queue keeps draining
//! 3. **One timer per concern** - the clock owns exactly one timer, started
//!    and stopped idempotently
//!
//! ## Concurrency
//!
//! The ring buffer and the world-time counter are the two structures whose
//! compound updates can span a suspension point; both sit behind a
//! `tokio::sync::Mutex`, which hands out its lock in FIFO (ticket) order.
//! Everything else is plain `parking_lot` state, never held across an await.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod clock;
pub mod queue;
pub mod ring;
pub mod task;

pub use clock::{ClockConfig, ClockSubscriber, GameClock, WorldTime};
pub use queue::{DequeuedTask, QueueConfig, TaskQueue};
pub use ring::RingBuffer;
pub use task::{Task, TaskError, TaskHandle, TaskId, TaskResult, TaskStatus};
