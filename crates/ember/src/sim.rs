//! # The Simulation Facade
//!
//! Builds every manager over one validated world and owns startup and
//! shutdown ordering. Construction is the only wiring point: collaborators
//! (notification sink, persistence sink) are injected here and flow down
//! into the managers by `Arc`.

use std::sync::Arc;

use tracing::info;

use ember_combat::{CombatEngine, Dice, SeededDice};
use ember_core::{NotificationSink, PersistenceSink, SharedWorld, World, WorldSeed};
use ember_movement::NpcMover;
use ember_sched::{ClockSubscriber, GameClock, TaskQueue};
use ember_trade::TradeLedger;

use crate::config::SimulationConfig;
use crate::error::SimResult;

/// The assembled simulation core.
pub struct Simulation {
    world: SharedWorld,
    queue: TaskQueue,
    clock: GameClock,
    combat: Arc<CombatEngine>,
    mover: Arc<NpcMover>,
    ledger: TradeLedger,
}

impl Simulation {
    /// Validates the seed and wires every manager. Must be called within
    /// a tokio runtime; the queue's drain worker starts immediately, but
    /// no timer runs until [`Simulation::start`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::SimError::Core`] if the seed fails validation.
    pub fn new(
        seed: WorldSeed,
        config: &SimulationConfig,
        notifier: Arc<dyn NotificationSink>,
        store: Arc<dyn PersistenceSink>,
    ) -> SimResult<Self> {
        let world = World::from_seed(seed)?.into_shared();
        let queue = TaskQueue::start(config.queue_config());
        let clock = GameClock::new(queue.clone(), config.clock_config());

        let dice: Arc<dyn Dice> = Arc::new(SeededDice::new(config.combat.dice_seed));
        let combat = CombatEngine::new(
            Arc::clone(&world),
            Arc::clone(&notifier),
            dice,
            config.combat_config(),
        );
        // Combat housekeeping (regeneration, new-day greetings) rides the
        // world clock.
        clock.subscribe(Arc::clone(&combat) as Arc<dyn ClockSubscriber>);

        let mover = NpcMover::new(
            Arc::clone(&world),
            Arc::clone(&notifier),
            queue.clone(),
            config.mover_config(),
        );
        let ledger = TradeLedger::new(Arc::clone(&world), notifier, store);

        Ok(Self {
            world,
            queue,
            clock,
            combat,
            mover,
            ledger,
        })
    }

    /// Starts the world clock and the movement scan. Idempotent.
    pub fn start(&self) {
        self.clock.start();
        self.mover.start_movement();
        info!("simulation started");
    }

    /// Stops every timer and shuts the queue down. Pending tasks resolve
    /// as canceled; running bodies finish on their own.
    pub async fn shutdown(&self) {
        self.mover.stop_movement();
        self.clock.stop();
        self.queue.cleanup().await;
        info!("simulation stopped");
    }

    /// The shared world.
    #[must_use]
    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    /// The task queue.
    #[must_use]
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// The world clock.
    #[must_use]
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// The combat engine.
    #[must_use]
    pub fn combat(&self) -> &Arc<CombatEngine> {
        &self.combat
    }

    /// The NPC mover.
    #[must_use]
    pub fn mover(&self) -> &Arc<NpcMover> {
        &self.mover
    }

    /// The trade ledger.
    #[must_use]
    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }
}
