//! # The NPC Mover
//!
//! Owns the mobile-NPC registry and the one scan timer. The timer enqueues
//! each movement pass into the task queue rather than touching the world
//! from the timer task itself, so movement competes for the same bounded
//! concurrency as every other unit of work.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use ember_core::{CoreResult, EntityId, Exit, NotificationSink, NotifyTarget, SharedWorld, ZoneId};
use ember_sched::{Task, TaskQueue};

/// Registration record for one wandering NPC.
#[derive(Clone, Debug)]
pub struct MobileNpc {
    /// Entity id of the NPC.
    pub id: EntityId,
    /// Zones the NPC may roam. An exit whose destination lies outside
    /// every listed zone is never taken.
    pub zones: HashSet<ZoneId>,
}

impl MobileNpc {
    /// Creates a registration for an NPC allowed in the given zones.
    #[must_use]
    pub fn new(id: EntityId, zones: impl IntoIterator<Item = ZoneId>) -> Self {
        Self {
            id,
            zones: zones.into_iter().collect(),
        }
    }
}

/// Mover tuning.
#[derive(Clone, Copy, Debug)]
pub struct MoverConfig {
    /// Interval between movement scans.
    pub scan_interval: Duration,
    /// Seed for exit selection.
    pub seed: u64,
}

impl Default for MoverConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(10),
            seed: 0,
        }
    }
}

/// Periodic random-movement scheduler for registered NPCs.
pub struct NpcMover {
    world: SharedWorld,
    notifier: Arc<dyn NotificationSink>,
    queue: TaskQueue,
    config: MoverConfig,
    registry: Mutex<HashMap<EntityId, MobileNpc>>,
    rng: Mutex<ChaCha8Rng>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl NpcMover {
    /// Creates a stopped mover with an empty registry.
    #[must_use]
    pub fn new(
        world: SharedWorld,
        notifier: Arc<dyn NotificationSink>,
        queue: TaskQueue,
        config: MoverConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            world,
            notifier,
            queue,
            config,
            registry: Mutex::new(HashMap::new()),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(config.seed)),
            timer: Mutex::new(None),
        })
    }

    /// Adds or replaces an NPC's registration.
    pub fn register(&self, npc: MobileNpc) {
        debug!(npc = npc.id, zones = ?npc.zones, "mobile npc registered");
        self.registry.lock().insert(npc.id, npc);
    }

    /// Removes an NPC's registration; it stops wandering immediately.
    pub fn unregister(&self, id: EntityId) {
        if self.registry.lock().remove(&id).is_some() {
            debug!(npc = id, "mobile npc unregistered");
        }
    }

    /// Starts the scan timer. Idempotent: a running mover is left alone,
    /// a second timer is never created.
    pub fn start_movement(self: &Arc<Self>) {
        let mut guard = self.timer.lock();
        if guard.is_some() {
            debug!("movement scan already running");
            return;
        }
        info!(interval = ?self.config.scan_interval, "movement scan started");
        let mover = Arc::clone(self);
        *guard = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(mover.config.scan_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; skip it.
            interval.tick().await;
            loop {
                interval.tick().await;
                let pass = Arc::clone(&mover);
                let task = Task::new("npc-movement-scan", move || async move {
                    pass.scan();
                    Ok(())
                });
                // Scan outcomes are logged, not consumed.
                drop(mover.queue.enqueue(task).await);
            }
        }));
    }

    /// Stops the scan timer. Idempotent.
    pub fn stop_movement(&self) {
        if let Some(handle) = self.timer.lock().take() {
            handle.abort();
            info!("movement scan stopped");
        }
    }

    /// Runs one movement pass over every registered NPC. Per-NPC failures
    /// are logged and skipped. Exposed for turn-based stepping and tests.
    pub fn scan(&self) {
        let mut roster: Vec<MobileNpc> = self.registry.lock().values().cloned().collect();
        roster.sort_unstable_by_key(|npc| npc.id);
        for npc in roster {
            if let Err(err) = self.move_npc(&npc) {
                warn!(npc = npc.id, %err, "movement attempt failed");
            }
        }
    }

    /// Gives one NPC its movement chance. Returns false when the NPC is
    /// immobilized or no exit qualifies; staying put is not an error.
    fn move_npc(&self, npc: &MobileNpc) -> CoreResult<bool> {
        let mut notes: Vec<(NotifyTarget, String)> = Vec::new();
        {
            let mut world = self.world.write();
            let entity = world.entity(npc.id)?;
            let name = entity.name.clone();
            let from = entity.location;

            if let Ok(combatant) = world.combatant(npc.id) {
                if combatant.posture.immobilized() {
                    return Ok(false);
                }
            }
            let level = world.combatant(npc.id).map_or(0, |c| c.level);

            let exits = world.location(from)?.exits.clone();
            let eligible: Vec<Exit> = exits
                .into_iter()
                .filter(|exit| {
                    world.location(exit.to).is_ok_and(|dest| {
                        npc.zones.contains(&dest.zone) && level >= dest.min_level
                    })
                })
                .collect();
            if eligible.is_empty() {
                return Ok(false);
            }

            let pick = eligible[self.rng.lock().gen_range(0..eligible.len())];
            world.move_entity(npc.id, pick.to)?;
            debug!(npc = npc.id, from, to = pick.to, "npc moved");
            notes.push((
                NotifyTarget::Location(from),
                format!("{name} leaves {}.", pick.direction.name()),
            ));
            notes.push((
                NotifyTarget::Location(pick.to),
                format!("{name} arrives from the {}.", pick.direction.opposite().name()),
            ));
        }
        for (target, message) in notes {
            self.notifier.notify(target, &message);
        }
        Ok(true)
    }
}
