//! # The Combat Engine
//!
//! Owns every combat session, the per-player round timers, and the
//! NPC-engagement and experience-participant registries. All collaborators
//! arrive through the constructor; the engine holds no global state.
//!
//! ## Locking
//!
//! Lock order is sessions/engaged registries, then the world, then the
//! participant registry. World-lock stretches never spawn or await;
//! notifications produced under the lock are buffered and flushed after
//! release so a slow sink can never stall the world.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use ember_core::{
    Combatant, EntityId, EntityKind, LocationId, NotificationSink, NotifyTarget, Posture,
    SharedWorld, World,
};
use ember_sched::{ClockSubscriber, WorldTime};

use crate::dice::Dice;
use crate::error::{CombatError, CombatResult};
use crate::outcome::{attack_value, compute_damage, AttackOutcome};
use crate::session::CombatSession;

/// Combat tuning.
#[derive(Clone, Copy, Debug)]
pub struct CombatConfig {
    /// Interval between combat rounds for each engaged player.
    pub round_interval: Duration,
    /// Whether a defeated NPC's gold and items move to the victor.
    pub auto_loot: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            round_interval: Duration::from_millis(1500),
            auto_loot: true,
        }
    }
}

/// What one strike did to its defender.
struct StrikeReport {
    damage: u32,
    downed: bool,
}

/// Turn-based combat manager.
///
/// Construct with [`CombatEngine::new`]; round timers require the engine
/// to live behind an `Arc`, so the constructor returns one.
pub struct CombatEngine {
    world: SharedWorld,
    notifier: Arc<dyn NotificationSink>,
    dice: Arc<dyn Dice>,
    config: CombatConfig,
    /// Engaging player id -> session. One round timer lives inside each.
    sessions: Mutex<HashMap<EntityId, CombatSession>>,
    /// NPC id -> the player whose session holds it. Enforces the
    /// one-session-per-NPC rule across sessions.
    engaged_npcs: Mutex<HashMap<EntityId, EntityId>>,
    /// NPC id -> players who dealt it damage, for experience splitting.
    participants: Mutex<HashMap<EntityId, HashSet<EntityId>>>,
}

impl CombatEngine {
    /// Creates an engine over the shared world with injected collaborators.
    #[must_use]
    pub fn new(
        world: SharedWorld,
        notifier: Arc<dyn NotificationSink>,
        dice: Arc<dyn Dice>,
        config: CombatConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            world,
            notifier,
            dice,
            config,
            sessions: Mutex::new(HashMap::new()),
            engaged_npcs: Mutex::new(HashMap::new()),
            participants: Mutex::new(HashMap::new()),
        })
    }

    /// True if the player currently has a combat session.
    #[must_use]
    pub fn in_combat(&self, player: EntityId) -> bool {
        self.sessions.lock().contains_key(&player)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Resolves an attack command: picks the target (by name prefix, or
    /// the first live NPC present when unnamed) and engages it.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::TargetNotHere`] for an unmatched name,
    /// [`CombatError::NoTarget`] when nothing here can be attacked, and
    /// the engagement errors of [`CombatEngine::start_combat`].
    pub fn attack(self: &Arc<Self>, player: EntityId, target: Option<&str>) -> CombatResult<()> {
        let npc = {
            let world = self.world.read();
            let at = world.entity(player)?.location;
            match target {
                Some(name) => {
                    let id = world
                        .find_by_name(at, name)?
                        .ok_or_else(|| CombatError::TargetNotHere(name.to_string()))?;
                    if world.entity(id)?.kind != EntityKind::Npc {
                        return Err(CombatError::TargetNotHere(name.to_string()));
                    }
                    id
                }
                None => {
                    let mut ids = world.occupants(at)?;
                    ids.sort_unstable();
                    ids.into_iter()
                        .find(|id| {
                            *id != player
                                && world.entity(*id).is_ok_and(|e| e.kind == EntityKind::Npc)
                                && world.combatant(*id).is_ok_and(Combatant::is_up)
                        })
                        .ok_or(CombatError::NoTarget)?
                }
            }
        };
        self.start_combat(player, npc, true)
    }

    /// Engages an NPC under the player's session, creating the session and
    /// its round timer on first engagement. A player already in combat has
    /// the NPC appended to the existing order instead; no second timer is
    /// ever created.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::TargetBusy`] if the NPC already fights
    /// another player, [`CombatError::TargetDown`] if it cannot fight, or
    /// a [`CombatError::Core`] lookup failure.
    pub fn start_combat(
        self: &Arc<Self>,
        player: EntityId,
        npc: EntityId,
        player_initiated: bool,
    ) -> CombatResult<()> {
        if let Some(owner) = self.engaged_npcs.lock().get(&npc) {
            if *owner == player {
                return Ok(());
            }
            return Err(CombatError::TargetBusy(npc));
        }

        // Validate before mutating anything: a refused engagement must
        // leave both postures untouched.
        {
            let world = self.world.read();
            if !world.combatant(npc)?.is_up() {
                return Err(CombatError::TargetDown(npc));
            }
            world.combatant(player)?;
        }

        let joined = {
            let mut sessions = self.sessions.lock();
            if let Some(session) = sessions.get_mut(&player) {
                if !session.engage(npc, player_initiated) {
                    // Defeated earlier in this fight; it stays out.
                    return Ok(());
                }
                true
            } else {
                let mut session = CombatSession::new();
                session.engage(npc, player_initiated);
                session.timer = Some(self.spawn_round_timer(player));
                sessions.insert(player, session);
                false
            }
        };
        self.engaged_npcs.lock().insert(npc, player);

        let (player_name, npc_name, at) = {
            let mut world = self.world.write();
            let at = world.entity(player)?.location;
            let player_name = world.entity(player)?.name.clone();
            let npc_name = world.entity(npc)?.name.clone();
            world.combatant_mut(player)?.posture = Posture::Engaged;
            world.combatant_mut(npc)?.posture = Posture::Engaged;
            (player_name, npc_name, at)
        };

        let message = if joined {
            format!("{npc_name} joins the fight against {player_name}!")
        } else if player_initiated {
            format!("{player_name} attacks {npc_name}!")
        } else {
            format!("{npc_name} lunges at {player_name}!")
        };
        self.notifier.notify(NotifyTarget::Location(at), &message);
        debug!(player, npc, joined, "combat engagement");
        Ok(())
    }

    /// Breaks the player out of combat without a victor.
    ///
    /// Ending combat re-runs the aggression check, so a still-hostile NPC
    /// may re-engage immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::Core`] if the player is unknown.
    pub fn flee(self: &Arc<Self>, player: EntityId) -> CombatResult<()> {
        if !self.in_combat(player) {
            return Ok(());
        }
        let (name, at) = {
            let world = self.world.read();
            let entity = world.entity(player)?;
            (entity.name.clone(), entity.location)
        };
        self.notifier
            .notify(NotifyTarget::Location(at), &format!("{name} breaks away and flees!"));
        self.finish_combat(player);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rounds
    // ------------------------------------------------------------------

    /// Executes one combat round for the player: the player strikes each
    /// live opponent in order, and each opponent still standing strikes
    /// back. Returns false once combat is over and the session is gone.
    ///
    /// A round that fails mid-flight ends combat defensively instead of
    /// leaving the player wedged.
    pub fn run_round(self: &Arc<Self>, player: EntityId) -> bool {
        let order: Vec<EntityId> = {
            let sessions = self.sessions.lock();
            match sessions.get(&player) {
                Some(session) => session.order.clone(),
                None => return false,
            }
        };
        if order.is_empty() {
            self.finish_combat(player);
            return false;
        }

        let mut notes: Vec<(NotifyTarget, String)> = Vec::new();
        let mut defeated: Vec<EntityId> = Vec::new();
        let mut player_down = false;

        let round: CombatResult<()> = (|| {
            let mut world = self.world.write();
            if !world.combatant(player)?.is_up() {
                player_down = true;
                return Ok(());
            }
            for npc in order {
                if !world.combatant(npc)?.is_up() {
                    continue;
                }
                let strike = self.resolve_strike(&mut world, player, npc, &mut notes)?;
                if strike.damage > 0 {
                    self.participants
                        .lock()
                        .entry(npc)
                        .or_default()
                        .insert(player);
                }
                if strike.downed {
                    defeated.push(npc);
                    self.award_experience(&mut world, player, npc, &mut notes)?;
                    if self.config.auto_loot {
                        Self::loot(&mut world, player, npc, &mut notes);
                    }
                    continue;
                }
                let retaliation = self.resolve_strike(&mut world, npc, player, &mut notes)?;
                if retaliation.downed {
                    player_down = true;
                    break;
                }
            }
            Ok(())
        })();

        for (target, message) in notes {
            self.notifier.notify(target, &message);
        }

        if let Err(err) = round {
            warn!(player, %err, "combat round failed, ending combat defensively");
            self.finish_combat(player);
            return false;
        }

        {
            let mut engaged = self.engaged_npcs.lock();
            for npc in &defeated {
                engaged.remove(npc);
            }
        }
        let over = {
            let mut sessions = self.sessions.lock();
            match sessions.get_mut(&player) {
                Some(session) => {
                    for npc in &defeated {
                        session.defeat(*npc);
                    }
                    session.is_over()
                }
                None => return false,
            }
        };

        if player_down || over {
            self.finish_combat(player);
            return false;
        }
        true
    }

    /// Ends the player's combat: removes the session (aborting its round
    /// timer), frees its NPCs, resets engaged postures to standing, and
    /// immediately re-runs the aggression check at the player's location.
    pub fn finish_combat(self: &Arc<Self>, player: EntityId) {
        let Some(session) = self.sessions.lock().remove(&player) else {
            return;
        };
        let order = session.order.clone();
        drop(session);
        self.engaged_npcs.lock().retain(|_, owner| *owner != player);

        let at = {
            let mut world = self.world.write();
            for npc in order {
                if let Ok(combatant) = world.combatant_mut(npc) {
                    if combatant.posture == Posture::Engaged {
                        combatant.posture = Posture::Standing;
                    }
                }
            }
            if let Ok(combatant) = world.combatant_mut(player) {
                if combatant.posture == Posture::Engaged {
                    combatant.posture = Posture::Standing;
                }
            }
            world.entity(player).map(|e| e.location).ok()
        };
        debug!(player, "combat ended");

        if let Some(at) = at {
            self.check_aggression(at);
        }
    }

    /// Engages every free aggressive NPC at the location against the first
    /// standing player present. Players already down, sleeping, or engaged
    /// do not qualify.
    pub fn check_aggression(self: &Arc<Self>, at: LocationId) {
        let pairs: Vec<(EntityId, EntityId)> = {
            let world = self.world.read();
            let engaged = self.engaged_npcs.lock();
            let Ok(mut ids) = world.occupants(at) else {
                return;
            };
            ids.sort_unstable();
            let Some(player) = ids.iter().copied().find(|id| {
                world.entity(*id).is_ok_and(|e| e.kind == EntityKind::Player)
                    && world
                        .combatant(*id)
                        .is_ok_and(|c| c.posture == Posture::Standing)
            }) else {
                return;
            };
            ids.iter()
                .copied()
                .filter(|id| {
                    world.entity(*id).is_ok_and(|e| e.kind == EntityKind::Npc)
                        && world
                            .combatant(*id)
                            .is_ok_and(|c| c.aggro && c.is_up() && c.posture != Posture::Engaged)
                        && !engaged.contains_key(id)
                })
                .map(|npc| (player, npc))
                .collect()
        };
        for (player, npc) in pairs {
            if let Err(err) = self.start_combat(player, npc, false) {
                debug!(player, npc, %err, "aggression engagement skipped");
            }
        }
    }

    /// Drops an NPC from every registry, as when it is removed from the
    /// world. Its pending experience attribution is discarded.
    pub fn forget_npc(&self, npc: EntityId) {
        self.participants.lock().remove(&npc);
        self.engaged_npcs.lock().remove(&npc);
        let mut sessions = self.sessions.lock();
        for session in sessions.values_mut() {
            session.forget(npc);
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn spawn_round_timer(self: &Arc<Self>, player: EntityId) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(engine.config.round_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately; skip it so the
            // opening round lands a full interval after engagement.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !engine.run_round(player) {
                    break;
                }
            }
        })
    }

    fn resolve_strike(
        &self,
        world: &mut World,
        attacker: EntityId,
        defender: EntityId,
        notes: &mut Vec<(NotifyTarget, String)>,
    ) -> CombatResult<StrikeReport> {
        let (a_level, a_combo, a_power, a_killer) = {
            let a = world.combatant(attacker)?;
            (a.level, a.combo_skill, a.attack_power, a.killer)
        };
        let attacker_entity = world.entity(attacker)?;
        let a_name = attacker_entity.name.clone();
        let at = attacker_entity.location;
        let d_name = world.entity(defender)?.name.clone();

        let roll = self.dice.roll_d20();
        let defender_combatant = world.combatant_mut(defender)?;
        let value = attack_value(roll, a_combo, a_level, defender_combatant.level);
        let outcome = AttackOutcome::classify(value);
        let damage = compute_damage(
            outcome,
            a_power,
            defender_combatant.health,
            defender_combatant.defense_power,
        );
        defender_combatant.health = defender_combatant.health.saturating_sub(damage);
        let downed = defender_combatant.health == 0;
        if downed {
            defender_combatant.posture = if a_killer {
                Posture::LyingDead
            } else {
                Posture::LyingUnconscious
            };
        }

        let message = match outcome {
            AttackOutcome::CriticalSuccess => {
                format!("{a_name} lands a devastating blow on {d_name} for {damage} damage!")
            }
            AttackOutcome::Knockout => format!("{a_name} knocks {d_name} out cold!"),
            AttackOutcome::Hit => format!("{a_name} strikes {d_name} for {damage} damage."),
            AttackOutcome::Blocked => {
                format!("{d_name} blocks {a_name}'s attack, taking {damage} damage.")
            }
            AttackOutcome::Parried => {
                format!("{d_name} parries {a_name}'s attack, taking {damage} damage.")
            }
            AttackOutcome::Trapped => {
                format!("{a_name} traps {d_name} for {damage} damage.")
            }
            AttackOutcome::Evaded => format!("{d_name} evades {a_name}'s attack."),
        };
        notes.push((NotifyTarget::Location(at), message));
        if downed && outcome != AttackOutcome::Knockout {
            let fate = if a_killer {
                format!("{d_name} falls dead!")
            } else {
                format!("{d_name} collapses, unconscious.")
            };
            notes.push((NotifyTarget::Location(at), fate));
        }
        debug!(attacker, defender, roll, value, ?outcome, damage, "strike resolved");

        Ok(StrikeReport { damage, downed })
    }

    /// Splits the NPC's experience value evenly across everyone who dealt
    /// it damage; the remainder goes to the engaging player.
    fn award_experience(
        &self,
        world: &mut World,
        player: EntityId,
        npc: EntityId,
        notes: &mut Vec<(NotifyTarget, String)>,
    ) -> CombatResult<()> {
        let xp = world.combatant(npc)?.xp_value;
        if xp == 0 {
            self.participants.lock().remove(&npc);
            return Ok(());
        }
        let mut dealers = self.participants.lock().remove(&npc).unwrap_or_default();
        dealers.insert(player);
        let mut ids: Vec<EntityId> = dealers.into_iter().collect();
        ids.sort_unstable();
        let count = ids.len() as u64;
        let share = xp / count;
        let remainder = xp % count;
        for id in ids {
            let amount = if id == player { share + remainder } else { share };
            if amount == 0 {
                continue;
            }
            if let Ok(combatant) = world.combatant_mut(id) {
                combatant.experience += amount;
                notes.push((
                    NotifyTarget::Entity(id),
                    format!("You gain {amount} experience."),
                ));
            }
        }
        Ok(())
    }

    /// Moves a defeated NPC's gold and items to the victor. Individual
    /// transfer failures are logged and skipped; loot is best-effort.
    fn loot(
        world: &mut World,
        player: EntityId,
        npc: EntityId,
        notes: &mut Vec<(NotifyTarget, String)>,
    ) {
        let Ok(holdings) = world.holdings(npc) else {
            return;
        };
        let gold = holdings.gold;
        let items: Vec<_> = holdings
            .items
            .values()
            .map(|item| (item.id, item.name.clone()))
            .collect();

        if gold > 0 {
            match world.transfer_gold(npc, player, gold) {
                Ok(()) => notes.push((
                    NotifyTarget::Entity(player),
                    format!("You loot {gold} gold."),
                )),
                Err(err) => debug!(player, npc, %err, "gold loot skipped"),
            }
        }
        for (item, name) in items {
            match world.transfer_item(npc, player, item) {
                Ok(()) => notes.push((
                    NotifyTarget::Entity(player),
                    format!("You loot the {name}."),
                )),
                Err(err) => debug!(player, npc, item, %err, "item loot skipped"),
            }
        }
    }
}

impl ClockSubscriber for CombatEngine {
    /// World-tick housekeeping: posture-based regeneration for every
    /// combatant, with stand-up notifications on recovery.
    fn on_tick(&self, _time: WorldTime) {
        let mut notes: Vec<(NotifyTarget, String)> = Vec::new();
        {
            let mut world = self.world.write();
            let ids: Vec<EntityId> = world.combatant_ids().collect();
            for id in ids {
                let Ok(combatant) = world.combatant_mut(id) else {
                    continue;
                };
                if combatant.regenerate() {
                    let Ok(entity) = world.entity(id) else {
                        continue;
                    };
                    match entity.kind {
                        EntityKind::Player => notes.push((
                            NotifyTarget::Entity(id),
                            "You come to your senses and struggle to your feet.".to_string(),
                        )),
                        EntityKind::Npc => notes.push((
                            NotifyTarget::Location(entity.location),
                            format!("{} stirs and gets back up.", entity.name),
                        )),
                    }
                }
            }
        }
        for (target, message) in notes {
            self.notifier.notify(target, &message);
        }
    }

    fn on_new_day(&self, day: u64) {
        let ids: Vec<EntityId> = self.world.read().player_ids().collect();
        for id in ids {
            self.notifier
                .notify(NotifyTarget::Entity(id), &format!("Dawn breaks on day {day}."));
        }
    }
}
