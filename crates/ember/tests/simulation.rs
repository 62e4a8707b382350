//! End-to-end tests over the assembled facade: clock wiring, combat to
//! victory, movement through the queue, and atomic trade settlement.

use std::sync::Arc;
use std::time::Duration;

use ember::{Simulation, SimulationConfig};
use ember_combat::{AttackOutcome, CombatConfig, CombatEngine, Dice, FixedDice};
use ember_core::{
    Combatant, Direction, Entity, EntityKind, Holdings, Item, ItemKind, Location, MemoryNotifier,
    MemoryStore, NotificationSink, PersistenceSink, Posture, WorldSeed,
};
use ember_movement::MobileNpc;
use ember_trade::{AtomicTransaction, CommitError};

const HERO: u64 = 1;
const TRADER: u64 = 2;
const WOLF: u64 = 10;
const RAT: u64 = 11;
const SWORD: u64 = 50;

fn village() -> WorldSeed {
    WorldSeed::default()
        .with_location(Location::new(1, "Square", 0).with_exit(Direction::North, 2))
        .with_location(Location::new(2, "Meadow", 0).with_exit(Direction::South, 1))
        .with_actor(
            Entity::new(HERO, "Hero", EntityKind::Player, 1),
            // Ten levels above the wolf: its adjusted value can never
            // reach the hit threshold, so the hero cannot lose.
            Some(Combatant::new(11, 100, 10, 5)),
            Some(Holdings::with_gold(50).with_item(Item::new(
                SWORD,
                "iron sword",
                ItemKind::Weapon { damage: 5 },
                20,
            ))),
        )
        .with_actor(
            Entity::new(TRADER, "Trader", EntityKind::Player, 1),
            None,
            Some(Holdings::with_gold(30)),
        )
        .with_actor(
            Entity::new(WOLF, "Wolf", EntityKind::Npc, 1),
            Some(Combatant::new(1, 40, 2, 0).with_aggro().with_xp_value(12)),
            Some(Holdings::with_gold(3)),
        )
        .with_actor(
            Entity::new(RAT, "Rat", EntityKind::Npc, 2),
            Some(Combatant::new(1, 15, 2, 0)),
            None,
        )
}

fn fast_config() -> SimulationConfig {
    SimulationConfig::from_toml(
        "[clock]\ntick_interval_ms = 100\nday_length = 4\n\n\
         [combat]\nround_interval_ms = 100\ndice_seed = 7\n\n\
         [movement]\nscan_interval_ms = 200\n",
    )
    .unwrap()
}

fn simulation() -> (Simulation, Arc<MemoryNotifier>, Arc<MemoryStore>) {
    let notifier = Arc::new(MemoryNotifier::new());
    let store = Arc::new(MemoryStore::new());
    let sim = Simulation::new(
        village(),
        &fast_config(),
        Arc::clone(&notifier) as Arc<dyn NotificationSink>,
        Arc::clone(&store) as Arc<dyn PersistenceSink>,
    )
    .unwrap();
    (sim, notifier, store)
}

#[tokio::test(start_paused = true)]
async fn test_day_rollover_reaches_combat_housekeeping() {
    let (sim, notifier, _store) = simulation();

    // day_length is 4; the fourth tick wraps and greets every player.
    for _ in 0..4 {
        sim.clock().run_tick().await;
    }

    assert_eq!(sim.clock().time().await.day, 1);
    assert!(notifier.saw("Dawn breaks on day 1."));
    let dawns = notifier
        .drain()
        .into_iter()
        .filter(|(_, m)| m.contains("Dawn breaks"))
        .count();
    // Two players, one rollover each.
    assert_eq!(dawns, 2);
}

#[tokio::test(start_paused = true)]
async fn test_aggression_to_victory_through_timers() {
    let (sim, notifier, _store) = simulation();

    sim.combat().check_aggression(1);
    assert!(sim.combat().in_combat(HERO));
    assert!(notifier.saw("Wolf lunges at Hero!"));

    // The outmatched wolf cannot land a hit; rounds fire every 100ms
    // until it drops.
    for _ in 0..60 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        if !sim.combat().in_combat(HERO) {
            break;
        }
    }

    let world = sim.world().read();
    let wolf = world.combatant(WOLF).unwrap();
    assert_eq!(wolf.health, 0);
    assert!(!wolf.is_up());
    let hero = world.combatant(HERO).unwrap();
    assert_eq!(hero.health, 100);
    assert_eq!(hero.experience, 12);
    assert_eq!(hero.posture, Posture::Standing);
    // Auto-loot emptied the wolf's purse.
    assert_eq!(world.holdings(HERO).unwrap().gold, 53);
    drop(world);

    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_movement_scan_rides_the_task_queue() {
    let (sim, notifier, _store) = simulation();
    sim.mover().register(MobileNpc::new(RAT, [0]));
    sim.start();

    tokio::time::sleep(Duration::from_millis(250)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    // One scan has run; the rat took its single exit south.
    assert_eq!(sim.world().read().entity(RAT).unwrap().location, 1);
    assert!(notifier.saw("Rat leaves south."));
    assert!(notifier.saw("Rat arrives from the north."));

    sim.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_trade_settles_and_persists() {
    let (sim, notifier, store) = simulation();
    let ledger = sim.ledger();

    ledger.create(HERO, TRADER).unwrap();
    ledger.accept(TRADER).unwrap();
    ledger.add_item(HERO, SWORD).unwrap();
    ledger.set_gold(TRADER, 20).unwrap();
    assert!(!ledger.confirm(TRADER).unwrap());
    assert!(ledger.confirm(HERO).unwrap());

    let world = sim.world().read();
    assert!(world.holdings(TRADER).unwrap().holds(SWORD));
    assert_eq!(world.holdings(HERO).unwrap().gold, 70);
    assert_eq!(world.holdings(TRADER).unwrap().gold, 10);
    drop(world);
    assert!(notifier.saw("The trade is complete."));
    assert_eq!(store.len(), 2);
    assert_eq!(
        store.load(TRADER).unwrap().unwrap().items[0].name,
        "iron sword"
    );
}

#[tokio::test(start_paused = true)]
async fn test_forced_gold_failure_rolls_the_world_back() {
    let (sim, _notifier, _store) = simulation();
    let world = sim.world();

    // The settlement the ledger would build for "hero gives the sword,
    // trader gives 30 gold", with the trader's gold transfer forced to
    // fail after the sword has already moved.
    let mut txn: AtomicTransaction<ember_core::World> = AtomicTransaction::new();
    txn.push(
        |w| w.transfer_item(HERO, TRADER, SWORD),
        |w| w.transfer_item(TRADER, HERO, SWORD),
    )
    .unwrap();
    txn.push(
        |w| w.transfer_gold(TRADER, HERO, 1_000_000),
        |w| w.transfer_gold(HERO, TRADER, 1_000_000),
    )
    .unwrap();

    let before_hero = world.read().holdings(HERO).unwrap().clone();
    let before_trader = world.read().holdings(TRADER).unwrap().clone();

    let err = txn.commit(&mut world.write()).unwrap_err();
    assert!(matches!(err, CommitError::Operation { index: 1, .. }));

    let w = world.read();
    assert_eq!(*w.holdings(HERO).unwrap(), before_hero);
    assert_eq!(*w.holdings(TRADER).unwrap(), before_trader);
    assert!(w.holdings(HERO).unwrap().holds(SWORD));
    assert_eq!(w.holdings(TRADER).unwrap().gold, 30);
}

#[tokio::test(start_paused = true)]
async fn test_deterministic_roll_scenarios() {
    let (sim, notifier, _store) = simulation();
    // A scripted engine over the same world: level-5 attacker and
    // defender, no combo skill.
    {
        let mut w = sim.world().write();
        w.combatant_mut(HERO).unwrap().level = 5;
        w.combatant_mut(WOLF).unwrap().level = 5;
    }
    let dice = Arc::new(FixedDice::new([1, 1, 20]));
    let engine = CombatEngine::new(
        Arc::clone(sim.world()),
        Arc::clone(&notifier) as Arc<dyn NotificationSink>,
        Arc::clone(&dice) as Arc<dyn Dice>,
        CombatConfig::default(),
    );

    engine.start_combat(HERO, WOLF, true).unwrap();

    // Roll 1 on both sides: value 1, evaded, no damage anywhere.
    assert!(engine.run_round(HERO));
    {
        let w = sim.world().read();
        assert_eq!(w.combatant(WOLF).unwrap().health, 40);
        assert_eq!(w.combatant(HERO).unwrap().health, 100);
    }
    assert_eq!(AttackOutcome::classify(1), AttackOutcome::Evaded);

    // Roll 20: value 20, knockout, damage equals full current health.
    assert!(!engine.run_round(HERO));
    let w = sim.world().read();
    assert_eq!(w.combatant(WOLF).unwrap().health, 0);
    assert_eq!(w.combatant(WOLF).unwrap().posture, Posture::LyingUnconscious);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_silences_every_timer() {
    let (sim, notifier, _store) = simulation();
    sim.mover().register(MobileNpc::new(RAT, [0]));
    sim.start();
    sim.shutdown().await;
    let _ = notifier.drain();

    tokio::time::sleep(Duration::from_secs(5)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(notifier.drain().is_empty());
}
