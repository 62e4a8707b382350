//! Headless demo: a hero fends off an aggressive wolf while a rat wanders
//! the map, then the hero trades with a merchant. Messages drain to stdout.

use std::sync::Arc;
use std::time::Duration;

use ember::{NotificationBus, SimResult, Simulation, SimulationConfig};
use ember_core::{
    Combatant, Direction, Entity, EntityKind, Holdings, Item, ItemKind, Location, MemoryStore,
    NotificationSink, NotifyTarget, WorldSeed,
};
use ember_movement::MobileNpc;

const HERO: u64 = 1;
const MERCHANT: u64 = 2;
const WOLF: u64 = 10;
const RAT: u64 = 11;

fn seed() -> WorldSeed {
    WorldSeed::default()
        .with_location(Location::new(1, "Village Square", 0).with_exit(Direction::North, 2))
        .with_location(Location::new(2, "Forest Edge", 0).with_exit(Direction::South, 1))
        .with_actor(
            Entity::new(HERO, "Hero", EntityKind::Player, 1),
            Some(Combatant::new(6, 120, 12, 3).with_combo_skill(2)),
            Some(Holdings::with_gold(25)),
        )
        .with_actor(
            Entity::new(MERCHANT, "Merchant", EntityKind::Player, 1),
            None,
            Some(Holdings::with_gold(100).with_item(Item::new(
                50,
                "iron sword",
                ItemKind::Weapon { damage: 5 },
                20,
            ))),
        )
        .with_actor(
            Entity::new(WOLF, "Wolf", EntityKind::Npc, 1),
            Some(Combatant::new(4, 60, 8, 1).with_aggro().with_xp_value(35)),
            Some(Holdings::with_gold(4)),
        )
        .with_actor(
            Entity::new(RAT, "Rat", EntityKind::Npc, 2),
            Some(Combatant::new(1, 15, 2, 0).with_xp_value(5)),
            None,
        )
}

fn drain(bus: &NotificationBus) {
    for note in bus.try_drain() {
        match note.target {
            NotifyTarget::Entity(id) => println!("[to {id}] {}", note.message),
            NotifyTarget::Location(id) => println!("[room {id}] {}", note.message),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> SimResult<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = SimulationConfig::from_toml(
        "[clock]\ntick_interval_ms = 500\n\n[movement]\nscan_interval_ms = 2000\n",
    )?;
    let bus = Arc::new(NotificationBus::new());
    let store = Arc::new(MemoryStore::new());
    let sim = Simulation::new(
        seed(),
        &config,
        Arc::clone(&bus) as Arc<dyn NotificationSink>,
        Arc::clone(&store) as Arc<dyn ember_core::PersistenceSink>,
    )?;

    sim.mover().register(MobileNpc::new(RAT, [0]));
    sim.start();
    // The wolf is hostile; one aggression pass starts the fight.
    sim.combat().check_aggression(1);

    for _ in 0..16 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        drain(&bus);
        if !sim.combat().in_combat(HERO) {
            break;
        }
    }

    // Buy the sword: hero offers 20 gold, merchant offers the blade.
    let ledger = sim.ledger();
    ledger.create(HERO, MERCHANT)?;
    ledger.accept(MERCHANT)?;
    ledger.set_gold(HERO, 20)?;
    ledger.add_item(MERCHANT, 50)?;
    ledger.confirm(HERO)?;
    ledger.confirm(MERCHANT)?;
    drain(&bus);

    {
        let world = sim.world().read();
        let hero = world.snapshot(HERO)?;
        println!(
            "hero: {} hp, {} xp, {} gold, {} items",
            hero.health.unwrap_or_default(),
            hero.experience.unwrap_or_default(),
            hero.gold.unwrap_or_default(),
            hero.items.len()
        );
    }
    println!("persisted snapshots: {}", store.len());

    sim.shutdown().await;
    drain(&bus);
    Ok(())
}
