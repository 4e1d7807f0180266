use pretty_assertions::assert_eq;

use super::*;
use crate::simulation::mocks::{block_pos, MAX_HEALTH};

fn context_with_alice() -> (SimulationContext, PlayerRef) {
    let mut sim = SimulationContext::new();
    let alice = sim
        .spawn_player("Alice", Location::new(0.0, 64.0, 0.0))
        .unwrap();
    (sim, alice)
}

#[test]
fn test_new_context_has_default_world() {
    let sim = SimulationContext::new();
    let world = sim.default_world().unwrap();
    assert_eq!(world.read().name, DEFAULT_WORLD);
    assert_eq!(world.read().time, 0);
    assert_eq!(world.read().weather, Weather::Clear);
    assert!(sim.logs().is_empty());
}

#[test]
fn test_spawn_player_logs_and_rejects_duplicates() {
    let (mut sim, alice) = context_with_alice();
    assert_eq!(sim.logs(), ["[SPAWN] Player 'Alice' spawned at (0, 64, 0)"]);
    assert_eq!(alice.read().health, MAX_HEALTH);
    assert_eq!(alice.read().gamemode, GameMode::Survival);

    let err = sim
        .spawn_player("Alice", Location::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "Player 'Alice' already exists");
}

#[test]
fn test_player_lookup() {
    let (mut sim, alice) = context_with_alice();
    assert!(Arc::ptr_eq(&sim.player("Alice").unwrap(), &alice));
    assert!(sim.has_player("Alice"));
    assert_eq!(
        sim.player("Bob").unwrap_err().to_string(),
        "Player 'Bob' not found"
    );

    assert!(sim.remove_player("Alice"));
    assert!(!sim.remove_player("Alice"));
    assert!(!sim.has_player("Alice"));
}

#[test]
fn test_remove_item_never_goes_negative() {
    let (_sim, alice) = context_with_alice();
    let mut player = alice.write();
    player.give_item("diamond", 3).unwrap();

    let err = player.remove_item("diamond", 5).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Player Alice has only 3 diamond, cannot remove 5"
    );
    assert_eq!(player.item_count("diamond"), 3);

    player.remove_item("diamond", 3).unwrap();
    assert!(!player.inventory.contains_key("diamond"));
}

#[test]
fn test_health_and_hunger_clamp() {
    let (_sim, alice) = context_with_alice();
    let mut player = alice.write();
    player.damage(25.0);
    assert_eq!(player.health, 0.0);
    player.set_health(50.0);
    assert_eq!(player.health, MAX_HEALTH);
    player.set_hunger(-4);
    assert_eq!(player.hunger, 0);
}

#[test]
fn test_send_message_records_history() {
    let (mut sim, alice) = context_with_alice();
    sim.send_message(&alice, "hello");
    assert_eq!(sim.messages(), ["Alice: hello"]);
    assert_eq!(alice.read().messages, vec!["hello".to_string()]);
    assert_eq!(sim.logs().last().unwrap(), "[MSG] Alice: hello");
}

#[test]
fn test_worlds() {
    let mut sim = SimulationContext::new();
    let nether = sim.create_world("nether").unwrap();
    assert!(Arc::ptr_eq(&sim.world("nether").unwrap(), &nether));
    assert_eq!(sim.logs(), ["[WORLD] Created world 'nether'"]);
    assert_eq!(
        sim.create_world("nether").unwrap_err().to_string(),
        "World 'nether' already exists"
    );
    assert_eq!(
        sim.world("end").unwrap_err().to_string(),
        "World 'end' not found"
    );
    assert_eq!(sim.worlds().count(), 2);
}

#[test]
fn test_world_blocks_and_time() {
    let mut world = MockWorld::new("world");
    assert_eq!(world.block(block_pos(1.0, 2.0, 3.0)), "air");
    world.set_block(block_pos(1.2, 2.0, 2.6), "stone");
    assert_eq!(world.block((1, 2, 3)), "stone");

    world.set_time(24_000);
    assert_eq!(world.time, 0);
    world.set_time(6_000);
    assert_eq!(world.time, 6_000);
}

#[test]
fn test_event_queue_is_fifo() {
    let mut sim = SimulationContext::new();
    sim.queue_event("first", IndexMap::new());
    sim.queue_event("second", IndexMap::new());
    assert_eq!(sim.pending_events(), 2);
    assert_eq!(sim.next_event().unwrap().name, "first");
    assert_eq!(sim.next_event().unwrap().name, "second");
    assert!(sim.next_event().is_none());
    assert_eq!(
        sim.logs(),
        ["[QUEUE] Event queued: first", "[QUEUE] Event queued: second"]
    );
}

#[test]
fn test_entity_health_by_type() {
    let zombie = MockEntity::new("ZOMBIE", Location::default());
    assert_eq!(zombie.entity_type, "zombie");
    assert_eq!(zombie.health, 20.0);
    let chicken = MockEntity::new("chicken", Location::default());
    assert_eq!(chicken.max_health, 4.0);
    assert_eq!(chicken.health, 4.0);
    assert_eq!(MockEntity::new("iron_golem", Location::default()).health, 100.0);
    assert_eq!(MockEntity::new("slime", Location::default()).health, 20.0);
}

#[test]
fn test_inventory_slots() {
    let mut chest = MockInventory::new("chest", false);
    assert_eq!(chest.slots.len(), MockInventory::SMALL_SIZE);
    assert_eq!(MockInventory::new("big", true).slots.len(), MockInventory::LARGE_SIZE);

    assert_eq!(chest.add_item(MockItemStack::new("Diamond", 4)), Some(0));
    assert_eq!(chest.add_item(MockItemStack::new("diamond", 2)), Some(1));
    assert_eq!(chest.slot(1).unwrap().amount, 2);
    assert_eq!(chest.slot(0).unwrap().item_type, "diamond");
    assert_eq!(
        chest.slot(27).unwrap_err().to_string(),
        "Invalid index 27 in chest"
    );
}

#[test]
fn test_snapshots_and_summary() {
    let (mut sim, alice) = context_with_alice();
    alice.write().location = Location::new(10.0, 65.0, 10.0);
    sim.set_state("score", Value::Number(3.0));
    assert_eq!(sim.state("score"), Some(&Value::Number(3.0)));

    let players = sim.player_snapshots();
    assert_eq!(
        players[0].to_string(),
        "Alice | HP: 20.0 | Pos: (10.0, 65.0, 10.0) | Mode: survival"
    );
    let worlds = sim.world_snapshots();
    assert_eq!(worlds[0].to_string(), "world | Time: 0 | Weather: clear");

    let summary = sim.summary();
    assert!(summary.starts_with("=== Simulation Summary ===\n"));
    assert!(summary.contains("Players: 1\n"));
    assert!(summary.contains("  - Alice at (10.0, 65.0, 10.0)\n"));
}

#[test]
fn test_report_rendering() {
    use chrono::Utc;

    let (mut sim, _alice) = context_with_alice();
    sim.log("[LOG] one");
    sim.log("[LOG] two");
    let report = report::RunReport {
        started_at: Utc::now(),
        elapsed_ms: 3,
        logs: sim.logs().to_vec(),
        messages: Vec::new(),
        players: sim.player_snapshots(),
        worlds: sim.world_snapshots(),
        pending_events: 0,
    };
    assert!(!report.worlds_changed());

    let text = report.render(Some(2));
    assert!(text.starts_with("=== Execution Logs ===\n"));
    assert!(text.contains("... (1 more lines)\n"));
    assert!(text.contains("=== Player States ===\nAlice | HP: 20.0"));
    assert!(!text.contains("=== World States ==="));
    assert!(text.ends_with("Executed 3 operations in 3ms"));
}
