//! Mock simulation state that built-ins read and mutate
//!
//! A [`SimulationContext`] is created fresh for every script run and holds the
//! players, worlds, output log, message history, pending event queue and a
//! free-form global state map.

pub mod mocks;
pub mod report;

use std::{collections::VecDeque, sync::Arc};

use indexmap::IndexMap;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::evaluator::value::{format_number, Value};
pub use mocks::{
    GameMode, Location, MockEntity, MockEvent, MockInventory, MockItemStack, MockPlayer,
    MockWorld, Weather,
};
use report::{PlayerSnapshot, WorldSnapshot};

pub type PlayerRef = Arc<RwLock<MockPlayer>>;
pub type WorldRef = Arc<RwLock<MockWorld>>;
pub type EntityRef = Arc<RwLock<MockEntity>>;
pub type ItemRef = Arc<RwLock<MockItemStack>>;
pub type InventoryRef = Arc<RwLock<MockInventory>>;
pub type EventRef = Arc<RwLock<MockEvent>>;

/// Name of the world every context starts with
pub const DEFAULT_WORLD: &str = "world";

/// Failures raised by simulation bookkeeping
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Player '{0}' already exists")]
    PlayerExists(String),

    #[error("Player '{0}' not found")]
    PlayerNotFound(String),

    #[error("World '{0}' already exists")]
    WorldExists(String),

    #[error("World '{0}' not found")]
    WorldNotFound(String),

    #[error("Player {player} has only {have} {item}, cannot remove {requested}")]
    InsufficientItems {
        player: String,
        item: String,
        have: u32,
        requested: u32,
    },

    #[error("Inventory count overflow: {player} cannot hold {requested} more {item}")]
    InventoryOverflow {
        player: String,
        item: String,
        requested: u32,
    },

    #[error("Invalid index {slot} in {inventory}")]
    InvalidSlot { inventory: String, slot: usize },
}

/// An event waiting for the post-run drain
#[derive(Debug, Clone)]
pub struct QueuedEvent {
    pub name: String,
    /// Variables bound in each handler's scope
    pub context: IndexMap<String, Value>,
    pub event: EventRef,
}

/// Per-run simulation state
#[derive(Debug)]
pub struct SimulationContext {
    players: IndexMap<String, PlayerRef>,
    worlds: IndexMap<String, WorldRef>,
    logs: Vec<String>,
    messages: Vec<String>,
    events: VecDeque<QueuedEvent>,
    state: IndexMap<String, Value>,
}

impl SimulationContext {
    pub fn new() -> Self {
        let mut context = Self {
            players: IndexMap::new(),
            worlds: IndexMap::new(),
            logs: Vec::new(),
            messages: Vec::new(),
            events: VecDeque::new(),
            state: IndexMap::new(),
        };
        context.worlds.insert(
            DEFAULT_WORLD.to_string(),
            Arc::new(RwLock::new(MockWorld::new(DEFAULT_WORLD))),
        );
        context
    }

    // === Logging ===

    /// Append a line to the run's output log
    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!(target: "quill_core::simulation", "{line}");
        self.logs.push(line);
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    // === Players ===

    pub fn spawn_player(&mut self, name: &str, location: Location) -> Result<PlayerRef, SimulationError> {
        if self.players.contains_key(name) {
            return Err(SimulationError::PlayerExists(name.to_string()));
        }
        let player = Arc::new(RwLock::new(MockPlayer::new(name, location)));
        self.players.insert(name.to_string(), player.clone());
        self.log(format!(
            "[SPAWN] Player '{name}' spawned at ({}, {}, {})",
            format_number(location.x),
            format_number(location.y),
            format_number(location.z)
        ));
        Ok(player)
    }

    pub fn player(&self, name: &str) -> Result<PlayerRef, SimulationError> {
        self.players
            .get(name)
            .cloned()
            .ok_or_else(|| SimulationError::PlayerNotFound(name.to_string()))
    }

    pub fn has_player(&self, name: &str) -> bool {
        self.players.contains_key(name)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerRef> {
        self.players.values()
    }

    pub fn remove_player(&mut self, name: &str) -> bool {
        let removed = self.players.shift_remove(name).is_some();
        if removed {
            self.log(format!("[REMOVE] Player '{name}' removed"));
        }
        removed
    }

    // === Worlds ===

    pub fn create_world(&mut self, name: &str) -> Result<WorldRef, SimulationError> {
        if self.worlds.contains_key(name) {
            return Err(SimulationError::WorldExists(name.to_string()));
        }
        let world = Arc::new(RwLock::new(MockWorld::new(name)));
        self.worlds.insert(name.to_string(), world.clone());
        self.log(format!("[WORLD] Created world '{name}'"));
        Ok(world)
    }

    pub fn world(&self, name: &str) -> Result<WorldRef, SimulationError> {
        self.worlds
            .get(name)
            .cloned()
            .ok_or_else(|| SimulationError::WorldNotFound(name.to_string()))
    }

    pub fn default_world(&self) -> Result<WorldRef, SimulationError> {
        self.world(DEFAULT_WORLD)
    }

    pub fn worlds(&self) -> impl Iterator<Item = &WorldRef> {
        self.worlds.values()
    }

    // === Events ===

    pub fn queue_event(&mut self, name: &str, context: IndexMap<String, Value>) -> EventRef {
        let event = Arc::new(RwLock::new(MockEvent::new(name)));
        self.events.push_back(QueuedEvent {
            name: name.to_string(),
            context,
            event: event.clone(),
        });
        self.log(format!("[QUEUE] Event queued: {name}"));
        event
    }

    pub fn next_event(&mut self) -> Option<QueuedEvent> {
        self.events.pop_front()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    // === Messages ===

    /// Deliver a message to a player and record it in the run history
    pub fn send_message(&mut self, player: &PlayerRef, message: &str) {
        let name = {
            let mut player = player.write();
            player.messages.push(message.to_string());
            player.name.clone()
        };
        self.messages.push(format!("{name}: {message}"));
        self.log(format!("[MSG] {name}: {message}"));
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    // === Global state ===

    pub fn set_state(&mut self, key: &str, value: Value) {
        self.state.insert(key.to_string(), value);
    }

    pub fn state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    // === Snapshots ===

    pub fn player_snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players
            .values()
            .map(|player| PlayerSnapshot::from(&*player.read()))
            .collect()
    }

    pub fn world_snapshots(&self) -> Vec<WorldSnapshot> {
        self.worlds
            .values()
            .map(|world| WorldSnapshot::from(&*world.read()))
            .collect()
    }

    /// Short multi-line overview of the current state
    pub fn summary(&self) -> String {
        let mut out = String::from("=== Simulation Summary ===\n");
        out.push_str(&format!("Players: {}\n", self.players.len()));
        for player in self.players.values() {
            let player = player.read();
            out.push_str(&format!(
                "  - {} at ({:.1}, {:.1}, {:.1})\n",
                player.name, player.location.x, player.location.y, player.location.z
            ));
        }
        out.push_str(&format!("Worlds: {}\n", self.worlds.len()));
        for world in self.worlds.values() {
            out.push_str(&format!("  - {}\n", world.read().name));
        }
        out.push_str(&format!("Pending Events: {}\n", self.events.len()));
        out.push_str(&format!("Messages: {}\n", self.messages.len()));
        out.push_str(&format!("Output Logs: {}\n", self.logs.len()));
        out
    }
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
