//! In-memory stand-ins for game objects manipulated by built-ins

use std::{collections::HashMap, fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SimulationError;

pub const MAX_HEALTH: f64 = 20.0;
pub const MAX_HUNGER: i64 = 20;
pub const DAY_LENGTH: i64 = 24_000;

/// A point in 3D world space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Location) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl FromStr for GameMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "survival" => Ok(GameMode::Survival),
            "creative" => Ok(GameMode::Creative),
            "adventure" => Ok(GameMode::Adventure),
            "spectator" => Ok(GameMode::Spectator),
            _ => Err(()),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::Survival => "survival",
            GameMode::Creative => "creative",
            GameMode::Adventure => "adventure",
            GameMode::Spectator => "spectator",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Clear,
    Rain,
    Thunder,
}

impl FromStr for Weather {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clear" => Ok(Weather::Clear),
            "rain" => Ok(Weather::Rain),
            "thunder" => Ok(Weather::Thunder),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weather::Clear => "clear",
            Weather::Rain => "rain",
            Weather::Thunder => "thunder",
        };
        f.write_str(name)
    }
}

/// A simulated online player
#[derive(Debug, Clone)]
pub struct MockPlayer {
    pub name: String,
    pub location: Location,
    pub health: f64,
    pub max_health: f64,
    pub hunger: i64,
    pub gamemode: GameMode,
    pub flying: bool,
    /// Item id to count; entries never hold zero
    pub inventory: IndexMap<String, u32>,
    /// Messages this player received, oldest first
    pub messages: Vec<String>,
}

impl MockPlayer {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            health: MAX_HEALTH,
            max_health: MAX_HEALTH,
            hunger: MAX_HUNGER,
            gamemode: GameMode::Survival,
            flying: false,
            inventory: IndexMap::new(),
            messages: Vec::new(),
        }
    }

    pub fn set_health(&mut self, health: f64) {
        self.health = health.clamp(0.0, self.max_health);
    }

    pub fn set_hunger(&mut self, hunger: i64) {
        self.hunger = hunger.clamp(0, MAX_HUNGER);
    }

    pub fn damage(&mut self, amount: f64) {
        self.set_health(self.health - amount);
    }

    /// Add items, refusing counts that do not fit in a `u32`
    pub fn give_item(&mut self, item: &str, amount: u32) -> Result<(), SimulationError> {
        let total = self
            .item_count(item)
            .checked_add(amount)
            .ok_or_else(|| SimulationError::InventoryOverflow {
                player: self.name.clone(),
                item: item.to_string(),
                requested: amount,
            })?;
        self.inventory.insert(item.to_string(), total);
        Ok(())
    }

    pub fn item_count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    /// Remove items, refusing to go below zero
    pub fn remove_item(&mut self, item: &str, amount: u32) -> Result<(), SimulationError> {
        let have = self.item_count(item);
        if have < amount {
            return Err(SimulationError::InsufficientItems {
                player: self.name.clone(),
                item: item.to_string(),
                have,
                requested: amount,
            });
        }
        if have == amount {
            self.inventory.shift_remove(item);
        } else {
            self.inventory.insert(item.to_string(), have - amount);
        }
        Ok(())
    }
}

/// Integer block coordinate
pub type BlockPos = (i64, i64, i64);

pub fn block_pos(x: f64, y: f64, z: f64) -> BlockPos {
    (x.round() as i64, y.round() as i64, z.round() as i64)
}

/// A simulated world with sparse block storage
#[derive(Debug, Clone)]
pub struct MockWorld {
    pub name: String,
    /// Always within `0..DAY_LENGTH`
    pub time: i64,
    pub weather: Weather,
    pub blocks: HashMap<BlockPos, String>,
    pub entities: Vec<super::EntityRef>,
}

impl MockWorld {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: 0,
            weather: Weather::Clear,
            blocks: HashMap::new(),
            entities: Vec::new(),
        }
    }

    pub fn set_time(&mut self, time: i64) {
        self.time = time.rem_euclid(DAY_LENGTH);
    }

    pub fn set_block(&mut self, pos: BlockPos, block: impl Into<String>) {
        self.blocks.insert(pos, block.into());
    }

    pub fn block(&self, pos: BlockPos) -> &str {
        self.blocks.get(&pos).map(String::as_str).unwrap_or("air")
    }
}

/// A spawned non-player entity
#[derive(Debug, Clone)]
pub struct MockEntity {
    pub id: Uuid,
    pub entity_type: String,
    pub location: Location,
    pub health: f64,
    pub max_health: f64,
}

impl MockEntity {
    pub fn new(entity_type: impl Into<String>, location: Location) -> Self {
        let entity_type = entity_type.into().to_lowercase();
        let max_health = default_entity_health(&entity_type);
        Self {
            id: Uuid::new_v4(),
            entity_type,
            location,
            health: max_health,
            max_health,
        }
    }
}

fn default_entity_health(entity_type: &str) -> f64 {
    match entity_type {
        "zombie" => 20.0,
        "spider" => 16.0,
        "enderman" => 40.0,
        "cow" | "pig" | "sheep" => 10.0,
        "chicken" => 4.0,
        "horse" => 30.0,
        "iron_golem" => 100.0,
        "wolf" => 8.0,
        "cat" => 10.0,
        _ => 20.0,
    }
}

/// A stack of items of one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockItemStack {
    pub item_type: String,
    pub amount: u32,
}

impl MockItemStack {
    pub fn new(item_type: &str, amount: u32) -> Self {
        Self {
            item_type: item_type.to_lowercase(),
            amount,
        }
    }

    pub fn air() -> Self {
        Self::new("air", 1)
    }

    pub fn is_air(&self) -> bool {
        self.item_type == "air"
    }
}

/// A container of fixed-size item slots
#[derive(Debug, Clone)]
pub struct MockInventory {
    pub name: String,
    pub slots: Vec<MockItemStack>,
}

impl MockInventory {
    pub const SMALL_SIZE: usize = 27;
    pub const LARGE_SIZE: usize = 54;

    pub fn new(name: impl Into<String>, large: bool) -> Self {
        let size = if large {
            Self::LARGE_SIZE
        } else {
            Self::SMALL_SIZE
        };
        Self {
            name: name.into(),
            slots: vec![MockItemStack::air(); size],
        }
    }

    pub fn slot(&self, index: usize) -> Result<&MockItemStack, SimulationError> {
        self.slots
            .get(index)
            .ok_or_else(|| SimulationError::InvalidSlot {
                inventory: self.name.clone(),
                slot: index,
            })
    }

    /// Place an item in the first empty slot, returning its index
    pub fn add_item(&mut self, item: MockItemStack) -> Option<usize> {
        let index = self.slots.iter().position(MockItemStack::is_air)?;
        self.slots[index] = item;
        Some(index)
    }
}

/// An event raised by a script, possibly cancelled by a handler
#[derive(Debug, Clone)]
pub struct MockEvent {
    pub name: String,
    pub cancelled: bool,
}

impl MockEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cancelled: false,
        }
    }
}
