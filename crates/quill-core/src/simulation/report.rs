//! Final-state snapshots handed to drivers after a run

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{GameMode, MockPlayer, MockWorld, Weather, DEFAULT_WORLD};

/// State of one player at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    pub health: f64,
    pub hunger: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub gamemode: GameMode,
    pub flying: bool,
    pub inventory: IndexMap<String, u32>,
}

impl From<&MockPlayer> for PlayerSnapshot {
    fn from(player: &MockPlayer) -> Self {
        Self {
            name: player.name.clone(),
            health: player.health,
            hunger: player.hunger,
            x: player.location.x,
            y: player.location.y,
            z: player.location.z,
            gamemode: player.gamemode,
            flying: player.flying,
            inventory: player.inventory.clone(),
        }
    }
}

impl fmt::Display for PlayerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | HP: {:.1} | Pos: ({:.1}, {:.1}, {:.1}) | Mode: {}",
            self.name, self.health, self.x, self.y, self.z, self.gamemode
        )
    }
}

/// State of one world at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub name: String,
    pub time: i64,
    pub weather: Weather,
    pub blocks: usize,
    pub entities: usize,
}

impl From<&MockWorld> for WorldSnapshot {
    fn from(world: &MockWorld) -> Self {
        Self {
            name: world.name.clone(),
            time: world.time,
            weather: world.weather,
            blocks: world.blocks.len(),
            entities: world.entities.len(),
        }
    }
}

impl fmt::Display for WorldSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Time: {} | Weather: {}",
            self.name, self.time, self.weather
        )
    }
}

/// Everything a driver needs to display the outcome of a successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub logs: Vec<String>,
    pub messages: Vec<String>,
    pub players: Vec<PlayerSnapshot>,
    pub worlds: Vec<WorldSnapshot>,
    /// Events left in the queue when the drain stopped
    pub pending_events: usize,
}

impl RunReport {
    /// World states are only interesting once something changed them
    pub fn worlds_changed(&self) -> bool {
        self.worlds.len() > 1
            || self
                .worlds
                .iter()
                .any(|world| world.name == DEFAULT_WORLD && world.time != 0)
    }

    /// Plain-text rendering with optional truncation of the log section
    pub fn render(&self, max_log_lines: Option<usize>) -> String {
        let mut out = String::new();

        if !self.logs.is_empty() {
            out.push_str("=== Execution Logs ===\n");
            let limit = max_log_lines.unwrap_or(usize::MAX);
            for line in self.logs.iter().take(limit) {
                out.push_str(line);
                out.push('\n');
            }
            if self.logs.len() > limit {
                out.push_str(&format!("... ({} more lines)\n", self.logs.len() - limit));
            }
            out.push('\n');
        }

        if !self.messages.is_empty() {
            out.push_str("=== Messages ===\n");
            for message in &self.messages {
                out.push_str(message);
                out.push('\n');
            }
            out.push('\n');
        }

        if !self.players.is_empty() {
            out.push_str("=== Player States ===\n");
            for player in &self.players {
                out.push_str(&format!("{player}\n"));
            }
            out.push('\n');
        }

        if self.worlds_changed() {
            out.push_str("=== World States ===\n");
            for world in &self.worlds {
                out.push_str(&format!("{world}\n"));
            }
            out.push('\n');
        }

        out.push_str(&format!(
            "Executed {} operations in {}ms",
            self.logs.len(),
            self.elapsed_ms
        ));
        out
    }
}
