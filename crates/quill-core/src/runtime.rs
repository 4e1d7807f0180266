//! Quill Runtime - High-level interface for script execution
//!
//! [`QuillRuntime`] runs one script from scratch and returns a [`RunReport`];
//! every run gets its own evaluator and simulation, so runs never share
//! state. [`QuillSession`] keeps one evaluator alive across several
//! evaluations for interactive use.

use std::{path::Path, time::Instant};

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    evaluator::{errors::EvaluatorError, value::Value, Evaluator},
    lexer::tokenize,
    parser::Parser,
    simulation::{report::RunReport, Location, SimulationContext},
    Program, QuillConfig, Result,
};

/// A player to place in the world before the script starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpawn {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PlayerSpawn {
    pub fn new(name: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z,
        }
    }
}

/// Script text plus the players it expects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptRequest {
    pub source: String,
    pub players: Vec<PlayerSpawn>,
}

impl ScriptRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            players: Vec::new(),
        }
    }

    pub fn with_player(mut self, spawn: PlayerSpawn) -> Self {
        self.players.push(spawn);
        self
    }
}

/// Lex and parse without executing anything
fn compile(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    let program = Parser::new(tokens).parse()?;
    debug!(statements = program.statements.len(), "parsed script");
    Ok(program)
}

fn spawn_players(sim: &mut SimulationContext, players: &[PlayerSpawn]) -> Result<()> {
    for spawn in players {
        sim.spawn_player(&spawn.name, Location::new(spawn.x, spawn.y, spawn.z))
            .map_err(EvaluatorError::from)?;
    }
    Ok(())
}

fn report(evaluator: &Evaluator, started_at: chrono::DateTime<Utc>, started: Instant) -> RunReport {
    let sim = evaluator.simulation();
    RunReport {
        started_at,
        elapsed_ms: started.elapsed().as_millis() as u64,
        logs: sim.logs().to_vec(),
        messages: sim.messages().to_vec(),
        players: sim.player_snapshots(),
        worlds: sim.world_snapshots(),
        pending_events: sim.pending_events(),
    }
}

/// One-shot script runner
#[derive(Debug, Clone, Default)]
pub struct QuillRuntime {
    config: QuillConfig,
}

impl QuillRuntime {
    pub fn new(config: QuillConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QuillConfig {
        &self.config
    }

    /// Run a script to completion
    ///
    /// Lex and parse errors are reported before any player is spawned. On
    /// success the queued events have been drained.
    pub fn run(&self, request: &ScriptRequest) -> Result<RunReport> {
        let started_at = Utc::now();
        let started = Instant::now();
        let program = compile(&request.source)?;

        let mut sim = SimulationContext::new();
        spawn_players(&mut sim, &request.players)?;
        let mut evaluator = Evaluator::with_simulation(self.config.clone(), sim);

        evaluator.execute(&program)?;
        let dispatched = evaluator.drain_events();

        let report = report(&evaluator, started_at, started);
        info!(
            elapsed_ms = report.elapsed_ms,
            log_lines = report.logs.len(),
            dispatched,
            "script run complete"
        );
        Ok(report)
    }

    /// Run source text with no players
    pub fn run_source(&self, source: &str) -> Result<RunReport> {
        self.run(&ScriptRequest::new(source))
    }

    /// Read a script from disk and run it
    pub fn run_file(&self, path: impl AsRef<Path>, players: Vec<PlayerSpawn>) -> anyhow::Result<RunReport> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        let request = ScriptRequest { source, players };
        let report = self
            .run(&request)
            .with_context(|| format!("script {} failed", path.display()))?;
        Ok(report)
    }
}

/// A long-lived evaluator for interactive use
///
/// Variables, functions, handlers and simulation state persist between
/// calls to [`QuillSession::eval`].
pub struct QuillSession {
    evaluator: Evaluator,
    started_at: chrono::DateTime<Utc>,
    started: Instant,
}

impl QuillSession {
    pub fn new(config: QuillConfig) -> Self {
        Self {
            evaluator: Evaluator::new(config),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Evaluate a chunk of source in the session's global scope
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        let program = compile(source)?;
        Ok(self.evaluator.execute(&program)?)
    }

    pub fn spawn_player(&mut self, spawn: &PlayerSpawn) -> Result<()> {
        spawn_players(
            self.evaluator.simulation_mut(),
            std::slice::from_ref(spawn),
        )
    }

    /// Dispatch queued events now, returning how many were dequeued
    pub fn drain_events(&mut self) -> usize {
        self.evaluator.drain_events()
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn simulation(&self) -> &SimulationContext {
        self.evaluator.simulation()
    }

    /// Snapshot of everything the session has done so far
    pub fn report(&self) -> RunReport {
        report(&self.evaluator, self.started_at, self.started)
    }

    pub fn summary(&self) -> String {
        self.evaluator.simulation().summary()
    }

    /// Discard all state and start over with the same configuration
    pub fn reset(&mut self) {
        let config = self.evaluator.config().clone();
        *self = Self::new(config);
    }
}

impl Default for QuillSession {
    fn default() -> Self {
        Self::new(QuillConfig::default())
    }
}
