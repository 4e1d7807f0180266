//! REPL (Read-Eval-Print Loop) functionality for Quill
//!
//! Wraps a [`QuillSession`] with dot-commands, multi-line input collection
//! and notifier-based output. Queued events are drained after every
//! evaluation, the same point a one-shot run drains them.

use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use quill_core::{PlayerSpawn, QuillConfig, QuillError, QuillSession, Value};
use tracing::debug;

use crate::message::{render_report, MessageParser};

pub mod commands;
pub mod multiline;
pub mod notifier;

pub use commands::ReplCommand;
pub use multiline::{LineProcessResult, MultiLineCollector};
pub use notifier::{DefaultNotifier, ReplNotifier};

/// Interactive REPL for the Quill scripting language
pub struct Repl {
    session: QuillSession,
    messages: MessageParser,
    notifier: Box<dyn ReplNotifier>,
    running: bool,
    /// Quiet mode (suppress timing info)
    quiet: bool,
    debug: bool,
    /// Log lines already handed to the notifier
    shown_logs: usize,
}

impl Repl {
    pub fn new(config: QuillConfig) -> Result<Self> {
        let debug = config.debug;
        Ok(Self {
            session: QuillSession::new(config),
            messages: MessageParser::new()?,
            notifier: Box::new(DefaultNotifier::new()),
            running: true,
            quiet: false,
            debug,
            shown_logs: 0,
        })
    }

    pub fn set_notifier(&mut self, notifier: Box<dyn ReplNotifier>) {
        self.notifier = notifier;
    }

    pub fn notifier(&self) -> &dyn ReplNotifier {
        self.notifier.as_ref()
    }

    pub fn session(&self) -> &QuillSession {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Parse REPL input into a command
    pub fn parse_input(&self, input: &str) -> Result<ReplCommand> {
        commands::parse_command(input)
    }

    /// Handle a REPL command
    pub fn handle_command(&mut self, command: ReplCommand) -> Result<String> {
        match command {
            ReplCommand::Help => Ok(help_text().to_string()),
            ReplCommand::Quit => {
                self.running = false;
                Ok("Goodbye!".to_string())
            }
            ReplCommand::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                Ok("Screen cleared.".to_string())
            }
            ReplCommand::Quiet => {
                self.quiet = !self.quiet;
                Ok(format!("Quiet mode: {}", on_off(self.quiet)))
            }
            ReplCommand::Debug => {
                self.debug = !self.debug;
                Ok(format!("Debug mode: {}", on_off(self.debug)))
            }
            ReplCommand::SpawnPlayer(spawn) => self.spawn_player(&spawn),
            ReplCommand::ListPlayers => Ok(self.list_players()),
            ReplCommand::Report => Ok(render_report(&self.session.report(), None)),
            ReplCommand::Stats => Ok(format!(
                "{}Debug mode: {}\nQuiet mode: {}",
                self.session.summary(),
                on_off(self.debug),
                on_off(self.quiet)
            )),
            ReplCommand::Reset => {
                self.session.reset();
                self.shown_logs = 0;
                Ok("Session reset.".to_string())
            }
            ReplCommand::Load(path) => self.load(&path),
        }
    }

    /// Evaluate Quill code and return the formatted result with timing
    pub fn execute(&mut self, code: &str) -> Result<(String, u64)> {
        let start = Instant::now();
        let value = self.session.eval(code).map_err(describe)?;
        let dispatched = self.session.drain_events();
        if self.debug {
            debug!(dispatched, "drained events after evaluation");
        }
        let duration = start.elapsed().as_millis() as u64;
        Ok((format_value(&value), duration))
    }

    /// Log lines written since the last call
    pub fn take_new_logs(&mut self) -> Vec<String> {
        let logs = self.session.simulation().logs();
        let start = self.shown_logs.min(logs.len());
        self.shown_logs = logs.len();
        logs[start..].to_vec()
    }

    fn spawn_player(&mut self, spawn: &PlayerSpawn) -> Result<String> {
        self.session.spawn_player(spawn).map_err(describe)?;
        Ok(format!(
            "Spawned player '{}' at ({}, {}, {})",
            spawn.name, spawn.x, spawn.y, spawn.z
        ))
    }

    fn list_players(&self) -> String {
        let players = self.session.simulation().player_snapshots();
        if players.is_empty() {
            return "No players spawned.".to_string();
        }
        let lines: Vec<String> = players.iter().map(|p| format!("  {p}")).collect();
        format!("Players:\n{}", lines.join("\n"))
    }

    /// Run a script file inside the current session
    ///
    /// `PLAYER` directives in the file spawn players first; players that
    /// already exist are kept as they are.
    fn load(&mut self, path: &str) -> Result<String> {
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read script {path}"))?;
        let request = self.messages.parse_script(&text);
        for spawn in &request.players {
            if !self.session.simulation().has_player(&spawn.name) {
                self.session.spawn_player(spawn).map_err(describe)?;
            }
        }
        let (output, duration) = self.execute(&request.source)?;
        Ok(format!("Loaded {path} => {output} ({duration}ms)"))
    }

    pub fn show_exit_stats(&self) {
        if !self.quiet {
            let sim = self.session.simulation();
            println!(
                "\nSession complete: {} log lines, {} messages.",
                sim.logs().len(),
                sim.messages().len()
            );
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn describe(error: QuillError) -> anyhow::Error {
    anyhow!("{}: {error}", error.title())
}

/// Format a value for display, quoting top-level strings
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

fn help_text() -> &'static str {
    r#"Quill REPL Commands:
  .help    - Show this help message
  .quit    - Exit the REPL
  .clear   - Clear the screen
  .quiet   - Toggle quiet mode (hide timing info)
  .debug   - Toggle debug mode
  .eval    - Enter multi-line evaluation mode (end with '.')

Simulation Commands:
  .player <name> [<x> <y> <z>] - Spawn a mock player
  .players                     - List players
  .report                      - Show logs, messages, players and worlds
  .stats                       - Show a summary of the simulation
  .reset                       - Discard all variables and simulation state
  .load <file>                 - Run a script file in this session

Quill Language Features:
  - Variables: let x = 42, const MAX = 10
  - Lists and maps: [1, 2, 3], {name: "Steve", level: 5}
  - Functions: func add(a, b) { return a + b }
  - Conditionals: if x > 5 { ... } else { ... }
  - Loops: while n < 10 { ... }, for item in items { ... }
  - Errors: try { ... } catch (e) { log(e) }
  - Events: on(player_join) { ... }, queue_event("player_join", {who: "Steve"})
  - Scopes: let arena = new Scope(0, 0, 0, 50, 50, 50)"#
}
