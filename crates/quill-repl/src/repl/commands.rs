//! REPL command parsing and definitions
//!
//! Handles parsing of dot-commands (.help, .quit, etc.) and the simulation
//! management commands.

use anyhow::{anyhow, Result};
use quill_core::PlayerSpawn;

/// Available REPL commands
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Show help information
    Help,
    /// Exit the REPL
    Quit,
    /// Clear the screen
    Clear,
    /// Toggle quiet mode
    Quiet,
    /// Toggle debug mode
    Debug,
    /// Spawn a mock player
    SpawnPlayer(PlayerSpawn),
    /// List all players
    ListPlayers,
    /// Show the full session report
    Report,
    /// Show the simulation summary
    Stats,
    /// Discard all session state
    Reset,
    /// Run a script file in the current session
    Load(String),
}

/// Parse a command string into a ReplCommand
pub fn parse_command(input: &str) -> Result<ReplCommand> {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('.') else {
        return Err(anyhow!("Commands must start with '.'"));
    };

    let parts: Vec<&str> = rest.split_whitespace().collect();

    let Some(&name) = parts.first() else {
        return Err(anyhow!("Empty command"));
    };

    match name {
        "help" | "h" => Ok(ReplCommand::Help),
        "quit" | "q" | "exit" => Ok(ReplCommand::Quit),
        "clear" | "cls" => Ok(ReplCommand::Clear),
        "quiet" => Ok(ReplCommand::Quiet),
        "debug" => Ok(ReplCommand::Debug),
        "player" | "spawn" => parse_spawn(&parts[1..]).map(ReplCommand::SpawnPlayer),
        "players" | "list" => Ok(ReplCommand::ListPlayers),
        "report" => Ok(ReplCommand::Report),
        "stats" | "statistics" => Ok(ReplCommand::Stats),
        "reset" => Ok(ReplCommand::Reset),
        "load" => {
            if parts.len() != 2 {
                return Err(anyhow!("Usage: .load <script_file>"));
            }
            Ok(ReplCommand::Load(parts[1].to_string()))
        }
        _ => Err(anyhow!("Unknown command: .{name}")),
    }
}

/// Arguments of `.player <name> [<x> <y> <z>]`; without coordinates the
/// player stands at (0, 64, 0)
pub fn parse_spawn(args: &[&str]) -> Result<PlayerSpawn> {
    const USAGE: &str = "Usage: .player <name> [<x> <y> <z>]";

    match args {
        [name] => Ok(PlayerSpawn::new(*name, 0.0, 64.0, 0.0)),
        [name, x, y, z] => {
            let coord = |text: &str| {
                text.parse::<f64>()
                    .map_err(|_| anyhow!("Invalid coordinate '{text}'. {USAGE}"))
            };
            Ok(PlayerSpawn::new(*name, coord(*x)?, coord(*y)?, coord(*z)?))
        }
        _ => Err(anyhow!(USAGE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert!(matches!(parse_command(".help").unwrap(), ReplCommand::Help));
        assert!(matches!(parse_command(".h").unwrap(), ReplCommand::Help));
    }

    #[test]
    fn test_parse_quit() {
        assert!(matches!(parse_command(".quit").unwrap(), ReplCommand::Quit));
        assert!(matches!(parse_command(".q").unwrap(), ReplCommand::Quit));
        assert!(matches!(parse_command(".exit").unwrap(), ReplCommand::Quit));
    }

    #[test]
    fn test_parse_spawn_player() {
        assert_eq!(
            parse_command(".player Alice 1 70.5 -3").unwrap(),
            ReplCommand::SpawnPlayer(PlayerSpawn::new("Alice", 1.0, 70.5, -3.0))
        );
        assert_eq!(
            parse_command(".spawn Bob").unwrap(),
            ReplCommand::SpawnPlayer(PlayerSpawn::new("Bob", 0.0, 64.0, 0.0))
        );
    }

    #[test]
    fn test_parse_load() {
        assert_eq!(
            parse_command(".load scripts/demo.quill").unwrap(),
            ReplCommand::Load("scripts/demo.quill".to_string())
        );
    }

    #[test]
    fn test_parse_invalid_command() {
        assert!(parse_command(".invalid").is_err());
        assert!(parse_command("help").is_err()); // Missing dot
        assert!(parse_command(".").is_err());
        assert!(parse_command(".player").is_err());
        assert!(parse_command(".player Alice 1 2").is_err());
        assert!(parse_command(".load").is_err());

        let err = parse_command(".player Alice one 2 3").unwrap_err();
        assert!(err.to_string().starts_with("Invalid coordinate 'one'"));
    }
}
