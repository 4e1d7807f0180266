//! Running several script files at once
//!
//! Every file gets its own [`QuillRuntime::run`] on the blocking pool, so
//! scripts never share simulation state. Results come back in the order
//! the files were given.

use std::path::PathBuf;

use anyhow::Result;
use quill_core::{PlayerSpawn, QuillRuntime, RunReport};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::message::{render_error, render_report, MessageParser};

/// What happened to one script file
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Completed { report: RunReport },
    Failed { title: String, message: String, rendered: String },
    Unreadable { message: String },
}

#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Completed { .. })
    }

    /// Human-readable rendering for the terminal
    pub fn render(&self, max_log_lines: Option<usize>) -> String {
        let body = match &self.outcome {
            Outcome::Completed { report } => render_report(report, max_log_lines),
            Outcome::Failed { rendered, .. } => rendered.clone(),
            Outcome::Unreadable { message } => format!("Could not read script: {message}\n"),
        };
        format!("--- {} ---\n{body}", self.path.display())
    }
}

enum Pending {
    Running(JoinHandle<quill_core::Result<RunReport>>),
    Unreadable(String),
}

/// Run every file concurrently
///
/// `players` are spawned in addition to the file's own `PLAYER` directives;
/// a name the file already declares is not spawned twice.
pub async fn run_files(
    runtime: &QuillRuntime,
    parser: &MessageParser,
    paths: Vec<PathBuf>,
    players: &[PlayerSpawn],
) -> Result<Vec<BatchResult>> {
    let mut pending = Vec::with_capacity(paths.len());

    for path in paths {
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read script");
                pending.push((path, Pending::Unreadable(e.to_string())));
                continue;
            }
        };

        let mut request = parser.parse_script(&text);
        for spawn in players {
            if !request.players.iter().any(|p| p.name == spawn.name) {
                request.players.push(spawn.clone());
            }
        }

        let runtime = runtime.clone();
        let handle = tokio::task::spawn_blocking(move || runtime.run(&request));
        pending.push((path, Pending::Running(handle)));
    }

    let mut results = Vec::with_capacity(pending.len());
    for (path, job) in pending {
        let outcome = match job {
            Pending::Running(handle) => match handle.await? {
                Ok(report) => Outcome::Completed { report },
                Err(error) => Outcome::Failed {
                    title: error.title().to_string(),
                    message: error.to_string(),
                    rendered: render_error(&error),
                },
            },
            Pending::Unreadable(message) => Outcome::Unreadable { message },
        };
        results.push(BatchResult { path, outcome });
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    info!(scripts = results.len(), failed, "batch complete");
    Ok(results)
}
