//! Chat-style script messages
//!
//! A message carries the script in a fenced code block (```` ```quill ```` or a
//! plain fence) plus optional `PLAYER <name> AT <x> <y> <z>` directives
//! anywhere in the text. When several code blocks are present the last one is
//! the script.

use anyhow::{bail, Context, Result};
use quill_core::{PlayerSpawn, QuillError, RunReport, ScriptRequest};
use regex::Regex;

/// Log lines shown before the rest are summarised
pub const DEFAULT_MAX_LOG_LINES: usize = 20;

/// Compiled patterns for reading script messages
#[derive(Debug, Clone)]
pub struct MessageParser {
    code_block: Regex,
    player: Regex,
    player_line: Regex,
}

impl MessageParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            code_block: Regex::new(r"(?s)```(?:quill)?\n?(.*?)```")
                .context("invalid code block pattern")?,
            player: Regex::new(r"(?i)PLAYER\s+(\w+)\s+AT\s+([\d.]+)\s+([\d.]+)\s+([\d.]+)")
                .context("invalid player directive pattern")?,
            player_line: Regex::new(
                r"(?im)^[ \t]*PLAYER\s+\w+\s+AT\s+[\d.]+\s+[\d.]+\s+[\d.]+[ \t]*;?[ \t]*$",
            )
            .context("invalid player line pattern")?,
        })
    }

    /// Trimmed contents of every fenced code block, in order
    pub fn code_blocks(&self, text: &str) -> Vec<String> {
        self.code_block
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|body| body.as_str().trim().to_string())
            .collect()
    }

    /// Every `PLAYER` directive in the text, in order
    ///
    /// Directives whose coordinates are not valid numbers (such as `1.2.3`)
    /// are skipped.
    pub fn player_directives(&self, text: &str) -> Vec<PlayerSpawn> {
        self.player
            .captures_iter(text)
            .filter_map(|caps| {
                let x = caps[2].parse().ok()?;
                let y = caps[3].parse().ok()?;
                let z = caps[4].parse().ok()?;
                Some(PlayerSpawn::new(&caps[1], x, y, z))
            })
            .collect()
    }

    /// Remove lines that consist only of a `PLAYER` directive
    pub fn strip_directives(&self, source: &str) -> String {
        self.player_line.replace_all(source, "").trim().to_string()
    }

    /// Parse a chat message, which must contain a code block
    pub fn parse_message(&self, text: &str) -> Result<ScriptRequest> {
        let Some(code) = self.code_blocks(text).pop() else {
            bail!("No Quill code found. Wrap the script in a ``` code block.");
        };
        Ok(ScriptRequest {
            source: self.strip_directives(&code),
            players: self.player_directives(text),
        })
    }

    /// Parse a script file
    ///
    /// Files may be written like chat messages; without a code block the
    /// whole file is the script.
    pub fn parse_script(&self, text: &str) -> ScriptRequest {
        let source = self.code_blocks(text).pop().unwrap_or_else(|| text.to_string());
        ScriptRequest {
            source: self.strip_directives(&source),
            players: self.player_directives(text),
        }
    }
}

/// Plain-text rendering of a successful run
pub fn render_report(report: &RunReport, max_log_lines: Option<usize>) -> String {
    format!("Quill Execution Complete\n\n{}", report.render(max_log_lines))
}

const LEX_HINTS: &[&str] = &["Unclosed strings", "Invalid characters", "Unterminated comments"];
const PARSE_HINTS: &[&str] = &["Missing semicolons", "Unmatched brackets/parentheses", "Invalid syntax"];
const RUNTIME_HINTS: &[&str] = &[
    "Undefined variables",
    "Type mismatches",
    "Division by zero",
    "Invalid function arguments",
];

/// Plain-text rendering of a failed run, with hints for each error kind
pub fn render_error(error: &QuillError) -> String {
    let (lead, hints) = match error {
        QuillError::Lex(_) => ("Failed to tokenize the code:", LEX_HINTS),
        QuillError::Parse(_) => ("Failed to parse the code:", PARSE_HINTS),
        QuillError::Runtime(_) => ("Error during script execution:", RUNTIME_HINTS),
    };

    let mut out = format!("{}\n{lead}\n  {error}\n\n", error.title());
    out.push_str(match error {
        QuillError::Runtime(_) => "Common causes:\n",
        _ => "Check for:\n",
    });
    for hint in hints {
        out.push_str(&format!("  - {hint}\n"));
    }
    out
}
