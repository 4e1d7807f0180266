//! Quill REPL - command-line driver for the Quill scripting language
//!
//! Provides the interactive REPL, chat-message parsing (code blocks and
//! `PLAYER` directives) and concurrent batch runs of script files.

pub mod batch;
pub mod message;
pub mod repl;

pub use batch::{run_files, BatchResult, Outcome};
pub use message::{render_error, render_report, MessageParser, DEFAULT_MAX_LOG_LINES};
pub use repl::{DefaultNotifier, Repl, ReplCommand, ReplNotifier};
