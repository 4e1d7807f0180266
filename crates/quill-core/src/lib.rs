//! # Quill Core
//!
//! Core implementation of the Quill scripting language, including:
//! - Lexer and token definitions
//! - Abstract Syntax Tree (AST) definitions
//! - Recursive-descent parser
//! - Tree-walking evaluator with scopes, built-ins and event dispatch
//! - Mock simulation state (players, worlds, entities, items)
//!
//! This crate provides the foundational components that can be used to build
//! various Quill front ends (REPL, chat command, embedded runtime, etc.)

#![warn(clippy::all)]

pub mod ast;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod simulation;

// Re-export commonly used types
pub use ast::{Expr, ExprKind, Program, Stmt, StmtKind};
pub use evaluator::{
    errors::EvaluatorError,
    event_system::{EventHandler, EventSystem},
    scope::{Region, ScopeArena, ScopeId},
    value::{FunctionValue, Value},
    ControlFlow, Evaluator,
};
pub use lexer::{tokenize, LexError, Token, TokenKind};
pub use parser::{parse_source, ParseError, Parser};
pub use runtime::{PlayerSpawn, QuillRuntime, QuillSession, ScriptRequest};
pub use simulation::{
    report::{PlayerSnapshot, RunReport, WorldSnapshot},
    SimulationContext,
};

/// Quill language version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for Quill core components
pub fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "quill_core=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Core Quill runtime configuration
#[derive(Debug, Clone)]
pub struct QuillConfig {
    /// Iterations a single loop may run before it is treated as runaway
    pub max_loop_iterations: usize,
    /// Wall-clock milliseconds a single loop may run
    pub max_loop_millis: u64,
    /// Events dequeued by the post-run drain before it gives up
    pub max_event_dispatches: usize,
    /// Maximum nesting of user function calls
    pub max_call_depth: usize,
    /// Optional wall-clock budget for a whole run
    pub run_budget_millis: Option<u64>,
    /// Seed for `random`/`random_choice`; entropy when unset
    pub rng_seed: Option<u64>,
    /// Enable debug mode
    pub debug: bool,
}

impl Default for QuillConfig {
    fn default() -> Self {
        Self {
            max_loop_iterations: 10_000,
            max_loop_millis: 5_000,
            max_event_dispatches: 100,
            max_call_depth: 64,
            run_budget_millis: None,
            rng_seed: None,
            debug: false,
        }
    }
}

/// Error types for Quill core operations
#[derive(thiserror::Error, Debug)]
pub enum QuillError {
    /// Tokenization failed
    #[error("{0}")]
    Lex(#[from] LexError),

    /// Parsing failed
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// Evaluation failed
    #[error("{0}")]
    Runtime(#[from] EvaluatorError),
}

impl QuillError {
    /// Heading a driver shows above the message
    pub fn title(&self) -> &'static str {
        match self {
            QuillError::Lex(_) => "Lexer Error",
            QuillError::Parse(_) => "Parser Error",
            QuillError::Runtime(_) => "Runtime Error",
        }
    }
}

/// Result type for Quill core operations
pub type Result<T> = std::result::Result<T, QuillError>;
