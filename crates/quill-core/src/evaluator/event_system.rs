use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::ast::Stmt;

/// A handler registered by an `on(name) { ... }` statement
#[derive(Debug, Clone)]
pub struct EventHandler {
    /// The event name this handler responds to
    pub event_name: String,
    /// The statements run on each trigger
    pub body: Arc<[Stmt]>,
    /// Source line of the registration
    pub line: usize,
}

/// Interpreter-wide handler table
///
/// Handlers are append-only and run in registration order. The table is not
/// tied to the scope that registered a handler: every trigger runs in a fresh
/// scope parented at global.
#[derive(Debug, Default)]
pub struct EventSystem {
    handlers: RwLock<HashMap<String, Vec<EventHandler>>>,
}

impl EventSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event handler
    pub fn register_handler(&self, event_name: &str, body: Arc<[Stmt]>, line: usize) {
        let handler = EventHandler {
            event_name: event_name.to_string(),
            body,
            line,
        };
        self.handlers
            .write()
            .entry(event_name.to_string())
            .or_default()
            .push(handler);
    }

    /// Snapshot of the handlers for an event, in registration order
    ///
    /// Handlers registered while these run are not part of the snapshot.
    pub fn handlers_for(&self, event_name: &str) -> Vec<EventHandler> {
        self.handlers
            .read()
            .get(event_name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn handler_count(&self, event_name: &str) -> usize {
        self.handlers.read().get(event_name).map_or(0, Vec::len)
    }

    /// Names of all events with at least one handler, sorted
    pub fn registered_events(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }
}
