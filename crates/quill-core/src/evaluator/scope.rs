//! Lexical scopes and the arena that owns them
//!
//! Scopes live in a [`ScopeArena`] and refer to their parent by [`ScopeId`].
//! Short-lived scopes (function calls, loop iterations, catch blocks, event
//! handlers) are released when evaluation leaves them unless something
//! captured them: a function declared inside, or a subscope parented there.
//! Captured scopes, and every ancestor of one, are retained until the arena
//! is dropped at the end of the run.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use serde::{Deserialize, Serialize};

use super::{errors::EvaluatorError, value::Value};

/// Handle to a scope in a [`ScopeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Normalized axis-aligned 3D box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x1: f64,
    pub y1: f64,
    pub z1: f64,
    pub x2: f64,
    pub y2: f64,
    pub z2: f64,
}

impl Region {
    /// Build a region from two opposite corners in any order
    pub fn new(x1: f64, y1: f64, z1: f64, x2: f64, y2: f64, z2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            z1: z1.min(z2),
            x2: x1.max(x2),
            y2: y1.max(y2),
            z2: z1.max(z2),
        }
    }

    /// The unbounded region of the global scope
    pub fn infinite() -> Self {
        Self::new(
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::INFINITY,
            f64::INFINITY,
        )
    }

    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        (self.x1..=self.x2).contains(&x)
            && (self.y1..=self.y2).contains(&y)
            && (self.z1..=self.z2).contains(&z)
    }

    /// Whether this region lies entirely inside `other`
    pub fn is_within(&self, other: &Region) -> bool {
        self.x1 >= other.x1
            && self.x2 <= other.x2
            && self.y1 >= other.y1
            && self.y2 <= other.y2
            && self.z1 >= other.z1
            && self.z2 <= other.z2
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.x1 <= other.x2
            && self.x2 >= other.x1
            && self.y1 <= other.y2
            && self.y2 >= other.y1
            && self.z1 <= other.z2
            && self.z2 >= other.z1
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Region({:.1}, {:.1}, {:.1} -> {:.1}, {:.1}, {:.1})",
            self.x1, self.y1, self.z1, self.x2, self.y2, self.z2
        )
    }
}

/// A single lexical scope
#[derive(Debug)]
pub struct Scope {
    pub name: String,
    pub parent: Option<ScopeId>,
    variables: HashMap<String, Value>,
    constants: HashSet<String>,
    subscopes: HashMap<String, ScopeId>,
    /// Explicit region; `None` inherits from the parent
    region: Option<Region>,
    retained: bool,
}

impl Scope {
    fn new(name: impl Into<String>, parent: Option<ScopeId>, region: Option<Region>) -> Self {
        Self {
            name: name.into(),
            parent,
            variables: HashMap::new(),
            constants: HashSet::new(),
            subscopes: HashMap::new(),
            region,
            retained: false,
        }
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains(name)
    }
}

/// Owner of every scope created during a run
#[derive(Debug)]
pub struct ScopeArena {
    slots: Vec<Option<Scope>>,
    free: Vec<usize>,
    global: ScopeId,
}

impl ScopeArena {
    pub fn new() -> Self {
        let mut global = Scope::new("global", None, Some(Region::infinite()));
        global.retained = true;
        Self {
            slots: vec![Some(global)],
            free: Vec::new(),
            global: ScopeId(0),
        }
    }

    pub fn global(&self) -> ScopeId {
        self.global
    }

    fn insert(&mut self, scope: Scope) -> ScopeId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(scope);
                ScopeId(index)
            }
            None => {
                self.slots.push(Some(scope));
                ScopeId(self.slots.len() - 1)
            }
        }
    }

    /// Create a child scope that inherits its parent's region
    pub fn push(&mut self, parent: ScopeId, name: impl Into<String>) -> ScopeId {
        self.insert(Scope::new(name, Some(parent), None))
    }

    /// Create a child scope bound to an explicit region
    pub fn push_region(&mut self, parent: ScopeId, name: impl Into<String>, region: Region) -> ScopeId {
        self.insert(Scope::new(name, Some(parent), Some(region)))
    }

    /// Keep a scope and all of its ancestors alive for the rest of the run
    pub fn retain(&mut self, id: ScopeId) {
        let mut next = Some(id);
        while let Some(current) = next {
            match self.slots.get_mut(current.0).and_then(Option::as_mut) {
                Some(scope) if !scope.retained => {
                    scope.retained = true;
                    next = scope.parent;
                }
                _ => break,
            }
        }
    }

    /// Drop a scope that evaluation has left, unless it was captured
    pub fn release(&mut self, id: ScopeId) {
        let releasable = self
            .slots
            .get(id.0)
            .and_then(Option::as_ref)
            .is_some_and(|scope| !scope.retained);
        if releasable {
            self.slots[id.0] = None;
            self.free.push(id.0);
        }
    }

    pub fn get(&self, id: ScopeId) -> Result<&Scope, EvaluatorError> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| EvaluatorError::runtime("Scope is no longer available"))
    }

    fn get_mut(&mut self, id: ScopeId) -> Result<&mut Scope, EvaluatorError> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| EvaluatorError::runtime("Scope is no longer available"))
    }

    pub fn name(&self, id: ScopeId) -> Result<&str, EvaluatorError> {
        Ok(&self.get(id)?.name)
    }

    /// Number of live scopes
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bind a new variable in exactly this scope
    pub fn define(&mut self, id: ScopeId, name: &str, value: Value) -> Result<(), EvaluatorError> {
        let scope = self.get_mut(id)?;
        if scope.variables.contains_key(name) {
            return Err(EvaluatorError::AlreadyDefined {
                name: name.to_string(),
            });
        }
        scope.variables.insert(name.to_string(), value);
        Ok(())
    }

    pub fn define_const(&mut self, id: ScopeId, name: &str, value: Value) -> Result<(), EvaluatorError> {
        self.define(id, name, value)?;
        self.get_mut(id)?.constants.insert(name.to_string());
        Ok(())
    }

    /// Find the nearest scope in the chain that binds `name`
    pub fn resolve(&self, id: ScopeId, name: &str) -> Result<Option<ScopeId>, EvaluatorError> {
        let mut next = Some(id);
        while let Some(current) = next {
            let scope = self.get(current)?;
            if scope.variables.contains_key(name) {
                return Ok(Some(current));
            }
            next = scope.parent;
        }
        Ok(None)
    }

    pub fn lookup(&self, id: ScopeId, name: &str) -> Result<Value, EvaluatorError> {
        match self.resolve(id, name)? {
            Some(owner) => self
                .get(owner)?
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| EvaluatorError::variable_not_found(name)),
            None => Err(EvaluatorError::variable_not_found(name)),
        }
    }

    /// Update the nearest binding of `name`, or define it here if none exists
    pub fn assign(&mut self, id: ScopeId, name: &str, value: Value) -> Result<(), EvaluatorError> {
        let owner = self.resolve(id, name)?.unwrap_or(id);
        let scope = self.get_mut(owner)?;
        if scope.constants.contains(name) {
            return Err(EvaluatorError::ConstantReassignment {
                name: name.to_string(),
            });
        }
        scope.variables.insert(name.to_string(), value);
        Ok(())
    }

    /// Effective region, inherited from the nearest ancestor that sets one
    pub fn region(&self, id: ScopeId) -> Result<Region, EvaluatorError> {
        let mut next = Some(id);
        while let Some(current) = next {
            let scope = self.get(current)?;
            if let Some(region) = scope.region {
                return Ok(region);
            }
            next = scope.parent;
        }
        Ok(Region::infinite())
    }

    pub fn register_subscope(&mut self, id: ScopeId, name: &str, subscope: ScopeId) -> Result<(), EvaluatorError> {
        self.get_mut(id)?
            .subscopes
            .insert(name.to_string(), subscope);
        Ok(())
    }

    /// Find a named subscope registered here or in an ancestor
    pub fn subscope(&self, id: ScopeId, name: &str) -> Result<Option<ScopeId>, EvaluatorError> {
        let mut next = Some(id);
        while let Some(current) = next {
            let scope = self.get(current)?;
            if let Some(found) = scope.subscopes.get(name) {
                return Ok(Some(*found));
            }
            next = scope.parent;
        }
        Ok(None)
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}
