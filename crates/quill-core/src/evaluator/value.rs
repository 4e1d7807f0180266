//! Runtime values
//!
//! Lists and maps are shared, mutable containers: `append(xs, 1)` is visible
//! through every binding of `xs`. Simulation handles point at state owned by
//! the [`SimulationContext`](crate::simulation::SimulationContext).

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{
    errors::EvaluatorError,
    scope::{Region, ScopeId},
};
use crate::{
    ast::Stmt,
    simulation::{EntityRef, EventRef, InventoryRef, ItemRef, PlayerRef, WorldRef},
};

pub type ListRef = Arc<RwLock<Vec<Value>>>;
pub type MapRef = Arc<RwLock<IndexMap<String, Value>>>;

/// A user-defined function and the scope it closes over
#[derive(Debug)]
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Arc<[Stmt]>,
    pub closure: ScopeId,
}

/// A reference to a scope in the evaluator's arena
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeRef {
    pub id: ScopeId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    List(ListRef),
    Map(MapRef),
    Function(Arc<FunctionValue>),
    Player(PlayerRef),
    World(WorldRef),
    Region(Region),
    Scope(ScopeRef),
    Inventory(InventoryRef),
    Entity(EntityRef),
    Item(ItemRef),
    Event(EventRef),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items)))
    }

    pub fn map(entries: IndexMap<String, Value>) -> Self {
        Value::Map(Arc::new(RwLock::new(entries)))
    }

    /// Get the type name as reported by `type_of`
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
            Value::Player(_) => "player",
            Value::World(_) => "world",
            Value::Region(_) => "region",
            Value::Scope(_) => "scope",
            Value::Inventory(_) => "inventory",
            Value::Entity(_) => "entity",
            Value::Item(_) => "item",
            Value::Event(_) => "event",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.read().is_empty(),
            _ => true,
        }
    }

    fn mismatch(&self, expected: &str) -> EvaluatorError {
        EvaluatorError::type_mismatch(expected, self.type_name())
    }

    pub fn as_number(&self) -> Result<f64, EvaluatorError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(other.mismatch("number")),
        }
    }

    pub fn as_str(&self) -> Result<&str, EvaluatorError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, EvaluatorError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn as_list(&self) -> Result<&ListRef, EvaluatorError> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn as_map(&self) -> Result<&MapRef, EvaluatorError> {
        match self {
            Value::Map(entries) => Ok(entries),
            other => Err(other.mismatch("map")),
        }
    }

    pub fn as_player(&self) -> Result<&PlayerRef, EvaluatorError> {
        match self {
            Value::Player(player) => Ok(player),
            other => Err(other.mismatch("player")),
        }
    }

    pub fn as_world(&self) -> Result<&WorldRef, EvaluatorError> {
        match self {
            Value::World(world) => Ok(world),
            other => Err(other.mismatch("world")),
        }
    }

    pub fn as_region(&self) -> Result<Region, EvaluatorError> {
        match self {
            Value::Region(region) => Ok(*region),
            other => Err(other.mismatch("region")),
        }
    }

    pub fn as_scope(&self) -> Result<&ScopeRef, EvaluatorError> {
        match self {
            Value::Scope(scope) => Ok(scope),
            other => Err(other.mismatch("scope")),
        }
    }

    pub fn as_inventory(&self) -> Result<&InventoryRef, EvaluatorError> {
        match self {
            Value::Inventory(inventory) => Ok(inventory),
            other => Err(other.mismatch("inventory")),
        }
    }

    pub fn as_entity(&self) -> Result<&EntityRef, EvaluatorError> {
        match self {
            Value::Entity(entity) => Ok(entity),
            other => Err(other.mismatch("entity")),
        }
    }

    pub fn as_item(&self) -> Result<&ItemRef, EvaluatorError> {
        match self {
            Value::Item(item) => Ok(item),
            other => Err(other.mismatch("item")),
        }
    }

    pub fn as_event(&self) -> Result<&EventRef, EvaluatorError> {
        match self {
            Value::Event(event) => Ok(event),
            other => Err(other.mismatch("event")),
        }
    }
}

/// Type-aware equality: primitives by value, containers and handles by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Player(a), Value::Player(b)) => Arc::ptr_eq(a, b),
            (Value::World(a), Value::World(b)) => Arc::ptr_eq(a, b),
            (Value::Region(a), Value::Region(b)) => a == b,
            (Value::Scope(a), Value::Scope(b)) => a.id == b.id,
            (Value::Inventory(a), Value::Inventory(b)) => Arc::ptr_eq(a, b),
            (Value::Entity(a), Value::Entity(b)) => Arc::ptr_eq(a, b),
            (Value::Item(a), Value::Item(b)) => Arc::ptr_eq(a, b),
            (Value::Event(a), Value::Event(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Whole numbers print without a fractional part
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(self, f, &mut Vec::new())
    }
}

/// Identity of a shared container, used to spot cycles while printing
fn container_id<T>(container: &Arc<T>) -> usize {
    Arc::as_ptr(container) as *const () as usize
}

/// Display a value; a container already being printed shows as `[...]` or `{...}`
fn write_value(value: &Value, f: &mut fmt::Formatter<'_>, open: &mut Vec<usize>) -> fmt::Result {
    match value {
        Value::Number(n) => f.write_str(&format_number(*n)),
        Value::String(s) => f.write_str(s),
        Value::Boolean(b) => write!(f, "{b}"),
        Value::Null => f.write_str("null"),
        Value::List(items) => {
            let id = container_id(items);
            if open.contains(&id) {
                return f.write_str("[...]");
            }
            open.push(id);
            f.write_str("[")?;
            for (i, item) in items.read().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(item, f, open)?;
            }
            open.pop();
            f.write_str("]")
        }
        Value::Map(entries) => {
            let id = container_id(entries);
            if open.contains(&id) {
                return f.write_str("{...}");
            }
            open.push(id);
            f.write_str("{")?;
            for (i, (key, entry)) in entries.read().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key}: ")?;
                write_value(entry, f, open)?;
            }
            open.pop();
            f.write_str("}")
        }
        Value::Function(func) => write!(f, "Function({})", func.name),
        Value::Player(player) => write!(f, "Player({})", player.read().name),
        Value::World(world) => write!(f, "World({})", world.read().name),
        Value::Region(region) => write!(f, "{region}"),
        Value::Scope(scope) => write!(f, "Scope({})", scope.name),
        Value::Inventory(inventory) => write!(f, "Inventory({})", inventory.read().name),
        Value::Entity(entity) => write!(f, "Entity({})", entity.read().entity_type),
        Value::Item(item) => {
            let item = item.read();
            write!(f, "Item({} x{})", item.item_type, item.amount)
        }
        Value::Event(event) => write!(f, "Event({})", event.read().name),
    }
}
