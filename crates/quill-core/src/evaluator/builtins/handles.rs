//! Built-ins over the remaining handle types: events, items, inventories,
//! regions, entities, plus the global state map

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{amount_arg, expect_args, expect_args_between};
use crate::{
    evaluator::{errors::EvaluatorError, scope::Region, value::Value, Evaluator},
    simulation::{MockInventory, MockItemStack},
};

impl Evaluator {
    /// Region of a region value or of a scope value
    fn region_arg(&self, function: &str, value: &Value) -> Result<Region, EvaluatorError> {
        match value {
            Value::Region(region) => Ok(*region),
            Value::Scope(scope) => self.scopes.region(scope.id),
            other => Err(EvaluatorError::invalid_argument(
                function,
                "region or scope",
                other.type_name(),
            )),
        }
    }

    /// queue_event(name, [context]) - Enqueue for the post-run drain
    pub(super) fn builtin_queue_event(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args_between("queue_event", args, 1, 2)?;
        let name = args[0].as_str()?;
        let context: IndexMap<String, Value> = match args.get(1) {
            Some(value) => value.as_map()?.read().clone(),
            None => IndexMap::new(),
        };
        Ok(Value::Event(self.sim.queue_event(name, context)))
    }

    /// cancel_event(event) - Mark an event cancelled
    pub(super) fn builtin_cancel_event(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("cancel_event", args, 1)?;
        let event = args[0].as_event()?;
        let name = {
            let mut event = event.write();
            event.cancelled = true;
            event.name.clone()
        };
        self.sim.log(format!("[CANCEL] Event cancelled: {name}"));
        Ok(Value::Boolean(true))
    }

    pub(super) fn builtin_is_cancelled(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("is_cancelled", args, 1)?;
        let cancelled = args[0].as_event()?.read().cancelled;
        Ok(Value::Boolean(cancelled))
    }

    /// create_item(type, [amount]) - A free-standing item stack
    pub(super) fn builtin_create_item(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args_between("create_item", args, 1, 2)?;
        let item_type = args[0].as_str()?;
        let amount = amount_arg("create_item", args.get(1))?;
        let item = MockItemStack::new(item_type, amount);
        Ok(Value::Item(Arc::new(RwLock::new(item))))
    }

    /// create_inventory(name, [large]) - 27 slots, or 54 when large
    pub(super) fn builtin_create_inventory(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args_between("create_inventory", args, 1, 2)?;
        let name = args[0].as_str()?;
        let large = match args.get(1) {
            Some(value) => value.as_bool()?,
            None => false,
        };
        let inventory = MockInventory::new(name, large);
        self.sim.log(format!(
            "[INVENTORY] Created inventory '{name}' with {} slots",
            inventory.slots.len()
        ));
        Ok(Value::Inventory(Arc::new(RwLock::new(inventory))))
    }

    /// inventory_add(inventory, item) - Slot index used, or null when full
    pub(super) fn builtin_inventory_add(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("inventory_add", args, 2)?;
        let inventory = args[0].as_inventory()?;
        let item = args[1].as_item()?.read().clone();
        let slot = inventory.write().add_item(item);
        Ok(slot.map_or(Value::Null, |slot| Value::Number(slot as f64)))
    }

    /// inventory_get(inventory, slot) - Copy of the stack in a slot
    pub(super) fn builtin_inventory_get(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("inventory_get", args, 2)?;
        let index = args[1].as_number()? as i64;
        let inventory = args[0].as_inventory()?.read();
        let stack = match usize::try_from(index) {
            Ok(slot) => inventory.slot(slot)?.clone(),
            Err(_) => {
                return Err(EvaluatorError::runtime(format!(
                    "Invalid index {index} in {}",
                    inventory.name
                )))
            }
        };
        Ok(Value::Item(Arc::new(RwLock::new(stack))))
    }

    /// get_region(scope) - Effective region, inherited from enclosing scopes
    pub(super) fn builtin_get_region(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_region", args, 1)?;
        let scope = args[0].as_scope()?;
        Ok(Value::Region(self.scopes.region(scope.id)?))
    }

    /// region_contains(region, x, y, z)
    pub(super) fn builtin_region_contains(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("region_contains", args, 4)?;
        let region = self.region_arg("region_contains", &args[0])?;
        let (x, y, z) = (
            args[1].as_number()?,
            args[2].as_number()?,
            args[3].as_number()?,
        );
        Ok(Value::Boolean(region.contains(x, y, z)))
    }

    /// region_overlaps(a, b)
    pub(super) fn builtin_region_overlaps(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("region_overlaps", args, 2)?;
        let a = self.region_arg("region_overlaps", &args[0])?;
        let b = self.region_arg("region_overlaps", &args[1])?;
        Ok(Value::Boolean(a.overlaps(&b)))
    }

    /// set_state(key, value) - Store a value in the run-wide state map
    pub(super) fn builtin_set_state(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("set_state", args, 2)?;
        let key = args[0].as_str()?;
        self.sim.set_state(key, args[1].clone());
        Ok(Value::Boolean(true))
    }

    /// get_state(key) - Stored value, or null
    pub(super) fn builtin_get_state(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_state", args, 1)?;
        let key = args[0].as_str()?;
        Ok(self.sim.state(key).cloned().unwrap_or(Value::Null))
    }

    pub(super) fn builtin_get_entity_health(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_entity_health", args, 1)?;
        let health = args[0].as_entity()?.read().health;
        Ok(Value::Number(health))
    }
}
