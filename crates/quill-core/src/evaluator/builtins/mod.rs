//! Built-in function library
//!
//! Each built-in is an `Evaluator` method with the [`BuiltinFn`] signature.
//! Arguments arrive already evaluated; every function validates its argument
//! count and types before touching simulation state.

use std::collections::HashMap;

use super::{errors::EvaluatorError, value::Value, Evaluator};
use crate::simulation::PlayerRef;

mod handles;
mod player;
mod utility;
mod world;

/// Signature shared by every built-in
pub type BuiltinFn = fn(&mut Evaluator, &[Value]) -> Result<Value, EvaluatorError>;

/// Build the name to function table consulted before user functions
pub fn registry() -> HashMap<&'static str, BuiltinFn> {
    let mut table: HashMap<&'static str, BuiltinFn> = HashMap::new();
    // utility
    table.insert("log", Evaluator::builtin_log);
    table.insert("len", Evaluator::builtin_len);
    table.insert("append", Evaluator::builtin_append);
    table.insert("remove", Evaluator::builtin_remove);
    table.insert("contains", Evaluator::builtin_contains);
    table.insert("split", Evaluator::builtin_split);
    table.insert("join", Evaluator::builtin_join);
    table.insert("to_string", Evaluator::builtin_to_string);
    table.insert("to_number", Evaluator::builtin_to_number);
    table.insert("to_boolean", Evaluator::builtin_to_boolean);
    table.insert("type_of", Evaluator::builtin_type_of);
    table.insert("range", Evaluator::builtin_range);
    table.insert("random", Evaluator::builtin_random);
    table.insert("round", Evaluator::builtin_round);
    table.insert("floor", Evaluator::builtin_floor);
    table.insert("ceil", Evaluator::builtin_ceil);
    table.insert("abs", Evaluator::builtin_abs);
    table.insert("sqrt", Evaluator::builtin_sqrt);
    table.insert("pow", Evaluator::builtin_pow);
    table.insert("random_choice", Evaluator::builtin_random_choice);
    table.insert("min", Evaluator::builtin_min);
    table.insert("max", Evaluator::builtin_max);
    table.insert("sum", Evaluator::builtin_sum);
    table.insert("avg", Evaluator::builtin_avg);
    table.insert("get_player", Evaluator::builtin_get_player);
    table.insert("get_online_players", Evaluator::builtin_get_online_players);
    // player
    table.insert("teleport", Evaluator::builtin_teleport);
    table.insert("give", Evaluator::builtin_give);
    table.insert("remove_item", Evaluator::builtin_remove_item);
    table.insert("set_health", Evaluator::builtin_set_health);
    table.insert("set_hunger", Evaluator::builtin_set_hunger);
    table.insert("set_gamemode", Evaluator::builtin_set_gamemode);
    table.insert("heal", Evaluator::builtin_heal);
    table.insert("kill", Evaluator::builtin_kill);
    table.insert("sendmessage", Evaluator::builtin_sendmessage);
    table.insert("get_health", Evaluator::builtin_get_health);
    table.insert("get_hunger", Evaluator::builtin_get_hunger);
    table.insert("get_name", Evaluator::builtin_get_name);
    table.insert("get_location", Evaluator::builtin_get_location);
    table.insert("get_gamemode", Evaluator::builtin_get_gamemode);
    table.insert("set_flying", Evaluator::builtin_set_flying);
    table.insert("damage", Evaluator::builtin_damage);
    // world
    table.insert("set_block", Evaluator::builtin_set_block);
    table.insert("get_block", Evaluator::builtin_get_block);
    table.insert("break_block", Evaluator::builtin_break_block);
    table.insert("set_time", Evaluator::builtin_set_time);
    table.insert("get_time", Evaluator::builtin_get_time);
    table.insert("set_weather", Evaluator::builtin_set_weather);
    table.insert("get_weather", Evaluator::builtin_get_weather);
    table.insert("broadcast", Evaluator::builtin_broadcast);
    table.insert("create_world", Evaluator::builtin_create_world);
    table.insert("get_world", Evaluator::builtin_get_world);
    table.insert("spawn_entity", Evaluator::builtin_spawn_entity);
    table.insert("distance", Evaluator::builtin_distance);
    // events, items, inventories, regions, state
    table.insert("queue_event", Evaluator::builtin_queue_event);
    table.insert("cancel_event", Evaluator::builtin_cancel_event);
    table.insert("is_cancelled", Evaluator::builtin_is_cancelled);
    table.insert("create_item", Evaluator::builtin_create_item);
    table.insert("create_inventory", Evaluator::builtin_create_inventory);
    table.insert("inventory_add", Evaluator::builtin_inventory_add);
    table.insert("inventory_get", Evaluator::builtin_inventory_get);
    table.insert("get_region", Evaluator::builtin_get_region);
    table.insert("region_contains", Evaluator::builtin_region_contains);
    table.insert("region_overlaps", Evaluator::builtin_region_overlaps);
    table.insert("set_state", Evaluator::builtin_set_state);
    table.insert("get_state", Evaluator::builtin_get_state);
    table.insert("get_entity_health", Evaluator::builtin_get_entity_health);
    table
}

/// Require exactly `expected` arguments
fn expect_args(function: &str, args: &[Value], expected: usize) -> Result<(), EvaluatorError> {
    if args.len() != expected {
        return Err(EvaluatorError::argument_count(
            function,
            &expected.to_string(),
            args.len(),
        ));
    }
    Ok(())
}

/// Require between `min` and `max` arguments inclusive
fn expect_args_between(function: &str, args: &[Value], min: usize, max: usize) -> Result<(), EvaluatorError> {
    if args.len() < min || args.len() > max {
        let expected = if max == min + 1 {
            format!("{min} or {max}")
        } else {
            format!("{min} to {max}")
        };
        return Err(EvaluatorError::argument_count(function, &expected, args.len()));
    }
    Ok(())
}

/// The player handle every player built-in takes first
fn player_arg(function: &str, args: &[Value]) -> Result<PlayerRef, EvaluatorError> {
    match args.first() {
        Some(Value::Player(player)) => Ok(player.clone()),
        other => {
            let expected = if args.len() == 1 {
                "player argument"
            } else {
                "player as first argument"
            };
            let actual = other.map_or("nothing", Value::type_name);
            Err(EvaluatorError::invalid_argument(function, expected, actual))
        }
    }
}

/// Whole-number argument, truncated toward zero
fn int_arg(value: &Value) -> Result<i64, EvaluatorError> {
    Ok(value.as_number()? as i64)
}

/// Item amount argument; negative amounts are rejected
fn amount_arg(function: &str, value: Option<&Value>) -> Result<u32, EvaluatorError> {
    let Some(value) = value else {
        return Ok(1);
    };
    let amount = int_arg(value)?;
    u32::try_from(amount)
        .map_err(|_| EvaluatorError::invalid_argument(function, "a non-negative amount", amount.to_string()))
}

/// Numbers from either a variadic argument list or a single list argument
fn numbers_from(args: &[Value]) -> Result<Vec<f64>, EvaluatorError> {
    match args {
        [Value::List(items)] => items.read().iter().map(Value::as_number).collect(),
        _ => args.iter().map(Value::as_number).collect(),
    }
}
