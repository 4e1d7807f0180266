//! Player built-ins
//!
//! Every function takes a player handle first and logs a trace line for each
//! mutation.

use indexmap::IndexMap;

use super::{amount_arg, expect_args, expect_args_between, int_arg, player_arg};
use crate::{
    evaluator::{
        errors::EvaluatorError,
        value::{format_number, Value},
        Evaluator,
    },
    simulation::{mocks::MAX_HUNGER, GameMode, Location},
};

impl Evaluator {
    /// teleport(player, x, y, z) or teleport(player, {x, y, z})
    pub(super) fn builtin_teleport(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        if args.len() != 2 && args.len() != 4 {
            return Err(EvaluatorError::argument_count("teleport", "2 or 4", args.len()));
        }
        let player = player_arg("teleport", args)?;
        let target = match args {
            [_, Value::Map(entries)] => {
                let entries = entries.read();
                let coordinate = |axis: &str| match entries.get(axis) {
                    Some(Value::Number(n)) => Ok(*n),
                    _ => Err(EvaluatorError::invalid_argument(
                        "teleport",
                        "a location map with numeric x, y and z",
                        "map",
                    )),
                };
                Location::new(coordinate("x")?, coordinate("y")?, coordinate("z")?)
            }
            [_, other] => {
                return Err(EvaluatorError::invalid_argument(
                    "teleport",
                    "location map as second argument",
                    other.type_name(),
                ))
            }
            [_, x, y, z] => Location::new(x.as_number()?, y.as_number()?, z.as_number()?),
            _ => return Err(EvaluatorError::argument_count("teleport", "2 or 4", args.len())),
        };

        let name = {
            let mut player = player.write();
            player.location = target;
            player.name.clone()
        };
        self.sim.log(format!(
            "[TELEPORT] {name} teleported to ({}, {}, {})",
            format_number(target.x),
            format_number(target.y),
            format_number(target.z)
        ));
        Ok(Value::Boolean(true))
    }

    /// give(player, item, [amount]) - Add items to the inventory
    pub(super) fn builtin_give(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args_between("give", args, 2, 3)?;
        let player = player_arg("give", args)?;
        let item = args[1].as_str()?;
        let amount = amount_arg("give", args.get(2))?;

        let name = {
            let mut player = player.write();
            player.give_item(item, amount)?;
            player.name.clone()
        };
        self.sim.log(format!("[GIVE] {name} received {amount}x {item}"));
        Ok(Value::Boolean(true))
    }

    /// remove_item(player, item, [amount]) - Fails rather than going negative
    pub(super) fn builtin_remove_item(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args_between("remove_item", args, 2, 3)?;
        let player = player_arg("remove_item", args)?;
        let item = args[1].as_str()?;
        let amount = amount_arg("remove_item", args.get(2))?;

        let name = {
            let mut player = player.write();
            player.remove_item(item, amount)?;
            player.name.clone()
        };
        self.sim
            .log(format!("[REMOVE_ITEM] {name} lost {amount}x {item}"));
        Ok(Value::Number(f64::from(amount)))
    }

    /// set_health(player, health) - Health must be within [0, 20]
    pub(super) fn builtin_set_health(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("set_health", args, 2)?;
        let player = player_arg("set_health", args)?;
        let health = args[1].as_number()?;
        let max_health = player.read().max_health;
        if !(0.0..=max_health).contains(&health) {
            return Err(EvaluatorError::invalid_argument(
                "set_health",
                format!("health between 0 and {}", format_number(max_health)),
                format_number(health),
            ));
        }

        let name = {
            let mut player = player.write();
            player.set_health(health);
            player.name.clone()
        };
        self.sim.log(format!(
            "[HEALTH] {name} health set to {}",
            format_number(health)
        ));
        Ok(Value::Boolean(true))
    }

    /// set_hunger(player, hunger) - Hunger must be within [0, 20]
    pub(super) fn builtin_set_hunger(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("set_hunger", args, 2)?;
        let player = player_arg("set_hunger", args)?;
        let hunger = int_arg(&args[1])?;
        if !(0..=MAX_HUNGER).contains(&hunger) {
            return Err(EvaluatorError::invalid_argument(
                "set_hunger",
                format!("hunger between 0 and {MAX_HUNGER}"),
                hunger.to_string(),
            ));
        }

        let name = {
            let mut player = player.write();
            player.set_hunger(hunger);
            player.name.clone()
        };
        self.sim
            .log(format!("[HUNGER] {name} hunger set to {hunger}"));
        Ok(Value::Boolean(true))
    }

    /// set_gamemode(player, mode) - One of adventure, creative, spectator, survival
    pub(super) fn builtin_set_gamemode(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("set_gamemode", args, 2)?;
        let player = player_arg("set_gamemode", args)?;
        let requested = args[1].as_str()?.to_lowercase();
        let gamemode: GameMode = requested.parse().map_err(|()| {
            EvaluatorError::invalid_argument(
                "set_gamemode",
                "one of [adventure, creative, spectator, survival]",
                requested.as_str(),
            )
        })?;

        let name = {
            let mut player = player.write();
            player.gamemode = gamemode;
            player.name.clone()
        };
        self.sim
            .log(format!("[GAMEMODE] {name} gamemode set to {gamemode}"));
        Ok(Value::Boolean(true))
    }

    /// heal(player) - Restore full health
    pub(super) fn builtin_heal(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("heal", args, 1)?;
        let player = player_arg("heal", args)?;
        let name = {
            let mut player = player.write();
            let max_health = player.max_health;
            player.set_health(max_health);
            player.name.clone()
        };
        self.sim.log(format!("[HEAL] {name} healed to full health"));
        Ok(Value::Boolean(true))
    }

    /// kill(player) - Set health to zero
    pub(super) fn builtin_kill(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("kill", args, 1)?;
        let player = player_arg("kill", args)?;
        let name = {
            let mut player = player.write();
            player.set_health(0.0);
            player.name.clone()
        };
        self.sim.log(format!("[KILL] {name} was killed"));
        Ok(Value::Boolean(true))
    }

    /// sendmessage(player, message) - Deliver a chat message
    pub(super) fn builtin_sendmessage(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("sendmessage", args, 2)?;
        let player = player_arg("sendmessage", args)?;
        let message = args[1].to_string();
        self.sim.send_message(&player, &message);
        Ok(Value::Boolean(true))
    }

    pub(super) fn builtin_get_health(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_health", args, 1)?;
        let player = player_arg("get_health", args)?;
        let health = player.read().health;
        Ok(Value::Number(health))
    }

    pub(super) fn builtin_get_hunger(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_hunger", args, 1)?;
        let player = player_arg("get_hunger", args)?;
        let hunger = player.read().hunger;
        Ok(Value::Number(hunger as f64))
    }

    pub(super) fn builtin_get_name(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_name", args, 1)?;
        let player = player_arg("get_name", args)?;
        let name = player.read().name.clone();
        Ok(Value::String(name))
    }

    /// get_location(player) - Map with x, y and z
    pub(super) fn builtin_get_location(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_location", args, 1)?;
        let player = player_arg("get_location", args)?;
        let location = player.read().location;
        let mut map = IndexMap::new();
        map.insert("x".to_string(), Value::Number(location.x));
        map.insert("y".to_string(), Value::Number(location.y));
        map.insert("z".to_string(), Value::Number(location.z));
        Ok(Value::map(map))
    }

    pub(super) fn builtin_get_gamemode(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_gamemode", args, 1)?;
        let player = player_arg("get_gamemode", args)?;
        let gamemode = player.read().gamemode;
        Ok(Value::String(gamemode.to_string()))
    }

    pub(super) fn builtin_set_flying(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("set_flying", args, 2)?;
        let player = player_arg("set_flying", args)?;
        let flying = args[1].as_bool()?;
        let name = {
            let mut player = player.write();
            player.flying = flying;
            player.name.clone()
        };
        self.sim
            .log(format!("[FLYING] {name} flying set to {flying}"));
        Ok(Value::Boolean(true))
    }

    /// damage(player, amount) - Health never drops below zero
    pub(super) fn builtin_damage(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("damage", args, 2)?;
        let player = player_arg("damage", args)?;
        let amount = args[1].as_number()?;
        let name = {
            let mut player = player.write();
            player.damage(amount);
            player.name.clone()
        };
        self.sim.log(format!(
            "[DAMAGE] {name} took {} damage",
            format_number(amount)
        ));
        Ok(Value::Boolean(true))
    }
}
