//! World built-ins; block, time and weather functions act on the default world

use std::sync::Arc;

use parking_lot::RwLock;

use super::{expect_args, expect_args_between, int_arg};
use crate::{
    evaluator::{
        errors::EvaluatorError,
        value::{format_number, Value},
        Evaluator,
    },
    simulation::{
        mocks::{block_pos, DAY_LENGTH},
        Location, MockEntity, Weather, DEFAULT_WORLD,
    },
};

/// Three numeric arguments starting at `start`
fn coordinates(args: &[Value], start: usize) -> Result<(f64, f64, f64), EvaluatorError> {
    Ok((
        args[start].as_number()?,
        args[start + 1].as_number()?,
        args[start + 2].as_number()?,
    ))
}

fn format_point(x: f64, y: f64, z: f64) -> String {
    format!(
        "({}, {}, {})",
        format_number(x),
        format_number(y),
        format_number(z)
    )
}

impl Evaluator {
    /// set_block(x, y, z, type)
    pub(super) fn builtin_set_block(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("set_block", args, 4)?;
        let (x, y, z) = coordinates(args, 0)?;
        let block = args[3].as_str()?;
        self.sim
            .default_world()?
            .write()
            .set_block(block_pos(x, y, z), block);
        self.sim.log(format!(
            "[BLOCK] Set block at {} to {block}",
            format_point(x, y, z)
        ));
        Ok(Value::Boolean(true))
    }

    /// get_block(x, y, z) - Block type, "air" where nothing was placed
    pub(super) fn builtin_get_block(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_block", args, 3)?;
        let (x, y, z) = coordinates(args, 0)?;
        let world = self.sim.default_world()?;
        let block = world.read().block(block_pos(x, y, z)).to_string();
        Ok(Value::String(block))
    }

    /// break_block(x, y, z) - Replace the block with air
    pub(super) fn builtin_break_block(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("break_block", args, 3)?;
        let (x, y, z) = coordinates(args, 0)?;
        self.sim
            .default_world()?
            .write()
            .set_block(block_pos(x, y, z), "air");
        self.sim
            .log(format!("[BREAK] Broke block at {}", format_point(x, y, z)));
        Ok(Value::Boolean(true))
    }

    /// set_time(ticks) - Ticks must be within [0, 24000]
    pub(super) fn builtin_set_time(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("set_time", args, 1)?;
        let time = int_arg(&args[0])?;
        if !(0..=DAY_LENGTH).contains(&time) {
            return Err(EvaluatorError::invalid_argument(
                "set_time",
                format!("time between 0 and {DAY_LENGTH}"),
                time.to_string(),
            ));
        }
        self.sim.default_world()?.write().set_time(time);
        self.sim.log(format!("[TIME] World time set to {time}"));
        Ok(Value::Boolean(true))
    }

    pub(super) fn builtin_get_time(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_time", args, 0)?;
        let time = self.sim.default_world()?.read().time;
        Ok(Value::Number(time as f64))
    }

    /// set_weather(kind) - One of clear, rain, thunder
    pub(super) fn builtin_set_weather(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("set_weather", args, 1)?;
        let requested = args[0].as_str()?.to_lowercase();
        let weather: Weather = requested.parse().map_err(|()| {
            EvaluatorError::invalid_argument(
                "set_weather",
                "one of [clear, rain, thunder]",
                requested.as_str(),
            )
        })?;
        self.sim.default_world()?.write().weather = weather;
        self.sim.log(format!("[WEATHER] Weather set to {weather}"));
        Ok(Value::Boolean(true))
    }

    pub(super) fn builtin_get_weather(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_weather", args, 0)?;
        let weather = self.sim.default_world()?.read().weather;
        Ok(Value::String(weather.to_string()))
    }

    /// broadcast(message) - Log once and deliver to every online player
    pub(super) fn builtin_broadcast(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("broadcast", args, 1)?;
        let message = args[0].to_string();
        self.sim.log(format!("[BROADCAST] {message}"));
        let players: Vec<_> = self.sim.players().cloned().collect();
        for player in &players {
            self.sim.send_message(player, &message);
        }
        Ok(Value::Boolean(true))
    }

    /// create_world(name) - Fails if the name is taken
    pub(super) fn builtin_create_world(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("create_world", args, 1)?;
        let world = self.sim.create_world(args[0].as_str()?)?;
        Ok(Value::World(world))
    }

    /// get_world([name]) - Defaults to the "world" world
    pub(super) fn builtin_get_world(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args_between("get_world", args, 0, 1)?;
        let name = match args.first() {
            Some(name) => name.as_str()?,
            None => DEFAULT_WORLD,
        };
        Ok(Value::World(self.sim.world(name)?))
    }

    /// spawn_entity(type, x, y, z) - Entity handle recorded in the default world
    pub(super) fn builtin_spawn_entity(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("spawn_entity", args, 4)?;
        let entity_type = args[0].as_str()?;
        let (x, y, z) = coordinates(args, 1)?;
        let entity = Arc::new(RwLock::new(MockEntity::new(
            entity_type,
            Location::new(x, y, z),
        )));
        self.sim
            .default_world()?
            .write()
            .entities
            .push(entity.clone());
        self.sim.log(format!(
            "[ENTITY] Spawned {entity_type} at {}",
            format_point(x, y, z)
        ));
        Ok(Value::Entity(entity))
    }

    /// distance(a, b) - Euclidean distance between two players
    pub(super) fn builtin_distance(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("distance", args, 2)?;
        let (Value::Player(a), Value::Player(b)) = (&args[0], &args[1]) else {
            return Err(EvaluatorError::runtime("distance() expects two players"));
        };
        let from = a.read().location;
        let to = b.read().location;
        Ok(Value::Number(from.distance(&to)))
    }
}
