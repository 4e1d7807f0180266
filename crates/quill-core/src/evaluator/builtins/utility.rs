//! General-purpose built-ins: output, collections, conversion, math

use rand::Rng;

use super::{expect_args, expect_args_between, int_arg, numbers_from};
use crate::evaluator::{errors::EvaluatorError, value::Value, Evaluator};

/// `range` may produce this many times `max_loop_iterations` elements
const RANGE_LIMIT_FACTOR: usize = 10;

impl Evaluator {
    /// log(value) - Append `[LOG] value` to the run log
    pub(super) fn builtin_log(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("log", args, 1)?;
        self.sim.log(format!("[LOG] {}", args[0]));
        Ok(Value::Boolean(true))
    }

    /// len(value) - Size of a list, string or map
    pub(super) fn builtin_len(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("len", args, 1)?;
        let len = match &args[0] {
            Value::List(items) => items.read().len(),
            Value::String(s) => s.chars().count(),
            Value::Map(entries) => entries.read().len(),
            other => {
                return Err(EvaluatorError::invalid_argument(
                    "len",
                    "list, string, or map",
                    other.type_name(),
                ))
            }
        };
        Ok(Value::Number(len as f64))
    }

    /// append(list, value) - Push onto a list in place
    pub(super) fn builtin_append(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("append", args, 2)?;
        let Value::List(items) = &args[0] else {
            return Err(EvaluatorError::invalid_argument(
                "append",
                "list as first argument",
                args[0].type_name(),
            ));
        };
        items.write().push(args[1].clone());
        Ok(Value::Boolean(true))
    }

    /// remove(list, index) - Remove the element at `index`
    pub(super) fn builtin_remove(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("remove", args, 2)?;
        let Value::List(items) = &args[0] else {
            return Err(EvaluatorError::invalid_argument(
                "remove",
                "list as first argument",
                args[0].type_name(),
            ));
        };
        let Value::Number(index) = &args[1] else {
            return Err(EvaluatorError::invalid_argument(
                "remove",
                "number as second argument",
                args[1].type_name(),
            ));
        };

        let mut items = items.write();
        let index = *index as i64;
        if index < 0 || index as usize >= items.len() {
            return Err(EvaluatorError::IndexOutOfBounds {
                index,
                len: items.len(),
            });
        }
        items.remove(index as usize);
        Ok(Value::Boolean(true))
    }

    /// contains(list, value) or contains(string, substring)
    pub(super) fn builtin_contains(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("contains", args, 2)?;
        let found = match &args[0] {
            Value::List(items) => items.read().iter().any(|item| item == &args[1]),
            Value::String(s) => s.contains(args[1].to_string().as_str()),
            other => {
                return Err(EvaluatorError::invalid_argument(
                    "contains",
                    "list or string",
                    other.type_name(),
                ))
            }
        };
        Ok(Value::Boolean(found))
    }

    /// split(string, delimiter) - Literal split; trailing empty pieces are dropped
    pub(super) fn builtin_split(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("split", args, 2)?;
        let parts = split_literal(args[0].as_str()?, args[1].as_str()?);
        Ok(Value::list(parts.into_iter().map(Value::String).collect()))
    }

    /// join(list, delimiter) - Concatenate display forms
    pub(super) fn builtin_join(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("join", args, 2)?;
        let delimiter = args[1].as_str()?;
        let joined = args[0]
            .as_list()?
            .read()
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(delimiter);
        Ok(Value::String(joined))
    }

    pub(super) fn builtin_to_string(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("to_string", args, 1)?;
        Ok(Value::String(args[0].to_string()))
    }

    pub(super) fn builtin_to_number(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("to_number", args, 1)?;
        match &args[0] {
            Value::Number(n) => Ok(Value::Number(*n)),
            Value::String(s) => s.trim().parse::<f64>().map(Value::Number).map_err(|_| {
                EvaluatorError::runtime(format!("Cannot convert string '{s}' to number"))
            }),
            Value::Boolean(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
            other => Err(EvaluatorError::runtime(format!(
                "Cannot convert {} to number",
                other.type_name()
            ))),
        }
    }

    pub(super) fn builtin_to_boolean(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("to_boolean", args, 1)?;
        Ok(Value::Boolean(args[0].is_truthy()))
    }

    pub(super) fn builtin_type_of(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("type_of", args, 1)?;
        Ok(Value::string(args[0].type_name()))
    }

    /// range(start, end) - Integers from start toward end, end excluded
    pub(super) fn builtin_range(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("range", args, 2)?;
        let start = int_arg(&args[0])?;
        let end = int_arg(&args[1])?;
        let limit = self.config.max_loop_iterations.saturating_mul(RANGE_LIMIT_FACTOR);
        let size = start.abs_diff(end);
        if size > limit as u64 {
            return Err(EvaluatorError::runtime(format!(
                "range() would produce {size} elements, the limit is {limit}"
            )));
        }
        let values: Vec<Value> = if start <= end {
            (start..end).map(|i| Value::Number(i as f64)).collect()
        } else {
            ((end + 1)..=start).rev().map(|i| Value::Number(i as f64)).collect()
        };
        Ok(Value::list(values))
    }

    /// random(max) or random(min, max) - Uniform float in [min, max)
    pub(super) fn builtin_random(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args_between("random", args, 1, 2)?;
        let (min, max) = match args {
            [max] => (0.0, max.as_number()?),
            [min, max] => (min.as_number()?, max.as_number()?),
            _ => (0.0, 0.0),
        };
        let unit: f64 = self.rng.gen();
        Ok(Value::Number(unit * (max - min) + min))
    }

    /// round(n) - Half-up rounding
    pub(super) fn builtin_round(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("round", args, 1)?;
        Ok(Value::Number((args[0].as_number()? + 0.5).floor()))
    }

    pub(super) fn builtin_floor(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("floor", args, 1)?;
        Ok(Value::Number(args[0].as_number()?.floor()))
    }

    pub(super) fn builtin_ceil(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("ceil", args, 1)?;
        Ok(Value::Number(args[0].as_number()?.ceil()))
    }

    pub(super) fn builtin_abs(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("abs", args, 1)?;
        Ok(Value::Number(args[0].as_number()?.abs()))
    }

    pub(super) fn builtin_sqrt(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("sqrt", args, 1)?;
        Ok(Value::Number(args[0].as_number()?.sqrt()))
    }

    pub(super) fn builtin_pow(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("pow", args, 2)?;
        Ok(Value::Number(args[0].as_number()?.powf(args[1].as_number()?)))
    }

    /// random_choice(list) - Uniformly chosen element
    pub(super) fn builtin_random_choice(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("random_choice", args, 1)?;
        let items = args[0].as_list()?.read();
        if items.is_empty() {
            return Err(EvaluatorError::runtime(
                "random_choice() requires non-empty list",
            ));
        }
        let index = self.rng.gen_range(0..items.len());
        Ok(items[index].clone())
    }

    /// min(a, b, ...) or min(list)
    pub(super) fn builtin_min(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        let numbers = non_empty_numbers("min", args)?;
        Ok(Value::Number(numbers.into_iter().fold(f64::INFINITY, f64::min)))
    }

    /// max(a, b, ...) or max(list)
    pub(super) fn builtin_max(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        let numbers = non_empty_numbers("max", args)?;
        Ok(Value::Number(numbers.into_iter().fold(f64::NEG_INFINITY, f64::max)))
    }

    /// sum(a, b, ...) or sum(list); an empty list sums to 0
    pub(super) fn builtin_sum(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        if args.is_empty() {
            return Err(EvaluatorError::argument_count("sum", "at least 1", 0));
        }
        Ok(Value::Number(numbers_from(args)?.into_iter().sum()))
    }

    /// avg(a, b, ...) or avg(list)
    pub(super) fn builtin_avg(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        let numbers = non_empty_numbers("avg", args)?;
        let total: f64 = numbers.iter().sum();
        Ok(Value::Number(total / numbers.len() as f64))
    }

    /// get_player(name) - Handle for an online player
    pub(super) fn builtin_get_player(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_player", args, 1)?;
        let player = self.sim.player(args[0].as_str()?)?;
        Ok(Value::Player(player))
    }

    /// get_online_players() - Every spawned player in spawn order
    pub(super) fn builtin_get_online_players(&mut self, args: &[Value]) -> Result<Value, EvaluatorError> {
        expect_args("get_online_players", args, 0)?;
        let players = self.sim.players().cloned().map(Value::Player).collect();
        Ok(Value::list(players))
    }
}

fn non_empty_numbers(function: &str, args: &[Value]) -> Result<Vec<f64>, EvaluatorError> {
    if args.is_empty() {
        return Err(EvaluatorError::argument_count(function, "at least 1", 0));
    }
    let numbers = numbers_from(args)?;
    if numbers.is_empty() {
        return Err(EvaluatorError::runtime(format!(
            "{function}() requires non-empty list"
        )));
    }
    Ok(numbers)
}

/// Split on a literal delimiter
///
/// An empty delimiter splits into characters. Trailing empty pieces are
/// removed unless the input itself is empty.
fn split_literal(s: &str, delimiter: &str) -> Vec<String> {
    if s.is_empty() {
        return vec![String::new()];
    }
    let mut parts: Vec<String> = if delimiter.is_empty() {
        s.chars().map(String::from).collect()
    } else {
        s.split(delimiter).map(str::to_string).collect()
    };
    while parts.last().is_some_and(String::is_empty) {
        parts.pop();
    }
    parts
}
