//! Tree-walking evaluator
//!
//! Statements return a [`ControlFlow`] so `return`, `break` and `continue`
//! unwind explicitly to the call or loop that handles them. Runtime failures
//! travel separately as [`EvaluatorError`].

use std::{collections::HashMap, sync::Arc, time::Instant};

use indexmap::IndexMap;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, warn};

use crate::{
    ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp},
    simulation::SimulationContext,
    QuillConfig,
};

pub mod builtins;
pub mod errors;
pub mod event_system;
pub mod loop_guard;
pub mod scope;
pub mod value;

use builtins::BuiltinFn;
use errors::EvaluatorError;
use event_system::EventSystem;
use loop_guard::LoopGuard;
use scope::{Region, ScopeArena, ScopeId};
use value::{FunctionValue, ScopeRef, Value};


#[cfg(test)]
mod control_flow_tests;



/// Control flow result for handling break/continue/return
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    None(Value),
    Break,
    Continue,
    Return(Value),
}

impl ControlFlow {
    /// Value of a block that completed without unwinding
    pub fn into_value(self) -> Result<Value, EvaluatorError> {
        match self {
            ControlFlow::None(v) => Ok(v),
            ControlFlow::Break => Err(EvaluatorError::StrayControlFlow {
                keyword: "break",
                context: "loop",
            }),
            ControlFlow::Continue => Err(EvaluatorError::StrayControlFlow {
                keyword: "continue",
                context: "loop",
            }),
            ControlFlow::Return(_) => Err(EvaluatorError::StrayControlFlow {
                keyword: "return",
                context: "function",
            }),
        }
    }
}

/// Interpreter state for one script run
///
/// Everything here is owned by the instance: two evaluators never share
/// scopes, handlers, simulation state or random number generators.
pub struct Evaluator {
    scopes: ScopeArena,
    sim: SimulationContext,
    events: EventSystem,
    builtins: HashMap<&'static str, BuiltinFn>,
    config: QuillConfig,
    rng: StdRng,
    call_depth: usize,
    run_started: Instant,
}

impl Evaluator {
    pub fn new(config: QuillConfig) -> Self {
        Self::with_simulation(config, SimulationContext::new())
    }

    /// Create an evaluator over an already-populated simulation
    pub fn with_simulation(config: QuillConfig, sim: SimulationContext) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            scopes: ScopeArena::new(),
            sim,
            events: EventSystem::new(),
            builtins: builtins::registry(),
            config,
            rng,
            call_depth: 0,
            run_started: Instant::now(),
        }
    }

    pub fn config(&self) -> &QuillConfig {
        &self.config
    }

    pub fn simulation(&self) -> &SimulationContext {
        &self.sim
    }

    pub fn simulation_mut(&mut self) -> &mut SimulationContext {
        &mut self.sim
    }

    pub fn scopes(&self) -> &ScopeArena {
        &self.scopes
    }

    pub fn events(&self) -> &EventSystem {
        &self.events
    }

    pub fn global_scope(&self) -> ScopeId {
        self.scopes.global()
    }

    /// Look up a variable in the global scope
    pub fn global(&self, name: &str) -> Result<Value, EvaluatorError> {
        self.scopes.lookup(self.scopes.global(), name)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Sorted names of every built-in function
    pub fn builtin_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.builtins.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Restart the whole-run budget clock
    pub fn start_run(&mut self) {
        self.run_started = Instant::now();
    }

    fn check_budget(&self) -> Result<(), EvaluatorError> {
        match self.config.run_budget_millis {
            Some(millis) if self.run_started.elapsed().as_millis() > u128::from(millis) => {
                warn!(millis, "run budget exhausted");
                Err(EvaluatorError::RunBudgetExceeded { millis })
            }
            _ => Ok(()),
        }
    }

    /// Execute a program in the global scope
    ///
    /// Returns the value of the last expression statement, or `Null`.
    pub fn execute(&mut self, program: &Program) -> Result<Value, EvaluatorError> {
        self.start_run();
        debug!(statements = program.statements.len(), "executing program");
        let global = self.scopes.global();
        self.exec_block(&program.statements, global)?.into_value()
    }

    // === Statements ===

    fn exec_block(&mut self, stmts: &[Stmt], scope: ScopeId) -> Result<ControlFlow, EvaluatorError> {
        let mut last = Value::Null;
        for stmt in stmts {
            match self.exec_stmt(stmt, scope)? {
                ControlFlow::None(value) => last = value,
                flow => return Ok(flow),
            }
        }
        Ok(ControlFlow::None(last))
    }

    fn exec_stmt(&mut self, stmt: &Stmt, scope: ScopeId) -> Result<ControlFlow, EvaluatorError> {
        self.check_budget()?;
        match &stmt.kind {
            StmtKind::Expression(expr) => Ok(ControlFlow::None(self.eval_expr(expr, scope)?)),
            StmtKind::VariableDeclaration {
                name,
                value,
                is_const,
            } => {
                let evaluated = self.eval_expr(value, scope)?;
                if let (ExprKind::ScopeCreation(_), Value::Scope(sub)) = (&value.kind, &evaluated) {
                    self.scopes.register_subscope(scope, name, sub.id)?;
                }
                if *is_const {
                    self.scopes.define_const(scope, name, evaluated)?;
                } else {
                    self.scopes.define(scope, name, evaluated)?;
                }
                Ok(ControlFlow::None(Value::Null))
            }
            StmtKind::FunctionDeclaration { name, params, body } => {
                self.scopes.retain(scope);
                let function = FunctionValue {
                    name: name.clone(),
                    params: params.clone(),
                    body: Arc::clone(body),
                    closure: scope,
                };
                self.scopes
                    .define(scope, name, Value::Function(Arc::new(function)))?;
                Ok(ControlFlow::None(Value::Null))
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, scope)?,
                    None => Value::Null,
                };
                Ok(ControlFlow::Return(value))
            }
            StmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                if self.eval_expr(condition, scope)?.is_truthy() {
                    self.exec_body(then_body, scope)
                } else if let Some(else_body) = else_body {
                    self.exec_body(else_body, scope)
                } else {
                    Ok(ControlFlow::None(Value::Null))
                }
            }
            StmtKind::While { condition, body } => self.exec_while(condition, body, scope),
            StmtKind::For {
                variable,
                iterable,
                body,
            } => self.exec_for(variable, iterable, body, scope),
            StmtKind::Break => Ok(ControlFlow::Break),
            StmtKind::Continue => Ok(ControlFlow::Continue),
            StmtKind::Try {
                try_body,
                error_var,
                catch_body,
            } => self.exec_try(try_body, error_var, catch_body, scope),
            StmtKind::EventHandler { event_name, body } => {
                self.events
                    .register_handler(event_name, Arc::clone(body), stmt.line);
                self.sim
                    .log(format!("[EVENT] Registered handler for event: {event_name}"));
                Ok(ControlFlow::None(Value::Null))
            }
        }
    }

    /// Run a nested statement list, discarding its trailing value
    fn exec_body(&mut self, stmts: &[Stmt], scope: ScopeId) -> Result<ControlFlow, EvaluatorError> {
        match self.exec_block(stmts, scope)? {
            ControlFlow::None(_) => Ok(ControlFlow::None(Value::Null)),
            flow => Ok(flow),
        }
    }

    /// Run a loop body in a fresh iteration scope, releasing it afterwards
    fn exec_iteration(
        &mut self,
        body: &[Stmt],
        scope: ScopeId,
        binding: Option<(&str, Value)>,
        name: &'static str,
    ) -> Result<ControlFlow, EvaluatorError> {
        let iteration = self.scopes.push(scope, name);
        let result = match binding {
            Some((variable, item)) => self
                .scopes
                .define(iteration, variable, item)
                .and_then(|()| self.exec_block(body, iteration)),
            None => self.exec_block(body, iteration),
        };
        self.scopes.release(iteration);
        result
    }

    fn exec_while(&mut self, condition: &Expr, body: &[Stmt], scope: ScopeId) -> Result<ControlFlow, EvaluatorError> {
        let mut guard = LoopGuard::new(self.config.max_loop_iterations, self.config.max_loop_millis);
        while self.eval_expr(condition, scope)?.is_truthy() {
            guard.check()?;
            self.check_budget()?;
            match self.exec_iteration(body, scope, None, "while_iteration")? {
                ControlFlow::Break => break,
                ControlFlow::None(_) | ControlFlow::Continue => {}
                flow @ ControlFlow::Return(_) => return Ok(flow),
            }
        }
        Ok(ControlFlow::None(Value::Null))
    }

    fn exec_for(
        &mut self,
        variable: &str,
        iterable: &Expr,
        body: &[Stmt],
        scope: ScopeId,
    ) -> Result<ControlFlow, EvaluatorError> {
        let items = match self.eval_expr(iterable, scope)? {
            // Iterate a snapshot so the body may mutate the list
            Value::List(items) => items.read().clone(),
            other => {
                return Err(EvaluatorError::runtime(format!(
                    "For loop expects a list, got {}",
                    other.type_name()
                )))
            }
        };

        let mut guard = LoopGuard::new(self.config.max_loop_iterations, self.config.max_loop_millis);
        for item in items {
            guard.check()?;
            self.check_budget()?;
            match self.exec_iteration(body, scope, Some((variable, item)), "for_iteration")? {
                ControlFlow::Break => break,
                ControlFlow::None(_) | ControlFlow::Continue => {}
                flow @ ControlFlow::Return(_) => return Ok(flow),
            }
        }
        Ok(ControlFlow::None(Value::Null))
    }

    fn exec_try(
        &mut self,
        try_body: &[Stmt],
        error_var: &str,
        catch_body: &[Stmt],
        scope: ScopeId,
    ) -> Result<ControlFlow, EvaluatorError> {
        match self.exec_body(try_body, scope) {
            Err(err) if err.is_catchable() => {
                debug!(error = %err, "caught runtime error");
                let catch_scope = self.scopes.push(scope, "try_catch");
                let result = self
                    .scopes
                    .define(catch_scope, error_var, Value::string(err.to_string()))
                    .and_then(|()| self.exec_body(catch_body, catch_scope));
                self.scopes.release(catch_scope);
                result
            }
            other => other,
        }
    }

    // === Expressions ===

    pub(crate) fn eval_expr(&mut self, expr: &Expr, scope: ScopeId) -> Result<Value, EvaluatorError> {
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::String(s) => Ok(Value::String(s.clone())),
            ExprKind::Boolean(b) => Ok(Value::Boolean(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::List(elements) => {
                let items = elements
                    .iter()
                    .map(|element| self.eval_expr(element, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(items))
            }
            ExprKind::Map(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let value = self.eval_expr(value, scope)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::map(map))
            }
            ExprKind::Identifier(name) => self.scopes.lookup(scope, name),
            ExprKind::Member { object, property } => {
                let object = self.eval_expr(object, scope)?;
                self.read_member(&object, property)
            }
            ExprKind::Index { object, index } => {
                let object = self.eval_expr(object, scope)?;
                let index = self.eval_expr(index, scope)?;
                read_index(&object, &index)
            }
            ExprKind::Binary { left, op, right } => {
                let left = self.eval_expr(left, scope)?;
                let right = self.eval_expr(right, scope)?;
                binary_op(*op, &left, &right)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.eval_expr(operand, scope)?;
                match op {
                    UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
                    UnaryOp::Negate => Ok(Value::Number(-operand.as_number()?)),
                }
            }
            ExprKind::Assignment { target, value } => {
                let value = self.eval_expr(value, scope)?;
                self.assign(target, value.clone(), scope)?;
                Ok(value)
            }
            ExprKind::Call { callee, args } => self.eval_call(callee, args, scope),
            ExprKind::ScopeCreation(args) => self.eval_scope_creation(args, scope),
        }
    }

    fn read_member(&self, object: &Value, property: &str) -> Result<Value, EvaluatorError> {
        match object {
            Value::Scope(sub) => self.scopes.lookup(sub.id, property),
            Value::Map(entries) => Ok(entries.read().get(property).cloned().unwrap_or(Value::Null)),
            other => Err(EvaluatorError::runtime(format!(
                "Cannot access property '{property}' on type {}",
                other.type_name()
            ))),
        }
    }

    fn assign(&mut self, target: &Expr, value: Value, scope: ScopeId) -> Result<(), EvaluatorError> {
        match &target.kind {
            ExprKind::Identifier(name) => self.scopes.assign(scope, name, value),
            ExprKind::Member { object, property } => match self.eval_expr(object, scope)? {
                Value::Map(entries) => {
                    entries.write().insert(property.clone(), value);
                    Ok(())
                }
                Value::Scope(sub) => self.scopes.assign(sub.id, property, value),
                other => Err(EvaluatorError::runtime(format!(
                    "Cannot assign to member of type {}",
                    other.type_name()
                ))),
            },
            ExprKind::Index { object, index } => {
                let object = self.eval_expr(object, scope)?;
                let index = self.eval_expr(index, scope)?;
                match &object {
                    Value::List(items) => {
                        let mut items = items.write();
                        let slot = list_slot(&index, items.len())?;
                        items[slot] = value;
                        Ok(())
                    }
                    Value::Map(entries) => {
                        entries.write().insert(index.to_string(), value);
                        Ok(())
                    }
                    other => Err(EvaluatorError::runtime(format!(
                        "Cannot index type {}",
                        other.type_name()
                    ))),
                }
            }
            _ => Err(EvaluatorError::InvalidAssignmentTarget),
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], scope: ScopeId) -> Result<Value, EvaluatorError> {
        // Built-ins win over any user binding with the same name
        if let ExprKind::Identifier(name) = &callee.kind {
            if let Some(builtin) = self.builtins.get(name.as_str()).copied() {
                let args = self.eval_args(args, scope)?;
                return builtin(self, &args);
            }
        }

        let callee = self.eval_expr(callee, scope)?;
        let args = self.eval_args(args, scope)?;
        match callee {
            Value::Function(function) => self.call_function(&function, args),
            other => Err(EvaluatorError::NotCallable {
                type_name: other.type_name().to_string(),
            }),
        }
    }

    fn eval_args(&mut self, args: &[Expr], scope: ScopeId) -> Result<Vec<Value>, EvaluatorError> {
        args.iter().map(|arg| self.eval_expr(arg, scope)).collect()
    }

    /// Invoke a user function in a fresh scope parented at its closure
    pub fn call_function(&mut self, function: &FunctionValue, args: Vec<Value>) -> Result<Value, EvaluatorError> {
        if args.len() != function.params.len() {
            return Err(EvaluatorError::FunctionArity {
                name: function.name.clone(),
                expected: function.params.len(),
                actual: args.len(),
            });
        }
        if self.call_depth >= self.config.max_call_depth {
            return Err(EvaluatorError::CallDepthExceeded {
                depth: self.config.max_call_depth,
            });
        }

        let call_scope = self
            .scopes
            .push(function.closure, format!("function_{}", function.name));
        self.call_depth += 1;
        let result = function
            .params
            .iter()
            .zip(args)
            .try_for_each(|(param, arg)| self.scopes.define(call_scope, param, arg))
            .and_then(|()| self.exec_block(&function.body, call_scope));
        self.call_depth -= 1;
        self.scopes.release(call_scope);

        match result? {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::None(_) => Ok(Value::Null),
            flow => flow.into_value(),
        }
    }

    fn eval_scope_creation(&mut self, args: &[Expr], scope: ScopeId) -> Result<Value, EvaluatorError> {
        if args.len() != 6 {
            return Err(EvaluatorError::runtime(
                "Scope creation requires 6 boundary arguments (x1, y1, z1, x2, y2, z2)",
            ));
        }
        let mut bounds = [0.0; 6];
        for (bound, arg) in bounds.iter_mut().zip(args) {
            *bound = self.eval_expr(arg, scope)?.as_number()?;
        }
        let [x1, y1, z1, x2, y2, z2] = bounds;
        let region = Region::new(x1, y1, z1, x2, y2, z2);
        let id = self.scopes.push_region(scope, "subscope", region);
        self.scopes.retain(id);
        Ok(Value::Scope(ScopeRef {
            id,
            name: "subscope".to_string(),
        }))
    }

    // === Events ===

    /// Run every handler registered for `name`, returning how many ran
    ///
    /// Each handler gets a fresh scope under global with `context` bound as
    /// variables. A failing handler is logged and does not stop the others.
    pub fn trigger_event(&mut self, name: &str, context: &IndexMap<String, Value>) -> usize {
        self.sim.log(format!("[TRIGGER] Event: {name}"));
        let handlers = self.events.handlers_for(name);
        debug!(event = name, handlers = handlers.len(), "dispatching event");

        let global = self.scopes.global();
        for handler in &handlers {
            let handler_scope = self.scopes.push(global, format!("event_{name}"));
            let result = context
                .iter()
                .try_for_each(|(key, value)| self.scopes.define(handler_scope, key, value.clone()))
                .and_then(|()| self.exec_block(&handler.body, handler_scope));
            self.scopes.release(handler_scope);

            let failure = match result {
                Ok(ControlFlow::None(_) | ControlFlow::Return(_)) => None,
                Ok(flow) => flow.into_value().err(),
                Err(err) => Some(err),
            };
            if let Some(err) = failure {
                warn!(event = name, line = handler.line, error = %err, "event handler failed");
                self.sim
                    .log(format!("[ERROR] Error in event handler {name}: {err}"));
            }
        }
        handlers.len()
    }

    /// Dispatch queued events until the queue is empty or the cap is hit
    ///
    /// Returns the number of events dequeued. Events a handler cancelled
    /// before their turn are dequeued without running handlers.
    pub fn drain_events(&mut self) -> usize {
        let max = self.config.max_event_dispatches;
        let mut dispatched = 0;
        while dispatched < max {
            let Some(queued) = self.sim.next_event() else {
                break;
            };
            dispatched += 1;
            if queued.event.read().cancelled {
                debug!(event = %queued.name, "skipping cancelled event");
                continue;
            }
            let mut context = queued.context;
            context
                .entry("event".to_string())
                .or_insert_with(|| Value::Event(queued.event.clone()));
            self.trigger_event(&queued.name, &context);
        }

        if dispatched >= max && self.sim.pending_events() > 0 {
            warn!(max, pending = self.sim.pending_events(), "event drain cap reached");
            self.sim.log(format!(
                "[WARNING] Event processing stopped after {max} iterations"
            ));
        }
        dispatched
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(QuillConfig::default())
    }
}

fn list_slot(index: &Value, len: usize) -> Result<usize, EvaluatorError> {
    let index = index.as_number()? as i64;
    if index < 0 || index as usize >= len {
        return Err(EvaluatorError::IndexOutOfBounds { index, len });
    }
    Ok(index as usize)
}

fn read_index(object: &Value, index: &Value) -> Result<Value, EvaluatorError> {
    match object {
        Value::List(items) => {
            let items = items.read();
            let slot = list_slot(index, items.len())?;
            Ok(items[slot].clone())
        }
        Value::Map(entries) => Ok(entries
            .read()
            .get(&index.to_string())
            .cloned()
            .unwrap_or(Value::Null)),
        other => Err(EvaluatorError::runtime(format!(
            "Cannot index type {}",
            other.type_name()
        ))),
    }
}

fn binary_op(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvaluatorError> {
    let result = match op {
        BinaryOp::And => Value::Boolean(left.is_truthy() && right.is_truthy()),
        BinaryOp::Or => Value::Boolean(left.is_truthy() || right.is_truthy()),
        BinaryOp::Equal => Value::Boolean(left == right),
        BinaryOp::NotEqual => Value::Boolean(left != right),
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            _ => Value::String(format!("{left}{right}")),
        },
        BinaryOp::Subtract => {
            let (a, b) = numeric_operands(op, left, right)?;
            Value::Number(a - b)
        }
        BinaryOp::Multiply => {
            let (a, b) = numeric_operands(op, left, right)?;
            Value::Number(a * b)
        }
        BinaryOp::Divide | BinaryOp::Modulo => {
            let (a, b) = numeric_operands(op, left, right)?;
            if b == 0.0 {
                return Err(EvaluatorError::DivisionByZero);
            }
            if op == BinaryOp::Divide {
                Value::Number(a / b)
            } else {
                Value::Number(a % b)
            }
        }
        BinaryOp::Less => {
            let (a, b) = numeric_operands(op, left, right)?;
            Value::Boolean(a < b)
        }
        BinaryOp::LessEqual => {
            let (a, b) = numeric_operands(op, left, right)?;
            Value::Boolean(a <= b)
        }
        BinaryOp::Greater => {
            let (a, b) = numeric_operands(op, left, right)?;
            Value::Boolean(a > b)
        }
        BinaryOp::GreaterEqual => {
            let (a, b) = numeric_operands(op, left, right)?;
            Value::Boolean(a >= b)
        }
    };
    Ok(result)
}

fn numeric_operands(op: BinaryOp, left: &Value, right: &Value) -> Result<(f64, f64), EvaluatorError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(EvaluatorError::binary_type_error(
            op.symbol(),
            left.type_name(),
            right.type_name(),
        )),
    }
}
