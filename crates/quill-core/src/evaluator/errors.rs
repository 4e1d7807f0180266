use thiserror::Error;

use crate::simulation::SimulationError;

/// Evaluator-specific error types for better error handling
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluatorError {
    #[error("Expected {expected} but got {actual}")]
    TypeError { expected: String, actual: String },

    #[error("Cannot apply '{operator}' to {left_type} and {right_type}")]
    BinaryTypeError {
        operator: String,
        left_type: String,
        right_type: String,
    },

    #[error("Undefined variable: '{name}'")]
    VariableNotFound { name: String },

    #[error("Variable '{name}' already defined in this scope")]
    AlreadyDefined { name: String },

    #[error("Cannot reassign constant variable '{name}'")]
    ConstantReassignment { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Index {index} out of bounds for list of size {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("{function}() requires {expected} argument{}, got {actual}", plural(.expected))]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("Function {name} expects {expected} arguments, got {actual}")]
    FunctionArity {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("{function}() expects {expected}, got {actual}")]
    InvalidArgument {
        function: String,
        expected: String,
        actual: String,
    },

    #[error("Cannot call type {type_name}")]
    NotCallable { type_name: String },

    #[error("Invalid assignment target")]
    InvalidAssignmentTarget,

    #[error("{0}")]
    Simulation(#[from] SimulationError),

    #[error("Infinite loop detected: {0}")]
    InfiniteLoop(String),

    #[error("Script exceeded its run budget of {millis}ms")]
    RunBudgetExceeded { millis: u64 },

    #[error("Maximum call depth of {depth} exceeded")]
    CallDepthExceeded { depth: usize },

    #[error("{keyword} statement outside of {context}")]
    StrayControlFlow {
        keyword: &'static str,
        context: &'static str,
    },

    #[error("{0}")]
    Runtime(String),
}

fn plural(expected: &str) -> &'static str {
    if expected == "1" || expected.ends_with(" 1") {
        ""
    } else {
        "s"
    }
}

impl EvaluatorError {
    /// Create a conversion error for a value of the wrong type
    pub fn type_mismatch(expected: &str, actual: &str) -> Self {
        Self::TypeError {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a type error for binary operations
    pub fn binary_type_error(operator: &str, left_type: &str, right_type: &str) -> Self {
        Self::BinaryTypeError {
            operator: operator.to_string(),
            left_type: left_type.to_string(),
            right_type: right_type.to_string(),
        }
    }

    /// Create a variable not found error
    pub fn variable_not_found(name: &str) -> Self {
        Self::VariableNotFound {
            name: name.to_string(),
        }
    }

    /// Create a built-in arity error; `expected` reads like "2" or "2 or 3"
    pub fn argument_count(function: &str, expected: &str, actual: usize) -> Self {
        Self::ArgumentCount {
            function: function.to_string(),
            expected: expected.to_string(),
            actual,
        }
    }

    /// Create a built-in argument error
    pub fn invalid_argument(function: &str, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.to_string(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    /// Guard trips abort the run; a script-level `try` must not swallow them
    pub fn is_catchable(&self) -> bool {
        !matches!(
            self,
            Self::InfiniteLoop(_) | Self::RunBudgetExceeded { .. } | Self::CallDepthExceeded { .. }
        )
    }
}
