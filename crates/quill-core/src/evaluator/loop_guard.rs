use std::time::{Duration, Instant};

use tracing::warn;

use super::errors::EvaluatorError;

/// Per-loop runaway detector
///
/// A fresh guard is created each time a `while` or `for` statement starts, so
/// a loop that runs twice in one script is bounded independently each time.
/// Dropping the guard on any exit path (normal, `break`, error) clears it.
#[derive(Debug)]
pub struct LoopGuard {
    iterations: usize,
    started: Instant,
    max_iterations: usize,
    max_duration: Duration,
}

impl LoopGuard {
    pub fn new(max_iterations: usize, max_millis: u64) -> Self {
        Self {
            iterations: 0,
            started: Instant::now(),
            max_iterations,
            max_duration: Duration::from_millis(max_millis),
        }
    }

    /// Count one iteration and fail once either ceiling is exceeded
    pub fn check(&mut self) -> Result<(), EvaluatorError> {
        self.iterations += 1;
        if self.iterations > self.max_iterations {
            warn!(iterations = self.iterations, "loop guard tripped on iteration count");
            return Err(EvaluatorError::InfiniteLoop(format!(
                "Loop exceeded maximum iterations ({}). Possible infinite loop detected.",
                self.max_iterations
            )));
        }
        if self.started.elapsed() > self.max_duration {
            warn!(iterations = self.iterations, "loop guard tripped on elapsed time");
            return Err(EvaluatorError::InfiniteLoop(format!(
                "Loop exceeded maximum execution time ({}ms). Possible infinite loop detected.",
                self.max_duration.as_millis()
            )));
        }
        Ok(())
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_ceiling() {
        let mut guard = LoopGuard::new(3, 60_000);
        for _ in 0..3 {
            guard.check().unwrap();
        }
        let err = guard.check().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Infinite loop detected: Loop exceeded maximum iterations (3). Possible infinite loop detected."
        );
        assert!(!err.is_catchable());
    }

    #[test]
    fn test_time_ceiling() {
        let mut guard = LoopGuard::new(usize::MAX, 0);
        std::thread::sleep(Duration::from_millis(2));
        let err = guard.check().unwrap_err();
        assert!(err.to_string().contains("maximum execution time (0ms)"));
    }

    #[test]
    fn test_fresh_guard_resets_count() {
        let mut first = LoopGuard::new(2, 60_000);
        first.check().unwrap();
        first.check().unwrap();
        assert_eq!(first.iterations(), 2);
        let mut second = LoopGuard::new(2, 60_000);
        second.check().unwrap();
        assert_eq!(second.iterations(), 1);
    }
}
