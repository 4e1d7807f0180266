//! Output notification system for the REPL
//!
//! Output goes through a trait so tests and other front ends can capture it.

/// Trait for handling REPL output notifications
pub trait ReplNotifier: Send + Sync {
    /// Handle regular output
    fn on_output(&self, content: &str);

    /// Handle error output
    fn on_error(&self, content: &str);

    /// Script log lines produced by the last evaluation
    fn on_log(&self, line: &str);

    /// Handle evaluation result with timing information
    fn on_result(&self, output: &str, duration_ms: u64, quiet: bool);
}

/// Default console-based notifier
pub struct DefaultNotifier;

impl DefaultNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl ReplNotifier for DefaultNotifier {
    fn on_output(&self, content: &str) {
        if !content.is_empty() {
            println!("{content}");
        }
    }

    fn on_error(&self, content: &str) {
        eprintln!("{content}");
    }

    fn on_log(&self, line: &str) {
        println!("  {line}");
    }

    fn on_result(&self, output: &str, duration_ms: u64, quiet: bool) {
        if quiet {
            if output != "null" {
                println!("{output}");
            }
        } else {
            println!("=> {output} ({duration_ms}ms)");
        }
    }
}

impl Default for DefaultNotifier {
    fn default() -> Self {
        Self::new()
    }
}
