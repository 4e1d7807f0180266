//! Multi-line input collection for the REPL
//!
//! Lines are buffered until brackets balance, no string is open, and the
//! buffer either parses or fails for a reason more input cannot fix.

use quill_core::parse_source;

/// Result of processing a line of input
#[derive(Debug, PartialEq)]
pub enum LineProcessResult {
    /// Input is complete and ready for execution
    Complete(String),
    /// More input is needed to complete the statement
    NeedMore,
}

/// Collects multi-line input for complete statements
pub struct MultiLineCollector {
    buffer: String,
    /// Open braces, brackets and parentheses
    nesting_level: i32,
    in_string: bool,
    string_delimiter: char,
    last_was_escape: bool,
    in_block_comment: bool,
}

impl MultiLineCollector {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            nesting_level: 0,
            in_string: false,
            string_delimiter: '"',
            last_was_escape: false,
            in_block_comment: false,
        }
    }

    /// Get the appropriate prompt for the current state
    pub fn get_prompt(&self) -> &'static str {
        if self.is_collecting() {
            "   "
        } else {
            ">> "
        }
    }

    /// Check if we're currently collecting a multi-line statement
    pub fn is_collecting(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.nesting_level = 0;
        self.in_string = false;
        self.last_was_escape = false;
        self.in_block_comment = false;
    }

    /// Process a line of input
    pub fn process_line(&mut self, line: &str) -> LineProcessResult {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);

        self.update_parsing_state(line);

        if self.is_complete_statement() {
            let complete_code = std::mem::take(&mut self.buffer);
            self.reset();
            LineProcessResult::Complete(complete_code)
        } else {
            LineProcessResult::NeedMore
        }
    }

    fn update_parsing_state(&mut self, line: &str) {
        let mut chars = line.chars().peekable();
        while let Some(ch) = chars.next() {
            if self.in_block_comment {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    self.in_block_comment = false;
                }
            } else if self.in_string {
                if self.last_was_escape {
                    self.last_was_escape = false;
                } else if ch == '\\' {
                    self.last_was_escape = true;
                } else if ch == self.string_delimiter {
                    self.in_string = false;
                }
            } else {
                match ch {
                    '/' if chars.peek() == Some(&'/') => break,
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        self.in_block_comment = true;
                    }
                    '"' | '\'' => {
                        self.in_string = true;
                        self.string_delimiter = ch;
                        self.last_was_escape = false;
                    }
                    '{' | '(' | '[' => self.nesting_level += 1,
                    '}' | ')' | ']' => self.nesting_level -= 1,
                    _ => {}
                }
            }
        }
    }

    fn is_complete_statement(&self) -> bool {
        if self.in_string || self.in_block_comment || self.nesting_level > 0 {
            return false;
        }

        if parse_source(&self.buffer).is_ok() {
            return true;
        }

        // A dangling operator or keyword means the statement continues on
        // the next line; anything else is a genuine error for the evaluator
        // to report.
        let trimmed = self.buffer.trim_end();
        let dangling_symbol = [
            ",", "=", "+", "-", "*", "/", "%", "&&", "||", "==", "!=", "<", ">", "<=", ">=", ".",
        ]
        .iter()
        .any(|suffix| trimmed.ends_with(suffix));
        let dangling_keyword = ["if", "else", "while", "for", "in", "func", "let", "const", "return", "catch", "try"]
            .iter()
            .any(|keyword| {
                trimmed
                    .strip_suffix(keyword)
                    .is_some_and(|before| before.is_empty() || before.ends_with(char::is_whitespace))
            });

        !(dangling_symbol || dangling_keyword)
    }
}

impl Default for MultiLineCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_complete_statement() {
        let mut collector = MultiLineCollector::new();
        assert_eq!(
            collector.process_line("let x = 42"),
            LineProcessResult::Complete("let x = 42".to_string())
        );
        assert!(!collector.is_collecting());
    }

    #[test]
    fn test_multiline_function() {
        let mut collector = MultiLineCollector::new();

        assert_eq!(collector.process_line("func add(a, b) {"), LineProcessResult::NeedMore);
        assert_eq!(collector.get_prompt(), "   ");
        assert_eq!(collector.process_line("  return a + b"), LineProcessResult::NeedMore);

        match collector.process_line("}") {
            LineProcessResult::Complete(code) => {
                assert_eq!(code, "func add(a, b) {\n  return a + b\n}");
            }
            LineProcessResult::NeedMore => panic!("Expected complete statement"),
        }
        assert_eq!(collector.get_prompt(), ">> ");
    }

    #[test]
    fn test_brackets_inside_strings_and_comments() {
        let mut collector = MultiLineCollector::new();
        assert_eq!(
            collector.process_line("log(\"{ not a block\") // also ( not"),
            LineProcessResult::Complete("log(\"{ not a block\") // also ( not".to_string())
        );

        assert_eq!(collector.process_line("let s = 'it\\'s"), LineProcessResult::NeedMore);
        assert!(matches!(collector.process_line("fine'"), LineProcessResult::Complete(_)));

        assert_eq!(collector.process_line("/* open"), LineProcessResult::NeedMore);
        assert!(matches!(collector.process_line("closed */ log(1)"), LineProcessResult::Complete(_)));
    }

    #[test]
    fn test_dangling_operator_continues() {
        let mut collector = MultiLineCollector::new();
        assert_eq!(collector.process_line("let total = 1 +"), LineProcessResult::NeedMore);
        assert_eq!(
            collector.process_line("2"),
            LineProcessResult::Complete("let total = 1 +\n2".to_string())
        );
    }

    #[test]
    fn test_genuine_errors_are_handed_over() {
        let mut collector = MultiLineCollector::new();
        assert_eq!(
            collector.process_line("let = 5"),
            LineProcessResult::Complete("let = 5".to_string())
        );
        assert_eq!(
            collector.process_line("}"),
            LineProcessResult::Complete("}".to_string())
        );
    }

    #[test]
    fn test_reset_discards_buffer() {
        let mut collector = MultiLineCollector::new();
        collector.process_line("while true {");
        assert!(collector.is_collecting());
        collector.reset();
        assert!(!collector.is_collecting());
        assert!(matches!(collector.process_line("log(1)"), LineProcessResult::Complete(_)));
    }
}
