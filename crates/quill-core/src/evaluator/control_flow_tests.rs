use pretty_assertions::assert_eq;

use super::*;
use crate::parser::parse_source;

fn evaluator_with(config: QuillConfig) -> Evaluator {
    Evaluator::new(config)
}

fn exec(evaluator: &mut Evaluator, source: &str) -> Result<Value, EvaluatorError> {
    let program = parse_source(source).unwrap();
    evaluator.execute(&program)
}

fn logs_of(source: &str) -> Vec<String> {
    let mut evaluator = Evaluator::default();
    exec(&mut evaluator, source).unwrap();
    evaluator.simulation().logs().to_vec()
}

fn small_loops() -> QuillConfig {
    QuillConfig {
        max_loop_iterations: 5,
        ..QuillConfig::default()
    }
}

#[test]
fn test_if_else_chain() {
    let source = r#"
        func grade(score) {
            if score >= 90 {
                return "A"
            } else if score >= 80 {
                return "B"
            } else {
                return "C"
            }
        }
        log(grade(95))
        log(grade(85))
        log(grade(10))
    "#;
    assert_eq!(logs_of(source), ["[LOG] A", "[LOG] B", "[LOG] C"]);
}

#[test]
fn test_if_body_runs_in_enclosing_scope() {
    let mut evaluator = Evaluator::default();
    exec(&mut evaluator, "if true { let inner = 1 }").unwrap();
    assert_eq!(evaluator.global("inner").unwrap(), Value::Number(1.0));
}

#[test]
fn test_while_loop() {
    let source = "let n = 0\nwhile n < 3 { log(n)\nn = n + 1 }";
    assert_eq!(logs_of(source), ["[LOG] 0", "[LOG] 1", "[LOG] 2"]);
}

#[test]
fn test_loop_bodies_get_a_fresh_scope_each_iteration() {
    let mut evaluator = Evaluator::default();
    exec(
        &mut evaluator,
        "let n = 0\nwhile n < 3 { let step = n\nn = step + 1 }\nfor i in [1, 2] { let sq = i * i }",
    )
    .unwrap();
    assert_eq!(evaluator.global("n").unwrap(), Value::Number(3.0));
    assert!(evaluator.global("step").is_err());
    assert!(evaluator.global("sq").is_err());
    assert!(evaluator.global("i").is_err());
}

#[test]
fn test_for_loop_over_list() {
    let source = "let total = 0\nfor x in [1, 2, 3, 4] { total = total + x }\nlog(total)";
    assert_eq!(logs_of(source), ["[LOG] 10"]);
}

#[test]
fn test_for_loop_iterates_a_snapshot() {
    let source = "let xs = [1, 2]\nfor x in xs { append(xs, x) }\nlog(len(xs))";
    assert_eq!(logs_of(source), ["[LOG] 4"]);
}

#[test]
fn test_for_loop_requires_a_list() {
    let mut evaluator = Evaluator::default();
    let err = exec(&mut evaluator, "for x in 5 { log(x) }").unwrap_err();
    assert_eq!(err.to_string(), "For loop expects a list, got number");
}

#[test]
fn test_break_and_continue() {
    let source = r#"
        for i in range(0, 10) {
            if i == 1 { continue }
            if i == 4 { break }
            log(i)
        }
    "#;
    assert_eq!(logs_of(source), ["[LOG] 0", "[LOG] 2", "[LOG] 3"]);
}

#[test]
fn test_break_only_leaves_the_inner_loop() {
    let source = r#"
        for i in [1, 2] {
            let j = 0
            while true {
                j = j + 1
                if j > 2 { break }
            }
            log(i + ":" + j)
        }
    "#;
    assert_eq!(logs_of(source), ["[LOG] 1:3", "[LOG] 2:3"]);
}

#[test]
fn test_return_unwinds_through_loops() {
    let source = r#"
        func find(xs, target) {
            let index = 0
            for x in xs {
                while true {
                    if x == target { return index }
                    break
                }
                index = index + 1
            }
            return -1
        }
        log(find([4, 5, 6], 6))
        log(find([4, 5, 6], 9))
    "#;
    assert_eq!(logs_of(source), ["[LOG] 2", "[LOG] -1"]);
}

#[test]
fn test_stray_control_flow_is_an_error() {
    let mut evaluator = Evaluator::default();
    assert_eq!(
        exec(&mut evaluator, "return 1").unwrap_err().to_string(),
        "return statement outside of function"
    );
    assert_eq!(
        exec(&mut evaluator, "break").unwrap_err().to_string(),
        "break statement outside of loop"
    );
    assert_eq!(
        exec(&mut evaluator, "func f() { continue }\nf()")
            .unwrap_err()
            .to_string(),
        "continue statement outside of loop"
    );
}

#[test]
fn test_loop_guard_stops_runaway_while() {
    let mut evaluator = evaluator_with(small_loops());
    let err = exec(&mut evaluator, "let n = 0\nwhile true { n = n + 1 }").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Infinite loop detected: Loop exceeded maximum iterations (5). Possible infinite loop detected."
    );
    assert_eq!(evaluator.global("n").unwrap(), Value::Number(5.0));
}

#[test]
fn test_loop_guard_uses_default_ceiling() {
    let mut evaluator = Evaluator::default();
    let err = exec(&mut evaluator, "while true { }").unwrap_err();
    assert_eq!(
        err,
        EvaluatorError::InfiniteLoop(
            "Loop exceeded maximum iterations (10000). Possible infinite loop detected.".to_string()
        )
    );
}

#[test]
fn test_loop_guard_allows_exactly_the_maximum() {
    let mut evaluator = evaluator_with(small_loops());
    exec(
        &mut evaluator,
        "let n = 0\nfor i in range(0, 5) { n = n + 1 }\nfor i in range(0, 5) { n = n + 1 }",
    )
    .unwrap();
    assert_eq!(evaluator.global("n").unwrap(), Value::Number(10.0));

    let err = exec(&mut evaluator, "for i in range(0, 6) { }").unwrap_err();
    assert!(matches!(err, EvaluatorError::InfiniteLoop(_)));
}

#[test]
fn test_loop_guard_times_out() {
    let config = QuillConfig {
        max_loop_iterations: usize::MAX,
        max_loop_millis: 1,
        ..QuillConfig::default()
    };
    let mut evaluator = evaluator_with(config);
    let err = exec(&mut evaluator, "while true { }").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Infinite loop detected: Loop exceeded maximum execution time (1ms). Possible infinite loop detected."
    );
}

#[test]
fn test_try_catch_binds_message() {
    let source = "try { let x = 1 / 0 } catch (e) { log(\"caught: \" + e) }";
    assert_eq!(logs_of(source), ["[LOG] caught: Division by zero"]);

    let source = "try { missing() } catch err { log(err) }";
    assert_eq!(logs_of(source), ["[LOG] Undefined variable: 'missing'"]);
}

#[test]
fn test_try_without_error_skips_catch() {
    let source = "try { log(\"ok\") } catch (e) { log(\"never\") }";
    assert_eq!(logs_of(source), ["[LOG] ok"]);
}

#[test]
fn test_catch_variable_is_scoped_to_catch_body() {
    let mut evaluator = Evaluator::default();
    exec(&mut evaluator, "try { 1 / 0 } catch (e) { let seen = e }").unwrap();
    assert!(evaluator.global("e").is_err());
    assert!(evaluator.global("seen").is_err());
}

#[test]
fn test_try_does_not_catch_loop_guard() {
    let mut evaluator = evaluator_with(small_loops());
    let err = exec(
        &mut evaluator,
        "try { while true { } } catch (e) { log(\"caught\") }",
    )
    .unwrap_err();
    assert!(matches!(err, EvaluatorError::InfiniteLoop(_)));
    assert!(evaluator.simulation().logs().is_empty());
}

#[test]
fn test_try_does_not_catch_call_depth() {
    let config = QuillConfig {
        max_call_depth: 10,
        ..QuillConfig::default()
    };
    let mut evaluator = evaluator_with(config);
    let err = exec(
        &mut evaluator,
        "func spin() { spin() }\ntry { spin() } catch (e) { log(\"caught\") }",
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Maximum call depth of 10 exceeded");
}

#[test]
fn test_return_inside_try_propagates() {
    let source = "func f() { try { return 7 } catch (e) { return 0 }\nreturn 1 }\nlog(f())";
    assert_eq!(logs_of(source), ["[LOG] 7"]);
}

#[test]
fn test_run_budget() {
    let config = QuillConfig {
        max_loop_iterations: usize::MAX,
        max_loop_millis: 60_000,
        run_budget_millis: Some(1),
        ..QuillConfig::default()
    };
    let mut evaluator = evaluator_with(config);
    let err = exec(&mut evaluator, "try { while true { } } catch (e) { }").unwrap_err();
    assert_eq!(err, EvaluatorError::RunBudgetExceeded { millis: 1 });
    assert_eq!(err.to_string(), "Script exceeded its run budget of 1ms");
}
