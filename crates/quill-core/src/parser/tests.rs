use pretty_assertions::assert_eq;

use super::*;

fn parse(source: &str) -> Program {
    parse_source(source).unwrap()
}

fn parse_err(source: &str) -> ParseError {
    match parse_source(source) {
        Err(QuillError::Parse(err)) => err,
        other => panic!("expected parse error, got {other:?}"),
    }
}

fn single_expr(source: &str) -> Expr {
    let mut program = parse(source);
    assert_eq!(program.statements.len(), 1);
    match program.statements.remove(0).kind {
        StmtKind::Expression(expr) => expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

#[test]
fn test_precedence_multiplication_binds_tighter() {
    let expr = single_expr("1 + 2 * 3");
    match expr.kind {
        ExprKind::Binary { left, op, right } => {
            assert_eq!(op, BinaryOp::Add);
            assert_eq!(left.kind, ExprKind::Number(1.0));
            assert!(matches!(
                right.kind,
                ExprKind::Binary {
                    op: BinaryOp::Multiply,
                    ..
                }
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_logical_precedence() {
    let expr = single_expr("a || b && c == d");
    match expr.kind {
        ExprKind::Binary { op, right, .. } => {
            assert_eq!(op, BinaryOp::Or);
            match right.kind {
                ExprKind::Binary { op, right, .. } => {
                    assert_eq!(op, BinaryOp::And);
                    assert!(matches!(
                        right.kind,
                        ExprKind::Binary {
                            op: BinaryOp::Equal,
                            ..
                        }
                    ));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    let expr = single_expr("a = b = 3");
    match expr.kind {
        ExprKind::Assignment { target, value } => {
            assert_eq!(target.kind, ExprKind::Identifier("a".into()));
            assert!(matches!(value.kind, ExprKind::Assignment { .. }));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_invalid_assignment_target_parses() {
    let expr = single_expr("1 = 2");
    assert!(matches!(expr.kind, ExprKind::Assignment { .. }));
}

#[test]
fn test_postfix_chain() {
    let expr = single_expr("a.b[0](1, 2)");
    match expr.kind {
        ExprKind::Call { callee, args } => {
            assert_eq!(args.len(), 2);
            match callee.kind {
                ExprKind::Index { object, .. } => {
                    assert!(matches!(object.kind, ExprKind::Member { .. }));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_unary_operators_nest() {
    let expr = single_expr("!-x");
    match expr.kind {
        ExprKind::Unary { op, operand } => {
            assert_eq!(op, UnaryOp::Not);
            assert!(matches!(
                operand.kind,
                ExprKind::Unary {
                    op: UnaryOp::Negate,
                    ..
                }
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_declarations() {
    let program = parse("let x = 1; const y = \"two\"");
    assert_eq!(program.statements.len(), 2);
    assert!(matches!(
        &program.statements[0].kind,
        StmtKind::VariableDeclaration { name, is_const: false, .. } if name == "x"
    ));
    assert!(matches!(
        &program.statements[1].kind,
        StmtKind::VariableDeclaration { name, is_const: true, .. } if name == "y"
    ));
}

#[test]
fn test_function_declaration_with_stray_comma() {
    let program = parse("func add(, a, b) { return a + b }");
    match &program.statements[0].kind {
        StmtKind::FunctionDeclaration { name, params, body } => {
            assert_eq!(name, "add");
            assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
            assert_eq!(body.len(), 1);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_bare_return() {
    let program = parse("function f() { return; } func g() { return }");
    for stmt in &program.statements {
        match &stmt.kind {
            StmtKind::FunctionDeclaration { body, .. } => {
                assert_eq!(body[0].kind, StmtKind::Return(None));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn test_else_if_chains() {
    let program = parse("if a { x } else if b { y } else { z }");
    match &program.statements[0].kind {
        StmtKind::If { else_body, .. } => {
            let else_body = else_body.as_ref().unwrap();
            assert_eq!(else_body.len(), 1);
            match &else_body[0].kind {
                StmtKind::If { else_body, .. } => assert!(else_body.is_some()),
                other => panic!("unexpected {other:?}"),
            }
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_loops() {
    let program = parse("while (i < 3) { i = i + 1 } for p in players { break; continue }");
    assert!(matches!(program.statements[0].kind, StmtKind::While { .. }));
    match &program.statements[1].kind {
        StmtKind::For { variable, body, .. } => {
            assert_eq!(variable, "p");
            assert_eq!(body[0].kind, StmtKind::Break);
            assert_eq!(body[1].kind, StmtKind::Continue);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_try_catch_both_forms() {
    for source in ["try { 1 / 0 } catch (e) { log(e) }", "try { 1 / 0 } catch e { log(e) }"] {
        let program = parse(source);
        match &program.statements[0].kind {
            StmtKind::Try { error_var, catch_body, .. } => {
                assert_eq!(error_var, "e");
                assert_eq!(catch_body.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn test_event_handler_forms() {
    let program = parse("on(player_join) { log(1) } OnEvent(tick) { }");
    assert!(matches!(
        &program.statements[0].kind,
        StmtKind::EventHandler { event_name, .. } if event_name == "player_join"
    ));
    assert!(matches!(
        &program.statements[1].kind,
        StmtKind::EventHandler { event_name, .. } if event_name == "tick"
    ));
}

#[test]
fn test_on_as_ordinary_call() {
    let expr = single_expr("on(1, 2)");
    assert!(matches!(expr.kind, ExprKind::Call { .. }));
}

#[test]
fn test_scope_creation() {
    let program = parse("let s = new Scope(0, 0, 0, 10, 10, 10)");
    match &program.statements[0].kind {
        StmtKind::VariableDeclaration { value, .. } => match &value.kind {
            ExprKind::ScopeCreation(args) => assert_eq!(args.len(), 6),
            other => panic!("unexpected {other:?}"),
        },
        other => panic!("unexpected {other:?}"),
    }
    // arity is checked when evaluated
    assert!(parse_source("new Scope(1, 2)").is_ok());
}

#[test]
fn test_list_and_map_literals() {
    let expr = single_expr("[1, \"a\", [true, null]]");
    match expr.kind {
        ExprKind::List(items) => assert_eq!(items.len(), 3),
        other => panic!("unexpected {other:?}"),
    }

    let expr = single_expr("{name: \"Alice\", \"hp\": 20}");
    match expr.kind {
        ExprKind::Map(entries) => {
            let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
            assert_eq!(keys, vec!["name", "hp"]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_map_key_must_be_identifier_or_string() {
    let err = parse_err("let m = {1: 2}");
    assert_eq!(
        err.message,
        "Expected identifier or string as map key, but found Number on line 1"
    );
}

#[test]
fn test_missing_paren_error_message() {
    let err = parse_err("log(1\nlet x = 2");
    assert_eq!(err.message, "Expected CloseParen, but found Let on line 2");
    assert_eq!(err.line, 2);
}

#[test]
fn test_unexpected_token_error_message() {
    let err = parse_err("let x = ;");
    assert_eq!(err.message, "Unexpected token: Semicolon at line 1");
}

#[test]
fn test_unclosed_block_reports_eof() {
    let err = parse_err("if true { log(1)");
    assert_eq!(err.message, "Expected CloseBrace, but found EOF on line 1");
}

#[test]
fn test_import_is_reserved() {
    let err = parse_err("import foo");
    assert_eq!(err.message, "Unexpected token: Import at line 1");
}

#[test]
fn test_semicolons_optional() {
    let with = parse("let a = 1; log(a);");
    let without = parse("let a = 1\nlog(a)");
    assert_eq!(with.statements.len(), without.statements.len());
}

#[test]
fn test_positions_recorded() {
    let program = parse("\n  let x = 1");
    assert_eq!(program.statements[0].line, 2);
    assert_eq!(program.statements[0].column, 3);
}

#[test]
fn test_deeply_nested_parens_are_rejected() {
    let source = format!("log({}1{})", "(".repeat(20_000), ")".repeat(20_000));
    let err = parse_err(&source);
    assert_eq!(err.message, "Expression nested too deeply (limit 100) on line 1");
}

#[test]
fn test_long_unary_chain_is_rejected() {
    let source = format!("let x = {}true", "!".repeat(20_000));
    let err = parse_err(&source);
    assert!(err.message.starts_with("Expression nested too deeply"));
}

#[test]
fn test_deep_lists_and_blocks_are_rejected() {
    let lists = format!("{}{}", "[".repeat(5_000), "]".repeat(5_000));
    assert!(parse_err(&lists).message.starts_with("Expression nested too deeply"));

    let blocks = format!("{}{}", "if true { ".repeat(5_000), "}".repeat(5_000));
    assert!(parse_err(&blocks).message.starts_with("Expression nested too deeply"));
}

#[test]
fn test_moderate_nesting_still_parses() {
    let source = format!("let x = {}1{}", "(".repeat(40), ")".repeat(40));
    assert_eq!(parse(&source).statements.len(), 1);

    let chain = (0..30).map(|i| format!("if x == {i} {{ log({i}) }}")).collect::<Vec<_>>().join(" else ");
    assert_eq!(parse(&chain).statements.len(), 1);
}
