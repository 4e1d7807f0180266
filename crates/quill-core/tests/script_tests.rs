use std::io::Write;

use pretty_assertions::assert_eq;
use quill_core::{
    EvaluatorError, PlayerSpawn, QuillConfig, QuillError, QuillRuntime, QuillSession, ScriptRequest,
    Value,
};

fn alice_request(source: &str) -> ScriptRequest {
    ScriptRequest::new(source).with_player(PlayerSpawn::new("Alice", 0.0, 64.0, 0.0))
}

#[test]
fn test_teleport_script_end_to_end() {
    let runtime = QuillRuntime::default();
    let report = runtime
        .run(&alice_request(
            "let p = get_player(\"Alice\")\nteleport(p, 10, 65, 10)\nlog(5 + 5)",
        ))
        .unwrap();

    assert!(report.logs.contains(&"[LOG] 10".to_string()));
    let alice = &report.players[0];
    assert_eq!(alice.name, "Alice");
    assert_eq!((alice.x, alice.y, alice.z), (10.0, 65.0, 10.0));
    assert_eq!(report.pending_events, 0);
}

#[test]
fn test_remove_item_failure_is_a_runtime_error() {
    let runtime = QuillRuntime::default();
    let err = runtime
        .run(&alice_request(
            "let p = get_player(\"Alice\")\ngive(p, \"diamond\", 3)\nremove_item(p, \"diamond\", 5)",
        ))
        .unwrap_err();

    assert!(matches!(err, QuillError::Runtime(_)));
    assert_eq!(err.title(), "Runtime Error");
    assert_eq!(err.to_string(), "Player Alice has only 3 diamond, cannot remove 5");
}

#[test]
fn test_caught_division_by_zero_is_logged() {
    let report = QuillRuntime::default()
        .run_source("try { let x = 1 / 0 } catch (e) { log(\"Error: \" + e) }")
        .unwrap();
    assert_eq!(report.logs.len(), 1);
    assert!(report.logs[0].contains("Division by zero"));
}

#[test]
fn test_runaway_loop_aborts_the_run() {
    let config = QuillConfig {
        max_loop_iterations: 100,
        ..QuillConfig::default()
    };
    let err = QuillRuntime::new(config)
        .run_source("while true { }")
        .unwrap_err();
    assert!(matches!(
        err,
        QuillError::Runtime(EvaluatorError::InfiniteLoop(_))
    ));
}

#[test]
fn test_syntax_errors_are_reported_before_players_spawn() {
    let runtime = QuillRuntime::default();
    let err = runtime.run(&alice_request("let = 5")).unwrap_err();
    assert!(matches!(err, QuillError::Parse(_)));
    assert_eq!(err.title(), "Parser Error");

    let err = runtime.run_source("let x = 1 @ 2").unwrap_err();
    assert!(matches!(err, QuillError::Lex(_)));
    assert_eq!(err.title(), "Lexer Error");
}

#[test]
fn test_duplicate_players_are_rejected() {
    let request = alice_request("log(1)").with_player(PlayerSpawn::new("Alice", 1.0, 1.0, 1.0));
    let err = QuillRuntime::default().run(&request).unwrap_err();
    assert_eq!(err.to_string(), "Player 'Alice' already exists");
}

#[test]
fn test_queued_events_drain_after_the_script() {
    let source = r#"
        let joined = 0
        on(player_join) {
            joined = joined + 1
            sendmessage(get_player(who), "Welcome, " + who)
        }
        queue_event("player_join", {who: "Alice"})
        log("script done")
    "#;
    let report = QuillRuntime::default().run(&alice_request(source)).unwrap();

    let done = report.logs.iter().position(|l| l == "[LOG] script done").unwrap();
    let trigger = report
        .logs
        .iter()
        .position(|l| l == "[TRIGGER] Event: player_join")
        .unwrap();
    assert!(done < trigger);
    assert_eq!(report.messages, ["Alice: Welcome, Alice"]);
}

#[test]
fn test_event_storm_is_capped() {
    let source = "on(tick) { queue_event(\"tick\") }\nqueue_event(\"tick\")";
    let report = QuillRuntime::default().run_source(source).unwrap();
    assert_eq!(report.pending_events, 1);
    assert_eq!(
        report.logs.last().unwrap(),
        "[WARNING] Event processing stopped after 100 iterations"
    );
}

#[test]
fn test_runs_are_isolated() {
    let runtime = QuillRuntime::default();
    runtime.run_source("let shared = 1\nset_state(\"k\", 1)").unwrap();
    let err = runtime.run_source("log(shared)").unwrap_err();
    assert_eq!(err.to_string(), "Undefined variable: 'shared'");
    let report = runtime.run_source("log(get_state(\"k\"))").unwrap();
    assert_eq!(report.logs, ["[LOG] null"]);
}

#[test]
fn test_world_changes_show_in_report() {
    let report = QuillRuntime::default()
        .run_source("set_time(6000)\nset_weather(\"thunder\")\ncreate_world(\"nether\")")
        .unwrap();
    assert!(report.worlds_changed());
    let rendered = report.render(None);
    assert!(rendered.contains("=== World States ==="));
    assert!(rendered.contains("world | Time: 6000 | Weather: thunder"));
    assert!(rendered.contains("nether | Time: 0 | Weather: clear"));
}

#[test]
fn test_report_serializes_to_json() {
    let report = QuillRuntime::default()
        .run(&alice_request("give(get_player(\"Alice\"), \"apple\", 2)"))
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["players"][0]["name"], "Alice");
    assert_eq!(json["players"][0]["inventory"]["apple"], 2);
    assert_eq!(json["logs"][1], "[GIVE] Alice received 2x apple");
}

#[test]
fn test_run_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "log(\"from disk\")").unwrap();

    let report = QuillRuntime::default()
        .run_file(file.path(), Vec::new())
        .unwrap();
    assert_eq!(report.logs, ["[LOG] from disk"]);

    let err = QuillRuntime::default()
        .run_file("/definitely/not/here.quill", Vec::new())
        .unwrap_err();
    assert!(err.to_string().starts_with("failed to read script"));
}

#[test]
fn test_session_keeps_state_between_evaluations() {
    let mut session = QuillSession::default();
    session
        .spawn_player(&PlayerSpawn::new("Alice", 0.0, 64.0, 0.0))
        .unwrap();

    session.eval("let count = 1").unwrap();
    session.eval("func bump() { count = count + 1\nreturn count }").unwrap();
    assert_eq!(session.eval("bump()").unwrap(), Value::Number(2.0));
    assert_eq!(session.eval("bump()").unwrap(), Value::Number(3.0));

    session.eval("on(ping) { log(\"pong\") }\nqueue_event(\"ping\")").unwrap();
    assert_eq!(session.drain_events(), 1);
    assert_eq!(session.simulation().logs().last().unwrap(), "[LOG] pong");
    assert!(session.summary().contains("Players: 1"));

    session.reset();
    assert!(session.eval("count").is_err());
    assert!(session.simulation().logs().is_empty());
}

#[test]
fn test_session_errors_do_not_discard_state() {
    let mut session = QuillSession::default();
    session.eval("let kept = 5").unwrap();
    assert!(session.eval("1 / 0").is_err());
    assert_eq!(session.eval("kept").unwrap(), Value::Number(5.0));
}
