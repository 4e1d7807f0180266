use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quill_core::{parse_source, Evaluator, PlayerSpawn, QuillRuntime, ScriptRequest};

const FIBONACCI: &str = r#"
func fib(n) {
    if n < 2 { return n }
    return fib(n - 1) + fib(n - 2)
}
fib(15)
"#;

const LOOPS: &str = r#"
let total = 0
for i in range(0, 2000) {
    if i % 2 == 0 { continue }
    total = total + i
}
let n = 0
while n < 2000 { n = n + 1 }
total
"#;

const PLAYER_OPS: &str = r#"
let p = get_player("bench")
for i in range(0, 200) {
    teleport(p, i, 64, i)
    give(p, "stone", 1)
}
remove_item(p, "stone", 100)
"#;

const EVENTS: &str = r#"
let handled = 0
on(tick) { handled = handled + 1 }
for i in range(0, 100) { queue_event("tick", {i: i}) }
"#;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, source) in [("fibonacci", FIBONACCI), ("loops", LOOPS), ("player_ops", PLAYER_OPS)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| parse_source(black_box(source)).unwrap());
        });
    }
    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");
    for (name, source) in [("fibonacci", FIBONACCI), ("loops", LOOPS)] {
        let program = parse_source(source).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut evaluator = Evaluator::default();
                evaluator.execute(black_box(&program)).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_full_runs(c: &mut Criterion) {
    let runtime = QuillRuntime::default();
    let player_ops = ScriptRequest::new(PLAYER_OPS).with_player(PlayerSpawn::new("bench", 0.0, 64.0, 0.0));
    let events = ScriptRequest::new(EVENTS);

    c.bench_function("run_player_ops", |b| {
        b.iter(|| runtime.run(black_box(&player_ops)).unwrap());
    });
    c.bench_function("run_event_drain", |b| {
        b.iter(|| runtime.run(black_box(&events)).unwrap());
    });
}

criterion_group!(benches, bench_parse, bench_execute, bench_full_runs);
criterion_main!(benches);
