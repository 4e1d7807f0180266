use std::{
    io::{self, IsTerminal, Read},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use quill_core::{init_tracing, PlayerSpawn, QuillConfig, QuillRuntime};
use quill_repl::{
    message::{render_error, render_report, MessageParser, DEFAULT_MAX_LOG_LINES},
    repl::{commands::parse_spawn, LineProcessResult, MultiLineCollector, Repl, ReplCommand},
    run_files,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("quill")
        .version(quill_core::VERSION)
        .about("Run Quill scripts against a simulated game server, or explore them interactively")
        .arg(
            Arg::new("files")
                .value_name("FILE")
                .help("Script files to run; starts the REPL when none are given")
                .num_args(0..)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("message")
                .long("message")
                .help("Read a chat message with a ``` code block from stdin and run it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("player")
                .long("player")
                .value_name("\"NAME [X Y Z]\"")
                .help("Spawn a player before running (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("max-iterations")
                .long("max-iterations")
                .value_name("N")
                .help("Iterations a single loop may run")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("loop-timeout-ms")
                .long("loop-timeout-ms")
                .value_name("MS")
                .help("Milliseconds a single loop may run")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("budget-ms")
                .long("budget-ms")
                .value_name("MS")
                .help("Wall-clock budget for a whole run")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .help("Seed for random() and random_choice()")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("max-log-lines")
                .long("max-log-lines")
                .value_name("N")
                .help("Log lines shown per run before the rest are summarised")
                .default_value("20")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print run results as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug mode")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let debug = matches.get_flag("debug");
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("quill_core=debug,quill_repl=debug"))
            .init();
    } else {
        init_tracing();
    }

    let config = config_from(&matches, debug);
    let players = players_from(&matches)?;
    let max_log_lines = matches
        .get_one::<usize>("max-log-lines")
        .copied()
        .unwrap_or(DEFAULT_MAX_LOG_LINES);
    let json = matches.get_flag("json");
    let files: Vec<PathBuf> = matches
        .get_many::<PathBuf>("files")
        .map(|files| files.cloned().collect())
        .unwrap_or_default();

    if matches.get_flag("message") {
        return run_message(config, players, max_log_lines, json);
    }

    if !files.is_empty() {
        return run_batch(config, files, &players, max_log_lines, json).await;
    }

    println!("Quill REPL v{}", quill_core::VERSION);
    if debug {
        println!("Debug mode: enabled");
    }
    println!("Type .help for help, .quit to exit");
    println!();

    let mut repl = Repl::new(config)?;
    for spawn in players {
        match repl.handle_command(ReplCommand::SpawnPlayer(spawn)) {
            Ok(msg) => repl.notifier().on_output(&msg),
            Err(e) => repl.notifier().on_error(&format!("Error: {e}")),
        }
    }
    flush_logs(&mut repl);
    run_repl(&mut repl)
}

fn config_from(matches: &ArgMatches, debug: bool) -> QuillConfig {
    let mut config = QuillConfig {
        debug,
        run_budget_millis: matches.get_one::<u64>("budget-ms").copied(),
        rng_seed: matches.get_one::<u64>("seed").copied(),
        ..QuillConfig::default()
    };
    if let Some(max) = matches.get_one::<usize>("max-iterations") {
        config.max_loop_iterations = *max;
    }
    if let Some(millis) = matches.get_one::<u64>("loop-timeout-ms") {
        config.max_loop_millis = *millis;
    }
    config
}

fn players_from(matches: &ArgMatches) -> Result<Vec<PlayerSpawn>> {
    matches
        .get_many::<String>("player")
        .into_iter()
        .flatten()
        .map(|arg| {
            let parts: Vec<&str> = arg.split_whitespace().collect();
            parse_spawn(&parts).with_context(|| format!("invalid --player '{arg}'"))
        })
        .collect()
}

/// Chat-message mode: stdin holds one message
fn run_message(config: QuillConfig, players: Vec<PlayerSpawn>, max_log_lines: usize, json: bool) -> Result<()> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("failed to read message from stdin")?;

    let parser = MessageParser::new()?;
    let mut request = parser.parse_message(&text)?;
    for spawn in players {
        if !request.players.iter().any(|p| p.name == spawn.name) {
            request.players.push(spawn);
        }
    }

    match QuillRuntime::new(config).run(&request) {
        Ok(report) if json => println!("{}", serde_json::to_string_pretty(&report)?),
        Ok(report) => print!("{}", render_report(&report, Some(max_log_lines))),
        Err(error) => {
            eprint!("{}", render_error(&error));
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn run_batch(
    config: QuillConfig,
    files: Vec<PathBuf>,
    players: &[PlayerSpawn],
    max_log_lines: usize,
    json: bool,
) -> Result<()> {
    let runtime = QuillRuntime::new(config);
    let parser = MessageParser::new()?;
    let results = run_files(&runtime, &parser, files, players).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            println!("{}", result.render(Some(max_log_lines)));
        }
    }

    if results.iter().any(|r| !r.is_success()) {
        std::process::exit(1);
    }
    Ok(())
}

fn flush_logs(repl: &mut Repl) {
    for line in repl.take_new_logs() {
        repl.notifier().on_log(&line);
    }
}

fn report_result(repl: &mut Repl, result: Result<(String, u64)>) {
    flush_logs(repl);
    match result {
        Ok((output, duration)) => repl.notifier().on_result(&output, duration, repl.is_quiet()),
        Err(e) => repl.notifier().on_error(&format!("Error: {e}")),
    }
}

fn run_repl(repl: &mut Repl) -> Result<()> {
    use rustyline::{error::ReadlineError, DefaultEditor};

    let mut rl = DefaultEditor::new()?;
    let mut multiline = MultiLineCollector::new();

    let is_interactive = io::stdin().is_terminal();
    let mut in_eval_mode = false;
    let mut eval_buffer = String::new();

    while repl.is_running() {
        let prompt = if in_eval_mode { ">> " } else { multiline.get_prompt() };

        match rl.readline(prompt) {
            Ok(line) => {
                if in_eval_mode {
                    if line.trim() == "." {
                        rl.add_history_entry(&eval_buffer)?;

                        if !is_interactive {
                            println!(">> .eval");
                            for eval_line in eval_buffer.lines() {
                                println!(">> {eval_line}");
                            }
                            println!(">> .");
                        }

                        let result = repl.execute(&eval_buffer);
                        report_result(repl, result);

                        eval_buffer.clear();
                        in_eval_mode = false;
                    } else {
                        if !eval_buffer.is_empty() {
                            eval_buffer.push('\n');
                        }
                        eval_buffer.push_str(&line);
                    }
                    continue;
                }

                let trimmed = line.trim();
                if trimmed.is_empty() && !multiline.is_collecting() {
                    continue;
                }

                if trimmed == ".eval" {
                    in_eval_mode = true;
                    repl.notifier()
                        .on_output("Entering eval mode. End with '.' on a line by itself.");
                    continue;
                }

                if trimmed.starts_with('.') && !multiline.is_collecting() {
                    rl.add_history_entry(&line)?;
                    match repl.parse_input(trimmed).and_then(|command| repl.handle_command(command)) {
                        Ok(output) => repl.notifier().on_output(&output),
                        Err(e) => repl.notifier().on_error(&format!("Error: {e}")),
                    }
                    flush_logs(repl);
                    continue;
                }

                match multiline.process_line(&line) {
                    LineProcessResult::Complete(code) => {
                        rl.add_history_entry(&code)?;
                        if !is_interactive {
                            println!(">> {code}");
                        }
                        let result = repl.execute(&code);
                        report_result(repl, result);
                    }
                    LineProcessResult::NeedMore => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                if in_eval_mode {
                    println!("^C");
                    eval_buffer.clear();
                    in_eval_mode = false;
                } else if multiline.is_collecting() {
                    println!("^C");
                    multiline.reset();
                } else {
                    println!("Use .quit to exit");
                }
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    repl.show_exit_stats();

    Ok(())
}
