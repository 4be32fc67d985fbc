//! performer-ctl: command-line interface for the task performer.
//!
//! Loads the performer config, builds the dispatcher exactly as a worker
//! would and runs single tasks against it. Logs go to stderr, results to
//! stdout.

use anyhow::{Context, Result};
use performer_core::config::PerformerConfig;
use performer_services::TaskDispatcher;

mod cmd;

const DEFAULT_TASK_ID: &str = "performer-ctl";

fn print_usage() {
    println!("Usage: performer-ctl [--task-id <id>] [--json] <command>");
    println!();
    println!("Commands:");
    println!("  selector               Show the declared signature and its selector");
    println!("  encode <arg>...        Encode arguments into a task payload (hex)");
    println!("  validate <payload>     Validate a hex payload against the interface");
    println!("  execute <payload>      Validate and execute a hex payload");
    println!("  task [<json> | -]      Execute a JSON TaskRequest (argument or stdin)");
    println!("  config                 Show the resolved configuration");
    println!("  config init            Write the default config file if missing");
    println!();
    println!("Options:");
    println!("  --task-id <id>   Task id for validate/execute (default: {})", DEFAULT_TASK_ID);
    println!("  --json           Print responses as JSON");
    println!();
    println!("Environment:");
    println!("  PERFORMER_CONFIG   Config file path");
    println!("  RUST_LOG           Log filter, e.g. info or performer_services=debug");
}

fn load_dispatcher() -> Result<TaskDispatcher> {
    let path = PerformerConfig::file_path();
    tracing::debug!(path = %path.display(), "loading config");
    let config = PerformerConfig::load().context("failed to load config")?;
    let dispatcher = TaskDispatcher::from_config(&config)?;
    tracing::info!(
        signature = %dispatcher.descriptor().signature(),
        selector = %dispatcher.descriptor().selector(),
        strategy = dispatcher.strategy_name(),
        "dispatcher ready"
    );
    Ok(dispatcher)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut opts = cmd::Options {
        task_id: DEFAULT_TASK_ID.to_string(),
        json: false,
    };
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--task-id" => {
                i += 1;
                opts.task_id = args.get(i).context("--task-id requires a value")?.clone();
            }
            "--json" => opts.json = true,
            other => remaining.push(other),
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["config"] => cmd::config::cmd_config_show(),
        ["config", "init"] => cmd::config::cmd_config_init(),
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        ["selector"] => cmd::interface::cmd_selector(&load_dispatcher()?),
        ["encode", values @ ..] => cmd::interface::cmd_encode(&load_dispatcher()?, values),
        ["validate", payload] => cmd::task::cmd_validate(&load_dispatcher()?, &opts, payload),
        ["execute", payload] => cmd::task::cmd_execute(&load_dispatcher()?, &opts, payload),
        ["task"] | ["task", "-"] => cmd::task::cmd_task_stdin(&load_dispatcher()?, &opts),
        ["task", json] => cmd::task::cmd_task(&load_dispatcher()?, &opts, json),
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
