//! Command-line front end over the task store.
//!
//! # Responsibility
//! - Verify `mytasks_core` linkage (`ping`).
//! - Drive the same store the mobile host uses, for local sanity checks.
//!
//! Terminals have no local notification support, so reminders are disabled.

use clap::{Parser, Subcommand};
use mytasks_core::db::open_db;
use mytasks_core::{
    core_version, init_logging, ping, CoreConfig, DisabledNotifier, Priority,
    SqliteSnapshotRepository, Task, TaskId, TaskStore,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mytasks", version, about = "Manage the MyTasks task list")]
struct Cli {
    /// Snapshot database file.
    #[arg(long, env = "MYTASKS_DB_PATH")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files.
    #[arg(long)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core linkage info.
    Ping,
    /// Add a task.
    Add {
        text: String,
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,
    },
    /// List tasks in presentation order.
    List,
    /// Flip completion of a task.
    Toggle { id: TaskId },
    /// Replace text and priority of a task.
    Edit {
        id: TaskId,
        text: String,
        #[arg(short, long, value_parser = parse_priority, default_value = "medium")]
        priority: Priority,
    },
    /// Delete a task.
    Delete { id: TaskId },
    /// Show pending/completed counters.
    Stats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir).map_err(|err| err.to_string())?;
    }

    if let Command::Ping = cli.command {
        println!("mytasks_core ping={}", ping());
        println!("mytasks_core version={}", core_version());
        return Ok(());
    }

    let db_path = cli.db.unwrap_or_else(|| config.db_path.clone());
    let conn = open_db(&db_path)
        .map_err(|err| format!("failed to open {}: {err}", db_path.display()))?;
    let mut store = TaskStore::open(
        SqliteSnapshotRepository::new(conn),
        DisabledNotifier,
        config.reminder_policy(),
    );

    match cli.command {
        Command::Ping => {}
        Command::Add { text, priority } => {
            let task = store.add(&text, priority).map_err(|err| err.to_string())?;
            println!("added {}", format_task(&task));
        }
        Command::List => {
            for task in store.sorted_view() {
                println!("{}", format_task(&task));
            }
        }
        Command::Toggle { id } => {
            let task = store.toggle_completion(id).map_err(|err| err.to_string())?;
            println!("updated {}", format_task(&task));
        }
        Command::Edit { id, text, priority } => {
            let task = store.edit(id, &text, priority).map_err(|err| err.to_string())?;
            println!("updated {}", format_task(&task));
        }
        Command::Delete { id } => {
            store.delete(id).map_err(|err| err.to_string())?;
            println!("deleted {id}");
        }
        Command::Stats => {
            let stats = store.stats();
            println!(
                "total={} pending={} completed={}",
                stats.total, stats.pending, stats.completed
            );
        }
    }
    Ok(())
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    Priority::parse(raw).ok_or_else(|| format!("expected high|medium|low, got `{raw}`"))
}

fn format_task(task: &Task) -> String {
    format!(
        "[{}] #{} {:<6} {}",
        if task.completed { "x" } else { " " },
        task.id,
        task.priority.as_str(),
        task.text
    )
}
