use std::{
    io::{self, BufRead, IsTerminal, Write},
    path::PathBuf,
};

use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use daybook::{
    config::{Config, ConfigOverrides},
    models::{
        confirmation::ConfirmationGate,
        date::{DateKey, format_date_label},
        store::TaskStore,
        task::TaskTime,
    },
    services::{
        confirmation::{cancel_pending, confirm_pending},
        tasks::{
            AddTaskParameters, RemoveDayParameters, RemoveTaskParameters, ToggleTaskParameters,
            add_task, request_remove_day, request_remove_task, toggle_task,
        },
    },
    storage::{json::JsonFileStorage, load_store},
    ui,
};

#[derive(Parser)]
#[command(name = "daybook", about = "Plan your days, one task at a time")]
struct Cli {
    /// Storage file to use instead of the default one
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Language for labels and prompts (en, it)
    #[arg(long, global = true)]
    locale: Option<String>,

    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every planned day
    List,

    /// Plan a new task
    Add {
        /// What to do
        text: String,

        /// Day of the task (YYYY-MM-DD)
        #[arg(short, long)]
        date: DateKey,

        /// Time of day (HH:MM)
        #[arg(short, long)]
        time: Option<TaskTime>,
    },

    /// Mark a task as done, or as not done again
    Done {
        /// Day of the task (YYYY-MM-DD)
        date: DateKey,
        /// Task number as shown by `list`
        number: usize,
    },

    /// Delete a task
    Rm {
        /// Day of the task (YYYY-MM-DD)
        date: DateKey,
        /// Task number as shown by `list`
        number: usize,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every task of a day
    Clear {
        /// Day to clear (YYYY-MM-DD)
        date: DateKey,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

fn init_tracing(verbose: u8, quiet: u8) {
    let default_level = if quiet >= 2 {
        "off"
    } else if quiet == 1 {
        "error"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }
}

/// Converts a 1-based task number into a store index
fn task_index(store: &TaskStore, date: DateKey, number: usize) -> usize {
    match number.checked_sub(1) {
        Some(index) if store.task(date, index).is_some() => index,
        _ => {
            eprintln!("Error: No task #{} on {}", number, date);
            std::process::exit(1);
        }
    }
}

/// Asks the user to approve the pending action on stdin
fn ask(message: &str) -> bool {
    print!("{} {} ", message.yellow(), "[y/N]".dimmed());
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sì"),
        Err(_) => false,
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = match Config::load(ConfigOverrides {
        store_path: cli.store,
        locale: cli.locale,
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Create parent directory if it doesn't exist
    if let Some(parent) = config.store_path.parent() {
        std::fs::create_dir_all(parent).unwrap_or_else(|e| {
            eprintln!("Error: Failed to create data directory: {}", e);
            std::process::exit(1);
        });
    }

    let storage =
        JsonFileStorage::new(config.store_path.clone()).with_backup_limit(config.backup_limit);
    info!(store = %storage.path().display(), "opening store");

    let mut store = match load_store(&storage) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: Failed to load tasks: {}", e);
            std::process::exit(1);
        }
    };
    let mut gate = ConfirmationGate::new();
    let locale = config.locale;

    match cli.command.unwrap_or(Commands::List) {
        Commands::List => ui::render_store(&store, locale),
        Commands::Add { text, date, time } => {
            let params = AddTaskParameters {
                date: date.to_string(),
                text,
                time,
            };
            match add_task(&mut store, &storage, params) {
                Ok(Some(task)) => {
                    println!(
                        "{} {} {}",
                        "Added".green(),
                        task.text.bold(),
                        format!("({})", format_date_label(date, task.time, locale)).dimmed()
                    );
                }
                Ok(None) => {
                    eprintln!("Error: Task text cannot be empty");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: Failed to save task: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Done { date, number } => {
            let index = task_index(&store, date, number);
            let params = ToggleTaskParameters { date, index };
            match toggle_task(&mut store, &storage, params) {
                Ok(Some(task)) if task.completed => {
                    println!("{} {}", "Completed".green(), task.text.dimmed());
                }
                Ok(Some(task)) => println!("{} {}", "Reopened".yellow(), task.text.bold()),
                Ok(None) => {
                    eprintln!("Error: No task #{} on {}", number, date);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: Failed to save task: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Rm { date, number, yes } => {
            let index = task_index(&store, date, number);
            request_remove_task(&mut gate, locale, RemoveTaskParameters { date, index });
            resolve_pending(&mut store, &mut gate, &storage, yes);
        }
        Commands::Clear { date, yes } => {
            if store.tasks(date).is_none() {
                println!("Nothing planned on {}", format_date_label(date, None, locale));
                return;
            }
            request_remove_day(&mut gate, locale, RemoveDayParameters { date });
            resolve_pending(&mut store, &mut gate, &storage, yes);
        }
    }
}

fn resolve_pending(
    store: &mut TaskStore,
    gate: &mut ConfirmationGate,
    storage: &JsonFileStorage,
    assume_yes: bool,
) {
    let Some(pending) = gate.pending() else {
        return;
    };

    if assume_yes || ask(&pending.message) {
        match confirm_pending(store, gate, storage) {
            Ok(_) => println!("{}", "Deleted".red()),
            Err(e) => {
                eprintln!("Error: Failed to delete: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        cancel_pending(gate);
        println!("Cancelled");
    }
}
