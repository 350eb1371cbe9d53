use crate::store::{TaskStore, TaskUpdate};
use crate::task::{Status, Task};
use clap::{Parser, Subcommand};
use std::io::Write;

pub const USAGE: &str = "Invalid command. Supported commands: add, update, delete, mark-in-progress, mark-done, list, list-status.";

#[derive(Parser, Debug)]
#[command(name = "task-cli", version, about = "Track tasks from the command line")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// Arguments are optional here so a missing one gets a friendly message
// instead of a clap error.
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Add a task; all words form the description
    Add {
        #[arg(allow_hyphen_values = true)]
        description: Vec<String>,
    },
    /// Change a task's description and/or status
    ///
    /// A trailing "done" or "in progress" is taken as the new status.
    Update {
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,
        #[arg(allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Delete a task; words after the ID are ignored
    Delete {
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Mark a task as in progress; words after the ID are ignored
    MarkInProgress {
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Mark a task as done; words after the ID are ignored
    MarkDone {
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List all tasks
    List,
    /// List tasks with the given status, e.g. `list-status in progress`
    ListStatus {
        #[arg(allow_hyphen_values = true)]
        status: Vec<String>,
    },
}

fn first(args: Vec<String>) -> Option<String> {
    args.into_iter().next()
}

/// Splits `update` words into a description and a status.
///
/// The last word is taken as the status when it is "done" or "in progress"
/// (any case). A description that really ends in one of those words loses it.
pub fn split_update_words(mut words: Vec<String>) -> (Option<String>, Option<Status>) {
    let status = match words.last().map(|word| word.to_lowercase()) {
        Some(last) if last == "done" => Some(Status::Done),
        Some(last) if last == "in progress" => Some(Status::InProgress),
        _ => None,
    };
    if status.is_some() {
        words.pop();
    }

    let description = words.join(" ");
    let description = (!description.is_empty()).then_some(description);
    (description, status)
}

fn parse_id(raw: &str) -> Option<u32> {
    raw.trim().parse().ok().filter(|id| *id > 0)
}

fn not_found(out: &mut impl Write, raw_id: &str) -> anyhow::Result<()> {
    writeln!(out, "Task with ID {} not found.", raw_id)?;
    Ok(())
}

fn print_tasks(out: &mut impl Write, tasks: &[Task]) -> anyhow::Result<()> {
    for task in tasks {
        writeln!(out, "{}", task)?;
    }
    Ok(())
}

/// Runs one command against `store`, writing user-facing messages to `out`.
pub fn run(store: &TaskStore, command: Commands, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Commands::Add { description } => {
            let description = description.join(" ");
            match store.add(&description)? {
                Some(task) => writeln!(out, "Task added with ID {}", task.id())?,
                None => writeln!(out, "Please provide a description for the task.")?,
            }
        }
        Commands::Update { id, words } => {
            let (description, status) = split_update_words(words);
            let update = TaskUpdate {
                description,
                status,
            };
            let Some(raw_id) = id.filter(|_| !update.is_empty()) else {
                writeln!(
                    out,
                    "Please provide both the task ID and a new description or status."
                )?;
                return Ok(());
            };
            let updated = match parse_id(&raw_id) {
                Some(id) => store.update(id, update)?,
                None => None,
            };
            match updated {
                Some(task) => writeln!(out, "Task with ID {} updated successfully!", task.id())?,
                None => not_found(out, &raw_id)?,
            }
        }
        Commands::Delete { args } => {
            let Some(raw_id) = first(args) else {
                writeln!(out, "Please provide the task ID to delete.")?;
                return Ok(());
            };
            let deleted = match parse_id(&raw_id) {
                Some(id) => store.delete(id)?,
                None => None,
            };
            match deleted {
                Some(task) => writeln!(out, "Task with ID {} deleted successfully!", task.id())?,
                None => not_found(out, &raw_id)?,
            }
        }
        Commands::MarkInProgress { args } => mark(store, first(args), Status::InProgress, out)?,
        Commands::MarkDone { args } => mark(store, first(args), Status::Done, out)?,
        Commands::List => {
            let tasks = store.list_all()?;
            if tasks.is_empty() {
                writeln!(out, "No tasks found.")?;
            } else {
                writeln!(out, "All tasks:")?;
                print_tasks(out, &tasks)?;
            }
        }
        Commands::ListStatus { status } => {
            let status = status.join(" ");
            if status.is_empty() {
                writeln!(
                    out,
                    "Please provide a status (\"todo\", \"in-progress\", \"done\")."
                )?;
                return Ok(());
            }
            let tasks = store.list_by_status(&status)?;
            if tasks.is_empty() {
                writeln!(out, "No tasks are {}.", status)?;
            } else {
                writeln!(out, "Tasks with status \"{}\":", status)?;
                print_tasks(out, &tasks)?;
            }
        }
    }
    Ok(())
}

fn mark(
    store: &TaskStore,
    id: Option<String>,
    status: Status,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let Some(raw_id) = id else {
        writeln!(out, "Please provide the task ID to mark as {}.", status)?;
        return Ok(());
    };
    let updated = match parse_id(&raw_id) {
        Some(id) => store.update(id, TaskUpdate::status(status))?,
        None => None,
    };
    match updated {
        Some(task) => writeln!(out, "Task with ID {} marked as {}.", task.id(), status)?,
        None => not_found(out, &raw_id)?,
    }
    Ok(())
}
