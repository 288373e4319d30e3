use crate::core::Filter;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Single-user task list")]
#[command(version)]
pub struct Cli {
    /// Database file (defaults to $TODO_DB, then the platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks, active first
    List {
        /// Which tasks to show
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Add a new task
    Add {
        /// Task title
        title: String,
    },

    /// Change a task's title
    Edit {
        /// Task ID or unique prefix
        id: String,
        /// New title
        title: String,
    },

    /// Mark a task done, or active again
    Toggle {
        /// Task ID or unique prefix
        id: String,
    },

    /// Delete a task
    Delete {
        /// Task ID or unique prefix
        id: String,
    },

    /// Print the database location
    Path,
}
