//! Command-line interface for deck
//!
//! This module defines the CLI structure using clap derive macros.
//! Subcommand implementations live in their own submodules.

use clap::{Parser, Subcommand};

use crate::api::HttpTaskApi;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputOptions;

mod board;
mod task;

/// deck - kanban task board client
///
/// A terminal client for a kanban task service: an interactive board with
/// drag-and-drop ordering, plus scriptable task commands.
#[derive(Parser, Debug)]
#[command(name = "deck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base URL of the task service (overrides deck.toml)
    #[arg(long, global = true, env = "DECK_API_URL")]
    pub api_url: Option<String>,

    /// Directory containing deck.toml (defaults to current directory)
    #[arg(long, global = true, env = "DECK_CONFIG_DIR")]
    pub config_dir: Option<std::path::PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive board
    Board,

    /// List tasks
    Ls {
        /// Column to list: backlog, in_progress, review, done (default: all)
        column: Option<String>,

        /// Filter by a title/description search term
        #[arg(long)]
        search: Option<String>,
    },

    /// Create a task
    Add {
        /// Task title
        title: String,

        /// Task description
        #[arg(long, default_value = "")]
        description: String,

        /// Column to create the task in
        #[arg(long, default_value = "backlog")]
        column: String,

        /// Priority: low, medium, hard
        #[arg(long, default_value = "medium")]
        priority: String,

        /// Insert at the bottom of the column instead of the top
        #[arg(long)]
        bottom: bool,
    },

    /// Edit a task's fields
    Edit {
        /// Task id
        id: i64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New column
        #[arg(long)]
        column: Option<String>,

        /// New priority
        #[arg(long)]
        priority: Option<String>,
    },

    /// Move a task within or across columns
    Mv {
        /// Task id
        id: i64,

        /// Destination column (default: the task's current column)
        #[arg(long)]
        column: Option<String>,

        /// Place the task just before this task id
        #[arg(long)]
        before: Option<i64>,
    },

    /// Delete a task
    Rm {
        /// Task id
        id: i64,
    },
}

fn block_on<T>(future: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    tokio::runtime::Runtime::new()?.block_on(future)
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let dir = match self.config_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let mut config = Config::load_from_dir(&dir)?;
        if let Some(url) = self.api_url {
            config.api.base_url = url;
        }
        let options = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Board => board::run(config),
            Commands::Ls { column, search } => {
                let column = column.as_deref().map(task::parse_column).transpose()?;
                let api = HttpTaskApi::new(&config.api)?;
                block_on(task::run_ls(
                    &api,
                    options,
                    &config,
                    column,
                    search.as_deref().unwrap_or(""),
                ))
            }
            Commands::Add {
                title,
                description,
                column,
                priority,
                bottom,
            } => {
                let column = task::parse_column(&column)?;
                let priority = task::parse_priority(&priority)?;
                let api = HttpTaskApi::new(&config.api)?;
                block_on(task::run_add(
                    &api,
                    options,
                    &config,
                    title,
                    description,
                    column,
                    priority,
                    bottom,
                ))
            }
            Commands::Edit {
                id,
                title,
                description,
                column,
                priority,
            } => {
                let column = column.as_deref().map(task::parse_column).transpose()?;
                let priority = priority.as_deref().map(task::parse_priority).transpose()?;
                let api = HttpTaskApi::new(&config.api)?;
                block_on(task::run_edit(
                    &api,
                    options,
                    &config,
                    id,
                    title,
                    description,
                    column,
                    priority,
                ))
            }
            Commands::Mv { id, column, before } => {
                let column = column.as_deref().map(task::parse_column).transpose()?;
                let api = HttpTaskApi::new(&config.api)?;
                block_on(task::run_mv(&api, options, &config, id, column, before))
            }
            Commands::Rm { id } => {
                let api = HttpTaskApi::new(&config.api)?;
                block_on(task::run_rm(&api, options, &config, id))
            }
        }
    }
}
