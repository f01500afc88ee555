//! CLI command definitions for the `todo` binary.
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::format::OutputFormat;
use crate::types::Filter;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    /// Human-readable markdown (default)
    #[default]
    Markdown,
    /// Pretty-printed JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Task list filter flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FilterArg {
    #[default]
    All,
    Completed,
    Pending,
}

impl From<FilterArg> for Filter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => Filter::All,
            FilterArg::Completed => Filter::Completed,
            FilterArg::Pending => Filter::Pending,
        }
    }
}

/// Dark mode action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DarkModeArg {
    On,
    Off,
    Toggle,
}

/// To-do list client
#[derive(Parser, Debug)]
#[command(name = "todo", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (skips the project/user tier search)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// API base URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to the token/preference storage file (overrides config)
    #[arg(short, long, global = true)]
    pub storage: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Markdown, global = true)]
    pub format: FormatArg,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List tasks
    List {
        /// Which tasks to show
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },

    /// Add a task
    Add {
        /// Task title (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },

    /// Toggle a task between pending and completed
    Toggle {
        /// Task id
        id: String,
    },

    /// Change a task's title
    Edit {
        /// Task id
        id: String,

        /// New title (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },

    /// Delete a task
    Delete {
        /// Task id
        id: String,
    },

    /// Obtain and store an access/refresh token pair
    Login(LoginArgs),

    /// Forget the stored tokens
    Logout,

    /// Show session, token expiry and preferences
    Status,

    /// Show or change the dark mode preference
    DarkMode {
        /// on, off or toggle; omit to show the current value
        #[arg(value_enum)]
        mode: Option<DarkModeArg>,
    },
}

/// Arguments for the login subcommand
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account name
    #[arg(short, long)]
    pub username: String,

    /// Password (read from stdin when neither this nor TODO_PASSWORD is set)
    #[arg(short, long, env = "TODO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}
