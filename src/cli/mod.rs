//! CLI module - Command-line interface for the helpdesk
//!
//! `serve` and `init` act on the local install; every other command talks to
//! a running server through [`crate::client::HelpdeskClient`].

mod commands;

use clap::{Args, Parser, Subcommand};

/// Helpdesk - support ticket tracker
#[derive(Parser)]
#[command(name = "helpdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where and as whom remote commands run.
#[derive(Args, Debug, Clone)]
pub struct Remote {
    /// Base URL of the helpdesk server
    #[arg(long, env = "HELPDESK_SERVER", default_value = "http://localhost:5000")]
    pub server: String,

    /// API token printed by `register` or `login`
    #[arg(long, env = "HELPDESK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create an account and print its token
    Register {
        name: String,
        email: String,
        password: String,
        #[command(flatten)]
        remote: Remote,
    },

    /// Log in and print the account token
    Login {
        email: String,
        password: String,
        #[command(flatten)]
        remote: Remote,
    },

    /// Show the account behind the token
    Whoami {
        #[command(flatten)]
        remote: Remote,
    },

    /// Change the account password
    Passwd {
        current_password: String,
        new_password: String,
        #[command(flatten)]
        remote: Remote,
    },

    /// Replace the account token and print the new one
    RotateKey {
        #[command(flatten)]
        remote: Remote,
    },

    /// Manage tickets
    #[command(alias = "t")]
    Tickets {
        #[command(subcommand)]
        command: TicketCommands,
        #[command(flatten)]
        remote: Remote,
    },

    /// Read and add ticket notes
    #[command(alias = "n")]
    Notes {
        #[command(subcommand)]
        command: NoteCommands,
        #[command(flatten)]
        remote: Remote,
    },
}

#[derive(Subcommand)]
pub enum TicketCommands {
    /// List your tickets
    #[command(alias = "ls")]
    List,
    /// Show one ticket
    Show { id: i32 },
    /// File a new ticket
    Create {
        /// One of: WHSIA, "Pik TV", HSIA, "Smart Hub"
        product: String,
        #[arg(required = true)]
        description: Vec<String>,
    },
    /// Close a ticket
    Close { id: i32 },
    /// Delete a ticket and its notes
    #[command(alias = "rm")]
    Delete { id: i32 },
}

#[derive(Subcommand)]
pub enum NoteCommands {
    /// List the notes of a ticket
    #[command(alias = "ls")]
    List { ticket_id: i32 },
    /// Add a note to a ticket
    Add {
        ticket_id: i32,
        #[arg(required = true)]
        text: Vec<String>,
    },
}

pub use commands::*;
