//! CLI interface for Gatehouse

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(version = "0.1.0")]
#[command(about = "Tiered request authentication and session management", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new gatehouse.toml configuration file
    Init,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "4280")]
        port: u16,
    },

    /// Hash a password for a user directory entry
    HashPassword {
        /// The password to hash
        password: String,
    },

    /// List configured users
    Users {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
