//! Command line interface

pub mod checkpoint;
pub mod error;
pub mod run;

pub use checkpoint::CheckpointAction;
pub use error::CliError;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::settings::Settings;
use crate::shutdown::SharedShutdown;

/// Default settings file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "siem-log-pump.toml";

/// SIEM log pump CLI
#[derive(Parser, Debug)]
#[command(name = "siem-log-pump")]
#[command(
    about = "Pull SIEM audit logs into date-partitioned files and forward them to syslog",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Command to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Settings file
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9000)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Pull logs until shutdown
    Run,

    /// Resolve and print the API base URL for the configured account
    Discover,

    /// Inspect or reset the stream checkpoint
    Checkpoint {
        /// Checkpoint action
        #[command(subcommand)]
        action: CheckpointAction,
    },
}

impl Cli {
    /// Load settings and execute the selected command
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        let settings = Settings::load(&self.config)?;
        match self.command.clone().unwrap_or(Commands::Run) {
            Commands::Run => run::execute_run(&settings, shutdown).await,
            Commands::Discover => run::execute_discover(&settings).await,
            Commands::Checkpoint { action } => action.execute(&settings),
        }
    }
}
