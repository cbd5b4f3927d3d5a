//! Command line interface

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{LogFormat, Overrides};

#[derive(Debug, Parser)]
#[command(name = "bites-node", about = "Time-ordered segment store behind a message bus")]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Console log format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the storage service on NATS
    Storage {
        /// Database file
        #[arg(long)]
        db_path: Option<PathBuf>,
        /// NATS server URL
        #[arg(long)]
        nats: Option<String>,
    },
    /// Run the HTTP gateway on NATS
    Gateway {
        /// HTTP listen address
        #[arg(long)]
        listen: Option<SocketAddr>,
        /// NATS server URL
        #[arg(long)]
        nats: Option<String>,
    },
    /// Run storage and gateway in one process
    Standalone {
        /// HTTP listen address
        #[arg(long)]
        listen: Option<SocketAddr>,
        /// Database file
        #[arg(long)]
        db_path: Option<PathBuf>,
        /// Call the store directly instead of going through an in-process bus
        #[arg(long)]
        direct: bool,
    },
}

impl Cli {
    /// Collect the flags that override configuration file values
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            log_level: self.log_level.clone(),
            log_format: self.log_format,
            ..Default::default()
        };
        match &self.command {
            Command::Storage { db_path, nats } => {
                overrides.db_path = db_path.clone();
                overrides.nats_url = nats.clone();
            }
            Command::Gateway { listen, nats } => {
                overrides.listen = *listen;
                overrides.nats_url = nats.clone();
            }
            Command::Standalone {
                listen, db_path, ..
            } => {
                overrides.listen = *listen;
                overrides.db_path = db_path.clone();
            }
        }
        overrides
    }
}
