//! # Bites Node
//!
//! Process wiring for the `bites-node` binary: command line parsing,
//! configuration loading, logging setup, and the three run modes.
//!
//! | Mode | Bus | Components |
//! |------|-----|------------|
//! | `storage` | NATS | storage service |
//! | `gateway` | NATS | HTTP gateway |
//! | `standalone` | in-process, or none with `--direct` | both |

pub mod cli;
pub mod config;
pub mod logging;
pub mod run;

pub use cli::{Cli, Command};
pub use config::{ConfigError, LogFormat, NodeConfig, Overrides};
