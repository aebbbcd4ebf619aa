//! Switchboard CLI library
//!
//! Thin front end over `switchboard-runtime`: configuration and data-file loading,
//! JSON state files, and the query and traffic commands.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod state;

pub use app::SwitchboardApp;
pub use cli::{Cli, Commands};
pub use config::AppConfig;
pub use error::{CliError, Result};
