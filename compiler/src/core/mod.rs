//! Binary infrastructure: CLI, configuration and constants

pub mod cli;
pub mod config;
pub mod constants;

pub use crate::app::CoreApp;
pub use cli::{CliConfig, Commands};
pub use config::CompilerConfig;
