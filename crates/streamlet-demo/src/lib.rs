#![forbid(unsafe_code)]

//! Command-line driver for the course services.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod session;

pub use cli::{Cli, Commands, run, run_from_env};
pub use error::{DemoError, Result};
pub use session::{Session, TransportKind};
