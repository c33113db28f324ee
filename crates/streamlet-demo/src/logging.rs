//! Log output for the command line: human-readable lines on stderr.

use tracing_subscriber::EnvFilter;

use crate::error::{DemoError, Result};

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|err| DemoError::invalid(format!("log filter {default_filter:?}: {err}")))?,
    };
    // A second installation (tests calling `run` twice) keeps the first.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
}
