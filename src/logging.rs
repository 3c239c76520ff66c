//! Console logging for the tools.
//!
//! `RUST_LOG` controls the filter (default: info). Logs go to stderr so that
//! stdout only carries report output.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
