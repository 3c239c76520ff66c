use std::io;
use std::process::ExitCode;

use anyhow::Result;

use alumni_db::config::{self, ConnectionConfig, PasswordDefault};
use alumni_db::error::{Severity, log_error};
use alumni_db::logging::init_tracing;
use alumni_db::provision::{self, DEFAULT_RECENT_LIMIT};
use alumni_db::MySqlConnector;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    config::load_dotenv();
    init_tracing()?;

    let config = match ConnectionConfig::from_env(PasswordDefault::Empty) {
        Ok(config) => config,
        Err(err) => {
            log_error(Severity::Fatal, "Invalid connection settings", &err);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut stdout = io::stdout().lock();
    provision::print_recent_rows(&MySqlConnector, &config, DEFAULT_RECENT_LIMIT, &mut stdout).await;
    Ok(ExitCode::SUCCESS)
}
