use std::process::ExitCode;

use anyhow::Result;

use alumni_db::config::{self, ConnectionConfig, PasswordDefault};
use alumni_db::error::{Severity, log_error};
use alumni_db::logging::init_tracing;
use alumni_db::{MySqlConnector, provision};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    config::load_dotenv();
    init_tracing()?;

    let outcome = match ConnectionConfig::from_env(PasswordDefault::Provisioning) {
        Ok(config) => provision::ensure_database_exists(&MySqlConnector, &config).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            log_error(Severity::Fatal, "Failed to create database", &err);
            Ok(ExitCode::FAILURE)
        }
    }
}
