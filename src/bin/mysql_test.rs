use std::io;
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

    let mut stdout = io::stdout().lock();
    let outcome = match ConnectionConfig::from_env(PasswordDefault::Empty) {
        Ok(config) => provision::run_diagnostic(&MySqlConnector, &config, &mut stdout).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            log_error(Severity::Fatal, "MySQL test failed", &err);
            Ok(ExitCode::FAILURE)
        }
    }
}
