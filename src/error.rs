use thiserror::Error;
use tracing::{error, warn};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Statement(String),
}

impl DbError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn connection(err: impl std::fmt::Display) -> Self {
        Self::Connection(err.to_string())
    }

    pub fn statement(err: impl std::fmt::Display) -> Self {
        Self::Statement(err.to_string())
    }
}

/// How far an error is allowed to travel.
///
/// Fatal errors abort the tool with a non-zero exit status. Advisory errors are
/// logged where they happen and go no further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Advisory,
}

/// Logs `err` at the level matching `severity`.
pub fn log_error(severity: Severity, context: &str, err: &DbError) {
    match severity {
        Severity::Fatal => error!("{context}: {err}"),
        Severity::Advisory => warn!("{context}: {err}"),
    }
}

/// Downgrades a failed result to an advisory log line.
pub fn advisory<T>(result: DbResult<T>, context: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log_error(Severity::Advisory, context, &err);
            None
        }
    }
}
