pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod provision;
pub mod report;

pub use config::{ConnectionConfig, PasswordDefault};
pub use db::{Connector, DbHandle, MySqlConnector, QueryResult};
pub use error::{DbError, DbResult, Severity};
