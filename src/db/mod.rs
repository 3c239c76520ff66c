mod connection;

pub use connection::*;

use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::error::DbResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self {
            columns: vec![],
            rows: vec![],
        }
    }

    /// Values of the first column, e.g. the names from `SHOW TABLES`.
    pub fn first_column(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.first().cloned())
            .collect()
    }
}

/// A live handle that statements can be sent over: one connection or a pool.
///
/// `close` consumes the handle, so a handle is released at most once.
#[async_trait]
pub trait DbHandle: Send + Sized {
    async fn execute(&mut self, sql: &str) -> DbResult<u64>;

    async fn fetch_all(&mut self, sql: &str) -> DbResult<QueryResult>;

    async fn close(self) -> DbResult<()>;
}

/// Opens handles against a server.
#[async_trait]
pub trait Connector: Sync {
    type Session: DbHandle;
    type Pool: DbHandle;

    /// Opens an ad-hoc connection. `database` of `None` selects no database.
    async fn connect(
        &self,
        config: &ConnectionConfig,
        database: Option<&str>,
    ) -> DbResult<Self::Session>;

    /// Builds a pool over `config.database` holding at most `max_connections`.
    /// Nothing is dialed until the first statement.
    fn open_pool(&self, config: &ConnectionConfig, max_connections: u32) -> Self::Pool;
}

/// Backtick-quotes a MySQL identifier.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_identifier() {
        assert_eq!(quote_identifier("alumni_db"), "`alumni_db`");
    }

    #[test]
    fn doubles_embedded_backticks() {
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn first_column_skips_empty_rows() {
        let result = QueryResult {
            columns: vec!["Tables_in_alumni_db".into()],
            rows: vec![vec!["alumni".into()], vec![], vec!["events".into()]],
        };
        assert_eq!(result.first_column(), vec!["alumni", "events"]);
    }
}
