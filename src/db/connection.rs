use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, TypeInfo, ValueRef};
use tracing::debug;

use super::{Connector, DbHandle, QueryResult};
use crate::config::ConnectionConfig;
use crate::error::{DbError, DbResult};

/// How long a pooled statement waits for a connection before giving up.
pub const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

/// Connector backed by sqlx's MySQL driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

pub struct MySqlSession {
    conn: MySqlConnection,
}

#[derive(Clone)]
pub struct ConnectionPool {
    pool: MySqlPool,
}

impl ConnectionPool {
    pub fn max_connections(&self) -> u32 {
        self.pool.options().get_max_connections()
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &MySqlPool {
        &self.pool
    }

    /// The pool only reports that it timed out. Dial once more so the caller
    /// sees why, e.g. the refusal or the rejected credentials.
    async fn explain(&self, err: sqlx::Error) -> DbError {
        if !matches!(err, sqlx::Error::PoolTimedOut) {
            return classify(err);
        }
        match self.pool.connect_options().connect().await {
            Err(connect_err) => DbError::connection(connect_err),
            Ok(conn) => {
                let _ = conn.close().await;
                classify(err)
            }
        }
    }
}

fn connect_options(config: &ConnectionConfig, database: Option<&str>) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password);

    match database {
        Some(name) => options.database(name),
        None => options,
    }
}

/// Transport failures surface as connection errors, everything else the server
/// rejected is a statement error.
fn classify(err: sqlx::Error) -> DbError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Configuration(_) => DbError::connection(err),
        other => DbError::statement(other),
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    type Session = MySqlSession;
    type Pool = ConnectionPool;

    async fn connect(
        &self,
        config: &ConnectionConfig,
        database: Option<&str>,
    ) -> DbResult<MySqlSession> {
        debug!(host = %config.host, port = config.port, user = %config.user, "opening connection");
        let conn = connect_options(config, database)
            .connect()
            .await
            .map_err(DbError::connection)?;
        Ok(MySqlSession { conn })
    }

    fn open_pool(&self, config: &ConnectionConfig, max_connections: u32) -> ConnectionPool {
        debug!(database = %config.database, max_connections, "creating pool");
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
            .connect_lazy_with(connect_options(config, Some(&config.database)));
        ConnectionPool { pool }
    }
}

// Plain `&str` statements carry no arguments, so sqlx sends them over the text
// protocol; `USE` cannot be prepared.
#[async_trait]
impl DbHandle for MySqlSession {
    async fn execute(&mut self, sql: &str) -> DbResult<u64> {
        let done = Executor::execute(&mut self.conn, sql)
            .await
            .map_err(classify)?;
        Ok(done.rows_affected())
    }

    async fn fetch_all(&mut self, sql: &str) -> DbResult<QueryResult> {
        let rows = Executor::fetch_all(&mut self.conn, sql)
            .await
            .map_err(classify)?;
        Ok(to_query_result(&rows))
    }

    async fn close(self) -> DbResult<()> {
        self.conn.close().await.map_err(DbError::connection)
    }
}

#[async_trait]
impl DbHandle for ConnectionPool {
    async fn execute(&mut self, sql: &str) -> DbResult<u64> {
        match Executor::execute(&self.pool, sql).await {
            Ok(done) => Ok(done.rows_affected()),
            Err(err) => Err(self.explain(err).await),
        }
    }

    async fn fetch_all(&mut self, sql: &str) -> DbResult<QueryResult> {
        match Executor::fetch_all(&self.pool, sql).await {
            Ok(rows) => Ok(to_query_result(&rows)),
            Err(err) => Err(self.explain(err).await),
        }
    }

    async fn close(self) -> DbResult<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn to_query_result(rows: &[MySqlRow]) -> QueryResult {
    if rows.is_empty() {
        return QueryResult::empty();
    }

    let columns: Vec<String> = rows[0]
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let data: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            (0..columns.len())
                .map(|idx| extract_mysql_value(row, idx))
                .collect()
        })
        .collect();

    QueryResult {
        columns,
        rows: data,
    }
}

fn extract_mysql_value(row: &MySqlRow, idx: usize) -> String {
    let value_ref = row.try_get_raw(idx).ok();

    if let Some(vr) = value_ref {
        if vr.is_null() {
            return "NULL".to_string();
        }

        let type_info = vr.type_info().clone();
        let type_name = type_info.name();

        match type_name {
            "BOOLEAN" => {
                if let Ok(v) = row.try_get::<bool, _>(idx) {
                    return v.to_string();
                }
            }
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                if let Ok(v) = row.try_get::<i64, _>(idx) {
                    return v.to_string();
                }
            }
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => {
                if let Ok(v) = row.try_get::<u64, _>(idx) {
                    return v.to_string();
                }
            }
            "FLOAT" => {
                if let Ok(v) = row.try_get::<f32, _>(idx) {
                    return v.to_string();
                }
            }
            "DOUBLE" => {
                if let Ok(v) = row.try_get::<f64, _>(idx) {
                    return v.to_string();
                }
            }
            "DECIMAL" => {
                if let Ok(v) = row.try_get::<sqlx::types::BigDecimal, _>(idx) {
                    return v.to_string();
                }
            }
            "VARCHAR" | "CHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
                if let Ok(v) = row.try_get::<String, _>(idx) {
                    return v;
                }
            }
            "DATE" => {
                if let Ok(v) = row.try_get::<sqlx::types::chrono::NaiveDate, _>(idx) {
                    return v.to_string();
                }
            }
            "TIME" => {
                if let Ok(v) = row.try_get::<sqlx::types::chrono::NaiveTime, _>(idx) {
                    return v.to_string();
                }
            }
            "DATETIME" | "TIMESTAMP" => {
                if let Ok(v) = row.try_get::<sqlx::types::chrono::NaiveDateTime, _>(idx) {
                    return v.to_string();
                }
            }
            "JSON" => {
                if let Ok(v) = row.try_get::<sqlx::types::JsonValue, _>(idx) {
                    return v.to_string();
                }
            }
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => {
                if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
                    return format!("0x{}", hex::encode(v));
                }
            }
            _ => {}
        }
    }

    row.try_get::<String, _>(idx)
        .or_else(|_| row.try_get::<i64, _>(idx).map(|v| v.to_string()))
        .or_else(|_| row.try_get::<u64, _>(idx).map(|v| v.to_string()))
        .or_else(|_| row.try_get::<f64, _>(idx).map(|v| v.to_string()))
        .or_else(|_| row.try_get::<bool, _>(idx).map(|v| v.to_string()))
        .or_else(|_| {
            row.try_get::<Vec<u8>, _>(idx)
                .map(|v| String::from_utf8_lossy(&v).into_owned())
        })
        .unwrap_or_else(|_| "NULL".to_string())
}
