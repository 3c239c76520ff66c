//! The fixed statements the tools run, generic over a [`Connector`].
//!
//! Every routine that acquires a handle releases it before returning, on the
//! error paths as well.

use std::io::Write;

use tracing::{error, info, warn};

use crate::config::ConnectionConfig;
use crate::db::{Connector, DbHandle, QueryResult, quote_identifier};
use crate::error::{DbResult, advisory};
use crate::report;

pub const SHARED_POOL_CONNECTIONS: u32 = 10;
pub const REPORT_POOL_CONNECTIONS: u32 = 5;
pub const DEFAULT_RECENT_LIMIT: u32 = 20;

pub fn create_database_sql(database: &str) -> String {
    format!(
        "CREATE DATABASE IF NOT EXISTS {} CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci",
        quote_identifier(database)
    )
}

pub fn recent_rows_sql(limit: u32) -> String {
    format!(
        "SELECT id, name, login_id, branch, batch, company, LENGTH(image) AS image_len \
         FROM alumni ORDER BY id DESC LIMIT {limit}"
    )
}

/// Releases `handle` and hands back `result`. A release failure is only
/// reported when the work itself succeeded.
async fn release<H: DbHandle, T>(handle: H, result: DbResult<T>) -> DbResult<T> {
    let closed = handle.close().await;
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!("failed to release connection: {close_err}");
            Err(err)
        }
    }
}

/// Creates `config.database` if it is missing.
pub async fn ensure_database_exists<C: Connector>(
    connector: &C,
    config: &ConnectionConfig,
) -> DbResult<()> {
    info!(
        "Connecting to MySQL on {}:{} as {} ...",
        config.host, config.port, config.user
    );
    let mut session = connector.connect(config, None).await?;
    let created = session
        .execute(&create_database_sql(&config.database))
        .await
        .map(|_| ());
    release(session, created).await?;
    info!("Database created (or already exists): {}", config.database);
    Ok(())
}

/// Builds the long-lived pool application code shares. The caller owns it and
/// must close it.
pub fn open_pool<C: Connector>(connector: &C, config: &ConnectionConfig, limit: u32) -> C::Pool {
    connector.open_pool(config, limit)
}

#[derive(Debug)]
pub struct DiagnosticReport {
    pub databases: Vec<String>,
    pub database: String,
    pub tables: DbResult<Vec<String>>,
}

fn write_line(out: &mut impl Write, line: &str) {
    if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
        error!("failed to write output: {e}");
    }
}

/// Lists visible databases, then the tables of `config.database`, printing
/// each list to `out` as soon as it is known.
///
/// Failing to connect or to list databases is an error. Failing to select the
/// target database or list its tables is logged and kept in the report.
pub async fn run_diagnostic<C: Connector>(
    connector: &C,
    config: &ConnectionConfig,
    out: &mut impl Write,
) -> DbResult<DiagnosticReport> {
    info!(
        "Connecting to MySQL at {} user {} port {}",
        config.host, config.user, config.port
    );
    let mut session = connector.connect(config, None).await?;

    let databases = match session.fetch_all("SHOW DATABASES").await {
        Ok(result) => result.first_column(),
        Err(err) => return release(session, Err(err)).await,
    };
    write_line(out, &report::render_name_list("Databases", &databases));

    let tables = list_tables(&mut session, &config.database).await;
    match &tables {
        Ok(names) => {
            let label = format!("Tables in {}", config.database);
            write_line(out, &report::render_name_list(&label, names));
        }
        Err(err) => warn!("Could not USE {}: {}", config.database, err),
    }

    release(
        session,
        Ok(DiagnosticReport {
            databases,
            database: config.database.clone(),
            tables,
        }),
    )
    .await
}

async fn list_tables<H: DbHandle>(session: &mut H, database: &str) -> DbResult<Vec<String>> {
    session
        .execute(&format!("USE {}", quote_identifier(database)))
        .await?;
    let tables = session.fetch_all("SHOW TABLES").await?;
    Ok(tables.first_column())
}

/// Most recent `limit` alumni rows, newest first.
pub async fn fetch_recent_rows<H: DbHandle>(pool: &mut H, limit: u32) -> DbResult<QueryResult> {
    pool.fetch_all(&recent_rows_sql(limit)).await
}

/// Opens a small pool, prints the recent rows as a table and closes the pool.
///
/// Query failures are logged and swallowed. Returns the rows that were printed.
pub async fn print_recent_rows<C: Connector>(
    connector: &C,
    config: &ConnectionConfig,
    limit: u32,
    out: &mut impl Write,
) -> Option<QueryResult> {
    let mut pool = connector.open_pool(config, REPORT_POOL_CONNECTIONS);

    let fetched = advisory(fetch_recent_rows(&mut pool, limit).await, "DB error");
    if let Some(result) = &fetched {
        if let Err(e) = write!(out, "{}", report::render_table(result)) {
            error!("failed to write table: {e}");
        }
    }

    advisory(pool.close().await, "failed to close pool");
    fetched
}
