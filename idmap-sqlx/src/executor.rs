//! Instrumented query execution.
//!
//! Every call logs the query text and arguments at debug level before it
//! runs, and logs failures at error level with the same context. Results and
//! errors are returned exactly as the driver produced them; nothing is
//! retried or rewritten.

use std::future::Future;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::config::Driver;
use crate::connection::Connection;
use crate::pool::DbPool;
use crate::row::DbRow;
use crate::types::{Value, args_for_log};

/// Statement execution, as used by bulk loaders.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Driver the statements are written for.
    fn driver(&self) -> Driver;

    /// Execute a statement and return the number of affected rows.
    async fn execute(&self, sql: &str, args: &[Value]) -> Result<u64, sqlx::Error>;
}

impl Connection {
    /// Execute a query and return all rows.
    pub async fn query_many(&self, sql: &str, args: &[Value]) -> Result<Vec<DbRow>, sqlx::Error> {
        self.instrumented(
            "Executing database query",
            sql,
            args,
            fetch_all(&self.pool, sql, args),
            |rows| rows.len() as u64,
        )
        .await
    }

    /// Execute a query that is expected to return exactly one row.
    pub async fn query_one(&self, sql: &str, args: &[Value]) -> Result<DbRow, sqlx::Error> {
        self.instrumented(
            "Executing single row query",
            sql,
            args,
            fetch_one(&self.pool, sql, args),
            |_| 1,
        )
        .await
    }

    /// Execute a statement without returning rows.
    pub async fn execute(&self, sql: &str, args: &[Value]) -> Result<u64, sqlx::Error> {
        self.instrumented(
            "Executing database modification",
            sql,
            args,
            execute(&self.pool, sql, args),
            |affected| *affected,
        )
        .await
    }

    async fn instrumented<T, F>(
        &self,
        message: &'static str,
        sql: &str,
        args: &[Value],
        operation: F,
        rows: impl Fn(&T) -> u64,
    ) -> Result<T, sqlx::Error>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        self.logger
            .instrument(async {
                debug!(query = %sql, args = %args_for_log(args), "{}", message);

                let start = Instant::now();
                let result = operation.await;
                let elapsed_ms = start.elapsed().as_millis() as u64;
                self.stats.record(result.is_ok());

                match &result {
                    Ok(value) => debug!(
                        query = %sql,
                        rows = rows(value),
                        elapsed_ms,
                        "Query completed"
                    ),
                    Err(e) => error!(
                        query = %sql,
                        args = %args_for_log(args),
                        error = %e,
                        elapsed_ms,
                        "Query execution failed"
                    ),
                }
                result
            })
            .await
    }
}

#[async_trait]
impl SqlExecutor for Connection {
    fn driver(&self) -> Driver {
        Connection::driver(self)
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> Result<u64, sqlx::Error> {
        Connection::execute(self, sql, args).await
    }
}

// ==================== Driver Dispatch ====================

async fn fetch_all(pool: &DbPool, sql: &str, args: &[Value]) -> Result<Vec<DbRow>, sqlx::Error> {
    match pool {
        #[cfg(feature = "postgres")]
        DbPool::Postgres(pool) => {
            let rows = bind_pg(sqlx::query(sql), args).fetch_all(pool).await?;
            Ok(rows.into_iter().map(DbRow::Postgres).collect())
        }
        #[cfg(feature = "mysql")]
        DbPool::MySql(pool) => {
            let rows = bind_mysql(sqlx::query(sql), args).fetch_all(pool).await?;
            Ok(rows.into_iter().map(DbRow::MySql).collect())
        }
        #[cfg(feature = "sqlite")]
        DbPool::Sqlite(pool) => {
            let rows = bind_sqlite(sqlx::query(sql), args).fetch_all(pool).await?;
            Ok(rows.into_iter().map(DbRow::Sqlite).collect())
        }
    }
}

async fn fetch_one(pool: &DbPool, sql: &str, args: &[Value]) -> Result<DbRow, sqlx::Error> {
    match pool {
        #[cfg(feature = "postgres")]
        DbPool::Postgres(pool) => {
            let row = bind_pg(sqlx::query(sql), args).fetch_one(pool).await?;
            Ok(DbRow::Postgres(row))
        }
        #[cfg(feature = "mysql")]
        DbPool::MySql(pool) => {
            let row = bind_mysql(sqlx::query(sql), args).fetch_one(pool).await?;
            Ok(DbRow::MySql(row))
        }
        #[cfg(feature = "sqlite")]
        DbPool::Sqlite(pool) => {
            let row = bind_sqlite(sqlx::query(sql), args).fetch_one(pool).await?;
            Ok(DbRow::Sqlite(row))
        }
    }
}

async fn execute(pool: &DbPool, sql: &str, args: &[Value]) -> Result<u64, sqlx::Error> {
    match pool {
        #[cfg(feature = "postgres")]
        DbPool::Postgres(pool) => {
            let result = bind_pg(sqlx::query(sql), args).execute(pool).await?;
            Ok(result.rows_affected())
        }
        #[cfg(feature = "mysql")]
        DbPool::MySql(pool) => {
            let result = bind_mysql(sqlx::query(sql), args).execute(pool).await?;
            Ok(result.rows_affected())
        }
        #[cfg(feature = "sqlite")]
        DbPool::Sqlite(pool) => {
            let result = bind_sqlite(sqlx::query(sql), args).execute(pool).await?;
            Ok(result.rows_affected())
        }
    }
}

// ==================== Parameter Binding Helpers ====================

#[cfg(feature = "postgres")]
fn bind_pg<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    args: &'q [Value],
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    for value in args {
        query = match value {
            Value::String(s) => query.bind(s.as_str()),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Bool(b) => query.bind(*b),
            Value::Null => query.bind(Option::<String>::None),
        };
    }
    query
}

#[cfg(feature = "mysql")]
fn bind_mysql<'q>(
    mut query: sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments>,
    args: &'q [Value],
) -> sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments> {
    for value in args {
        query = match value {
            Value::String(s) => query.bind(s.as_str()),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Bool(b) => query.bind(*b),
            Value::Null => query.bind(Option::<String>::None),
        };
    }
    query
}

#[cfg(feature = "sqlite")]
fn bind_sqlite<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    args: &'q [Value],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    for value in args {
        query = match value {
            Value::String(s) => query.bind(s.as_str()),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Bool(b) => query.bind(*b),
            Value::Null => query.bind(Option::<String>::None),
        };
    }
    query
}
