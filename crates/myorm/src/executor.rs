//! Dual-mode executor: one query/exec surface over a connection pool or an open transaction.
//!
//! An [`Executor`] is created in one of two modes and never changes mode:
//!
//! - **Pooled**: every call checks a connection out of the pool, runs, and returns it.
//! - **Transactional**: every call runs on the single connection reserved by the
//!   transaction. Obtained from [`Executor::begin_transaction`] on a pooled
//!   executor; ended by [`Executor::commit`] or [`Executor::rollback`], which
//!   consume it.
//!
//! Read methods return string-typed values (see [`crate::row`]); write helpers
//! render their SQL through [`crate::qb::statement`].
//!
//! # Example
//!
//! ```ignore
//! use myorm::{Data, Executor, args};
//!
//! let db: Executor = myorm::connect(&config).await?;
//!
//! let name = db.scalar("SELECT name FROM users WHERE id=?", args![1]).await?;
//!
//! let tx = db.begin_transaction().await?;
//! tx.insert("audit", &Data::new().set("event", "rename").set("user_id", 1)).await?;
//! tx.update("users", &Data::new().set("id", 1).set("name", "bob"), &["id"]).await?;
//! tx.commit().await?;
//! ```

use crate::error::{OrmError, OrmResult};
use crate::qb::param::{Data, ParamList};
use crate::qb::statement::{self, Statement};
use crate::qb::table::TableBuilder;
use crate::row::{ColumnMeta, Cursor, DataRow};
use mysql_async::prelude::Queryable;
use mysql_async::{Params, Pool, Row, Transaction, TxOpts};
use tokio::sync::Mutex;

/// Longest SQL text written to log events, in bytes.
const MAX_LOGGED_SQL: usize = 200;

/// Which execution context an [`Executor`] is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorMode {
    Pooled,
    Transactional,
}

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// `LAST_INSERT_ID()` of the statement, when the server reported one.
    pub last_insert_id: Option<u64>,
}

enum Handle {
    Pooled(Pool),
    // Queryable needs `&mut`; the lock lets a shared `&Executor` drive the transaction.
    Transactional(Mutex<Transaction<'static>>),
}

/// Uniform query/exec handle over a pooled connection or an active transaction.
pub struct Executor {
    handle: Handle,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("mode", &self.mode())
            .finish()
    }
}

impl Executor {
    /// Wrap a connection pool.
    pub fn pooled(pool: Pool) -> Self {
        Self {
            handle: Handle::Pooled(pool),
        }
    }

    pub fn mode(&self) -> ExecutorMode {
        match self.handle {
            Handle::Pooled(_) => ExecutorMode::Pooled,
            Handle::Transactional(_) => ExecutorMode::Transactional,
        }
    }

    pub fn is_transactional(&self) -> bool {
        self.mode() == ExecutorMode::Transactional
    }

    /// The underlying pool, for pooled executors.
    pub fn pool(&self) -> Option<&Pool> {
        match &self.handle {
            Handle::Pooled(pool) => Some(pool),
            Handle::Transactional(_) => None,
        }
    }

    /// Start a table query builder scoped to this executor.
    pub fn table(&self, name: &str) -> TableBuilder<'_> {
        TableBuilder::new(self, name)
    }

    // ==================== Transactions ====================

    /// Begin a transaction on a connection reserved from the pool.
    ///
    /// Returns a new, independent transactional executor; `self` is unchanged.
    pub async fn begin_transaction(&self) -> OrmResult<Executor> {
        self.begin_transaction_with(TxOpts::default()).await
    }

    /// Begin a transaction with explicit isolation level / access mode.
    pub async fn begin_transaction_with(&self, opts: TxOpts) -> OrmResult<Executor> {
        match &self.handle {
            Handle::Pooled(pool) => {
                let tx = pool.start_transaction(opts).await?;
                tracing::debug!(target: "myorm.sql", "transaction started");
                Ok(Self {
                    handle: Handle::Transactional(Mutex::new(tx)),
                })
            }
            Handle::Transactional(_) => Err(OrmError::TransactionState(
                "nested transactions are not supported".to_string(),
            )),
        }
    }

    /// Commit and release the reserved connection.
    pub async fn commit(self) -> OrmResult<()> {
        match self.handle {
            Handle::Transactional(tx) => {
                tx.into_inner().commit().await?;
                tracing::debug!(target: "myorm.sql", "transaction committed");
                Ok(())
            }
            Handle::Pooled(_) => Err(OrmError::TransactionState(
                "commit called on a pooled executor".to_string(),
            )),
        }
    }

    /// Roll back and release the reserved connection.
    pub async fn rollback(self) -> OrmResult<()> {
        match self.handle {
            Handle::Transactional(tx) => {
                tx.into_inner().rollback().await?;
                tracing::warn!(target: "myorm.sql", "transaction rolled back");
                Ok(())
            }
            Handle::Pooled(_) => Err(OrmError::TransactionState(
                "rollback called on a pooled executor".to_string(),
            )),
        }
    }

    /// Close every pooled connection. Transactional executors are rolled back.
    pub async fn disconnect(self) -> OrmResult<()> {
        if self.is_transactional() {
            return self.rollback().await;
        }
        if let Handle::Pooled(pool) = self.handle {
            pool.disconnect().await?;
        }
        Ok(())
    }

    // ==================== Low-level ====================

    /// Run a read and return its fully-read cursor.
    pub async fn query(&self, sql: &str, args: impl Into<ParamList>) -> OrmResult<Cursor> {
        let params = args.into();
        log_sql(self.mode(), sql, params.len());

        match &self.handle {
            Handle::Pooled(pool) => {
                let mut conn = pool.get_conn().await?;
                fetch_on(&mut conn, sql, params).await
            }
            Handle::Transactional(tx) => {
                let mut tx = tx.lock().await;
                fetch_on(&mut *tx, sql, params).await
            }
        }
    }

    /// Run a write (INSERT/UPDATE/DELETE/DDL).
    pub async fn exec(&self, sql: &str, args: impl Into<ParamList>) -> OrmResult<ExecResult> {
        let params = args.into();
        log_sql(self.mode(), sql, params.len());

        match &self.handle {
            Handle::Pooled(pool) => {
                let mut conn = pool.get_conn().await?;
                exec_on(&mut conn, sql, params).await
            }
            Handle::Transactional(tx) => {
                let mut tx = tx.lock().await;
                exec_on(&mut *tx, sql, params).await
            }
        }
    }

    /// Run a rendered statement.
    pub async fn exec_statement(&self, stmt: Statement) -> OrmResult<ExecResult> {
        self.exec(&stmt.sql, stmt.params).await
    }

    // ==================== Reads ====================

    /// First column of the first row.
    ///
    /// Returns [`OrmError::NoMatchingRow`] if there are no rows.
    pub async fn scalar(&self, sql: &str, args: impl Into<ParamList>) -> OrmResult<String> {
        self.query(sql, args).await?.scalar()
    }

    /// First column of every row (empty when there are no rows).
    pub async fn scalars(&self, sql: &str, args: impl Into<ParamList>) -> OrmResult<Vec<String>> {
        Ok(self.query(sql, args).await?.scalars())
    }

    /// First row as a name -> value mapping.
    ///
    /// Returns [`OrmError::NoMatchingRow`] if there are no rows.
    pub async fn row(&self, sql: &str, args: impl Into<ParamList>) -> OrmResult<DataRow> {
        self.query(sql, args).await?.row()
    }

    /// Every row (empty when there are no rows).
    pub async fn rows(&self, sql: &str, args: impl Into<ParamList>) -> OrmResult<Vec<DataRow>> {
        Ok(self.query(sql, args).await?.rows())
    }

    // ==================== Writes ====================

    /// `INSERT INTO table (...) VALUES (...)` from `data`, in data order.
    pub async fn insert(&self, table: &str, data: &Data) -> OrmResult<ExecResult> {
        let stmt = statement::render_insert(table, data)?;
        self.exec_statement(stmt).await
    }

    /// `UPDATE table SET ... [WHERE pk=? AND ...]`.
    ///
    /// Columns listed in `primary_keys` go to the WHERE clause instead of SET.
    /// With no primary key present in `data`, **every row** of the table is updated.
    pub async fn update(
        &self,
        table: &str,
        data: &Data,
        primary_keys: &[&str],
    ) -> OrmResult<ExecResult> {
        let stmt = statement::render_update(table, data, primary_keys)?;
        self.exec_statement(stmt).await
    }

    /// `DELETE FROM table WHERE c1=? AND ...`. An empty filter is refused.
    pub async fn delete(&self, table: &str, filter: &Data) -> OrmResult<ExecResult> {
        let stmt = statement::render_delete(table, filter)?;
        self.exec_statement(stmt).await
    }

    /// `TRUNCATE table`
    pub async fn truncate(&self, table: &str) -> OrmResult<ExecResult> {
        self.exec_statement(statement::render_truncate(table)).await
    }
}

async fn fetch_on<Q: Queryable>(conn: &mut Q, sql: &str, params: ParamList) -> OrmResult<Cursor> {
    let result = conn.exec_iter(sql, Params::from(params)).await?;
    let columns = ColumnMeta::from_driver(result.columns_ref());
    let rows: Vec<Row> = result.collect_and_drop().await?;
    Ok(Cursor::new(columns, rows.into_iter().map(Row::unwrap).collect()))
}

async fn exec_on<Q: Queryable>(conn: &mut Q, sql: &str, params: ParamList) -> OrmResult<ExecResult> {
    let result = conn.exec_iter(sql, Params::from(params)).await?;
    let outcome = ExecResult {
        rows_affected: result.affected_rows(),
        last_insert_id: result.last_insert_id(),
    };
    result.drop_result().await?;
    Ok(outcome)
}

fn log_sql(mode: ExecutorMode, sql: &str, param_count: usize) {
    if sql.len() > MAX_LOGGED_SQL {
        tracing::debug!(
            target: "myorm.sql",
            mode = ?mode,
            param_count,
            sql = %format_args!("{}...", truncate_sql_bytes(sql, MAX_LOGGED_SQL)),
        );
    } else {
        tracing::debug!(target: "myorm.sql", mode = ?mode, param_count, sql = %sql);
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mysql_async::OptsBuilder;

    fn lazy_pool() -> Pool {
        // Pool::new does not connect until a connection is requested.
        Pool::new(OptsBuilder::default().ip_or_hostname("127.0.0.1").tcp_port(3306))
    }

    #[tokio::test]
    async fn test_pooled_mode() {
        let executor = Executor::pooled(lazy_pool());
        assert_eq!(executor.mode(), ExecutorMode::Pooled);
        assert!(!executor.is_transactional());
        assert!(executor.pool().is_some());
        assert_eq!(format!("{executor:?}"), "Executor { mode: Pooled }");
    }

    #[tokio::test]
    async fn test_commit_on_pooled_is_error() {
        let err = Executor::pooled(lazy_pool()).commit().await.unwrap_err();
        assert!(matches!(err, OrmError::TransactionState(_)));

        let err = Executor::pooled(lazy_pool()).rollback().await.unwrap_err();
        assert!(matches!(err, OrmError::TransactionState(_)));
    }

    #[tokio::test]
    async fn test_invalid_writes_fail_before_io() {
        let executor = Executor::pooled(lazy_pool());

        let err = executor.delete("users", &Data::new()).await.unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));

        let err = executor.insert("users", &Data::new()).await.unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));

        let data = Data::new().set("id", 1);
        let err = executor.update("users", &data, &["id"]).await.unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
    }

    #[test]
    fn test_truncate_sql_bytes() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql_bytes("SELECT 1", 6), "SELECT");
        // never splits a multi-byte char
        assert_eq!(truncate_sql_bytes("é", 1), "");
    }
}
