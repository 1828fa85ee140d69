//! Transaction helpers.
//!
//! A transaction is just another [`Executor`](crate::Executor), in
//! transactional mode, so any code written against `&Executor` runs inside
//! or outside a transaction unchanged. For ergonomic commit/rollback
//! handling, use the [`transaction!`] macro.
//!
//! # Example
//!
//! ```ignore
//! use myorm::{Data, OrmResult, args};
//!
//! # async fn demo(db: &myorm::Executor) -> OrmResult<()> {
//! myorm::transaction!(db, tx, {
//!     tx.exec("UPDATE accounts SET balance = balance - ? WHERE id = ?", args![100, 1]).await?;
//!     tx.exec("UPDATE accounts SET balance = balance + ? WHERE id = ?", args![100, 2]).await?;
//!     tx.insert("transfers", &Data::new().set("src", 1).set("dst", 2).set("amount", 100)).await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

use crate::error::OrmResult;
use crate::executor::Executor;

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via `$executor.begin_transaction_with(..).await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
///
/// `$tx` is bound to the transactional executor inside the block. The block
/// must evaluate to `myorm::OrmResult<T>`; the macro evaluates to the same type.
/// An optional third argument passes explicit [`TxOpts`](crate::TxOpts).
#[macro_export]
macro_rules! transaction {
    ($executor:expr, $tx:ident, $body:block) => {
        $crate::transaction!($executor, $tx, $crate::TxOpts::default(), $body)
    };
    ($executor:expr, $tx:ident, $opts:expr, $body:block) => {{
        let $tx = ($executor).begin_transaction_with($opts).await?;
        let __myorm_tx_body_result: $crate::OrmResult<_> = async { $body }.await;
        $crate::transaction::finish($tx, __myorm_tx_body_result).await
    }};
}

/// Commit `tx` if `result` is `Ok`, roll it back otherwise.
///
/// A failed rollback is logged; the body's error is what the caller sees.
#[doc(hidden)]
pub async fn finish<T>(tx: Executor, result: OrmResult<T>) -> OrmResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(
                    target: "myorm.sql",
                    error = %rollback_err,
                    "rollback failed"
                );
            }
            Err(error)
        }
    }
}
