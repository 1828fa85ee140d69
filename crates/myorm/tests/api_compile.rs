//! Compile-only checks for the public API surface.

#![allow(dead_code)]

use myorm::{
    ConnectionConfig, Data, DataRow, ExecResult, Executor, IsolationLevel, OrmError, OrmResult,
    Registry, TermGroup, TxOpts, args,
};

async fn _transaction_with_options_macro_compiles(db: &Executor) -> OrmResult<()> {
    let mut opts = TxOpts::default();
    opts.with_isolation_level(IsolationLevel::ReadCommitted)
        .with_readonly(false);

    myorm::transaction!(db, tx, opts, {
        tx.exec("UPDATE accounts SET balance = balance - ? WHERE id = ?", args![10, 1])
            .await?;
        Ok::<(), OrmError>(())
    })?;

    Ok(())
}

async fn _begin_commit_consumes_executor(db: &Executor) -> OrmResult<()> {
    let tx = db.begin_transaction().await?;
    tx.insert("audit", &Data::new().set("event", "login")).await?;
    tx.commit().await
}

async fn _generic_over_mode(db: &Executor) -> OrmResult<Vec<DataRow>> {
    db.table("users")
        .where_eq("status", "active")
        .where_group(TermGroup::new().op("age", ">", 18).raw("deleted_at IS NULL"))
        .order_by("id", "asc")
        .offset(20)
        .limit(20)
        .all("*")
        .await
}

async fn _builder_writes(db: &Executor) -> OrmResult<ExecResult> {
    db.table("users")
        .where_not_in("id", [1, 2, 3])
        .update(&Data::from([("status", "archived")]))
        .await
}

async fn _registry_lookup(registry: &Registry) -> OrmResult<String> {
    registry
        .register("main", ConnectionConfig::new().database("shop"))
        .await;
    let db = registry.get("main").await?;
    db.scalar("SELECT VERSION()", args![]).await
}

#[test]
fn args_macro_builds_values() {
    let values = args![1, "two", 3.5, Option::<i64>::None];
    assert_eq!(values.len(), 4);
    assert_eq!(values[3], myorm::Value::NULL);
}
