//! DML renderers: turn column data into parameterized INSERT/UPDATE/DELETE/TRUNCATE.

use crate::error::{OrmError, OrmResult};
use crate::qb::param::{Data, ParamList};
use mysql_async::Value;

/// A rendered SQL statement and its positional parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: ParamList,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: impl Into<ParamList>) -> Self {
        Self {
            sql: sql.into(),
            params: params.into(),
        }
    }

    /// Parameters as plain values.
    pub fn values(&self) -> &[Value] {
        self.params.as_slice()
    }
}

/// `INSERT INTO table (c1,c2) VALUES (?,?)`, one placeholder per column in data order.
pub fn render_insert(table: &str, data: &Data) -> OrmResult<Statement> {
    if data.is_empty() {
        return Err(OrmError::validation(format!(
            "INSERT INTO {table} has no columns"
        )));
    }

    let mut params = ParamList::new();
    let mut columns = Vec::with_capacity(data.len());
    for (column, value) in data.iter() {
        columns.push(column);
        params.push(value.clone());
    }
    let placeholders = vec!["?"; columns.len()].join(",");

    Ok(Statement {
        sql: format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.join(",")
        ),
        params,
    })
}

/// `UPDATE table SET c1=?,c2=? [WHERE pk1=? AND pk2=?]`.
///
/// Columns named in `primary_keys` are moved out of the SET list into the WHERE
/// clause. A primary key that does not occur in `data` is ignored. With no
/// primary keys present no WHERE clause is emitted, i.e. every row is updated.
pub fn render_update(table: &str, data: &Data, primary_keys: &[&str]) -> OrmResult<Statement> {
    let mut set_parts = Vec::new();
    let mut where_parts = Vec::new();
    let mut set_params = ParamList::new();
    let mut where_params = ParamList::new();

    for (column, value) in data.iter() {
        if primary_keys.contains(&column) {
            where_parts.push(format!("{column}=?"));
            where_params.push(value.clone());
            continue;
        }
        set_parts.push(format!("{column}=?"));
        set_params.push(value.clone());
    }

    if set_parts.is_empty() {
        return Err(OrmError::validation(format!(
            "UPDATE {table} has no columns to SET"
        )));
    }

    let mut sql = format!("UPDATE {table} SET {}", set_parts.join(","));
    if !where_parts.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_parts.join(" AND "));
    }

    let mut params = set_params;
    params.extend(where_params);
    Ok(Statement { sql, params })
}

/// `DELETE FROM table WHERE c1=? AND c2=?`.
///
/// An empty `filter` is refused: whole-table deletes must go through
/// [`render_truncate`] or explicit SQL.
pub fn render_delete(table: &str, filter: &Data) -> OrmResult<Statement> {
    if filter.is_empty() {
        return Err(OrmError::validation(format!(
            "DELETE FROM {table} requires at least one WHERE column"
        )));
    }

    let mut params = ParamList::new();
    let mut parts = Vec::with_capacity(filter.len());
    for (column, value) in filter.iter() {
        parts.push(format!("{column}=?"));
        params.push(value.clone());
    }

    Ok(Statement {
        sql: format!("DELETE FROM {table} WHERE {}", parts.join(" AND ")),
        params,
    })
}

/// `TRUNCATE table`
pub fn render_truncate(table: &str) -> Statement {
    Statement {
        sql: format!("TRUNCATE {table}"),
        params: ParamList::new(),
    }
}
