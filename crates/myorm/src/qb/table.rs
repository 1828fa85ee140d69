//! Chainable per-table query builder.

use crate::error::{OrmError, OrmResult};
use crate::executor::{ExecResult, Executor};
use crate::format::Format;
use crate::qb::param::{Data, ParamList};
use crate::qb::term::{Term, TermGroup};
use crate::row::DataRow;
use mysql_async::Value;

/// Rows returned by reads that do not set their own limit.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Accumulates WHERE / ORDER BY / LIMIT state for one table, then runs a
/// terminal read or write on the executor it was created from.
///
/// The builder never touches the network until a terminal method
/// (`value`, `values`, `first`, `all`, `count`, `update`, `delete`) is awaited.
///
/// # Example
///
/// ```ignore
/// let names = db
///     .table("users")
///     .where_eq("status", "active")
///     .where_op("age", ">=", 18)
///     .where_group(TermGroup::new().raw("role='admin' OR role='owner'"))
///     .order_by("created_at", "desc")
///     .limit(10)
///     .values("name")
///     .await?;
/// ```
#[must_use]
#[derive(Debug)]
pub struct TableBuilder<'e> {
    executor: &'e Executor,
    table: String,
    terms: TermGroup,
    offset: u64,
    limit: u64,
    order_by: String,
}

impl<'e> TableBuilder<'e> {
    pub fn new(executor: &'e Executor, table: impl Into<String>) -> Self {
        Self {
            executor,
            table: table.into(),
            terms: TermGroup::new(),
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
            order_by: String::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Accumulated predicates.
    pub fn terms(&self) -> &TermGroup {
        &self.terms
    }

    // ==================== WHERE ====================

    /// Raw boolean expression. Parenthesized when combined with other terms;
    /// a blank string adds nothing.
    pub fn where_raw(mut self, sql: impl Into<String>) -> Self {
        self.terms.push(Term::raw(sql));
        self
    }

    /// `field=?`
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.terms.push(Term::eq(field, value));
        self
    }

    /// `field OP ?`. Unknown operators fail when the query is rendered.
    pub fn where_op(
        mut self,
        field: impl Into<String>,
        op: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.terms.push(Term::op(field, op, value));
        self
    }

    /// `field IN (?,?,...)`
    pub fn where_in<V: Into<Value>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.terms.push(Term::in_list(field, values));
        self
    }

    /// `field NOT IN (?,?,...)`
    pub fn where_not_in<V: Into<Value>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.terms.push(Term::not_in(field, values));
        self
    }

    /// `field BETWEEN ? AND ?`
    pub fn where_between(
        mut self,
        field: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.terms.push(Term::between(field, from, to));
        self
    }

    /// `field NOT BETWEEN ? AND ?`
    pub fn where_not_between(
        mut self,
        field: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.terms.push(Term::not_between(field, from, to));
        self
    }

    /// Parenthesized group of AND-ed terms. An empty group is ignored.
    pub fn where_group(mut self, group: TermGroup) -> Self {
        if !group.is_blank() {
            self.terms.push(Term::Group(group));
        }
        self
    }

    // ==================== Pagination / order ====================

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Page size; `0` removes the LIMIT clause.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// `ORDER BY field DIR`; `dir` other than asc/desc (any case) falls back to `ASC`.
    pub fn order_by(mut self, field: &str, dir: &str) -> Self {
        let dir = match dir.trim().to_ascii_uppercase().as_str() {
            "DESC" => "DESC",
            _ => "ASC",
        };
        self.order_by = format!("{} {dir}", field.trim());
        self
    }

    /// Pre-formatted ORDER BY list, e.g. `"age DESC, id ASC"`.
    pub fn order_by_raw(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into().trim().to_string();
        self
    }

    // ==================== Rendering ====================

    /// `WHERE ...`, or an empty string when no predicate was added.
    pub fn render_where(&self, params: &mut ParamList) -> OrmResult<String> {
        let predicate = self.terms.render(params)?;
        if predicate.is_empty() {
            return Ok(predicate);
        }
        Ok(format!("WHERE {predicate}"))
    }

    /// Pagination tail for the given limit (0 = none) and the builder's offset.
    fn render_pagination_with(&self, limit: u64) -> String {
        match (self.offset, limit) {
            (0, 0) => String::new(),
            (0, limit) => format!("LIMIT {limit}"),
            (offset, 0) => format!("OFFSET {offset}"),
            (offset, limit) => format!("LIMIT {offset},{limit}"),
        }
    }

    pub fn render_pagination(&self) -> String {
        self.render_pagination_with(self.limit)
    }

    fn render_tail(&self, limit: u64) -> OrmResult<(String, ParamList)> {
        let mut params = ParamList::new();
        let mut parts = Vec::with_capacity(3);

        let where_sql = self.render_where(&mut params)?;
        if !where_sql.is_empty() {
            parts.push(where_sql);
        }
        if !self.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by));
        }
        let pagination = self.render_pagination_with(limit);
        if !pagination.is_empty() {
            parts.push(pagination);
        }

        Ok((parts.join(" "), params))
    }

    /// WHERE + ORDER BY + pagination, space-separated, with bound values in text order.
    pub fn render(&self) -> OrmResult<(String, Vec<Value>)> {
        let (sql, params) = self.render_tail(self.limit)?;
        Ok((sql, params.into_vec()))
    }

    /// Full `SELECT fields FROM table ...` as [`all`](Self::all) would send it.
    pub fn render_select(&self, fields: &str) -> OrmResult<(String, Vec<Value>)> {
        let (sql, params) = self.select_sql(fields, self.limit)?;
        Ok((sql, params.into_vec()))
    }

    fn select_sql(&self, fields: &str, limit: u64) -> OrmResult<(String, ParamList)> {
        let (tail, params) = self.render_tail(limit)?;
        let mut sql = format!("SELECT {fields} FROM {}", self.table);
        if !tail.is_empty() {
            sql.push(' ');
            sql.push_str(&tail);
        }
        Ok((sql, params))
    }

    // ==================== Terminals ====================

    /// First column of the first matching row.
    pub async fn value(self, field: &str) -> OrmResult<String> {
        let (sql, params) = self.select_sql(field, 1)?;
        self.executor.scalar(&sql, params).await
    }

    /// `field` of every matching row on the current page.
    pub async fn values(self, field: &str) -> OrmResult<Vec<String>> {
        let (sql, params) = self.select_sql(field, self.limit)?;
        self.executor.scalars(&sql, params).await
    }

    /// First matching row. `fields` is a select list such as `"*"` or `"id,name"`.
    pub async fn first(self, fields: &str) -> OrmResult<DataRow> {
        let (sql, params) = self.select_sql(fields, 1)?;
        self.executor.row(&sql, params).await
    }

    /// Every matching row on the current page.
    pub async fn all(self, fields: &str) -> OrmResult<Vec<DataRow>> {
        let (sql, params) = self.select_sql(fields, self.limit)?;
        self.executor.rows(&sql, params).await
    }

    /// `COUNT(*)` over the predicate; ordering and pagination are ignored.
    pub async fn count(self) -> OrmResult<u64> {
        let mut params = ParamList::new();
        let where_sql = self.render_where(&mut params)?;
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
        if !where_sql.is_empty() {
            sql.push(' ');
            sql.push_str(&where_sql);
        }
        let raw = self.executor.scalar(&sql, params).await?;
        Ok(Format::new(&raw).u64(0))
    }

    /// `UPDATE table SET ... [WHERE ...]` with the accumulated predicate.
    ///
    /// Without any predicate every row is updated.
    pub async fn update(self, data: &Data) -> OrmResult<ExecResult> {
        if data.is_empty() {
            return Err(OrmError::validation(format!(
                "UPDATE {} has no columns to SET",
                self.table
            )));
        }

        let mut params = ParamList::new();
        let mut sets = Vec::with_capacity(data.len());
        for (column, value) in data.iter() {
            sets.push(format!("{column}=?"));
            params.push(value.clone());
        }

        let mut sql = format!("UPDATE {} SET {}", self.table, sets.join(","));
        let where_sql = self.render_where(&mut params)?;
        if !where_sql.is_empty() {
            sql.push(' ');
            sql.push_str(&where_sql);
        }
        self.executor.exec(&sql, params).await
    }

    /// `DELETE FROM table WHERE ...`. Refused when no predicate was added.
    pub async fn delete(self) -> OrmResult<ExecResult> {
        let mut params = ParamList::new();
        let where_sql = self.render_where(&mut params)?;
        if where_sql.is_empty() {
            return Err(OrmError::validation(format!(
                "DELETE FROM {} requires a WHERE predicate",
                self.table
            )));
        }
        let sql = format!("DELETE FROM {} {where_sql}", self.table);
        self.executor.exec(&sql, params).await
    }
}
