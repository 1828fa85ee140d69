//! Result cursors and string-typed row materialization.
//!
//! The driver hands back typed [`Value`]s, but the read API of this crate only
//! promises strings: every column of every row is rendered into one string slot,
//! indexed by column position, and exposed by name through [`DataRow`].
//! Typed decoding is an explicit second step through [`Format`](crate::Format).

use crate::error::{OrmError, OrmResult};
use crate::format::Format;
use mysql_async::Value;
use mysql_async::consts::ColumnType;
use std::collections::HashMap;
use std::sync::Arc;

/// Name and wire type of a result column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub(crate) fn from_driver(columns: &[mysql_async::Column]) -> Vec<Self> {
        columns
            .iter()
            .map(|c| Self::new(c.name_str().into_owned(), c.column_type()))
            .collect()
    }
}

/// One row as returned by the driver, before string conversion.
pub type RawRow = Vec<Value>;

/// Fully-read result set.
///
/// All rows are read off the wire before the cursor is handed out, so the
/// connection (or transaction lock) it came from has already been released.
#[derive(Debug)]
pub struct Cursor {
    columns: Arc<[ColumnMeta]>,
    rows: std::vec::IntoIter<RawRow>,
}

impl Cursor {
    pub fn new(columns: Vec<ColumnMeta>, rows: Vec<RawRow>) -> Self {
        Self {
            columns: columns.into(),
            rows: rows.into_iter(),
        }
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Rows not consumed yet.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// Advance and render the next row into a [`DataRow`].
    pub fn next_data_row(&mut self) -> Option<DataRow> {
        let names: Arc<[String]> = self.columns.iter().map(|c| c.name.clone()).collect();
        let raw = self.rows.next()?;
        Some(DataRow::from_raw(names, &self.columns, raw))
    }

    /// First column of the first row. Fails with [`OrmError::NoMatchingRow`] when empty.
    pub fn scalar(mut self) -> OrmResult<String> {
        let column = self.columns.first().cloned();
        let mut row = self
            .rows
            .next()
            .ok_or_else(|| OrmError::no_matching_row("expected one row, got none"))?;
        match column {
            Some(column) if !row.is_empty() => Ok(value_to_string(&row.swap_remove(0), column.column_type)),
            _ => Err(OrmError::no_matching_row("row has no columns")),
        }
    }

    /// First column of every row. Empty when there are no rows.
    pub fn scalars(self) -> Vec<String> {
        let Some(column_type) = self.columns.first().map(|c| c.column_type) else {
            return Vec::new();
        };
        self.rows
            .filter_map(|mut row| {
                (!row.is_empty()).then(|| value_to_string(&row.swap_remove(0), column_type))
            })
            .collect()
    }

    /// First row. Fails with [`OrmError::NoMatchingRow`] when empty.
    pub fn row(mut self) -> OrmResult<DataRow> {
        self.next_data_row()
            .ok_or_else(|| OrmError::no_matching_row("expected one row, got none"))
    }

    /// Every row. Empty when there are no rows.
    pub fn rows(self) -> Vec<DataRow> {
        let names: Arc<[String]> = self.columns.iter().map(|c| c.name.clone()).collect();
        let columns = self.columns;
        self.rows
            .map(|raw| DataRow::from_raw(names.clone(), &columns, raw))
            .collect()
    }
}

impl Iterator for Cursor {
    type Item = RawRow;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// One materialized row: column name -> string value.
///
/// Values are stored by column position; names are shared between all rows of
/// the same result set. SQL NULL is rendered as an empty string.
///
/// When a result carries the same column name twice (`SELECT a.id, b.id`),
/// name lookups resolve to the leftmost column. [`iter`](Self::iter) still
/// yields every column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataRow {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl DataRow {
    fn from_raw(columns: Arc<[String]>, meta: &[ColumnMeta], raw: RawRow) -> Self {
        let mut values = vec![String::new(); columns.len()];
        for (i, value) in raw.iter().enumerate().take(values.len()) {
            values[i] = value_to_string(value, meta[i].column_type);
        }
        Self { columns, values }
    }

    /// Build a row from name/value pairs.
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        let (columns, values): (Vec<String>, Vec<String>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i].as_str())
    }

    /// Typed access with defaults, e.g. `row.format("age").int(0)`.
    ///
    /// A missing column formats as an empty string, so every parser returns its default.
    pub fn format(&self, column: &str) -> Format<'_> {
        Format::new(self.get(column).unwrap_or(""))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Name/value pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    /// Name -> value map; a duplicated name keeps its leftmost value, like [`get`](Self::get).
    pub fn into_map(self) -> HashMap<String, String> {
        let mut map = HashMap::with_capacity(self.values.len());
        for (name, value) in self.columns.iter().zip(self.values) {
            map.entry(name.clone()).or_insert(value);
        }
        map
    }
}

/// Render a driver value as the string a text-protocol client would see.
pub fn value_to_string(value: &Value, column_type: ColumnType) -> String {
    match value {
        Value::NULL => String::new(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(n) => n.to_string(),
        Value::UInt(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(f) => f.to_string(),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let date = format!("{year:04}-{month:02}-{day:02}");
            if column_type == ColumnType::MYSQL_TYPE_DATE {
                return date;
            }
            let mut s = format!("{date} {hour:02}:{minute:02}:{second:02}");
            if *micros > 0 {
                s.push_str(&format!(".{micros:06}"));
            }
            s
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = u64::from(*days) * 24 + u64::from(*hours);
            let sign = if *negative { "-" } else { "" };
            let mut s = format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}");
            if *micros > 0 {
                s.push_str(&format!(".{micros:06}"));
            }
            s
        }
    }
}
