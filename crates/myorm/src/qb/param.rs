//! Bound parameter storage and ordered column data.

use mysql_async::{Params, Value};

/// Positional parameters, in the order their `?` placeholders appear.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Value>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based position.
    pub fn push(&mut self, value: impl Into<Value>) -> usize {
        self.params.push(value.into());
        self.params.len()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.params
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.params
    }

    /// Extend this list with another list's parameters.
    pub fn extend(&mut self, other: ParamList) {
        self.params.extend(other.params);
    }
}

impl From<Vec<Value>> for ParamList {
    fn from(params: Vec<Value>) -> Self {
        Self { params }
    }
}

impl From<ParamList> for Params {
    fn from(list: ParamList) -> Self {
        if list.is_empty() {
            Params::Empty
        } else {
            Params::Positional(list.params)
        }
    }
}

/// Build a `Vec<mysql_async::Value>` from heterogeneous values.
///
/// ```ignore
/// let row = executor.row("SELECT * FROM users WHERE id=? AND status=?", myorm::args![7, "active"]).await?;
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::Value>::new() };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}

/// Column/value pairs for INSERT, UPDATE and DELETE.
///
/// Iteration order is insertion order, which is also the order columns and
/// placeholders are rendered in. Column names are unique: setting a column
/// that is already present replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Data {
    entries: Vec<(String, Value)>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value (builder form).
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Value>>(self, column: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Data
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Data::new();
        for (column, value) in iter {
            data.insert(column, value);
        }
        data
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Data
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl IntoIterator for Data {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
