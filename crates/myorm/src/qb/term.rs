//! Predicate terms for WHERE clauses.
//!
//! A WHERE clause is a [`TermGroup`]: an ordered list of [`Term`]s that are
//! implicitly AND-ed together. A term is raw SQL, a `field OP value` comparison,
//! or a nested group rendered inside parentheses. Conjunctions and parentheses
//! are produced while rendering, never stored, so a rendered group is always
//! balanced. A raw fragment that sits next to other terms is wrapped in
//! parentheses as well.
//!
//! There is no first-class OR: spell it out with a raw term.

use crate::error::{OrmError, OrmResult};
use crate::qb::param::ParamList;
use mysql_async::Value;

/// Operators accepted in a [`Term::Binary`], after normalization.
const SCALAR_OPERATORS: &[&str] = &[
    "=", "!=", "<>", "<", "<=", ">", ">=", "<=>", "LIKE", "NOT LIKE", "REGEXP", "NOT REGEXP",
];

/// Right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// One bound value.
    Single(Value),
    /// Several bound values (IN / NOT IN / BETWEEN / NOT BETWEEN).
    List(Vec<Value>),
}

/// One unit of a WHERE expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// Opaque SQL fragment appended verbatim.
    Raw(String),

    /// `field OP ?` with the operand bound as parameter(s).
    Binary {
        field: String,
        op: String,
        operand: Operand,
    },

    /// Parenthesized sub-expression.
    Group(TermGroup),
}

impl Term {
    pub fn raw(sql: impl Into<String>) -> Self {
        Term::Raw(sql.into())
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Term::Binary {
            field: field.into(),
            op: "=".to_string(),
            operand: Operand::Single(value.into()),
        }
    }

    /// Comparison with an explicit operator. The operator is trimmed and upper-cased.
    pub fn op(field: impl Into<String>, op: &str, value: impl Into<Value>) -> Self {
        Term::Binary {
            field: field.into(),
            op: normalize_operator(op),
            operand: Operand::Single(value.into()),
        }
    }

    /// Comparison against a list operand (IN / NOT IN / BETWEEN / NOT BETWEEN).
    pub fn op_list<V: Into<Value>>(
        field: impl Into<String>,
        op: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Term::Binary {
            field: field.into(),
            op: normalize_operator(op),
            operand: Operand::List(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn in_list<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::op_list(field, "IN", values)
    }

    pub fn not_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::op_list(field, "NOT IN", values)
    }

    pub fn between(
        field: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Term::Binary {
            field: field.into(),
            op: "BETWEEN".to_string(),
            operand: Operand::List(vec![from.into(), to.into()]),
        }
    }

    pub fn not_between(
        field: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        Term::Binary {
            field: field.into(),
            op: "NOT BETWEEN".to_string(),
            operand: Operand::List(vec![from.into(), to.into()]),
        }
    }

    /// Render this term, appending its bound values to `params`.
    ///
    /// A blank raw fragment or an empty group renders as an empty string.
    pub fn render(&self, params: &mut ParamList) -> OrmResult<String> {
        match self {
            Term::Raw(sql) => Ok(sql.trim().to_string()),
            Term::Group(group) => {
                let inner = group.render(params)?;
                if inner.is_empty() {
                    Ok(inner)
                } else {
                    Ok(format!("({inner})"))
                }
            }
            Term::Binary { field, op, operand } => render_binary(field, op, operand, params),
        }
    }
}

/// Ordered list of AND-joined terms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TermGroup {
    terms: Vec<Term>,
}

impl TermGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Append any term.
    pub fn push(&mut self, term: Term) {
        self.terms.push(term);
    }

    /// Raw boolean expression, appended verbatim.
    pub fn raw(mut self, sql: impl Into<String>) -> Self {
        self.push(Term::raw(sql));
        self
    }

    /// `field=?`
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Term::eq(field, value));
        self
    }

    /// `field OP ?`
    pub fn op(mut self, field: impl Into<String>, op: &str, value: impl Into<Value>) -> Self {
        self.push(Term::op(field, op, value));
        self
    }

    /// `field IN (?,...)`
    pub fn in_list<V: Into<Value>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.push(Term::in_list(field, values));
        self
    }

    /// `field NOT IN (?,...)`
    pub fn not_in<V: Into<Value>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.push(Term::not_in(field, values));
        self
    }

    /// `field BETWEEN ? AND ?`
    pub fn between(
        mut self,
        field: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.push(Term::between(field, from, to));
        self
    }

    /// Nested parenthesized group.
    pub fn group(mut self, group: TermGroup) -> Self {
        self.push(Term::Group(group));
        self
    }

    /// Render the terms joined with ` AND `, appending bound values to `params`
    /// in the same order the text is produced.
    ///
    /// Blank terms are skipped. A raw fragment joined with other terms is
    /// parenthesized, so an `OR` inside it cannot escape the conjunction.
    /// An empty group renders as an empty string.
    pub fn render(&self, params: &mut ParamList) -> OrmResult<String> {
        let mut parts = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            let sql = term.render(params)?;
            if !sql.is_empty() {
                parts.push((matches!(term, Term::Raw(_)), sql));
            }
        }

        let joined = parts.len() > 1;
        let parts: Vec<String> = parts
            .into_iter()
            .map(|(raw, sql)| if raw && joined { format!("({sql})") } else { sql })
            .collect();
        Ok(parts.join(" AND "))
    }

    /// True when every term renders to nothing (no terms, blank raw
    /// fragments, empty nested groups).
    pub fn is_blank(&self) -> bool {
        self.terms.iter().all(|term| match term {
            Term::Raw(sql) => sql.trim().is_empty(),
            Term::Group(group) => group.is_blank(),
            Term::Binary { .. } => false,
        })
    }
}

impl FromIterator<Term> for TermGroup {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

/// Trim and upper-case an operator, collapsing inner whitespace (`"not  in"` -> `"NOT IN"`).
pub fn normalize_operator(op: &str) -> String {
    op.split_whitespace()
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_symbolic(op: &str) -> bool {
    !op.chars().any(|c| c.is_ascii_alphabetic())
}

fn render_binary(
    field: &str,
    op: &str,
    operand: &Operand,
    params: &mut ParamList,
) -> OrmResult<String> {
    match (op, operand) {
        ("IN" | "NOT IN", Operand::List(values)) => {
            if values.is_empty() {
                // IN () matches nothing, NOT IN () matches everything
                return Ok(if op == "IN" { "1=0" } else { "1=1" }.to_string());
            }
            let placeholders = values
                .iter()
                .map(|v| {
                    params.push(v.clone());
                    "?"
                })
                .collect::<Vec<_>>()
                .join(",");
            Ok(format!("{field} {op} ({placeholders})"))
        }
        ("BETWEEN" | "NOT BETWEEN", Operand::List(values)) => match values.as_slice() {
            [from, to] => {
                params.push(from.clone());
                params.push(to.clone());
                Ok(format!("{field} {op} ? AND ?"))
            }
            other => Err(OrmError::unsupported_operator(format!(
                "{op} on '{field}' takes exactly 2 values, got {}",
                other.len()
            ))),
        },
        ("IN" | "NOT IN" | "BETWEEN" | "NOT BETWEEN", Operand::Single(_)) => {
            Err(OrmError::unsupported_operator(format!(
                "{op} on '{field}' needs a list of values"
            )))
        }
        ("IS" | "IS NOT", Operand::Single(Value::NULL)) => Ok(format!("{field} {op} NULL")),
        ("IS" | "IS NOT", _) => Err(OrmError::unsupported_operator(format!(
            "{op} on '{field}' only compares against NULL"
        ))),
        (op, Operand::List(_)) if SCALAR_OPERATORS.contains(&op) => {
            Err(OrmError::unsupported_operator(format!(
                "{op} on '{field}' takes a single value, got a list"
            )))
        }
        (op, Operand::Single(value)) if SCALAR_OPERATORS.contains(&op) => {
            params.push(value.clone());
            if is_symbolic(op) {
                Ok(format!("{field}{op}?"))
            } else {
                Ok(format!("{field} {op} ?"))
            }
        }
        (op, _) => Err(OrmError::unsupported_operator(format!(
            "'{op}' on '{field}'"
        ))),
    }
}
