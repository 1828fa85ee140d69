//! Query building: predicate terms, DML renderers and the per-table builder.
//!
//! Everything here is pure string/parameter assembly except the terminal
//! methods of [`TableBuilder`], which hand the rendered SQL to an
//! [`Executor`](crate::Executor).
//!
//! - [`TermGroup`] / [`Term`]: WHERE predicates, AND-joined, groups parenthesized.
//! - [`statement`]: `INSERT` / `UPDATE` / `DELETE` / `TRUNCATE` from [`Data`].
//! - [`TableBuilder`]: WHERE + ORDER BY + LIMIT accumulator bound to an executor.
//!
//! # Usage
//!
//! ```ignore
//! use myorm::qb::TermGroup;
//!
//! let rows = db
//!     .table("orders")
//!     .where_eq("user_id", 7)
//!     .where_in("status", ["paid", "shipped"])
//!     .where_group(TermGroup::new().op("total", ">", 100).raw("coupon IS NULL"))
//!     .order_by("id", "desc")
//!     .limit(50)
//!     .all("*")
//!     .await?;
//! ```

pub mod param;
pub mod statement;
pub mod table;
pub mod term;

pub use param::{Data, ParamList};
pub use statement::{Statement, render_delete, render_insert, render_truncate, render_update};
pub use table::{DEFAULT_PAGE_SIZE, TableBuilder};
pub use term::{Operand, Term, TermGroup, normalize_operator};
