//! # myorm
//!
//! A small MySQL execution layer for Rust.
//!
//! ## Features
//!
//! - **One executor, two modes**: the same `query`/`exec`/`row`/`rows` surface over a
//!   connection pool or an open transaction
//! - **String-typed reads**: rows come back as column-name to string maps, decoded
//!   on demand through [`Format`]
//! - **Table builder**: chain WHERE / ORDER BY / LIMIT and run a terminal read or write
//! - **Safe defaults**: DELETE requires WHERE, UPDATE requires SET
//! - **Explicit registry**: named configurations and lazily-built pools, no globals
//!
//! ## Usage
//!
//! ```ignore
//! use myorm::{ConnectionConfig, Data, args};
//!
//! let db = myorm::connect(&ConnectionConfig::new().database("shop")).await?;
//!
//! // Raw SQL
//! let total = db.scalar("SELECT COUNT(*) FROM orders WHERE user_id=?", args![7]).await?;
//!
//! // Table builder
//! let recent = db
//!     .table("orders")
//!     .where_eq("user_id", 7)
//!     .order_by("created_at", "desc")
//!     .limit(5)
//!     .all("id,total")
//!     .await?;
//! let amount = recent[0].format("total").f64(0.0);
//!
//! // Writes
//! db.insert("orders", &Data::new().set("user_id", 7).set("total", 19.5)).await?;
//! db.update("orders", &Data::new().set("id", 3).set("total", 21.0), &["id"]).await?;
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod format;
pub mod pool;
pub mod qb;
pub mod registry;
pub mod row;
pub mod transaction;

pub use config::{ConnectionConfig, DriverKind, parse_duration};
pub use error::{OrmError, OrmResult};
pub use executor::{ExecResult, Executor, ExecutorMode};
pub use format::Format;
pub use pool::{connect, create_pool};
pub use qb::{Data, Operand, ParamList, Statement, TableBuilder, Term, TermGroup};
pub use registry::Registry;
pub use row::{ColumnMeta, Cursor, DataRow, RawRow};

pub use mysql_async::{IsolationLevel, Pool, TxOpts, Value};
