//! # tabula
//!
//! Relational schema declaration and SQL statement construction.
//!
//! ## Features
//!
//! - **Schema as values**: tables are built from columns and constraint modifiers
//! - **Composable clauses**: conditions form a tree rendered per dialect
//! - **Bound parameters**: every literal value becomes a placeholder
//! - **Dialects**: Postgres (`$N`), SQLite and MySQL (`?`), plus a registry for custom ones
//! - **Records**: `#[derive(Record)]` maps struct fields to columns for INSERT, DELETE and row materialization
//!
//! ```ignore
//! use tabula::prelude::*;
//!
//! let users = Table::new("users")
//!     .with(Column::new("id", Integer::new().primary_key()))
//!     .with(Column::new("name", Varchar::new(64).not_null()))
//!     .build();
//!
//! let BuiltQuery { sql, params } = users
//!     .select()
//!     .filter(users.c("id").equals(7))
//!     .build(&PostgresDialect)?;
//! // SELECT "users"."id", "users"."name" FROM "users" WHERE "users"."id" = $1
//! ```

extern crate self as tabula;

pub mod clause;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod materialize;
pub mod param;
pub mod prelude;
pub mod reflect;
pub mod schema;
pub mod stmt;
pub mod value;

pub use clause::{BoolOp, Clause, IntoClause, Nulls, OrderBy};
pub use compiler::{Compiler, CompilerConfig, SqlLogLevel};
pub use dialect::{
    Dialect, DialectRegistration, MysqlDialect, PostgresDialect, SqliteDialect, dialect,
    register_dialect, registered_dialects,
};
pub use error::{OrmError, OrmResult};
pub use materialize::{MemoryRows, PgRows, RowSource, all, must_all, must_one, one, scalar};
pub use param::Parameters;
pub use reflect::{Field, FieldDef, FieldTag, Record, align_fields_to_columns, derive_fields, describe};
pub use schema::{
    BigInt, Blob, Boolean, Column, Constraints, Creatable, Date, DefaultValue, Double, Exclude,
    ForeignKey, ForeignKeyDef, Integer, Modifier, PrimaryKey, PrimaryKeyDef, Real,
    ReferentialAction, SqlType, Table, TableBuilder, TableDef, Text, Timestamp, Unique, Varchar,
};
pub use stmt::{
    AlterTable, BuiltQuery, Compile, CreateTable, Delete, DropTable, Insert, Join, JoinKind,
    Select, Selectable, Selection, Update, Values,
};
pub use value::{FromValue, ToValue, Value};

#[cfg(feature = "derive")]
pub use tabula_derive::Record;

// Re-export inventory for dialect registration from downstream crates
pub use inventory;

/// `SELECT` over any selectable source.
pub fn select(source: impl Selectable) -> Select {
    Select::new(source)
}

/// `INSERT` into the table the given columns belong to.
pub fn insert(columns: impl IntoIterator<Item = Column>) -> Insert {
    Insert::new(columns)
}
