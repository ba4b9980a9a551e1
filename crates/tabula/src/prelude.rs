//! Convenient imports for typical `tabula` usage.
//!
//! ```ignore
//! use tabula::prelude::*;
//! ```

pub use crate::{
    BuiltQuery, Clause, Column, Compile, Compiler, CompilerConfig, IntoClause, OrmError,
    OrmResult, PostgresDialect, Record, Selectable, Table, Value, Values,
};
pub use crate::schema::{
    BigInt, Blob, Boolean, Date, Double, ForeignKey, Integer, PrimaryKey, Real, Text, Timestamp,
    Unique, Varchar,
};
