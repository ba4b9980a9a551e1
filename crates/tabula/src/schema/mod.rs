//! Table and column declarations.
//!
//! A [`Table`] is assembled from [`Modifier`]s applied in order: columns bind
//! themselves to the table, constraints check that the columns they name
//! already exist. Declaration order therefore matters.

mod column;
mod constraint;
mod table;
mod types;

pub use column::Column;
pub use constraint::{Exclude, ForeignKey, ForeignKeyDef, PrimaryKey, ReferentialAction, Unique};
pub use table::{Creatable, Modifier, PrimaryKeyDef, Table, TableBuilder, TableDef};
pub use types::{
    BigInt, Blob, Boolean, Constraints, Date, DefaultValue, Double, Integer, Real, SqlType, Text,
    Timestamp, Varchar,
};

pub(crate) use constraint::{primary_key_sql, unique_sql};
