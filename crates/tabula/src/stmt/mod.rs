//! Statement builders.
//!
//! Every statement is a plain value: modifiers consume the builder and return
//! the changed statement, so a partially configured statement can be cloned
//! and reused as a template.
//!
//! ```ignore
//! let base = users.select().order_by(users.c("id"));
//! let page = base.clone().limit(20).offset(40);
//! let BuiltQuery { sql, params } = page.build(&PostgresDialect)?;
//! ```
//!
//! Configuration mistakes (unknown value keys, columns from two tables, ...)
//! are recorded on the statement and returned by the next compile, so a
//! builder chain never has to be interrupted.

mod ddl;
mod delete;
mod insert;
mod select;
mod selectable;
mod update;
mod values;

pub use ddl::{AlterTable, CreateTable, DropTable};
pub use delete::Delete;
pub use insert::Insert;
pub use select::{Join, JoinKind, Select};
pub use selectable::{Selectable, Selection};
pub use update::Update;
pub use values::Values;

pub(crate) use selectable::write_returning;

use crate::dialect::{Dialect, PostgresDialect};
use crate::error::OrmResult;
use crate::param::Parameters;
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// Rendering contract shared by clauses and statements.
pub trait Compile {
    /// Render SQL for `dialect`, appending bound values to `params`.
    fn compile(&self, dialect: &dyn Dialect, params: &mut Parameters) -> OrmResult<String>;

    /// Compile into a fresh parameter bag.
    fn build(&self, dialect: &dyn Dialect) -> OrmResult<BuiltQuery> {
        let mut params = Parameters::new();
        let sql = self.compile(dialect, &mut params)?;
        Ok(BuiltQuery { sql, params })
    }

    /// Debug helper: SQL text for Postgres, parameters discarded.
    fn to_sql(&self) -> String {
        let mut params = Parameters::new();
        match self.compile(&PostgresDialect, &mut params) {
            Ok(sql) => sql,
            Err(e) => format!("<invalid statement: {e}>"),
        }
    }
}

impl Compile for crate::clause::Clause {
    fn compile(&self, dialect: &dyn Dialect, params: &mut Parameters) -> OrmResult<String> {
        crate::clause::Clause::compile(self, dialect, params)
    }
}

/// The result of compiling a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Parameters,
}

impl BuiltQuery {
    /// Get parameters as references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.as_refs()
    }

    pub fn values(&self) -> &[Value] {
        self.params.values()
    }
}

macro_rules! impl_display_via_to_sql {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&Compile::to_sql(self))
                }
            }
        )*
    };
}

impl_display_via_to_sql!(Select, Insert, Update, Delete, CreateTable, DropTable, AlterTable);

#[cfg(test)]
mod tests;
