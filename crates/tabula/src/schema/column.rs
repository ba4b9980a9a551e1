//! Typed table columns.

use super::table::{Modifier, TableDef};
use super::types::SqlType;
use crate::clause::{Clause, IntoClause, OrderBy};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::quote_ident;
use crate::stmt::Selection;
use std::fmt;
use std::sync::Arc;

/// A named, typed column.
///
/// Columns are created detached and bound to exactly one table when the
/// table is built. Columns obtained from a [`Table`](super::Table) render as
/// `"table"."column"`.
#[derive(Clone)]
pub struct Column {
    name: Arc<str>,
    table: Option<Arc<str>>,
    ty: Arc<dyn SqlType>,
}

impl Column {
    pub fn new(name: impl Into<Arc<str>>, ty: impl SqlType + 'static) -> Self {
        Self::with_type(name, Arc::new(ty))
    }

    /// Create a column from an already shared type.
    pub fn with_type(name: impl Into<Arc<str>>, ty: Arc<dyn SqlType>) -> Self {
        Self {
            name: name.into(),
            table: None,
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning table, if bound.
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn sql_type(&self) -> &Arc<dyn SqlType> {
        &self.ty
    }

    /// Return a copy bound to `table`. A column binds once.
    pub(crate) fn bind(&self, table: &Arc<str>) -> OrmResult<Column> {
        if let Some(owner) = &self.table {
            return Err(OrmError::schema(format!(
                "column \"{}\" already belongs to table \"{owner}\"",
                self.name
            )));
        }
        Ok(Column {
            name: self.name.clone(),
            table: Some(table.clone()),
            ty: self.ty.clone(),
        })
    }

    pub(crate) fn same_table(&self, other: &Column) -> bool {
        self.table == other.table
    }

    /// Column reference clause.
    pub fn to_clause(&self) -> Clause {
        Clause::Column {
            table: self.table.clone(),
            name: self.name.clone(),
        }
    }

    /// `"name" TYPE [constraints]` as used inside CREATE TABLE.
    pub fn create_sql(&self, dialect: &dyn Dialect) -> OrmResult<String> {
        Ok(format!(
            "{} {}",
            quote_ident(&self.name),
            self.ty.create_sql(dialect)?
        ))
    }

    // ── ordering ────────────────────────────────────────────────────────────

    pub fn asc(&self) -> OrderBy {
        OrderBy::asc(self.to_clause())
    }

    pub fn desc(&self) -> OrderBy {
        OrderBy::desc(self.to_clause())
    }

    // ── aggregates ──────────────────────────────────────────────────────────

    pub fn count(&self) -> Selection {
        self.aggregate("COUNT")
    }

    pub fn sum(&self) -> Selection {
        self.aggregate("SUM")
    }

    pub fn avg(&self) -> Selection {
        self.aggregate("AVG")
    }

    pub fn min(&self) -> Selection {
        self.aggregate("MIN")
    }

    pub fn max(&self) -> Selection {
        self.aggregate("MAX")
    }

    fn aggregate(&self, func: &'static str) -> Selection {
        Selection::computed(Clause::func(func, self.to_clause()), self.table.clone())
    }

    /// Select this column under another name.
    pub fn as_(&self, alias: impl Into<String>) -> Selection {
        Selection::from(self.clone()).as_(alias)
    }
}

macro_rules! delegate_conditions {
    ($($method:ident($($arg:ident),*)),* $(,)?) => {
        impl Column {
            $(
                pub fn $method(&self, $($arg: impl IntoClause),*) -> Clause {
                    self.to_clause().$method($($arg),*)
                }
            )*
        }
    };
}

delegate_conditions! {
    equals(rhs),
    not_equals(rhs),
    less_than(rhs),
    greater_than(rhs),
    lte(rhs),
    gte(rhs),
    like(pattern),
    ilike(pattern),
    not_like(pattern),
    between(lo, hi),
}

impl Column {
    /// `"t"."c" IN (...)`; empty lists render `1=0`.
    pub fn in_list<I>(&self, values: I) -> Clause
    where
        I: IntoIterator,
        I::Item: IntoClause,
    {
        self.to_clause().in_list(values)
    }

    /// `"t"."c" NOT IN (...)`; empty lists render `1=1`.
    pub fn not_in<I>(&self, values: I) -> Clause
    where
        I: IntoIterator,
        I::Item: IntoClause,
    {
        self.to_clause().not_in(values)
    }

    pub fn is_null(&self) -> Clause {
        self.to_clause().is_null()
    }

    pub fn is_not_null(&self) -> Clause {
        self.to_clause().is_not_null()
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("type", &self.ty)
            .finish()
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.table == other.table
    }
}

impl IntoClause for Column {
    fn into_clause(self) -> Clause {
        self.to_clause()
    }
}

impl IntoClause for &Column {
    fn into_clause(self) -> Clause {
        self.to_clause()
    }
}

impl From<Column> for OrderBy {
    fn from(column: Column) -> Self {
        column.asc()
    }
}

impl From<&Column> for OrderBy {
    fn from(column: &Column) -> Self {
        column.asc()
    }
}

impl Modifier for Column {
    fn modify(&self, table: &mut TableDef) -> OrmResult<()> {
        table.add_column(self.clone())
    }
}
