use crate::clause::{Clause, IntoClause, OrderBy};
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::ident::write_quoted;
use crate::param::Parameters;
use crate::schema::{Column, Table};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
enum Expr {
    Column(Column),
    Computed {
        clause: Clause,
        table: Option<Arc<str>>,
    },
}

/// One entry of a SELECT list (or a RETURNING list).
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    expr: Expr,
    alias: Option<String>,
}

impl Selection {
    /// Arbitrary expression. `table`, when given, is added to the FROM list.
    pub fn computed(clause: Clause, table: Option<Arc<str>>) -> Self {
        Self {
            expr: Expr::Computed { clause, table },
            alias: None,
        }
    }

    /// Render as `<expr> AS "alias"`.
    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The selected column, for plain column selections.
    pub fn column(&self) -> Option<&Column> {
        match &self.expr {
            Expr::Column(c) => Some(c),
            Expr::Computed { .. } => None,
        }
    }

    pub(crate) fn table(&self) -> Option<&str> {
        match &self.expr {
            Expr::Column(c) => c.table_name(),
            Expr::Computed { table, .. } => table.as_deref(),
        }
    }

    pub fn to_clause(&self) -> Clause {
        match &self.expr {
            Expr::Column(c) => c.to_clause(),
            Expr::Computed { clause, .. } => clause.clone(),
        }
    }

    pub fn equals(&self, rhs: impl IntoClause) -> Clause {
        self.to_clause().equals(rhs)
    }

    pub fn greater_than(&self, rhs: impl IntoClause) -> Clause {
        self.to_clause().greater_than(rhs)
    }

    pub fn less_than(&self, rhs: impl IntoClause) -> Clause {
        self.to_clause().less_than(rhs)
    }

    pub fn gte(&self, rhs: impl IntoClause) -> Clause {
        self.to_clause().gte(rhs)
    }

    pub fn lte(&self, rhs: impl IntoClause) -> Clause {
        self.to_clause().lte(rhs)
    }

    pub fn asc(&self) -> OrderBy {
        OrderBy::asc(self.to_clause())
    }

    pub fn desc(&self) -> OrderBy {
        OrderBy::desc(self.to_clause())
    }

    pub(crate) fn write(
        &self,
        out: &mut String,
        dialect: &dyn Dialect,
        params: &mut Parameters,
    ) -> OrmResult<()> {
        match &self.expr {
            Expr::Column(c) => c.to_clause().write(out, dialect, params)?,
            Expr::Computed { clause, .. } => clause.write(out, dialect, params)?,
        }
        self.write_alias(out);
        Ok(())
    }

    /// Like `write`, but plain columns render without their table. Used for
    /// RETURNING lists, which always refer to the statement's own table.
    pub(crate) fn write_bare(
        &self,
        out: &mut String,
        dialect: &dyn Dialect,
        params: &mut Parameters,
    ) -> OrmResult<()> {
        match &self.expr {
            Expr::Column(c) => write_quoted(out, c.name()),
            Expr::Computed { clause, .. } => clause.write(out, dialect, params)?,
        }
        self.write_alias(out);
        Ok(())
    }

    fn write_alias(&self, out: &mut String) {
        if let Some(alias) = &self.alias {
            out.push_str(" AS ");
            write_quoted(out, alias);
        }
    }
}

/// ` RETURNING a, b` (nothing for an empty list).
pub(crate) fn write_returning(
    out: &mut String,
    returning: &[Selection],
    dialect: &dyn Dialect,
    params: &mut Parameters,
) -> OrmResult<()> {
    for (i, selection) in returning.iter().enumerate() {
        out.push_str(if i == 0 { " RETURNING " } else { ", " });
        selection.write_bare(out, dialect, params)?;
    }
    Ok(())
}

impl From<Column> for Selection {
    fn from(column: Column) -> Self {
        Self {
            expr: Expr::Column(column),
            alias: None,
        }
    }
}

impl From<&Column> for Selection {
    fn from(column: &Column) -> Self {
        Selection::from(column.clone())
    }
}

impl IntoClause for Selection {
    fn into_clause(self) -> Clause {
        self.to_clause()
    }
}

/// Source of SELECT list entries.
///
/// A table expands to all of its columns in declaration order; columns and
/// selections stand for themselves; tuples, arrays, slices and vectors
/// concatenate their elements.
pub trait Selectable {
    fn selections(&self) -> Vec<Selection>;
}

impl Selectable for Table {
    fn selections(&self) -> Vec<Selection> {
        self.columns().iter().map(Selection::from).collect()
    }
}

impl Selectable for Column {
    fn selections(&self) -> Vec<Selection> {
        vec![Selection::from(self)]
    }
}

impl Selectable for Selection {
    fn selections(&self) -> Vec<Selection> {
        vec![self.clone()]
    }
}

impl<S: Selectable + ?Sized> Selectable for &S {
    fn selections(&self) -> Vec<Selection> {
        (**self).selections()
    }
}

impl<S: Selectable> Selectable for [S] {
    fn selections(&self) -> Vec<Selection> {
        self.iter().flat_map(Selectable::selections).collect()
    }
}

impl<S: Selectable, const N: usize> Selectable for [S; N] {
    fn selections(&self) -> Vec<Selection> {
        self.as_slice().selections()
    }
}

impl<S: Selectable> Selectable for Vec<S> {
    fn selections(&self) -> Vec<Selection> {
        self.as_slice().selections()
    }
}

macro_rules! impl_selectable_tuple {
    ($($name:ident),+) => {
        impl<$($name: Selectable),+> Selectable for ($($name,)+) {
            #[allow(non_snake_case)]
            fn selections(&self) -> Vec<Selection> {
                let ($($name,)+) = self;
                let mut out = Vec::new();
                $(out.extend($name.selections());)+
                out
            }
        }
    };
}

impl_selectable_tuple!(A);
impl_selectable_tuple!(A, B);
impl_selectable_tuple!(A, B, C);
impl_selectable_tuple!(A, B, C, D);
impl_selectable_tuple!(A, B, C, D, E);
impl_selectable_tuple!(A, B, C, D, E, F);
impl_selectable_tuple!(A, B, C, D, E, F, G);
impl_selectable_tuple!(A, B, C, D, E, F, G, H);
