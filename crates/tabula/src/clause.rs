//! Composable SQL expression tree.
//!
//! A [`Clause`] is built from four leaves (column reference, literal string,
//! literal integer, bound parameter) and a handful of combinators. Rendering
//! happens in [`Clause::compile`], which walks the tree depth-first, left to
//! right, and appends every bound value to the [`Parameters`] bag as it
//! writes the dialect placeholder for it. Placeholder numbers are therefore
//! computed while the text is produced, never patched afterwards.
//!
//! ```ignore
//! let cond = Clause::all_of([
//!     users.c("status").equals("active"),
//!     users.c("age").greater_than(18),
//! ]);
//! let mut params = Parameters::new();
//! let sql = cond.compile(&PostgresDialect, &mut params)?;
//! assert_eq!(sql, r#"("users"."status" = $1 AND "users"."age" > $2)"#);
//! ```

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::write_qualified;
use crate::param::Parameters;
use crate::value::{ToValue, Value};
use std::borrow::Cow;
use std::sync::Arc;

/// Boolean connective of a clause group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    fn infix(self) -> &'static str {
        match self {
            BoolOp::And => " AND ",
            BoolOp::Or => " OR ",
        }
    }
}

/// Expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    /// `"table"."column"`, or `"column"` when not bound to a table.
    Column {
        table: Option<Arc<str>>,
        name: Arc<str>,
    },
    /// Literal SQL text, emitted verbatim.
    Str(Cow<'static, str>),
    /// Literal integer, emitted verbatim.
    Int(i64),
    /// Bound parameter.
    Param(Value),
    /// `child` followed by `suffix`.
    Unary {
        child: Box<Clause>,
        suffix: Cow<'static, str>,
    },
    /// `left`, `infix`, `right`. The infix carries its own spacing.
    Binary {
        left: Box<Clause>,
        right: Box<Clause>,
        infix: Cow<'static, str>,
    },
    /// Children joined by `sep`.
    Array {
        children: Vec<Clause>,
        sep: Cow<'static, str>,
    },
    /// `name(child)`
    Func {
        name: Cow<'static, str>,
        child: Box<Clause>,
    },
    /// Parenthesized AND/OR group. Must not be empty.
    Group { op: BoolOp, children: Vec<Clause> },
}

impl Clause {
    pub fn column(table: Option<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Clause::Column {
            table,
            name: name.into(),
        }
    }

    /// Literal SQL text. The text is not escaped.
    pub fn raw(sql: impl Into<Cow<'static, str>>) -> Self {
        Clause::Str(sql.into())
    }

    pub fn int(value: i64) -> Self {
        Clause::Int(value)
    }

    pub fn param(value: impl ToValue) -> Self {
        Clause::Param(value.to_value())
    }

    pub fn unary(child: Clause, suffix: impl Into<Cow<'static, str>>) -> Self {
        Clause::Unary {
            child: Box::new(child),
            suffix: suffix.into(),
        }
    }

    pub fn binary(left: Clause, right: Clause, infix: impl Into<Cow<'static, str>>) -> Self {
        Clause::Binary {
            left: Box::new(left),
            right: Box::new(right),
            infix: infix.into(),
        }
    }

    pub fn array(children: Vec<Clause>, sep: impl Into<Cow<'static, str>>) -> Self {
        Clause::Array {
            children,
            sep: sep.into(),
        }
    }

    pub fn func(name: impl Into<Cow<'static, str>>, child: Clause) -> Self {
        Clause::Func {
            name: name.into(),
            child: Box::new(child),
        }
    }

    /// `(a AND b AND ...)`. Compiling an empty group is an error.
    pub fn all_of(children: impl IntoIterator<Item = Clause>) -> Self {
        Clause::Group {
            op: BoolOp::And,
            children: children.into_iter().collect(),
        }
    }

    /// `(a OR b OR ...)`. Compiling an empty group is an error.
    pub fn any_of(children: impl IntoIterator<Item = Clause>) -> Self {
        Clause::Group {
            op: BoolOp::Or,
            children: children.into_iter().collect(),
        }
    }

    /// `NOT (c)`
    pub fn not(clause: Clause) -> Self {
        Clause::func("NOT ", clause)
    }

    /// AND-combine with another clause, extending an existing AND group
    /// instead of nesting a new one.
    pub fn and(self, other: Clause) -> Self {
        self.combine(BoolOp::And, other)
    }

    /// OR-combine with another clause, extending an existing OR group.
    pub fn or(self, other: Clause) -> Self {
        self.combine(BoolOp::Or, other)
    }

    fn combine(self, op: BoolOp, other: Clause) -> Self {
        match self {
            Clause::Group {
                op: existing,
                mut children,
            } if existing == op && !children.is_empty() => {
                children.push(other);
                Clause::Group { op, children }
            }
            this => Clause::Group {
                op,
                children: vec![this, other],
            },
        }
    }

    // ── comparison helpers ──────────────────────────────────────────────────

    pub fn equals(self, rhs: impl IntoClause) -> Clause {
        Clause::binary(self, rhs.into_clause(), " = ")
    }

    pub fn not_equals(self, rhs: impl IntoClause) -> Clause {
        Clause::binary(self, rhs.into_clause(), " != ")
    }

    pub fn less_than(self, rhs: impl IntoClause) -> Clause {
        Clause::binary(self, rhs.into_clause(), " < ")
    }

    pub fn greater_than(self, rhs: impl IntoClause) -> Clause {
        Clause::binary(self, rhs.into_clause(), " > ")
    }

    pub fn lte(self, rhs: impl IntoClause) -> Clause {
        Clause::binary(self, rhs.into_clause(), " <= ")
    }

    pub fn gte(self, rhs: impl IntoClause) -> Clause {
        Clause::binary(self, rhs.into_clause(), " >= ")
    }

    pub fn like(self, pattern: impl IntoClause) -> Clause {
        Clause::binary(self, pattern.into_clause(), " LIKE ")
    }

    pub fn ilike(self, pattern: impl IntoClause) -> Clause {
        Clause::binary(self, pattern.into_clause(), " ILIKE ")
    }

    pub fn not_like(self, pattern: impl IntoClause) -> Clause {
        Clause::binary(self, pattern.into_clause(), " NOT LIKE ")
    }

    /// `x IN (a, b, ...)`; an empty list renders `1=0`.
    pub fn in_list<I>(self, values: I) -> Clause
    where
        I: IntoIterator,
        I::Item: IntoClause,
    {
        let children: Vec<Clause> = values.into_iter().map(IntoClause::into_clause).collect();
        if children.is_empty() {
            return Clause::raw("1=0");
        }
        Clause::binary(self, Clause::func("", Clause::array(children, ", ")), " IN ")
    }

    /// `x NOT IN (a, b, ...)`; an empty list renders `1=1`.
    pub fn not_in<I>(self, values: I) -> Clause
    where
        I: IntoIterator,
        I::Item: IntoClause,
    {
        let children: Vec<Clause> = values.into_iter().map(IntoClause::into_clause).collect();
        if children.is_empty() {
            return Clause::raw("1=1");
        }
        Clause::binary(
            self,
            Clause::func("", Clause::array(children, ", ")),
            " NOT IN ",
        )
    }

    /// `x BETWEEN lo AND hi`
    pub fn between(self, lo: impl IntoClause, hi: impl IntoClause) -> Clause {
        Clause::binary(
            self,
            Clause::binary(lo.into_clause(), hi.into_clause(), " AND "),
            " BETWEEN ",
        )
    }

    pub fn is_null(self) -> Clause {
        Clause::unary(self, " IS NULL")
    }

    pub fn is_not_null(self) -> Clause {
        Clause::unary(self, " IS NOT NULL")
    }

    // ── compilation ─────────────────────────────────────────────────────────

    /// Render the clause, appending bound values to `params`.
    ///
    /// Errors from children propagate unchanged; values appended before the
    /// error stay in the bag.
    pub fn compile(&self, dialect: &dyn Dialect, params: &mut Parameters) -> OrmResult<String> {
        let mut out = String::new();
        self.write(&mut out, dialect, params)?;
        Ok(out)
    }

    pub(crate) fn write(
        &self,
        out: &mut String,
        dialect: &dyn Dialect,
        params: &mut Parameters,
    ) -> OrmResult<()> {
        match self {
            Clause::Column { table, name } => {
                write_qualified(out, table.as_deref(), name);
            }
            Clause::Str(s) => out.push_str(s),
            Clause::Int(i) => out.push_str(&i.to_string()),
            Clause::Param(value) => {
                let position = params.add(value.clone());
                out.push_str(&dialect.placeholder(position));
            }
            Clause::Unary { child, suffix } => {
                child.write(out, dialect, params)?;
                out.push_str(suffix);
            }
            Clause::Binary { left, right, infix } => {
                left.write(out, dialect, params)?;
                out.push_str(infix);
                right.write(out, dialect, params)?;
            }
            Clause::Array { children, sep } => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(sep);
                    }
                    child.write(out, dialect, params)?;
                }
            }
            Clause::Func { name, child } => {
                out.push_str(name);
                out.push('(');
                child.write(out, dialect, params)?;
                out.push(')');
            }
            Clause::Group { op, children } => match children.as_slice() {
                [] => {
                    return Err(OrmError::compile(format!(
                        "empty{}group",
                        op.infix()
                    )));
                }
                [only] => only.write(out, dialect, params)?,
                _ => {
                    out.push('(');
                    for (i, child) in children.iter().enumerate() {
                        if i > 0 {
                            out.push_str(op.infix());
                        }
                        child.write(out, dialect, params)?;
                    }
                    out.push(')');
                }
            },
        }
        Ok(())
    }
}

/// Conversion into a right-hand operand.
///
/// Plain values become bound parameters; columns and clauses are used as-is.
pub trait IntoClause {
    fn into_clause(self) -> Clause;
}

impl<T: ToValue> IntoClause for T {
    fn into_clause(self) -> Clause {
        Clause::Param(self.to_value())
    }
}

impl IntoClause for Clause {
    fn into_clause(self) -> Clause {
        self
    }
}

/// Placement of NULLs in an ORDER BY term.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nulls {
    First,
    Last,
}

/// An ORDER BY term.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    clause: Clause,
    desc: bool,
    nulls: Option<Nulls>,
}

impl OrderBy {
    pub fn asc(clause: impl IntoClause) -> Self {
        Self {
            clause: clause.into_clause(),
            desc: false,
            nulls: None,
        }
    }

    pub fn desc(clause: impl IntoClause) -> Self {
        Self {
            clause: clause.into_clause(),
            desc: true,
            nulls: None,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(Nulls::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(Nulls::Last);
        self
    }

    pub(crate) fn write(
        &self,
        out: &mut String,
        dialect: &dyn Dialect,
        params: &mut Parameters,
    ) -> OrmResult<()> {
        self.clause.write(out, dialect, params)?;
        if self.desc {
            out.push_str(" DESC");
        }
        match self.nulls {
            Some(Nulls::First) => out.push_str(" NULLS FIRST"),
            Some(Nulls::Last) => out.push_str(" NULLS LAST"),
            None => {}
        }
        Ok(())
    }
}

impl From<Clause> for OrderBy {
    fn from(clause: Clause) -> Self {
        OrderBy::asc(clause)
    }
}
