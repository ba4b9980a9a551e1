//! SELECT statement.

use super::Compile;
use super::selectable::{Selectable, Selection};
use crate::clause::{Clause, IntoClause, OrderBy};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::write_quoted;
use crate::param::Parameters;
use crate::schema::{Column, Table};
use std::sync::Arc;

/// Join flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
}

impl JoinKind {
    fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
        }
    }
}

/// `JOIN "table" ON <condition>`
#[derive(Clone, Debug, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: Arc<str>,
    pub on: Clause,
}

/// SELECT statement builder.
///
/// The FROM list is inferred from the selected columns in order of first
/// appearance; joined tables are taken out of it and rendered as JOINs.
#[derive(Clone, Debug)]
pub struct Select {
    selections: Vec<Selection>,
    from: Vec<Arc<str>>,
    joins: Vec<Join>,
    condition: Option<Clause>,
    group_by: Vec<Clause>,
    having: Option<Clause>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    distinct: bool,
    error: Option<OrmError>,
}

impl Select {
    pub fn new(source: impl Selectable) -> Self {
        Self {
            selections: source.selections(),
            from: Vec::new(),
            joins: Vec::new(),
            condition: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            error: None,
        }
    }

    fn record(&mut self, err: OrmError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Append more entries to the SELECT list.
    pub fn columns(mut self, source: impl Selectable) -> Self {
        self.selections.extend(source.selections());
        self
    }

    /// Add a table to FROM even if none of its columns are selected.
    pub fn from(mut self, table: &Table) -> Self {
        self.from.push(table.name_arc().clone());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Add a WHERE condition; repeated calls are AND-combined.
    pub fn filter(mut self, condition: Clause) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// `JOIN <right's table> ON left = right`
    pub fn join(self, left: &Column, right: &Column) -> Self {
        self.join_kind(JoinKind::Inner, left, right)
    }

    /// `LEFT OUTER JOIN <right's table> ON left = right`
    pub fn left_join(self, left: &Column, right: &Column) -> Self {
        self.join_kind(JoinKind::LeftOuter, left, right)
    }

    fn join_kind(mut self, kind: JoinKind, left: &Column, right: &Column) -> Self {
        let (Some(left_table), Some(right_table)) = (left.table_name(), right.table_name()) else {
            self.record(OrmError::config(format!(
                "join between \"{}\" and \"{}\" needs columns that belong to tables",
                left.name(),
                right.name()
            )));
            return self;
        };
        if left.same_table(right) {
            self.record(OrmError::config(format!(
                "cannot join table \"{left_table}\" to itself"
            )));
            return self;
        }
        self.from.push(Arc::from(left_table));
        self.joins.push(Join {
            kind,
            table: Arc::from(right_table),
            on: left.equals(right),
        });
        self
    }

    /// Join `table` with an arbitrary condition.
    pub fn join_on(mut self, kind: JoinKind, table: &Table, on: Clause) -> Self {
        self.joins.push(Join {
            kind,
            table: table.name_arc().clone(),
            on,
        });
        self
    }

    pub fn group_by(mut self, expr: impl IntoClause) -> Self {
        self.group_by.push(expr.into_clause());
        self
    }

    /// Add a HAVING condition; repeated calls are AND-combined.
    pub fn having(mut self, condition: Clause) -> Self {
        self.having = Some(match self.having.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_by.push(order.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Tables of the implicit FROM list, joined tables removed.
    fn from_tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        let candidates = self
            .selections
            .iter()
            .filter_map(Selection::table)
            .chain(self.from.iter().map(|t| &**t));
        for table in candidates {
            if self.joins.iter().any(|j| &*j.table == table) {
                continue;
            }
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
        tables
    }
}

impl Compile for Select {
    fn compile(&self, dialect: &dyn Dialect, params: &mut Parameters) -> OrmResult<String> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.selections.is_empty() {
            return Err(OrmError::config("SELECT needs at least one column"));
        }

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        for (i, selection) in self.selections.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            selection.write(&mut sql, dialect, params)?;
        }

        let tables = self.from_tables();
        if !tables.is_empty() {
            sql.push_str(" FROM ");
            for (i, table) in tables.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                write_quoted(&mut sql, table);
            }
        }

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.kind.keyword());
            sql.push(' ');
            write_quoted(&mut sql, &join.table);
            sql.push_str(" ON ");
            join.on.write(&mut sql, dialect, params)?;
        }

        if let Some(condition) = &self.condition {
            sql.push_str(" WHERE ");
            condition.write(&mut sql, dialect, params)?;
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                expr.write(&mut sql, dialect, params)?;
            }
        }

        if let Some(having) = &self.having {
            sql.push_str(" HAVING ");
            having.write(&mut sql, dialect, params)?;
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                order.write(&mut sql, dialect, params)?;
            }
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        Ok(sql)
    }
}
