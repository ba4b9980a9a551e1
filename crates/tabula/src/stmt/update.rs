//! UPDATE statement.

use super::selectable::{Selectable, Selection};
use super::{Compile, Values, write_returning};
use crate::clause::Clause;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::write_quoted;
use crate::param::Parameters;
use crate::schema::Table;

/// UPDATE statement builder.
///
/// `SET` entries come from a [`Values`] map and render in sorted key order.
#[derive(Clone, Debug)]
pub struct Update {
    table: Table,
    values: Values,
    condition: Option<Clause>,
    returning: Vec<Selection>,
    error: Option<OrmError>,
}

impl Update {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            values: Values::new(),
            condition: None,
            returning: Vec::new(),
            error: None,
        }
    }

    /// Merge `values` into the SET list. Keys must name table columns.
    pub fn values(mut self, values: Values) -> Self {
        for (key, value) in values {
            if !self.table.has_column(&key) {
                if self.error.is_none() {
                    self.error = Some(OrmError::config(format!(
                        "UPDATE of \"{}\" has no column \"{key}\"",
                        self.table.name()
                    )));
                }
                continue;
            }
            self.values.insert(key, value);
        }
        self
    }

    /// Set a single column.
    pub fn set(self, column: impl Into<String>, value: impl crate::value::ToValue) -> Self {
        self.values(Values::new().set(column, value))
    }

    /// Add a WHERE condition; repeated calls are AND-combined.
    pub fn filter(mut self, condition: Clause) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    pub fn returning(mut self, source: impl Selectable) -> Self {
        self.returning.extend(source.selections());
        self
    }
}

impl Compile for Update {
    fn compile(&self, dialect: &dyn Dialect, params: &mut Parameters) -> OrmResult<String> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if self.values.is_empty() {
            return Err(OrmError::config(format!(
                "UPDATE of \"{}\" has no values",
                self.table.name()
            )));
        }

        let mut sql = String::from("UPDATE ");
        write_quoted(&mut sql, self.table.name());
        sql.push_str(" SET ");
        for (i, (column, value)) in self.values.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            write_quoted(&mut sql, column);
            sql.push_str(" = ");
            let position = params.add(value.clone());
            sql.push_str(&dialect.placeholder(position));
        }

        if let Some(condition) = &self.condition {
            sql.push_str(" WHERE ");
            condition.write(&mut sql, dialect, params)?;
        }

        write_returning(&mut sql, &self.returning, dialect, params)?;
        Ok(sql)
    }
}
