//! INSERT statement.

use super::selectable::{Selectable, Selection};
use super::{Compile, Values, write_returning};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::write_quoted;
use crate::param::Parameters;
use crate::reflect::{Record, align_fields_to_columns, describe};
use crate::schema::Column;
use crate::value::Value;
use std::sync::Arc;

/// INSERT statement builder.
///
/// Rows can come from records (`value`/`values`), [`Values`] maps or
/// positional value lists; every call appends rows. Without any row a single
/// row of NULL parameters is rendered.
///
/// A row cell is `None` when the record left an `omitempty` field empty: the
/// column is dropped from the statement. All rows of a bulk insert must drop
/// the same columns.
#[derive(Clone, Debug)]
pub struct Insert {
    table: Option<Arc<str>>,
    columns: Vec<Column>,
    rows: Vec<Vec<Option<Value>>>,
    returning: Vec<Selection>,
    error: Option<OrmError>,
}

impl Insert {
    /// Insert into `columns`, which must all belong to the same table.
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut insert = Self {
            table: None,
            columns: Vec::new(),
            rows: Vec::new(),
            returning: Vec::new(),
            error: None,
        };
        for column in columns {
            let Some(table) = column.table_name() else {
                insert.record(OrmError::config(format!(
                    "INSERT column \"{}\" does not belong to a table",
                    column.name()
                )));
                continue;
            };
            match &insert.table {
                None => insert.table = Some(Arc::from(table)),
                Some(first) if &**first != table => {
                    let message = format!(
                        "INSERT into \"{first}\" cannot use column \"{}\" of table \"{table}\"",
                        column.name()
                    );
                    insert.record(OrmError::config(message));
                    continue;
                }
                Some(_) => {}
            }
            if insert.columns.iter().any(|c| c.name() == column.name()) {
                let message = format!("INSERT lists column \"{}\" twice", column.name());
                insert.record(OrmError::config(message));
                continue;
            }
            insert.columns.push(column);
        }
        if insert.columns.is_empty() {
            insert.record(OrmError::config("INSERT needs at least one column"));
        }
        insert
    }

    fn record(&mut self, err: OrmError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Append one row from a record.
    pub fn value<R: Record + 'static>(self, record: &R) -> Self {
        self.values(std::slice::from_ref(record))
    }

    /// Append one row per record.
    pub fn values<R: Record + 'static>(mut self, records: &[R]) -> Self {
        if let Err(e) = self.push_records(records) {
            self.record(e);
        }
        self
    }

    fn push_records<R: Record + 'static>(&mut self, records: &[R]) -> OrmResult<()> {
        let fields = describe::<R>()?;
        let names: Vec<&str> = self.columns.iter().map(Column::name).collect();
        let aligned = align_fields_to_columns(&names, &fields);
        if let Some(pos) = aligned.iter().position(Option::is_none) {
            return Err(OrmError::config(format!(
                "{} has no field for INSERT column \"{}\"",
                std::any::type_name::<R>(),
                names[pos]
            )));
        }
        for record in records {
            let mut row = Vec::with_capacity(aligned.len());
            for field in aligned.iter().flatten() {
                let value = record.get(&field.path)?;
                if field.omit_empty && value.is_empty() {
                    row.push(None);
                } else {
                    row.push(Some(value));
                }
            }
            self.rows.push(row);
        }
        Ok(())
    }

    /// Append one row from a map; columns missing from the map are dropped.
    pub fn values_map(mut self, values: Values) -> Self {
        if let Some(unknown) = values
            .keys()
            .find(|key| !self.columns.iter().any(|c| c.name() == *key))
        {
            let message = format!("INSERT has no column \"{unknown}\"");
            self.record(OrmError::config(message));
            return self;
        }
        let row = self
            .columns
            .iter()
            .map(|c| values.get(c.name()).cloned())
            .collect();
        self.rows.push(row);
        self
    }

    /// Append one positional row; its length must match the column count.
    pub fn row(mut self, values: Vec<Value>) -> Self {
        if values.len() != self.columns.len() {
            let message = format!(
                "INSERT row has {} values for {} columns",
                values.len(),
                self.columns.len()
            );
            self.record(OrmError::config(message));
            return self;
        }
        self.rows.push(values.into_iter().map(Some).collect());
        self
    }

    pub fn returning(mut self, source: impl Selectable) -> Self {
        self.returning.extend(source.selections());
        self
    }
}

impl Compile for Insert {
    fn compile(&self, dialect: &dyn Dialect, params: &mut Parameters) -> OrmResult<String> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let Some(table) = &self.table else {
            return Err(OrmError::config("INSERT needs at least one column"));
        };

        let mut sql = String::from("INSERT INTO ");
        write_quoted(&mut sql, table);

        if self.rows.is_empty() {
            write_column_list(&mut sql, self.columns.iter());
            sql.push_str(" VALUES (");
            for i in 0..self.columns.len() {
                if i > 0 {
                    sql.push_str(", ");
                }
                let position = params.add(Value::Null);
                sql.push_str(&dialect.placeholder(position));
            }
            sql.push(')');
            write_returning(&mut sql, &self.returning, dialect, params)?;
            return Ok(sql);
        }

        let present: Vec<bool> = self.rows[0].iter().map(Option::is_some).collect();
        if self.rows[1..]
            .iter()
            .any(|row| row.iter().map(Option::is_some).ne(present.iter().copied()))
        {
            return Err(OrmError::config(
                "bulk INSERT rows must leave the same columns empty",
            ));
        }

        if !present.contains(&true) {
            if self.rows.len() > 1 {
                return Err(OrmError::config(
                    "bulk INSERT rows cannot all use DEFAULT VALUES",
                ));
            }
            sql.push_str(" DEFAULT VALUES");
            write_returning(&mut sql, &self.returning, dialect, params)?;
            return Ok(sql);
        }

        let included = self
            .columns
            .iter()
            .zip(&present)
            .filter(|(_, p)| **p)
            .map(|(c, _)| c);
        write_column_list(&mut sql, included);

        sql.push_str(" VALUES ");
        for (r, row) in self.rows.iter().enumerate() {
            if r > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (i, value) in row.iter().flatten().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                let position = params.add(value.clone());
                sql.push_str(&dialect.placeholder(position));
            }
            sql.push(')');
        }

        write_returning(&mut sql, &self.returning, dialect, params)?;
        Ok(sql)
    }
}

fn write_column_list<'a>(sql: &mut String, columns: impl Iterator<Item = &'a Column>) {
    sql.push_str(" (");
    for (i, column) in columns.enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        write_quoted(sql, column.name());
    }
    sql.push(')');
}
