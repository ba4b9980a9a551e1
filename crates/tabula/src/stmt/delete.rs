//! DELETE statement.

use super::selectable::{Selectable, Selection};
use super::{Compile, write_returning};
use crate::clause::Clause;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::write_quoted;
use crate::param::Parameters;
use crate::reflect::{Record, align_fields_to_columns, describe};
use crate::schema::Table;

/// DELETE statement builder.
#[derive(Clone, Debug)]
pub struct Delete {
    table: Table,
    condition: Option<Clause>,
    returning: Vec<Selection>,
    error: Option<OrmError>,
}

impl Delete {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            condition: None,
            returning: Vec::new(),
            error: None,
        }
    }

    /// Add a WHERE condition; repeated calls are AND-combined.
    pub fn filter(mut self, condition: Clause) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Delete the given record by primary key.
    pub fn value<R: Record + 'static>(self, record: &R) -> Self {
        self.values(std::slice::from_ref(record))
    }

    /// Delete the given records by primary key: `pk = $1` for one record,
    /// `pk IN (...)` for several. Composite keys are matched column by column.
    pub fn values<R: Record + 'static>(mut self, records: &[R]) -> Self {
        match self.primary_key_condition(records) {
            Ok(condition) => self.filter(condition),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e);
                }
                self
            }
        }
    }

    fn primary_key_condition<R: Record + 'static>(&self, records: &[R]) -> OrmResult<Clause> {
        let key = self.table.primary_key_columns();
        if key.is_empty() {
            return Err(OrmError::config(format!(
                "DELETE by record needs a primary key on \"{}\"",
                self.table.name()
            )));
        }
        if records.is_empty() {
            return Err(OrmError::config("DELETE by record needs at least one record"));
        }

        let fields = describe::<R>()?;
        let names: Vec<&str> = key.iter().map(|c| c.name()).collect();
        let aligned = align_fields_to_columns(&names, &fields);
        let mut paths = Vec::with_capacity(aligned.len());
        for (field, name) in aligned.into_iter().zip(&names) {
            match field {
                Some(field) => paths.push(field.path),
                None => {
                    return Err(OrmError::config(format!(
                        "{} has no field for primary key column \"{name}\"",
                        std::any::type_name::<R>()
                    )));
                }
            }
        }

        if let [column] = key.as_slice() {
            let path = &paths[0];
            let mut values = records
                .iter()
                .map(|r| r.get(path))
                .collect::<OrmResult<Vec<_>>>()?;
            return Ok(if values.len() == 1 {
                column.equals(values.remove(0))
            } else {
                column.in_list(values)
            });
        }

        let mut per_record = Vec::with_capacity(records.len());
        for record in records {
            let mut terms = Vec::with_capacity(key.len());
            for (column, path) in key.iter().zip(&paths) {
                terms.push(column.equals(record.get(path)?));
            }
            per_record.push(Clause::all_of(terms));
        }
        Ok(if per_record.len() == 1 {
            per_record.remove(0)
        } else {
            Clause::any_of(per_record)
        })
    }

    pub fn returning(mut self, source: impl Selectable) -> Self {
        self.returning.extend(source.selections());
        self
    }
}

impl Compile for Delete {
    fn compile(&self, dialect: &dyn Dialect, params: &mut Parameters) -> OrmResult<String> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let mut sql = String::from("DELETE FROM ");
        write_quoted(&mut sql, self.table.name());
        if let Some(condition) = &self.condition {
            sql.push_str(" WHERE ");
            condition.write(&mut sql, dialect, params)?;
        }
        write_returning(&mut sql, &self.returning, dialect, params)?;
        Ok(sql)
    }
}
