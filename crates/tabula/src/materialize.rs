//! Copying result rows into records.
//!
//! The materializer is driver agnostic: anything implementing [`RowSource`]
//! can feed it. [`PgRows`] adapts rows returned by tokio-postgres and
//! [`MemoryRows`] serves rows held in memory.
//!
//! ```ignore
//! let rows = client.query(&built.sql, &built.params_ref()).await?;
//! let mut users: Vec<User> = Vec::new();
//! tabula::all(&mut PgRows::new(rows), &mut users)?;
//! ```

use crate::error::{OrmError, OrmResult};
use crate::reflect::{Field, Record, align_fields_to_columns, describe};
use crate::value::{FromValue, Value};
use std::collections::VecDeque;
use tracing::trace;

/// A cursor over query results.
pub trait RowSource {
    /// Result column names, in order.
    fn columns(&self) -> &[String];

    /// Advance to the next row. Returns `false` when exhausted or failed.
    fn next(&mut self) -> bool;

    /// Values of the current row, one per column.
    fn scan(&mut self) -> OrmResult<Vec<Value>>;

    /// Error that stopped iteration, if any.
    fn err(&mut self) -> Option<OrmError>;
}

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
    error: Option<OrmError>,
}

impl MemoryRows {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.rows.push_back(values);
        self
    }

    /// Report `error` from `err()` once the buffered rows are consumed.
    pub fn fail_with(mut self, error: OrmError) -> Self {
        self.error = Some(error);
        self
    }
}

impl RowSource for MemoryRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next(&mut self) -> bool {
        self.current = self.rows.pop_front();
        self.current.is_some()
    }

    fn scan(&mut self) -> OrmResult<Vec<Value>> {
        let values = self
            .current
            .take()
            .ok_or_else(|| OrmError::scan("scan called without a current row"))?;
        if values.len() != self.columns.len() {
            return Err(OrmError::scan(format!(
                "row has {} values for {} columns",
                values.len(),
                self.columns.len()
            )));
        }
        Ok(values)
    }

    fn err(&mut self) -> Option<OrmError> {
        if self.rows.is_empty() {
            self.error.take()
        } else {
            None
        }
    }
}

/// Row source over rows fetched with tokio-postgres.
pub struct PgRows {
    columns: Vec<String>,
    rows: std::vec::IntoIter<tokio_postgres::Row>,
    current: Option<tokio_postgres::Row>,
}

impl PgRows {
    /// Column names are taken from the first row; use
    /// [`PgRows::from_statement`] when the result may be empty.
    pub fn new(rows: Vec<tokio_postgres::Row>) -> Self {
        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        Self {
            columns,
            rows: rows.into_iter(),
            current: None,
        }
    }

    pub fn from_statement(statement: &tokio_postgres::Statement, rows: Vec<tokio_postgres::Row>) -> Self {
        Self {
            columns: statement
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            rows: rows.into_iter(),
            current: None,
        }
    }
}

impl RowSource for PgRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next(&mut self) -> bool {
        self.current = self.rows.next();
        self.current.is_some()
    }

    fn scan(&mut self) -> OrmResult<Vec<Value>> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| OrmError::scan("scan called without a current row"))?;
        (0..row.len())
            .map(|i| {
                row.try_get::<usize, Value>(i)
                    .map_err(|e| OrmError::decode(self.columns[i].as_str(), e.to_string()))
            })
            .collect()
    }

    fn err(&mut self) -> Option<OrmError> {
        None
    }
}

/// Field for each result column, or an error when the record cannot hold
/// the result.
fn plan<R: Record + 'static>(columns: &[String]) -> OrmResult<Vec<Option<Field>>> {
    let fields = describe::<R>()?;
    let aligned = align_fields_to_columns(columns, &fields);
    let matched: Vec<&Field> = aligned.iter().flatten().collect();
    // Two columns resolving to one field leave other fields unset.
    let distinct = matched
        .iter()
        .enumerate()
        .all(|(i, f)| matched[..i].iter().all(|g| g.path != f.path));
    let matched = matched.len();
    if matched == columns.len() && distinct {
        return Ok(aligned);
    }
    if fields.len() == columns.len() {
        trace!(
            target: "tabula.materialize",
            record = std::any::type_name::<R>(),
            matched,
            columns = columns.len(),
            "column names do not match, falling back to positional mapping"
        );
        return Ok(fields.iter().cloned().map(Some).collect());
    }
    Err(OrmError::shape(format!(
        "{} has {} fields but the result has {} columns ({} matched by name)",
        std::any::type_name::<R>(),
        fields.len(),
        columns.len(),
        matched
    )))
}

fn fill<R: Record>(
    record: &mut R,
    plan: &[Option<Field>],
    columns: &[String],
    values: Vec<Value>,
) -> OrmResult<()> {
    for ((field, column), value) in plan.iter().zip(columns).zip(values) {
        let Some(field) = field else { continue };
        record
            .set(&field.path, value)
            .map_err(|e| e.for_column(column))?;
    }
    Ok(())
}

/// Copy the first row into `dest`.
///
/// Fails with `NotFound` when there is no row.
pub fn one<R, S>(rows: &mut S, dest: &mut R) -> OrmResult<()>
where
    R: Record + 'static,
    S: RowSource + ?Sized,
{
    let columns = rows.columns().to_vec();
    let plan = plan::<R>(&columns)?;
    if !rows.next() {
        return Err(rows
            .err()
            .unwrap_or_else(|| OrmError::not_found("query returned no rows")));
    }
    let values = rows.scan()?;
    fill(dest, &plan, &columns, values)
}

/// Append one fresh record per row to `dest`.
pub fn all<R, S>(rows: &mut S, dest: &mut Vec<R>) -> OrmResult<()>
where
    R: Record + Default + 'static,
    S: RowSource + ?Sized,
{
    let columns = rows.columns().to_vec();
    let plan = plan::<R>(&columns)?;
    while rows.next() {
        let values = rows.scan()?;
        let mut record = R::default();
        fill(&mut record, &plan, &columns, values)?;
        dest.push(record);
    }
    match rows.err() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Read the single column of the first row.
pub fn scalar<T, S>(rows: &mut S) -> OrmResult<T>
where
    T: FromValue,
    S: RowSource + ?Sized,
{
    let columns = rows.columns().to_vec();
    if columns.len() != 1 {
        return Err(OrmError::shape(format!(
            "scalar query must return exactly one column, got {}",
            columns.len()
        )));
    }
    if !rows.next() {
        return Err(rows
            .err()
            .unwrap_or_else(|| OrmError::not_found("query returned no rows")));
    }
    let value = rows.scan()?.into_iter().next().unwrap_or_default();
    T::from_value(value).map_err(|e| e.for_column(&columns[0]))
}

/// [`one`], panicking on error.
///
/// # Panics
///
/// Panics if no row is available or the row cannot be copied.
pub fn must_one<R, S>(rows: &mut S, dest: &mut R)
where
    R: Record + 'static,
    S: RowSource + ?Sized,
{
    if let Err(e) = one(rows, dest) {
        panic!("must_one: {e}");
    }
}

/// [`all`], panicking on error.
///
/// # Panics
///
/// Panics if any row cannot be copied.
pub fn must_all<R, S>(rows: &mut S, dest: &mut Vec<R>)
where
    R: Record + Default + 'static,
    S: RowSource + ?Sized,
{
    if let Err(e) = all(rows, dest) {
        panic!("must_all: {e}");
    }
}
