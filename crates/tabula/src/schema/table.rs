use super::column::Column;
use super::constraint::ForeignKeyDef;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::validate_ident;
use crate::stmt::{AlterTable, CreateTable, Delete, DropTable, Insert, Select, Update, Values};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Something that changes a table while it is being built.
///
/// Columns and constraints implement this; custom modifiers can use the
/// public mutation methods of [`TableDef`].
pub trait Modifier {
    fn modify(&self, table: &mut TableDef) -> OrmResult<()>;
}

/// A table-level item rendered inside CREATE TABLE after the columns.
pub trait Creatable: fmt::Debug + Send + Sync {
    fn create_sql(&self, dialect: &dyn Dialect) -> OrmResult<String>;
}

/// Primary key of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKeyDef {
    pub columns: Vec<String>,
    /// Declared on the column type itself (`INTEGER PRIMARY KEY`) rather than
    /// as a table constraint.
    pub inline: bool,
}

/// Table state while modifiers run, and the frozen definition afterwards.
#[derive(Debug)]
pub struct TableDef {
    name: Arc<str>,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    primary_key: Option<PrimaryKeyDef>,
    uniques: Vec<Vec<String>>,
    foreign_keys: Vec<ForeignKeyDef>,
    creatables: Vec<Arc<dyn Creatable>>,
}

impl TableDef {
    fn new(name: Arc<str>) -> Self {
        Self {
            name,
            columns: Vec::new(),
            index: HashMap::new(),
            primary_key: None,
            uniques: Vec::new(),
            foreign_keys: Vec::new(),
            creatables: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Fail unless every named column is already part of the table.
    pub fn require_columns<S: AsRef<str>>(&self, what: &str, names: &[S]) -> OrmResult<()> {
        if names.is_empty() {
            return Err(OrmError::schema(format!(
                "{what} on table \"{}\" needs at least one column",
                self.name
            )));
        }
        for name in names {
            let name = name.as_ref();
            if !self.has_column(name) {
                return Err(OrmError::schema(format!(
                    "{what} references unknown column \"{name}\" on table \"{}\"",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Bind and append a column. Primary key types also set the table key.
    pub fn add_column(&mut self, column: Column) -> OrmResult<()> {
        validate_ident("column", column.name())?;
        if self.has_column(column.name()) {
            return Err(OrmError::schema(format!(
                "duplicate column \"{}\" on table \"{}\"",
                column.name(),
                self.name
            )));
        }
        let column = column.bind(&self.name)?;
        if column.sql_type().is_primary_key() {
            self.set_primary_key(vec![column.name().to_string()], true)?;
        }
        self.index
            .insert(column.name().to_string(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    pub fn set_primary_key(&mut self, columns: Vec<String>, inline: bool) -> OrmResult<()> {
        if let Some(existing) = &self.primary_key {
            return Err(OrmError::schema(format!(
                "table \"{}\" already has a primary key ({})",
                self.name,
                existing.columns.join(", ")
            )));
        }
        self.primary_key = Some(PrimaryKeyDef { columns, inline });
        Ok(())
    }

    pub fn add_unique(&mut self, columns: Vec<String>) {
        self.uniques.push(columns);
    }

    pub fn add_foreign_key(&mut self, fk: ForeignKeyDef) {
        self.foreign_keys.push(fk);
    }

    pub fn add_creatable(&mut self, item: Arc<dyn Creatable>) {
        self.creatables.push(item);
    }
}

/// Builder returned by [`Table::new`].
pub struct TableBuilder {
    def: TableDef,
    error: Option<OrmError>,
}

impl TableBuilder {
    /// Apply a modifier. After the first failure later modifiers are skipped.
    pub fn with(mut self, modifier: impl Modifier) -> Self {
        if self.error.is_none() {
            if let Err(e) = modifier.modify(&mut self.def) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Finish the table.
    ///
    /// # Panics
    ///
    /// Panics if any modifier failed. Schemas are declared once at startup,
    /// so an invalid one is a programming error.
    pub fn build(self) -> Table {
        match self.try_build() {
            Ok(table) => table,
            Err(e) => panic!("invalid table definition: {e}"),
        }
    }

    /// Finish the table, returning the first modifier error.
    pub fn try_build(self) -> OrmResult<Table> {
        if let Some(e) = self.error {
            return Err(e);
        }
        validate_ident("table", &self.def.name)?;
        Ok(Table(Arc::new(self.def)))
    }
}

/// A built table. Cheap to clone; shared read-only after construction.
///
/// # Example
///
/// ```ignore
/// use tabula::schema::{Column, Table, Integer, Varchar};
///
/// let users = Table::new("users")
///     .with(Column::new("id", Integer::new().primary_key()))
///     .with(Column::new("name", Varchar::new(64).not_null()))
///     .build();
///
/// let sql = users.select().filter(users.c("id").equals(1)).to_sql();
/// assert_eq!(sql, r#"SELECT "users"."id", "users"."name" FROM "users" WHERE "users"."id" = $1"#);
/// ```
#[derive(Clone)]
pub struct Table(Arc<TableDef>);

impl Table {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(name: impl Into<Arc<str>>) -> TableBuilder {
        TableBuilder {
            def: TableDef::new(name.into()),
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.0.name
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.0.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.0.column(name)
    }

    /// Column by name.
    ///
    /// # Panics
    ///
    /// Panics if the table has no such column; use [`Table::column`] for a
    /// fallible lookup.
    pub fn c(&self, name: &str) -> Column {
        match self.column(name) {
            Some(c) => c.clone(),
            None => panic!("table \"{}\" has no column \"{name}\"", self.name()),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.0.has_column(name)
    }

    pub fn primary_key(&self) -> Option<&PrimaryKeyDef> {
        self.0.primary_key.as_ref()
    }

    /// Primary key columns in key order (empty without a key).
    pub fn primary_key_columns(&self) -> Vec<Column> {
        self.primary_key()
            .map(|pk| {
                pk.columns
                    .iter()
                    .filter_map(|name| self.column(name).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn uniques(&self) -> &[Vec<String>] {
        &self.0.uniques
    }

    pub fn foreign_keys(&self) -> &[ForeignKeyDef] {
        &self.0.foreign_keys
    }

    pub(crate) fn foreign_key_for(&self, column: &str) -> Option<&ForeignKeyDef> {
        self.0.foreign_keys.iter().find(|fk| fk.column == column)
    }

    pub fn creatables(&self) -> &[Arc<dyn Creatable>] {
        &self.0.creatables
    }

    /// Coerce every value through its column type.
    ///
    /// Unknown keys and missing required columns are rejected.
    pub fn validate(&self, values: &Values) -> OrmResult<Values> {
        let mut out = Values::new();
        for (key, value) in values.iter() {
            let column = self.column(key).ok_or_else(|| {
                OrmError::validation(format!(
                    "table \"{}\" has no column \"{key}\"",
                    self.name()
                ))
            })?;
            let coerced = column
                .sql_type()
                .validate(value.clone())
                .map_err(|e| e.for_column(key))?;
            out.insert(key.clone(), coerced);
        }
        for column in self.columns() {
            if column.sql_type().is_required() && values.get(column.name()).is_none() {
                return Err(OrmError::validation(format!(
                    "column \"{}\" is required",
                    column.name()
                )));
            }
        }
        Ok(out)
    }

    // ── statements ──────────────────────────────────────────────────────────

    /// `SELECT` of every column.
    pub fn select(&self) -> Select {
        Select::new(self)
    }

    /// `INSERT` into every column.
    pub fn insert(&self) -> Insert {
        Insert::new(self.columns().to_vec())
    }

    pub fn update(&self, values: Values) -> Update {
        Update::new(self).values(values)
    }

    pub fn delete(&self) -> Delete {
        Delete::new(self)
    }

    pub fn create(&self) -> CreateTable {
        CreateTable::new(self)
    }

    pub fn drop(&self) -> DropTable {
        DropTable::new(self)
    }

    pub fn alter(&self) -> AlterTable {
        AlterTable::new(self)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.0.name)
            .field(
                "columns",
                &self.0.columns.iter().map(Column::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}
