//! Table constraint modifiers.

use super::column::Column;
use super::table::{Creatable, Modifier, TableDef};
use super::types::SqlType;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::{quote_ident, write_quoted};
use std::fmt;
use std::sync::Arc;

fn quoted_list(names: &[String]) -> String {
    let mut out = String::new();
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_quoted(&mut out, name);
    }
    out
}

/// Table-level `PRIMARY KEY ("a", "b")`.
#[derive(Debug, Clone)]
pub struct PrimaryKey(Vec<String>);

impl PrimaryKey {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self(columns.into_iter().map(Into::into).collect())
    }
}

impl Modifier for PrimaryKey {
    fn modify(&self, table: &mut TableDef) -> OrmResult<()> {
        table.require_columns("primary key", &self.0)?;
        table.set_primary_key(self.0.clone(), false)
    }
}

/// Table-level `UNIQUE ("a", "b")`.
#[derive(Debug, Clone)]
pub struct Unique(Vec<String>);

impl Unique {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self(columns.into_iter().map(Into::into).collect())
    }
}

impl Modifier for Unique {
    fn modify(&self, table: &mut TableDef) -> OrmResult<()> {
        table.require_columns("unique constraint", &self.0)?;
        table.add_unique(self.0.clone());
        Ok(())
    }
}

pub(crate) fn unique_sql(columns: &[String]) -> String {
    format!("UNIQUE ({})", quoted_list(columns))
}

pub(crate) fn primary_key_sql(columns: &[String]) -> String {
    format!("PRIMARY KEY ({})", quoted_list(columns))
}

/// ON DELETE / ON UPDATE behaviour of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub fn as_sql(self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Column that references a column of another table.
///
/// Applying it adds a column named `name` to the table being built, typed
/// like the referenced column minus its constraints unless
/// [`ForeignKey::with_type`] overrides it.
///
/// ```ignore
/// let posts = Table::new("posts")
///     .with(Column::new("id", Integer::new().primary_key()))
///     .with(ForeignKey::new("author_id", &users.c("id")).on_delete(ReferentialAction::Cascade))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ForeignKey {
    name: String,
    references: Column,
    ty: Option<Arc<dyn SqlType>>,
    on_delete: Option<ReferentialAction>,
    on_update: Option<ReferentialAction>,
}

impl ForeignKey {
    pub fn new(name: impl Into<String>, references: &Column) -> Self {
        Self {
            name: name.into(),
            references: references.clone(),
            ty: None,
            on_delete: None,
            on_update: None,
        }
    }

    /// Use `ty` for the local column instead of the referenced type.
    pub fn with_type(mut self, ty: impl SqlType + 'static) -> Self {
        self.ty = Some(Arc::new(ty));
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

impl Modifier for ForeignKey {
    fn modify(&self, table: &mut TableDef) -> OrmResult<()> {
        let Some(ref_table) = self.references.table_name() else {
            return Err(OrmError::schema(format!(
                "foreign key \"{}\" on table \"{}\": missing table reference for column \"{}\"",
                self.name,
                table.name(),
                self.references.name()
            )));
        };
        let ty = match &self.ty {
            Some(ty) => ty.clone(),
            None => self.references.sql_type().referenced(),
        };
        table.add_column(Column::with_type(self.name.as_str(), ty))?;
        table.add_foreign_key(ForeignKeyDef {
            column: self.name.clone(),
            references_table: Arc::from(ref_table),
            references_column: Arc::from(self.references.name()),
            on_delete: self.on_delete,
            on_update: self.on_update,
        });
        Ok(())
    }
}

/// A foreign key as stored on the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDef {
    pub column: String,
    pub references_table: Arc<str>,
    pub references_column: Arc<str>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

impl ForeignKeyDef {
    /// ` REFERENCES table("col") [ON DELETE ..] [ON UPDATE ..]`, appended to
    /// the column definition.
    pub(crate) fn write_references(&self, out: &mut String) {
        out.push_str(" REFERENCES ");
        out.push_str(&self.references_table);
        out.push('(');
        write_quoted(out, &self.references_column);
        out.push(')');
        if let Some(action) = self.on_delete {
            out.push_str(" ON DELETE ");
            out.push_str(action.as_sql());
        }
        if let Some(action) = self.on_update {
            out.push_str(" ON UPDATE ");
            out.push_str(action.as_sql());
        }
    }
}

/// `EXCLUDE USING <method> ("col" WITH <op>, ...)`
#[derive(Debug, Clone)]
pub struct Exclude {
    method: String,
    elements: Vec<(String, String)>,
}

impl Exclude {
    /// Exclusion constraint using index `method` (usually `gist`).
    pub fn using(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            elements: Vec::new(),
        }
    }

    /// Add an element: column compared with operator `op`.
    pub fn element(mut self, column: impl Into<String>, op: impl Into<String>) -> Self {
        self.elements.push((column.into(), op.into()));
        self
    }
}

impl Modifier for Exclude {
    fn modify(&self, table: &mut TableDef) -> OrmResult<()> {
        let names: Vec<&str> = self.elements.iter().map(|(c, _)| c.as_str()).collect();
        table.require_columns("exclusion constraint", &names)?;
        table.add_creatable(Arc::new(self.clone()));
        Ok(())
    }
}

impl Creatable for Exclude {
    fn create_sql(&self, _dialect: &dyn Dialect) -> OrmResult<String> {
        let elements: Vec<String> = self
            .elements
            .iter()
            .map(|(column, op)| format!("{} WITH {op}", quote_ident(column)))
            .collect();
        Ok(format!(
            "EXCLUDE USING {} ({})",
            self.method,
            elements.join(", ")
        ))
    }
}
