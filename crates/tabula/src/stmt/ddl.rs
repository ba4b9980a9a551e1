//! CREATE / DROP / ALTER TABLE.

use super::Compile;
use crate::clause::Clause;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::write_quoted;
use crate::param::Parameters;
use crate::schema::{Column, Table, primary_key_sql, unique_sql};
use std::sync::Arc;

/// `CREATE TABLE` built from a table definition.
///
/// Renders one entry per line with two-space indentation: columns in
/// declaration order, then the table-level primary key (unless declared on
/// a column), unique constraints and other creatables.
#[derive(Clone, Debug)]
pub struct CreateTable {
    table: Table,
    if_not_exists: bool,
}

impl CreateTable {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            if_not_exists: false,
        }
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }
}

impl Compile for CreateTable {
    fn compile(&self, dialect: &dyn Dialect, _params: &mut Parameters) -> OrmResult<String> {
        let table = &self.table;
        if table.columns().is_empty() {
            return Err(OrmError::config(format!(
                "CREATE TABLE \"{}\" needs at least one column",
                table.name()
            )));
        }
        let mut entries = Vec::with_capacity(table.columns().len());
        for column in table.columns() {
            let mut entry = column.create_sql(dialect)?;
            if let Some(fk) = table.foreign_key_for(column.name()) {
                fk.write_references(&mut entry);
            }
            entries.push(entry);
        }
        if let Some(pk) = table.primary_key() {
            if !pk.inline {
                entries.push(primary_key_sql(&pk.columns));
            }
        }
        for unique in table.uniques() {
            entries.push(unique_sql(unique));
        }
        for item in table.creatables() {
            entries.push(item.create_sql(dialect)?);
        }

        let mut sql = String::from("CREATE TABLE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        write_quoted(&mut sql, table.name());
        sql.push_str(" (\n  ");
        sql.push_str(&entries.join(",\n  "));
        sql.push_str("\n);");
        Ok(sql)
    }
}

/// `DROP TABLE [IF EXISTS] "name"`
#[derive(Clone, Debug)]
pub struct DropTable {
    name: Arc<str>,
    if_exists: bool,
}

impl DropTable {
    pub fn new(table: &Table) -> Self {
        Self {
            name: Arc::from(table.name()),
            if_exists: false,
        }
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }
}

impl Compile for DropTable {
    fn compile(&self, _dialect: &dyn Dialect, _params: &mut Parameters) -> OrmResult<String> {
        let mut sql = String::from("DROP TABLE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        write_quoted(&mut sql, &self.name);
        Ok(sql)
    }
}

#[derive(Clone, Debug)]
enum AlterAction {
    RenameTo(String),
    AddColumn(Column),
    DropColumn(String),
}

/// `ALTER TABLE "name" <action>`
///
/// Exactly one action per statement; compiling without one is an error.
#[derive(Clone, Debug)]
pub struct AlterTable {
    table: Table,
    action: Option<AlterAction>,
}

impl AlterTable {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.clone(),
            action: None,
        }
    }

    /// `RENAME TO "name"`
    pub fn rename_to(mut self, name: impl Into<String>) -> Self {
        self.action = Some(AlterAction::RenameTo(name.into()));
        self
    }

    /// `ADD COLUMN "name" TYPE`
    pub fn add_column(mut self, column: Column) -> Self {
        self.action = Some(AlterAction::AddColumn(column));
        self
    }

    /// `DROP COLUMN "name"`
    pub fn drop_column(mut self, name: impl Into<String>) -> Self {
        self.action = Some(AlterAction::DropColumn(name.into()));
        self
    }
}

impl Compile for AlterTable {
    fn compile(&self, dialect: &dyn Dialect, params: &mut Parameters) -> OrmResult<String> {
        let Some(action) = &self.action else {
            return Err(OrmError::config(format!(
                "ALTER TABLE \"{}\" has no action",
                self.table.name()
            )));
        };
        let target = Clause::column(None, self.table.name());
        let clause = match action {
            AlterAction::RenameTo(name) => {
                Clause::binary(target, Clause::column(None, name.as_str()), " RENAME TO ")
            }
            AlterAction::AddColumn(column) => Clause::binary(
                target,
                Clause::raw(column.create_sql(dialect)?),
                " ADD COLUMN ",
            ),
            AlterAction::DropColumn(name) => {
                if !self.table.has_column(name) {
                    return Err(OrmError::config(format!(
                        "ALTER TABLE \"{}\" cannot drop unknown column \"{name}\"",
                        self.table.name()
                    )));
                }
                Clause::binary(target, Clause::column(None, name.as_str()), " DROP COLUMN ")
            }
        };
        Ok(format!("ALTER TABLE {}", clause.compile(dialect, params)?))
    }
}
