//! SQL dialects and the process-wide dialect registry.
//!
//! A [`Dialect`] only decides how a bound parameter is written into the SQL
//! text. The built-in dialects are submitted at link time through
//! `inventory`; additional ones can be added at startup with
//! [`register_dialect`].
//!
//! ```ignore
//! let pg = tabula::dialect("postgres")?;
//! assert_eq!(pg.placeholder(3), "$3");
//! ```

use crate::error::{OrmError, OrmResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Placeholder syntax of a SQL dialect.
pub trait Dialect: Send + Sync {
    /// Registry name, e.g. `"postgres"`.
    fn name(&self) -> &str;

    /// Placeholder text for a 1-based parameter position.
    fn placeholder(&self, position: usize) -> String;
}

impl fmt::Debug for dyn Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dialect").field(&self.name()).finish()
    }
}

/// PostgreSQL: numbered `$N` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }
}

/// SQLite: positional `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }
}

/// MySQL: positional `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }
}

/// Link-time registration entry for a dialect.
///
/// ```ignore
/// fn oracle() -> Arc<dyn Dialect> { Arc::new(OracleDialect) }
/// tabula::inventory::submit! { tabula::DialectRegistration::new("oracle", oracle) }
/// ```
pub struct DialectRegistration {
    pub name: &'static str,
    pub build: fn() -> Arc<dyn Dialect>,
}

impl DialectRegistration {
    pub const fn new(name: &'static str, build: fn() -> Arc<dyn Dialect>) -> Self {
        Self { name, build }
    }
}

inventory::collect!(DialectRegistration);

fn postgres() -> Arc<dyn Dialect> {
    Arc::new(PostgresDialect)
}

fn sqlite() -> Arc<dyn Dialect> {
    Arc::new(SqliteDialect)
}

fn mysql() -> Arc<dyn Dialect> {
    Arc::new(MysqlDialect)
}

inventory::submit! { DialectRegistration::new("postgres", postgres) }
inventory::submit! { DialectRegistration::new("sqlite", sqlite) }
inventory::submit! { DialectRegistration::new("mysql", mysql) }

type Registry = RwLock<HashMap<String, Arc<dyn Dialect>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map: HashMap<String, Arc<dyn Dialect>> = HashMap::new();
        for reg in inventory::iter::<DialectRegistration> {
            if map.insert(reg.name.to_string(), (reg.build)()).is_some() {
                panic!("dialect \"{}\" registered twice", reg.name);
            }
            tracing::debug!(target: "tabula.dialect", dialect = reg.name, "dialect registered");
        }
        RwLock::new(map)
    })
}

/// Register a dialect under `name`.
///
/// # Panics
///
/// Panics if a dialect with the same name is already registered.
pub fn register_dialect(name: impl Into<String>, dialect: Arc<dyn Dialect>) {
    let name = name.into();
    let mut map = registry().write().unwrap_or_else(PoisonError::into_inner);
    if map.contains_key(&name) {
        panic!("dialect \"{name}\" registered twice");
    }
    tracing::debug!(target: "tabula.dialect", dialect = %name, "dialect registered");
    map.insert(name, dialect);
}

/// Look up a registered dialect by name.
pub fn dialect(name: &str) -> OrmResult<Arc<dyn Dialect>> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
        .ok_or_else(|| OrmError::config(format!("unknown dialect \"{name}\"")))
}

/// Names of all registered dialects, sorted.
pub fn registered_dialects() -> Vec<String> {
    let mut names: Vec<String> = registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AtDialect;

    impl Dialect for AtDialect {
        fn name(&self) -> &str {
            "at-test"
        }

        fn placeholder(&self, position: usize) -> String {
            format!("@p{position}")
        }
    }

    #[test]
    fn test_builtin_placeholders() {
        assert_eq!(PostgresDialect.placeholder(12), "$12");
        assert_eq!(SqliteDialect.placeholder(12), "?");
        assert_eq!(MysqlDialect.placeholder(1), "?");
    }

    #[test]
    fn test_builtins_are_registered() {
        let names = registered_dialects();
        for name in ["mysql", "postgres", "sqlite"] {
            assert!(names.iter().any(|n| n == name), "missing {name}");
        }
        assert_eq!(dialect("postgres").unwrap().placeholder(2), "$2");
    }

    #[test]
    fn test_unknown_dialect() {
        let err = dialect("nope").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_register_custom() {
        register_dialect("at-test", Arc::new(AtDialect));
        assert_eq!(dialect("at-test").unwrap().placeholder(4), "@p4");
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_register_duplicate_panics() {
        register_dialect("postgres", Arc::new(PostgresDialect));
    }
}
