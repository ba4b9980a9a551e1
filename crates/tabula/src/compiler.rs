//! Dialect-bound statement compilation with SQL logging.
//!
//! A [`Compiler`] pairs a [`Dialect`] with a [`CompilerConfig`] and emits a
//! `tracing` event (target `tabula.sql`) for every statement it builds.
//!
//! ```ignore
//! let config: CompilerConfig = serde_json::from_str(r#"{"dialect": "sqlite"}"#)?;
//! let compiler = Compiler::from_config(config)?;
//! let built = compiler.build(&users.select())?;
//! ```

use crate::dialect::{Dialect, PostgresDialect, dialect};
use crate::error::{OrmError, OrmResult};
use crate::stmt::{BuiltQuery, Compile};
use serde::Deserialize;
use std::sync::Arc;
use tracing::Level;

/// Level of the per-statement SQL event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlLogLevel {
    Off,
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl SqlLogLevel {
    fn as_level(self) -> Option<Level> {
        match self {
            SqlLogLevel::Off => None,
            SqlLogLevel::Error => Some(Level::ERROR),
            SqlLogLevel::Warn => Some(Level::WARN),
            SqlLogLevel::Info => Some(Level::INFO),
            SqlLogLevel::Debug => Some(Level::DEBUG),
            SqlLogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Compiler settings.
///
/// Deserializable so it can live in the application's own configuration
/// file; missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Registered dialect name (default `"postgres"`).
    pub dialect: String,
    /// Level of the SQL event (default debug).
    pub log_level: SqlLogLevel,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            dialect: "postgres".to_string(),
            log_level: SqlLogLevel::Debug,
            max_sql_length: Some(200),
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(mut self, name: impl Into<String>) -> Self {
        self.dialect = name.into();
        self
    }

    pub fn with_log_level(mut self, level: SqlLogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Builds statements for one dialect.
#[derive(Clone)]
pub struct Compiler {
    dialect: Arc<dyn Dialect>,
    config: CompilerConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(Arc::new(PostgresDialect))
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("dialect", &self.dialect.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Compiler {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            config: CompilerConfig::default().with_dialect(dialect.name()),
            dialect,
        }
    }

    /// Resolve the configured dialect through the registry.
    pub fn from_config(config: CompilerConfig) -> OrmResult<Self> {
        let dialect = dialect(&config.dialect)?;
        Ok(Self { dialect, config })
    }

    pub fn dialect(&self) -> &dyn Dialect {
        &*self.dialect
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile `stmt` into SQL text and a fresh parameter bag.
    pub fn build(&self, stmt: &impl Compile) -> OrmResult<BuiltQuery> {
        match stmt.build(&*self.dialect) {
            Ok(built) => {
                self.emit(&built);
                Ok(built)
            }
            Err(e) => {
                if matches!(e, OrmError::Config(_)) {
                    tracing::warn!(
                        target: "tabula.sql",
                        dialect = self.dialect.name(),
                        error = %e,
                        "statement configuration error"
                    );
                }
                Err(e)
            }
        }
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }

    fn emit(&self, built: &BuiltQuery) {
        // `tracing` levels are compile-time only; pick the macro from the
        // configured `SqlLogLevel`.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let Some(level) = self.config.log_level.as_level() else {
            return;
        };
        let sql = self.truncate_sql(&built.sql);
        emit_at_level!(
            level,
            target: "tabula.sql",
            dialect = self.dialect.name(),
            param_count = built.params.len(),
            sql = %sql,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, Integer, Table};

    #[test]
    fn test_config_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.dialect, "postgres");
        assert_eq!(config.log_level, SqlLogLevel::Debug);
        assert_eq!(config.max_sql_length, Some(200));
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: CompilerConfig =
            serde_json::from_str(r#"{"dialect": "sqlite", "log_level": "off"}"#).unwrap();
        assert_eq!(config.dialect, "sqlite");
        assert_eq!(config.log_level, SqlLogLevel::Off);
        assert_eq!(config.max_sql_length, Some(200));
    }

    #[test]
    fn test_from_config_unknown_dialect() {
        let err = Compiler::from_config(CompilerConfig::new().with_dialect("nope")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_build_uses_configured_dialect() {
        let t = Table::new("t")
            .with(Column::new("id", Integer::new()))
            .build();
        let compiler = Compiler::from_config(CompilerConfig::new().with_dialect("sqlite")).unwrap();
        let built = compiler.build(&t.select().filter(t.c("id").equals(1))).unwrap();
        assert_eq!(built.sql, r#"SELECT "t"."id" FROM "t" WHERE "t"."id" = ?"#);
        assert_eq!(built.params.len(), 1);
    }

    #[test]
    fn test_truncate() {
        let compiler = Compiler::from_config(CompilerConfig::new().with_max_sql_length(5)).unwrap();
        assert_eq!(compiler.truncate_sql("SELECT 1"), "SELEC...");
        assert_eq!(compiler.truncate_sql("abc"), "abc");
        assert_eq!(truncate_sql_bytes("héllo", 2), "h");
    }
}
