//! Column type descriptors.
//!
//! Every type renders its own CREATE syntax (type name plus inline
//! constraints) and validates values before they are sent to the database,
//! coercing where it can be done without loss.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Behaviour shared by all column types.
pub trait SqlType: fmt::Debug + Send + Sync {
    /// Type name followed by inline constraints, e.g. `INTEGER PRIMARY KEY`.
    fn create_sql(&self, dialect: &dyn Dialect) -> OrmResult<String>;

    fn is_primary_key(&self) -> bool;

    /// A value must be supplied on insert (NOT NULL without default).
    fn is_required(&self) -> bool;

    fn is_unique(&self) -> bool;

    /// Coerce `value` into the representation this type stores.
    fn validate(&self, value: Value) -> OrmResult<Value>;

    /// Same type with every constraint removed, used for foreign key columns.
    fn referenced(&self) -> Arc<dyn SqlType>;
}

/// Column DEFAULT clause.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// A literal, rendered as SQL text.
    Literal(Value),
    /// Raw SQL such as `now()`.
    Raw(String),
}

/// Inline constraints carried by every type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub primary_key: bool,
    pub not_null: bool,
    pub unique: bool,
    pub default: Option<DefaultValue>,
}

impl Constraints {
    fn write(&self, out: &mut String) -> OrmResult<()> {
        if self.primary_key {
            out.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            out.push_str(" NOT NULL");
        }
        if self.unique {
            out.push_str(" UNIQUE");
        }
        if let Some(default) = &self.default {
            out.push_str(" DEFAULT ");
            match default {
                DefaultValue::Raw(sql) => out.push_str(sql),
                DefaultValue::Literal(value) => out.push_str(&literal_sql(value)?),
            }
        }
        Ok(())
    }

    fn is_required(&self) -> bool {
        self.not_null && self.default.is_none() && !self.primary_key
    }

    /// Handles NULL for every type: rejected when the column cannot hold it.
    fn check_null(&self) -> OrmResult<Value> {
        if self.not_null || self.primary_key {
            Err(OrmError::validation("value cannot be null"))
        } else {
            Ok(Value::Null)
        }
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn literal_sql(value: &Value) -> OrmResult<String> {
    Ok(match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => quote_literal(s),
        Value::Date(d) => quote_literal(&d.format("%Y-%m-%d").to_string()),
        Value::Timestamp(ts) => quote_literal(&ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Value::TimestampTz(ts) => quote_literal(&ts.to_rfc3339()),
        Value::Bytes(_) => {
            return Err(OrmError::schema("byte values cannot be used as a column default"));
        }
    })
}

fn reject(expected: &str, value: &Value) -> OrmError {
    OrmError::validation(format!(
        "cannot convert {} value {value} to {expected}",
        value.type_name()
    ))
}

macro_rules! constraint_builders {
    ($($ty:ident),* $(,)?) => {
        $(
            impl $ty {
                /// Mark the column as the table's primary key.
                pub fn primary_key(mut self) -> Self {
                    self.constraints.primary_key = true;
                    self
                }

                pub fn not_null(mut self) -> Self {
                    self.constraints.not_null = true;
                    self
                }

                pub fn unique(mut self) -> Self {
                    self.constraints.unique = true;
                    self
                }

                /// Literal DEFAULT value.
                pub fn default_value(mut self, value: impl crate::value::ToValue) -> Self {
                    self.constraints.default = Some(DefaultValue::Literal(value.to_value()));
                    self
                }

                /// Raw SQL DEFAULT expression, e.g. `now()`.
                pub fn default_sql(mut self, sql: impl Into<String>) -> Self {
                    self.constraints.default = Some(DefaultValue::Raw(sql.into()));
                    self
                }

                pub fn constraints(&self) -> &Constraints {
                    &self.constraints
                }
            }
        )*
    };
}

macro_rules! sql_type {
    ($ty:ident, |$this:ident, $dialect:ident| $name:expr, |$vthis:ident, $value:ident| $validate:expr) => {
        impl SqlType for $ty {
            fn create_sql(&self, $dialect: &dyn Dialect) -> OrmResult<String> {
                let $this = self;
                let mut out = String::from($name);
                self.constraints.write(&mut out)?;
                Ok(out)
            }

            fn is_primary_key(&self) -> bool {
                self.constraints.primary_key
            }

            fn is_required(&self) -> bool {
                self.constraints.is_required()
            }

            fn is_unique(&self) -> bool {
                self.constraints.unique
            }

            fn validate(&self, value: Value) -> OrmResult<Value> {
                if value.is_null() {
                    return self.constraints.check_null();
                }
                let $vthis = self;
                let $value = value;
                $validate
            }

            fn referenced(&self) -> Arc<dyn SqlType> {
                Arc::new(Self {
                    constraints: Constraints::default(),
                    ..self.clone()
                })
            }
        }
    };
}

/// `BOOLEAN`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Boolean {
    constraints: Constraints,
}

/// `INTEGER` (32-bit).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Integer {
    constraints: Constraints,
}

/// `BIGINT`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BigInt {
    constraints: Constraints,
}

/// `DOUBLE PRECISION`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Double {
    constraints: Constraints,
}

/// `REAL` (32-bit float).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Real {
    constraints: Constraints,
}

/// `VARCHAR(n)`, or plain `VARCHAR` without a length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Varchar {
    length: Option<usize>,
    constraints: Constraints,
}

/// `TEXT`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Text {
    constraints: Constraints,
}

/// `DATE`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Date {
    constraints: Constraints,
}

/// `TIMESTAMP`, optionally `WITH TIME ZONE`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timestamp {
    with_timezone: bool,
    constraints: Constraints,
}

/// Binary data: `BYTEA` on Postgres, `BLOB` elsewhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blob {
    constraints: Constraints,
}

constraint_builders!(Boolean, Integer, BigInt, Double, Real, Varchar, Text, Date, Timestamp, Blob);

impl Boolean {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Integer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BigInt {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Double {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Real {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Varchar {
    /// `VARCHAR(length)`; values longer than `length` characters are rejected.
    pub fn new(length: usize) -> Self {
        Self {
            length: Some(length),
            constraints: Constraints::default(),
        }
    }

    /// `VARCHAR` without a length limit.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn length(&self) -> Option<usize> {
        self.length
    }
}

impl Text {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Date {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Timestamp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timezone(mut self) -> Self {
        self.with_timezone = true;
        self
    }
}

impl Blob {
    pub fn new() -> Self {
        Self::default()
    }
}

// ── coercion helpers ────────────────────────────────────────────────────────

fn to_int(expected: &str, value: Value) -> OrmResult<i64> {
    match value {
        Value::Int(i) => Ok(i),
        Value::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(f as i64)
        }
        Value::Text(ref s) => s.trim().parse::<i64>().map_err(|_| reject(expected, &value)),
        other => Err(reject(expected, &other)),
    }
}

fn to_float(expected: &str, value: Value) -> OrmResult<f64> {
    match value {
        Value::Float(f) => Ok(f),
        Value::Int(i) => Ok(i as f64),
        Value::Text(ref s) => s.trim().parse::<f64>().map_err(|_| reject(expected, &value)),
        other => Err(reject(expected, &other)),
    }
}

fn to_text(expected: &str, value: Value) -> OrmResult<String> {
    match value {
        Value::Text(s) => Ok(s),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(reject(expected, &other)),
    }
}

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn parse_naive_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

sql_type!(Boolean, |_this, _dialect| "BOOLEAN", |_this, value| {
    match value {
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::Int(0) => Ok(Value::Bool(false)),
        Value::Int(1) => Ok(Value::Bool(true)),
        Value::Text(ref s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Ok(Value::Bool(true)),
            "false" | "f" | "0" => Ok(Value::Bool(false)),
            _ => Err(reject("boolean", &value)),
        },
        other => Err(reject("boolean", &other)),
    }
});

sql_type!(Integer, |_this, _dialect| "INTEGER", |_this, value| {
    let i = to_int("integer", value)?;
    if i32::try_from(i).is_err() {
        return Err(OrmError::validation(format!("{i} out of range for integer")));
    }
    Ok(Value::Int(i))
});

sql_type!(BigInt, |_this, _dialect| "BIGINT", |_this, value| {
    to_int("bigint", value).map(Value::Int)
});

sql_type!(Double, |_this, _dialect| "DOUBLE PRECISION", |_this, value| {
    to_float("double precision", value).map(Value::Float)
});

sql_type!(Real, |_this, _dialect| "REAL", |_this, value| {
    let f = to_float("real", value)?;
    if f.is_finite() && f.abs() > f64::from(f32::MAX) {
        return Err(OrmError::validation(format!("{f} out of range for real")));
    }
    Ok(Value::Float(f))
});

sql_type!(
    Varchar,
    |this, _dialect| match this.length {
        Some(n) => format!("VARCHAR({n})"),
        None => "VARCHAR".to_string(),
    },
    |this, value| {
        let s = to_text("varchar", value)?;
        if let Some(max) = this.length {
            let len = s.chars().count();
            if len > max {
                return Err(OrmError::validation(format!(
                    "value of {len} characters exceeds varchar({max})"
                )));
            }
        }
        Ok(Value::Text(s))
    }
);

sql_type!(Text, |_this, _dialect| "TEXT", |_this, value| {
    to_text("text", value).map(Value::Text)
});

sql_type!(Date, |_this, _dialect| "DATE", |_this, value| {
    match value {
        Value::Date(d) => Ok(Value::Date(d)),
        Value::Timestamp(ts) if ts.time() == NaiveTime::MIN => Ok(Value::Date(ts.date())),
        Value::Text(ref s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| reject("date", &value)),
        other => Err(reject("date", &other)),
    }
});

sql_type!(
    Timestamp,
    |this, _dialect| if this.with_timezone {
        "TIMESTAMP WITH TIME ZONE"
    } else {
        "TIMESTAMP"
    },
    |this, value| {
        let parsed = match value {
            Value::Timestamp(ts) => Value::Timestamp(ts),
            Value::TimestampTz(ts) => Value::TimestampTz(ts),
            Value::Date(d) => Value::Timestamp(d.and_time(NaiveTime::MIN)),
            Value::Text(ref s) => {
                let s = s.trim();
                if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                    Value::TimestampTz(ts.with_timezone(&Utc))
                } else if let Some(ts) = parse_naive_timestamp(s) {
                    Value::Timestamp(ts)
                } else {
                    return Err(reject("timestamp", &value));
                }
            }
            other => return Err(reject("timestamp", &other)),
        };
        Ok(match (this.with_timezone, parsed) {
            (true, Value::Timestamp(ts)) => Value::TimestampTz(ts.and_utc()),
            (false, Value::TimestampTz(ts)) => Value::Timestamp(ts.naive_utc()),
            (_, v) => v,
        })
    }
);

sql_type!(
    Blob,
    |_this, dialect| if dialect.name() == "postgres" {
        "BYTEA"
    } else {
        "BLOB"
    },
    |_this, value| {
        match value {
            Value::Bytes(b) => Ok(Value::Bytes(b)),
            Value::Text(s) => Ok(Value::Bytes(s.into_bytes())),
            other => Err(reject("blob", &other)),
        }
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{PostgresDialect, SqliteDialect};

    #[test]
    fn test_create_sql_with_constraints() {
        let ty = Varchar::new(64).not_null().unique().default_value("it's");
        assert_eq!(
            ty.create_sql(&PostgresDialect).unwrap(),
            "VARCHAR(64) NOT NULL UNIQUE DEFAULT 'it''s'"
        );
        assert_eq!(
            Integer::new().primary_key().create_sql(&PostgresDialect).unwrap(),
            "INTEGER PRIMARY KEY"
        );
        assert_eq!(
            Timestamp::new()
                .with_timezone()
                .default_sql("now()")
                .create_sql(&PostgresDialect)
                .unwrap(),
            "TIMESTAMP WITH TIME ZONE DEFAULT now()"
        );
    }

    #[test]
    fn test_blob_depends_on_dialect() {
        assert_eq!(Blob::new().create_sql(&PostgresDialect).unwrap(), "BYTEA");
        assert_eq!(Blob::new().create_sql(&SqliteDialect).unwrap(), "BLOB");
    }

    #[test]
    fn test_bytes_default_rejected() {
        let ty = Blob::new().default_value(vec![1u8, 2]);
        assert!(ty.create_sql(&PostgresDialect).is_err());
    }

    #[test]
    fn test_required() {
        assert!(Text::new().not_null().is_required());
        assert!(!Text::new().not_null().default_value("x").is_required());
        assert!(!Integer::new().primary_key().is_required());
        assert!(!Text::new().is_required());
    }

    #[test]
    fn test_integer_coercion() {
        let ty = Integer::new();
        assert_eq!(ty.validate(Value::Text(" 42 ".into())).unwrap(), Value::Int(42));
        assert_eq!(ty.validate(Value::Float(3.0)).unwrap(), Value::Int(3));
        assert!(ty.validate(Value::Float(3.5)).is_err());
        assert!(ty.validate(Value::Int(i64::from(i32::MAX) + 1)).is_err());
        assert!(ty.validate(Value::Text("abc".into())).is_err());
    }

    #[test]
    fn test_null_handling() {
        assert_eq!(Integer::new().validate(Value::Null).unwrap(), Value::Null);
        assert!(Integer::new().not_null().validate(Value::Null).is_err());
        assert!(Integer::new().primary_key().validate(Value::Null).is_err());
    }

    #[test]
    fn test_varchar_length() {
        let ty = Varchar::new(3);
        assert_eq!(ty.validate(Value::Int(12)).unwrap(), Value::Text("12".into()));
        assert!(ty.validate(Value::Text("abcd".into())).is_err());
        // length counts characters, not bytes
        assert!(ty.validate(Value::Text("äöü".into())).is_ok());
    }

    #[test]
    fn test_boolean_coercion() {
        let ty = Boolean::new();
        assert_eq!(ty.validate(Value::Text("t".into())).unwrap(), Value::Bool(true));
        assert_eq!(ty.validate(Value::Int(0)).unwrap(), Value::Bool(false));
        assert!(ty.validate(Value::Int(2)).is_err());
    }

    #[test]
    fn test_timestamp_coercion() {
        let plain = Timestamp::new();
        let v = plain.validate(Value::Text("2024-05-01 10:30:00".into())).unwrap();
        assert!(matches!(v, Value::Timestamp(_)));

        let tz = Timestamp::new().with_timezone();
        let v = tz.validate(Value::Text("2024-05-01T10:30:00+02:00".into())).unwrap();
        match v {
            Value::TimestampTz(ts) => assert_eq!(ts.to_rfc3339(), "2024-05-01T08:30:00+00:00"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_date_rejects_time_component() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(5, 0, 0)
            .unwrap();
        assert!(Date::new().validate(Value::Timestamp(ts)).is_err());
    }

    #[test]
    fn test_referenced_strips_constraints() {
        let ty = Integer::new().primary_key().not_null();
        let referenced = ty.referenced();
        assert_eq!(referenced.create_sql(&PostgresDialect).unwrap(), "INTEGER");
        assert!(!referenced.is_primary_key());
    }
}
