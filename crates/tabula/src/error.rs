//! Error types for tabula

use thiserror::Error;

/// Result type alias for tabula operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for schema construction, statement compilation and row mapping.
///
/// The enum is `Clone` so statement builders can record the first
/// configuration error and hand it back from every later compile.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrmError {
    /// Table construction failed (unknown column, duplicate primary key, ...)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Statement was configured inconsistently
    #[error("Configuration error: {0}")]
    Config(String),

    /// A clause could not be rendered
    #[error("Compile error: {0}")]
    Compile(String),

    /// A value was rejected by its column type
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record fields and result columns cannot be aligned
    #[error("Shape error: {0}")]
    Shape(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// The row source reported an error while iterating
    #[error("Scan error: {0}")]
    Scan(String),
}

impl OrmError {
    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Create a statement configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a compile error
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a shape error
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a scan error
    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan(message.into())
    }

    /// Error for a field path that does not resolve on a record type.
    pub fn field_path(type_name: &str, path: &[usize]) -> Self {
        Self::Shape(format!("{type_name} has no field at path {path:?}"))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a statement configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a shape error
    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Shape(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Prefix the message with the column it concerns, keeping the variant.
    pub(crate) fn for_column(self, column: &str) -> Self {
        match self {
            Self::Validation(m) => Self::Validation(format!("column \"{column}\": {m}")),
            Self::Decode { message, .. } => Self::Decode {
                column: column.to_string(),
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_display() {
        let err = OrmError::decode("age", "expected integer");
        assert_eq!(
            err.to_string(),
            "Decode error on column 'age': expected integer"
        );
    }

    #[test]
    fn test_predicates() {
        assert!(OrmError::not_found("row").is_not_found());
        assert!(OrmError::config("x").is_config());
        assert!(!OrmError::shape("x").is_config());
    }

    #[test]
    fn test_for_column_rewrites_decode() {
        let err = OrmError::decode("", "bad").for_column("name");
        assert_eq!(err, OrmError::decode("name", "bad"));
    }
}
