//! The parameter bag filled during one compilation pass.

use crate::value::Value;
use tokio_postgres::types::ToSql;

/// Ordered, append-only list of bound values.
///
/// Positions are 1-based and handed out in the order the compiler walks the
/// clause tree, so the N-th placeholder in the rendered SQL always refers to
/// the N-th value in the bag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    values: Vec<Value>,
}

impl Parameters {
    /// Create a new empty bag.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value and return its 1-based position.
    pub fn add(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len()
    }

    /// Number of bound values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Get all values as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_are_one_based() {
        let mut params = Parameters::new();
        assert_eq!(params.add(Value::Int(1)), 1);
        assert_eq!(params.add(Value::Null), 2);
        assert_eq!(params.len(), 2);
        assert_eq!(params.values()[1], Value::Null);
    }

    #[test]
    fn test_as_refs_len() {
        let mut params = Parameters::new();
        params.add(Value::Text("a".into()));
        params.add(Value::Bool(true));
        assert_eq!(params.as_refs().len(), 2);
    }
}
