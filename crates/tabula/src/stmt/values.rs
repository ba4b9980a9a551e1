use crate::error::OrmResult;
use crate::reflect::{Record, describe};
use crate::value::{ToValue, Value};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Column name to value map used by UPDATE, INSERT and validation.
///
/// Keys iterate in sorted order, which is also the order UPDATE renders them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Values(BTreeMap<String, Value>);

impl Values {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn set(mut self, column: impl Into<String>, value: impl ToValue) -> Self {
        self.0.insert(column.into(), value.to_value());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl ToValue) -> Option<Value> {
        self.0.insert(column.into(), value.to_value())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Read every reflected field of `record`; empty `omitempty` fields are
    /// left out.
    pub fn from_record<R: Record + 'static>(record: &R) -> OrmResult<Self> {
        let fields = describe::<R>()?;
        let mut values = Values::new();
        for field in fields.iter() {
            let value = record.get(&field.path)?;
            if field.omit_empty && value.is_empty() {
                continue;
            }
            values.0.insert(field.column.clone(), value);
        }
        Ok(values)
    }
}

impl<K: Into<String>, V: ToValue> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.to_value()))
                .collect(),
        )
    }
}

impl IntoIterator for Values {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
