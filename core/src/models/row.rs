//! Database row representation
//!
//! A row is a fixed-length, positionally addressed sequence of values whose
//! first element is the store-assigned identity.

use std::collections::HashMap;
use serde::{Serialize, Deserialize};

use super::value::Value;

/// Column name to value map used for writes and filters
pub type Fields = HashMap<String, Value>;

/// A row in a database table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Create a row from its values; index 0 must hold the identity
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    /// Identity of the row
    pub fn id(&self) -> i64 {
        self.values
            .first()
            .and_then(Value::as_integer)
            .unwrap_or_default()
    }

    /// Value at a column position
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// All values in schema order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the row into its values
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub(crate) fn set(&mut self, position: usize, value: Value) {
        self.values[position] = value;
    }

    /// Number of values in the row
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_accessors() {
        let row = Row::new(vec![Value::Integer(3), Value::from("Alice"), Value::Null]);
        assert_eq!(row.id(), 3);
        assert_eq!(row.len(), 3);
        assert_eq!(row.get(1), Some(&Value::from("Alice")));
        assert_eq!(row.get(5), None);
        assert_eq!(row.into_values()[2], Value::Null);
    }
}
