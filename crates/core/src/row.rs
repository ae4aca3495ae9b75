//! Example rows: column/value override tables that drive example-based
//! variant generation.

use serde::{Deserialize, Serialize};

/// One row of example overrides, keyed by field row keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Row::new();
        for (key, value) in pairs {
            row.columns.push(key.into());
            row.values.push(value.into());
        }
        row
    }

    pub fn contains_field(&self, key: &str) -> bool {
        self.columns.iter().any(|column| column == key)
    }

    pub fn get_field(&self, key: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|column| column == key)
            .map(|idx| self.values[idx].as_str())
    }

    /// A copy of this row with the field for `key` replaced (or appended,
    /// when absent). Used to derive synthetic rows for array-part
    /// expansion.
    pub fn with_field_value(&self, key: &str, value: &str) -> Row {
        let mut row = self.clone();
        match row.columns.iter().position(|column| column == key) {
            Some(idx) => row.values[idx] = value.to_string(),
            None => {
                row.columns.push(key.to_string());
                row.values.push(value.to_string());
            }
        }
        row
    }
}
