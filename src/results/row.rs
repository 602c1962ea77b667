use std::collections::BTreeMap;

use crate::oracle::FieldNaming;
use crate::types::RowValues;

/// A row returned by the native driver.
///
/// The shape follows the `object_rows` execute option: positional values by default,
/// field-keyed records when requested.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Array(Vec<RowValues>),
    Object(BTreeMap<String, RowValues>),
}

impl Row {
    /// Get a value by column index. Object rows have no positional access.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        match self {
            Row::Array(values) => values.get(index),
            Row::Object(_) => None,
        }
    }

    /// Get a value by key, ignoring ASCII case. Array rows have no keys.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        match self {
            Row::Array(_) => None,
            Row::Object(map) => map.get(column_name).or_else(|| {
                map.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(column_name))
                    .map(|(_, v)| v)
            }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Row::Array(values) => values.len(),
            Row::Object(map) => map.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[RowValues]> {
        if let Row::Array(values) = self {
            Some(values)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, RowValues>> {
        if let Row::Object(map) = self {
            Some(map)
        } else {
            None
        }
    }

    /// Remove a column: by index for array rows, by key for object rows.
    pub(crate) fn strip_column(&mut self, index: usize, name: &str) {
        match self {
            Row::Array(values) => {
                if index < values.len() {
                    values.remove(index);
                }
            }
            Row::Object(map) => {
                map.remove(name);
            }
        }
    }

    pub(crate) fn apply_naming(&mut self, naming: FieldNaming) {
        if let Row::Object(map) = self {
            let renamed = std::mem::take(map)
                .into_iter()
                .map(|(k, v)| (naming.apply(&k), v))
                .collect();
            *map = renamed;
        }
    }
}

impl From<Vec<RowValues>> for Row {
    fn from(values: Vec<RowValues>) -> Self {
        Row::Array(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_array_column_by_index() {
        let mut row = Row::Array(vec![
            RowValues::Int(1),
            RowValues::Text("a".into()),
            RowValues::Int(99),
        ]);
        row.strip_column(2, "ROW$NUMBER");
        assert_eq!(
            row,
            Row::Array(vec![RowValues::Int(1), RowValues::Text("a".into())])
        );
    }

    #[test]
    fn strips_object_column_by_key() {
        let mut map = BTreeMap::new();
        map.insert("ID".to_string(), RowValues::Int(1));
        map.insert("ROW$NUMBER".to_string(), RowValues::Int(7));
        let mut row = Row::Object(map);
        row.strip_column(1, "ROW$NUMBER");
        assert_eq!(row.len(), 1);
        assert!(row.get("row$number").is_none());
        assert_eq!(row.get("id"), Some(&RowValues::Int(1)));
    }

    #[test]
    fn naming_rewrites_object_keys() {
        let mut map = BTreeMap::new();
        map.insert("TABLE_NAME".to_string(), RowValues::Text("T".into()));
        let mut row = Row::Object(map);
        row.apply_naming(FieldNaming::Lowercase);
        assert!(row.as_object().unwrap().contains_key("table_name"));
    }
}
