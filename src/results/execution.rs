use std::collections::BTreeMap;

use crate::metadata::FieldDescriptor;
use crate::oracle::OracleCursor;
use crate::types::{ReturnValue, RowValues};

use super::row::Row;

/// Outcome of one `execute` call.
///
/// `rows` and `cursor` are never both set: a statement opened with the `cursor` option hands
/// back an [`OracleCursor`], everything else materializes its rows.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    /// Column metadata, with synthetic pagination columns removed
    pub fields: Option<Vec<FieldDescriptor>>,
    /// Materialized rows
    pub rows: Option<Vec<Row>>,
    /// Output bind values keyed by bind name
    pub returns: Option<BTreeMap<String, ReturnValue>>,
    /// Rows touched by DML
    pub rows_affected: Option<u64>,
    /// Server-side result set for incremental fetching
    pub cursor: Option<OracleCursor>,
}

impl ExecutionResult {
    /// Find a field by name, ignoring ASCII case.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .as_ref()?
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Read a column of a materialized row, resolving array rows through `fields`.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<&RowValues> {
        let row = self.rows.as_ref()?.get(row)?;
        match row {
            Row::Object(_) => row.get(column),
            Row::Array(values) => {
                let position = self
                    .fields
                    .as_ref()?
                    .iter()
                    .position(|f| f.name.eq_ignore_ascii_case(column))?;
                values.get(position)
            }
        }
    }

    /// Look up an output bind by name.
    #[must_use]
    pub fn returned(&self, name: &str) -> Option<&ReturnValue> {
        self.returns.as_ref()?.get(name)
    }

    /// Take the cursor out of the result.
    pub fn take_cursor(&mut self) -> Option<OracleCursor> {
        self.cursor.take()
    }
}
