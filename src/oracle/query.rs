use std::collections::BTreeMap;

use super::cursor::{OracleCursor, SyntheticColumn};
use super::native::{NativeOutBind, NativeResponse};
use super::options::{ExecuteOptions, FieldNaming};
use super::params::returning_key;
use crate::metadata::{FieldDescriptor, is_synthetic_column};
use crate::results::{ExecutionResult, Row};
use crate::types::ReturnValue;

/// Convert a native response into an [`ExecutionResult`].
///
/// The synthetic pagination column is dropped from the field list and from every row (or
/// handed to the cursor when the statement opened a server-side result set). Field indexes
/// are positions in the stripped rows.
#[must_use]
pub fn build_execution_result(response: NativeResponse, options: &ExecuteOptions) -> ExecutionResult {
    let NativeResponse {
        meta_data,
        rows,
        out_binds,
        rows_affected,
        result_set,
    } = response;

    let mut synthetic: Option<SyntheticColumn> = None;
    let fields = meta_data.map(|columns| {
        let mut fields = Vec::with_capacity(columns.len());
        for (native_index, column) in columns.iter().enumerate() {
            if is_synthetic_column(&column.name) {
                synthetic = Some(SyntheticColumn {
                    index: native_index,
                    name: column.name.clone(),
                });
                continue;
            }
            fields.push(FieldDescriptor::from_native(
                fields.len(),
                column,
                options.naming,
            ));
        }
        fields
    });

    let mut result = ExecutionResult {
        fields,
        rows_affected,
        returns: out_binds.map(unwrap_out_binds),
        ..ExecutionResult::default()
    };

    if let Some(result_set) = result_set {
        result.cursor = Some(OracleCursor::new(result_set, synthetic, options.naming));
    } else if let Some(mut rows) = rows {
        for row in &mut rows {
            tidy_row(row, synthetic.as_ref(), options.naming);
        }
        result.rows = Some(rows);
    }

    result
}

/// Drop the synthetic column from a row and apply field naming.
pub(crate) fn tidy_row(row: &mut Row, synthetic: Option<&SyntheticColumn>, naming: Option<FieldNaming>) {
    if let Some(col) = synthetic {
        row.strip_column(col.index, &col.name);
    }
    if let Some(naming) = naming {
        row.apply_naming(naming);
    }
}

fn unwrap_out_binds(out_binds: Vec<NativeOutBind>) -> BTreeMap<String, ReturnValue> {
    out_binds
        .into_iter()
        .map(|bind| {
            let key = returning_key(&bind.name).to_string();
            let mut values = bind.values;
            let value = if values.len() == 1 {
                ReturnValue::Scalar(values.remove(0))
            } else {
                ReturnValue::List(values)
            };
            (key, value)
        })
        .collect()
}
