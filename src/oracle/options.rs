use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::native::{NativeExecuteOptions, OutFormat};

/// Case applied to field names and record keys in results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldNaming {
    Lowercase,
    Uppercase,
}

impl FieldNaming {
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            FieldNaming::Lowercase => name.to_lowercase(),
            FieldNaming::Uppercase => name.to_uppercase(),
        }
    }
}

/// Per-statement execution options.
///
/// `auto_commit` left at `None` commits unless the connection is inside a transaction
/// started with `start_transaction`. Extended column metadata is requested unless turned off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteOptions {
    pub auto_commit: Option<bool>,
    /// Ask the driver for column size, nullability and precision
    pub extended_metadata: bool,
    /// Keep the result on the server and return a cursor
    pub cursor: bool,
    /// Prefetch size in cursor mode, row limit otherwise
    pub fetch_rows: Option<u32>,
    pub max_rows: Option<u32>,
    pub prefetch_rows: Option<u32>,
    pub object_rows: bool,
    /// Output binds to add, as (bind name, type name) in bind order
    pub returning_fields: Option<Vec<(String, String)>>,
    pub action: Option<String>,
    pub client_id: Option<String>,
    pub module: Option<String>,
    pub naming: Option<FieldNaming>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            auto_commit: None,
            extended_metadata: true,
            cursor: false,
            fetch_rows: None,
            max_rows: None,
            prefetch_rows: None,
            object_rows: false,
            returning_fields: None,
            action: None,
            client_id: None,
            module: None,
            naming: None,
        }
    }
}

impl ExecuteOptions {
    /// Auto-commit in effect for a connection with the given transaction state.
    #[must_use]
    pub fn effective_auto_commit(&self, in_transaction: bool) -> bool {
        self.auto_commit.unwrap_or(!in_transaction)
    }

    pub(crate) fn to_native(&self, in_transaction: bool) -> NativeExecuteOptions {
        let (max_rows, prefetch_rows) = if self.cursor {
            (self.max_rows, self.prefetch_rows.or(self.fetch_rows))
        } else {
            (self.max_rows.or(self.fetch_rows), self.prefetch_rows)
        };
        NativeExecuteOptions {
            auto_commit: self.effective_auto_commit(in_transaction),
            extended_metadata: self.extended_metadata,
            result_set: self.cursor,
            max_rows,
            prefetch_rows,
            out_format: if self.object_rows {
                OutFormat::Object
            } else {
                OutFormat::Array
            },
        }
    }
}
