use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::OracleMiddlewareError;
use crate::results::Row;
use crate::types::RowValues;

/// Map a catalog `data_type` onto the generic type vocabulary.
#[must_use]
pub fn normalize_data_type(data_type: &str) -> String {
    let normalized = match data_type {
        "NCHAR" => "CHAR",
        "NCLOB" => "CLOB",
        "VARCHAR2" | "NVARCHAR2" | "LONG" | "ROWID" | "UROWID" => "VARCHAR",
        "LONG RAW" | "BINARY_FLOAT" | "BINARY_DOUBLE" | "RAW" => "BUFFER",
        "DATE" => "TIMESTAMP",
        other if other.starts_with("TIMESTAMP") => "TIMESTAMP",
        other => other,
    };
    normalized.to_string()
}

/// Catalog flag columns: `Y`/`YES`/`1` are true, `N`/`NO`/`0` false.
#[must_use]
pub fn flag(value: &RowValues) -> Option<bool> {
    match value {
        RowValues::Bool(b) => Some(*b),
        RowValues::Int(i) => Some(*i != 0),
        RowValues::Text(s) => match s.trim().to_ascii_uppercase().as_str() {
            "Y" | "YES" | "1" => Some(true),
            "N" | "NO" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Constraint `status` column: true only for `ENABLED`.
#[must_use]
pub fn is_enabled(value: &RowValues) -> bool {
    match value {
        RowValues::Text(s) => s.eq_ignore_ascii_case("ENABLED"),
        other => flag(other).unwrap_or(false),
    }
}

fn required_text(row: &Row, column: &str) -> Result<String, OracleMiddlewareError> {
    optional_text(row, column).ok_or_else(|| {
        OracleMiddlewareError::Protocol(format!("catalog row is missing `{column}`"))
    })
}

fn optional_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        RowValues::Text(s) => Some(s.clone()),
        RowValues::Int(i) => Some(i.to_string()),
        RowValues::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

fn optional_int(row: &Row, column: &str) -> Option<i64> {
    match row.get(column)? {
        RowValues::Int(i) => Some(*i),
        #[allow(clippy::cast_possible_truncation)]
        RowValues::Float(f) => Some(*f as i64),
        RowValues::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn optional_flag(row: &Row, column: &str) -> Option<bool> {
    row.get(column).and_then(flag)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub schema_name: String,
    pub create_date: Option<NaiveDateTime>,
}

impl SchemaInfo {
    /// # Errors
    /// Returns `OracleMiddlewareError::Protocol` when `schema_name` is missing.
    pub fn from_row(row: &Row) -> Result<Self, OracleMiddlewareError> {
        Ok(Self {
            schema_name: required_text(row, "schema_name")?,
            create_date: row.get("create_date").and_then(RowValues::as_timestamp),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub schema_name: String,
    pub table_name: String,
    pub num_rows: Option<i64>,
    pub read_only: bool,
    pub table_comments: Option<String>,
}

impl TableInfo {
    /// # Errors
    /// Returns `OracleMiddlewareError::Protocol` when a name column is missing.
    pub fn from_row(row: &Row) -> Result<Self, OracleMiddlewareError> {
        Ok(Self {
            schema_name: required_text(row, "schema_name")?,
            table_name: required_text(row, "table_name")?,
            num_rows: optional_int(row, "num_rows"),
            read_only: optional_flag(row, "read_only").unwrap_or(false),
            table_comments: optional_text(row, "table_comments"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
    /// Normalized type, see [`normalize_data_type`]
    pub data_type: String,
    /// Type as the catalog reports it
    pub native_data_type: String,
    pub data_length: Option<i64>,
    pub data_precision: Option<i64>,
    pub data_scale: Option<i64>,
    pub char_length: Option<i64>,
    pub default_value: Option<String>,
    pub nullable: Option<bool>,
    pub column_comments: Option<String>,
}

impl ColumnInfo {
    /// # Errors
    /// Returns `OracleMiddlewareError::Protocol` when a name column or `data_type` is missing.
    pub fn from_row(row: &Row) -> Result<Self, OracleMiddlewareError> {
        let native_data_type = required_text(row, "data_type")?;
        Ok(Self {
            schema_name: required_text(row, "schema_name")?,
            table_name: required_text(row, "table_name")?,
            column_name: required_text(row, "column_name")?,
            data_type: normalize_data_type(&native_data_type),
            native_data_type,
            data_length: optional_int(row, "data_length"),
            data_precision: optional_int(row, "data_precision"),
            data_scale: optional_int(row, "data_scale"),
            char_length: optional_int(row, "char_length"),
            default_value: optional_text(row, "default_value").map(|d| d.trim().to_string()),
            nullable: optional_flag(row, "nullable"),
            column_comments: optional_text(row, "column_comments"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyInfo {
    pub schema_name: String,
    pub table_name: String,
    pub constraint_name: String,
    pub enabled: bool,
    /// Comma-delimited key columns
    pub columns: String,
}

impl PrimaryKeyInfo {
    /// # Errors
    /// Returns `OracleMiddlewareError::Protocol` when a name column is missing.
    pub fn from_row(row: &Row) -> Result<Self, OracleMiddlewareError> {
        Ok(Self {
            schema_name: required_text(row, "schema_name")?,
            table_name: required_text(row, "table_name")?,
            constraint_name: required_text(row, "constraint_name")?,
            enabled: row.get("status").is_some_and(is_enabled),
            columns: optional_text(row, "columns").unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub schema_name: String,
    pub table_name: String,
    pub constraint_name: String,
    pub enabled: bool,
    /// Comma-delimited referencing columns
    pub column_name: String,
    pub r_schema: Option<String>,
    pub r_table_name: Option<String>,
    /// Comma-delimited referenced columns
    pub r_columns: String,
}

impl ForeignKeyInfo {
    /// # Errors
    /// Returns `OracleMiddlewareError::Protocol` when a name column is missing.
    pub fn from_row(row: &Row) -> Result<Self, OracleMiddlewareError> {
        Ok(Self {
            schema_name: required_text(row, "schema_name")?,
            table_name: required_text(row, "table_name")?,
            constraint_name: required_text(row, "constraint_name")?,
            enabled: row.get("status").is_some_and(is_enabled),
            column_name: optional_text(row, "column_name").unwrap_or_default(),
            r_schema: optional_text(row, "r_schema").map(|s| first_item(&s)),
            r_table_name: optional_text(row, "r_table_name").map(|s| first_item(&s)),
            r_columns: optional_text(row, "r_columns").unwrap_or_default(),
        })
    }
}

// listagg repeats the referenced owner/table once per key column
fn first_item(list: &str) -> String {
    list.split(',').next().unwrap_or(list).trim().to_string()
}

/// Key records that can be merged when a constraint spans several rows.
pub trait KeyRecord {
    fn group_key(&self) -> (&str, &str, &str);
    fn merge(&mut self, other: Self);
}

impl KeyRecord for PrimaryKeyInfo {
    fn group_key(&self) -> (&str, &str, &str) {
        (&self.schema_name, &self.table_name, &self.constraint_name)
    }

    fn merge(&mut self, other: Self) {
        append_list(&mut self.columns, &other.columns);
    }
}

impl KeyRecord for ForeignKeyInfo {
    fn group_key(&self) -> (&str, &str, &str) {
        (&self.schema_name, &self.table_name, &self.constraint_name)
    }

    fn merge(&mut self, other: Self) {
        append_list(&mut self.column_name, &other.column_name);
        append_list(&mut self.r_columns, &other.r_columns);
        if self.r_schema.is_none() {
            self.r_schema = other.r_schema;
        }
        if self.r_table_name.is_none() {
            self.r_table_name = other.r_table_name;
        }
    }
}

fn append_list(list: &mut String, more: &str) {
    if more.is_empty() {
        return;
    }
    if !list.is_empty() {
        list.push(',');
    }
    list.push_str(more);
}

/// Collapse one-row-per-column key records into one record per owner, table and constraint,
/// keeping first-seen order.
#[must_use]
pub fn aggregate_keys<K: KeyRecord>(records: Vec<K>) -> Vec<K> {
    let mut merged: Vec<K> = Vec::with_capacity(records.len());
    for record in records {
        match merged
            .iter_mut()
            .find(|seen| seen.group_key() == record.group_key())
        {
            Some(seen) => seen.merge(record),
            None => merged.push(record),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn row(pairs: &[(&str, RowValues)]) -> Row {
        Row::Object(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn text(s: &str) -> RowValues {
        RowValues::Text(s.to_string())
    }

    #[test]
    fn normalizes_catalog_types() {
        assert_eq!(normalize_data_type("NCHAR"), "CHAR");
        assert_eq!(normalize_data_type("NCLOB"), "CLOB");
        assert_eq!(normalize_data_type("VARCHAR2"), "VARCHAR");
        assert_eq!(normalize_data_type("UROWID"), "VARCHAR");
        assert_eq!(normalize_data_type("LONG RAW"), "BUFFER");
        assert_eq!(normalize_data_type("RAW"), "BUFFER");
        assert_eq!(normalize_data_type("DATE"), "TIMESTAMP");
        assert_eq!(
            normalize_data_type("TIMESTAMP(6) WITH TIME ZONE"),
            "TIMESTAMP"
        );
        assert_eq!(normalize_data_type("NUMBER"), "NUMBER");
    }

    #[test]
    fn column_rows_use_upper_case_keys_too() {
        let r = row(&[
            ("SCHEMA_NAME", text("HR")),
            ("TABLE_NAME", text("EMPLOYEES")),
            ("COLUMN_NAME", text("HIRE_DATE")),
            ("DATA_TYPE", text("DATE")),
            ("DATA_LENGTH", RowValues::Int(7)),
            ("NULLABLE", text("N")),
        ]);
        let c = ColumnInfo::from_row(&r).unwrap();
        assert_eq!(c.data_type, "TIMESTAMP");
        assert_eq!(c.native_data_type, "DATE");
        assert_eq!(c.data_length, Some(7));
        assert_eq!(c.nullable, Some(false));
        assert_eq!(c.column_comments, None);
    }

    #[test]
    fn table_read_only_flag() {
        let r = row(&[
            ("schema_name", text("HR")),
            ("table_name", text("REGIONS")),
            ("num_rows", RowValues::Float(4.0)),
            ("read_only", text("YES")),
        ]);
        let t = TableInfo::from_row(&r).unwrap();
        assert!(t.read_only);
        assert_eq!(t.num_rows, Some(4));
    }

    #[test]
    fn missing_name_is_protocol_error() {
        let r = row(&[("table_name", text("REGIONS"))]);
        assert!(matches!(
            TableInfo::from_row(&r),
            Err(OracleMiddlewareError::Protocol(_))
        ));
    }

    #[test]
    fn status_enabled_becomes_bool() {
        assert!(is_enabled(&text("ENABLED")));
        assert!(!is_enabled(&text("DISABLED")));
        assert!(is_enabled(&RowValues::Int(1)));
    }

    #[test]
    fn key_columns_aggregate_per_constraint() {
        let pk = |table: &str, cons: &str, col: &str| PrimaryKeyInfo {
            schema_name: "HR".into(),
            table_name: table.into(),
            constraint_name: cons.into(),
            enabled: true,
            columns: col.into(),
        };
        let merged = aggregate_keys(vec![
            pk("JOB_HISTORY", "JHIST_PK", "EMPLOYEE_ID"),
            pk("REGIONS", "REG_ID_PK", "REGION_ID"),
            pk("JOB_HISTORY", "JHIST_PK", "START_DATE"),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].columns, "EMPLOYEE_ID,START_DATE");
        assert_eq!(merged[1].columns, "REGION_ID");
    }

    #[test]
    fn foreign_key_reference_collapses_repeated_owner() {
        let r = row(&[
            ("schema_name", text("HR")),
            ("table_name", text("COUNTRIES")),
            ("constraint_name", text("COUNTR_REG_FK")),
            ("status", text("ENABLED")),
            ("column_name", text("REGION_ID")),
            ("r_schema", text("HR,HR")),
            ("r_table_name", text("REGIONS,REGIONS")),
            ("r_columns", text("REGION_ID")),
        ]);
        let fk = ForeignKeyInfo::from_row(&r).unwrap();
        assert!(fk.enabled);
        assert_eq!(fk.r_schema.as_deref(), Some("HR"));
        assert_eq!(fk.r_table_name.as_deref(), Some("REGIONS"));
    }
}
