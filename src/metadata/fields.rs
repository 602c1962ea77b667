use serde::{Deserialize, Serialize};

use crate::oracle::{FieldNaming, NativeColumn};

/// Column injected by paginated queries; never shown to callers.
pub const ROW_NUMBER_COLUMN: &str = "row$number";

/// Whether a native column is the synthetic pagination marker.
#[must_use]
pub fn is_synthetic_column(name: &str) -> bool {
    name.eq_ignore_ascii_case(ROW_NUMBER_COLUMN)
}

/// Value category a column is fetched as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    String,
    Number,
    Date,
    Cursor,
    Buffer,
    Clob,
    Blob,
}

impl LogicalType {
    /// Map a native fetch-type constant.
    #[must_use]
    pub fn from_fetch_type(code: u32) -> Option<Self> {
        match code {
            2001 => Some(LogicalType::String),
            2002 => Some(LogicalType::Number),
            2003 => Some(LogicalType::Date),
            2004 => Some(LogicalType::Cursor),
            2005 => Some(LogicalType::Buffer),
            2006 => Some(LogicalType::Clob),
            2007 => Some(LogicalType::Blob),
            _ => None,
        }
    }
}

/// Server type name for a native type code.
#[must_use]
pub fn db_type_name(code: u32) -> Option<&'static str> {
    let name = match code {
        1 => "VARCHAR",
        2 => "NUMBER",
        8 => "LONG",
        12 => "DATE",
        23 => "RAW",
        24 => "LONG_RAW",
        68 => "UNSIGNED INT",
        96 => "CHAR",
        100 => "BINARY_FLOAT",
        101 => "BINARY_DOUBLE",
        104 => "ROWID",
        108 => "UDT",
        111 => "REF",
        112 => "CLOB",
        113 => "BLOB",
        114 => "BFILE",
        116 => "RSET",
        187 => "TIMESTAMP",
        188 => "TIMESTAMP_TZ",
        232 => "TIMESTAMP_LTZ",
        _ => return None,
    };
    Some(name)
}

/// Normalized column metadata of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Position in the returned rows
    pub index: usize,
    pub data_type: Option<LogicalType>,
    /// Server type name, or the raw type code when it is not in the lookup table
    pub field_type: String,
    pub size: Option<u32>,
    pub nullable: Option<bool>,
    pub precision: Option<i32>,
    pub fixed_length: bool,
}

impl FieldDescriptor {
    #[must_use]
    pub fn from_native(index: usize, column: &NativeColumn, naming: Option<FieldNaming>) -> Self {
        let data_type = LogicalType::from_fetch_type(column.fetch_type);
        let field_type = db_type_name(column.db_type)
            .map_or_else(|| column.db_type.to_string(), str::to_string);
        let fixed_length = data_type == Some(LogicalType::String) && field_type == "CHAR";
        let name = match naming {
            Some(naming) => naming.apply(&column.name),
            None => column.name.clone(),
        };
        Self {
            name,
            index,
            data_type,
            field_type,
            size: column.byte_size.filter(|s| *s > 0),
            nullable: column.nullable,
            precision: column.precision.filter(|p| *p > 0),
            fixed_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, fetch_type: u32, db_type: u32) -> NativeColumn {
        NativeColumn {
            name: name.to_string(),
            fetch_type,
            db_type,
            ..NativeColumn::default()
        }
    }

    #[test]
    fn char_strings_are_fixed_length() {
        let f = FieldDescriptor::from_native(0, &column("CODE", 2001, 96), None);
        assert_eq!(f.data_type, Some(LogicalType::String));
        assert_eq!(f.field_type, "CHAR");
        assert!(f.fixed_length);

        let f = FieldDescriptor::from_native(0, &column("NAME", 2001, 1), None);
        assert!(!f.fixed_length);
    }

    #[test]
    fn unknown_codes_pass_through() {
        let f = FieldDescriptor::from_native(3, &column("GEOM", 4242, 2009), None);
        assert_eq!(f.data_type, None);
        assert_eq!(f.field_type, "2009");
        assert_eq!(f.index, 3);
    }

    #[test]
    fn synthetic_marker_is_case_insensitive() {
        assert!(is_synthetic_column("ROW$NUMBER"));
        assert!(is_synthetic_column("row$number"));
        assert!(!is_synthetic_column("row_number"));
    }

    #[test]
    fn naming_applies_to_field_names() {
        let f = FieldDescriptor::from_native(
            0,
            &column("TABLE_NAME", 2001, 1),
            Some(FieldNaming::Lowercase),
        );
        assert_eq!(f.name, "table_name");
    }
}
