// Metadata mapping:
// - fields.rs: native column descriptors to `FieldDescriptor`, type code tables
// - catalog.rs: catalog rows to schema/table/column/key records
// - queries.rs: catalog SQL and the `Metadata` operator

mod catalog;
mod fields;
mod queries;

pub use catalog::{
    ColumnInfo, ForeignKeyInfo, KeyRecord, PrimaryKeyInfo, SchemaInfo, TableInfo, aggregate_keys,
    flag, is_enabled, normalize_data_type,
};
pub use fields::{
    FieldDescriptor, LogicalType, ROW_NUMBER_COLUMN, db_type_name, is_synthetic_column,
};
pub use queries::{
    COLUMNS_SQL, FOREIGN_KEYS_SQL, Metadata, PRIMARY_KEYS_SQL, SCHEMAS_SQL, TABLES_SQL,
};
