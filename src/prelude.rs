//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::connection::MiddlewareConnection;
pub use crate::error::{NativeError, OracleMiddlewareError};
pub use crate::metadata::{
    ColumnInfo, FieldDescriptor, ForeignKeyInfo, LogicalType, Metadata, PrimaryKeyInfo,
    SchemaInfo, TableInfo,
};
pub use crate::oracle::{
    ExecuteOptions, FieldNaming, NativeClient, NativeDriver, NativePool, NativeResultSet,
    OracleConnection, OracleCursor, OracleOptions, OracleOptionsBuilder, PoolSettings,
    ServerVersion,
};
pub use crate::pool::{ManagedDriver, NativeConnector, OraclePool, PoolStatus};
pub use crate::results::{ExecutionResult, Row};
pub use crate::types::{BindType, BindValue, Params, ReturnValue, RowValues};
