//! Pooled Oracle sessions on top of an abstract native client.
//!
//! The crate owns the parts between a query framework and the native client library:
//! lazy pool creation with queued callers, per-session setup (server version, session id,
//! default schema), statement execution with bind/result marshaling, forward-only cursors and
//! catalog introspection.
//!
//! ```no_run
//! use std::sync::Arc;
//! use sql_middleware_oracle::prelude::*;
//!
//! # async fn run(driver: Arc<dyn NativeDriver>) -> Result<(), OracleMiddlewareError> {
//! let pool = OracleOptionsBuilder::new("scott".into(), "tiger".into())
//!     .host("db.example.com")
//!     .database("XEPDB1")
//!     .schema("HR")
//!     .build(driver)?;
//!
//! let mut conn = pool.get_connection().await?;
//! let result = conn
//!     .query("select region_id, region_name from regions")
//!     .object_rows(true)
//!     .execute()
//!     .await?;
//! println!("{:?}", result.rows);
//! conn.close().await?;
//! pool.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub mod connection;
pub mod error;
pub mod metadata;
pub mod oracle;
pub mod pool;
pub mod query_builder;
pub mod results;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use connection::MiddlewareConnection;
pub use error::{NativeError, OracleMiddlewareError, StatementContext};
pub use metadata::{FieldDescriptor, LogicalType, Metadata};
pub use oracle::{
    ExecuteOptions, FieldNaming, OracleConnection, OracleCursor, OracleOptions,
    OracleOptionsBuilder, PoolSettings, ServerVersion,
};
pub use pool::{ManagedDriver, NativeConnector, OraclePool, PoolStatus};
pub use query_builder::QueryBuilder;
pub use results::{ExecutionResult, Row};
pub use types::{BindType, BindValue, Params, ReturnValue, RowValues};
