// Oracle module - session lifecycle and statement execution over a native client
//
// - native: capabilities required from the native client library
// - config: connection options, pool sizing and the options builder
// - session: per-session setup run right after checkout
// - connection: the connection wrapper and transaction state
// - options: execute options and field naming
// - params: output-bind expansion for returning fields
// - executor: native execute call
// - query: result marshaling (fields, synthetic columns, out binds)
// - cursor: forward-only server-side result paging

pub mod config;
pub mod connection;
pub mod cursor;
pub mod executor;
pub mod native;
pub mod options;
pub mod params;
pub mod query;
pub mod session;

pub use config::{OracleOptions, OracleOptionsBuilder, PoolSettings, validate_schema_name};
pub use connection::OracleConnection;
pub use cursor::OracleCursor;
pub use native::{
    NativeClient, NativeColumn, NativeDriver, NativeExecuteOptions, NativeOutBind, NativePool,
    NativePoolAttributes, NativeResponse, NativeResultSet, OutFormat, SessionTags,
};
pub use options::{ExecuteOptions, FieldNaming};
pub use query::build_execution_result;
pub use session::{ServerVersion, quote_identifier};
