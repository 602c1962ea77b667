//! Capabilities the middleware expects from the underlying native client library.
//!
//! Nothing in this module talks to a server. A driver binding implements these traits for its
//! session, result-set and pool handles; [`crate::pool::ManagedDriver`] supplies a pool for
//! clients that only know how to open single sessions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::NativeError;
use crate::results::Row;
use crate::types::{Params, RowValues};

/// Row shape requested from the native driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutFormat {
    #[default]
    Array,
    Object,
}

/// Options forwarded to [`NativeClient::execute`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NativeExecuteOptions {
    pub auto_commit: bool,
    pub extended_metadata: bool,
    /// Open a server-side result set instead of returning rows
    pub result_set: bool,
    pub max_rows: Option<u32>,
    pub prefetch_rows: Option<u32>,
    pub out_format: OutFormat,
}

/// Column description as reported by the native driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NativeColumn {
    pub name: String,
    /// Fetch type constant (2001 = string ... 2007 = blob)
    pub fetch_type: u32,
    /// Server type code (1 = VARCHAR, 2 = NUMBER, ...)
    pub db_type: u32,
    pub byte_size: Option<u32>,
    pub nullable: Option<bool>,
    pub precision: Option<i32>,
}

/// Values written into an output bind, one per affected row.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeOutBind {
    pub name: String,
    pub values: Vec<RowValues>,
}

/// Raw response of a native execute.
#[derive(Default)]
pub struct NativeResponse {
    pub meta_data: Option<Vec<NativeColumn>>,
    pub rows: Option<Vec<Row>>,
    pub out_binds: Option<Vec<NativeOutBind>>,
    pub rows_affected: Option<u64>,
    pub result_set: Option<Box<dyn NativeResultSet>>,
}

impl fmt::Debug for NativeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeResponse")
            .field("meta_data", &self.meta_data)
            .field("rows", &self.rows)
            .field("out_binds", &self.out_binds)
            .field("rows_affected", &self.rows_affected)
            .field("result_set", &self.result_set.as_ref().map(|_| "<NativeResultSet>"))
            .finish()
    }
}

/// End-to-end tracing attributes of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionTags {
    pub action: String,
    pub client_id: String,
    pub module: String,
}

/// One physical database session.
#[async_trait]
pub trait NativeClient: Send {
    /// Server version, two digits per component (`19030000` = 19.3.0.0).
    fn server_version(&self) -> String;

    /// Schema the session currently resolves unqualified names against, when known.
    fn current_schema(&self) -> Option<String> {
        None
    }

    /// Session id remembered from an earlier checkout of this physical session.
    fn session_id(&self) -> Option<RowValues> {
        None
    }

    /// Remember the session id so later checkouts skip the lookup.
    fn set_session_id(&mut self, _session_id: RowValues) {}

    fn set_session_tags(&mut self, tags: SessionTags);

    async fn execute(
        &mut self,
        sql: &str,
        params: &Params,
        options: &NativeExecuteOptions,
    ) -> Result<NativeResponse, NativeError>;

    async fn commit(&mut self) -> Result<(), NativeError>;

    async fn rollback(&mut self) -> Result<(), NativeError>;

    async fn ping(&mut self) -> Result<(), NativeError> {
        Ok(())
    }

    /// Release the session. Pooled sessions go back to their pool.
    async fn close(&mut self) -> Result<(), NativeError>;
}

/// A server-side result set opened by an execute with `result_set = true`.
#[async_trait]
pub trait NativeResultSet: Send {
    /// Fetch up to `n_rows` rows. An empty batch means the set is exhausted.
    async fn get_rows(&mut self, n_rows: u32) -> Result<Vec<Row>, NativeError>;

    async fn close(&mut self) -> Result<(), NativeError>;
}

/// A native connection pool.
#[async_trait]
pub trait NativePool: Send + Sync {
    async fn get_connection(&self) -> Result<Box<dyn NativeClient>, NativeError>;

    async fn close(&self) -> Result<(), NativeError>;
}

/// Constructor arguments for a native pool, passed through verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct NativePoolAttributes {
    pub user: Option<String>,
    pub password: Option<String>,
    pub external_auth: bool,
    pub connect_string: String,
    pub pool_min: u32,
    pub pool_max: u32,
    pub pool_increment: u32,
    pub pool_timeout: Duration,
}

impl fmt::Debug for NativePoolAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativePoolAttributes")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("external_auth", &self.external_auth)
            .field("connect_string", &self.connect_string)
            .field("pool_min", &self.pool_min)
            .field("pool_max", &self.pool_max)
            .field("pool_increment", &self.pool_increment)
            .field("pool_timeout", &self.pool_timeout)
            .finish()
    }
}

/// Factory for native pools.
#[async_trait]
pub trait NativeDriver: Send + Sync {
    async fn create_pool(
        &self,
        attributes: &NativePoolAttributes,
    ) -> Result<Arc<dyn NativePool>, NativeError>;
}
