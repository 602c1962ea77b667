use std::fmt;
use std::mem;

use tracing::{debug, warn};

use super::executor::execute_statement;
use super::native::NativeClient;
use super::options::ExecuteOptions;
use super::session::ServerVersion;
use crate::error::OracleMiddlewareError;
use crate::metadata::Metadata;
use crate::query_builder::QueryBuilder;
use crate::results::ExecutionResult;
use crate::types::{Params, RowValues};

const TEST_QUERY: &str = "select 1 from dual";

/// An initialized session checked out of an [`OraclePool`](crate::pool::OraclePool).
///
/// The native handle is released by [`OracleConnection::close`]; after that every statement
/// fails with `ClosedConnection`.
pub struct OracleConnection {
    client: Option<Box<dyn NativeClient>>,
    in_transaction: bool,
    session_id: RowValues,
    server_version: ServerVersion,
}

// Manual Debug implementation because the native handle does not expose `Debug`
impl fmt::Debug for OracleConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleConnection")
            .field("closed", &self.is_closed())
            .field("in_transaction", &self.in_transaction)
            .field("session_id", &self.session_id)
            .field("server_version", &self.server_version)
            .finish()
    }
}

impl OracleConnection {
    pub(crate) fn new(
        client: Box<dyn NativeClient>,
        server_version: ServerVersion,
        session_id: RowValues,
    ) -> Self {
        Self {
            client: Some(client),
            in_transaction: false,
            session_id,
            server_version,
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Value of `v$mystat.sid` captured when the session was opened.
    #[must_use]
    pub fn session_id(&self) -> &RowValues {
        &self.session_id
    }

    #[must_use]
    pub fn server_version(&self) -> ServerVersion {
        self.server_version
    }

    /// Execute one statement.
    ///
    /// Auto-commit defaults to on unless [`OracleConnection::start_transaction`] was called;
    /// a successful auto-committed statement ends the transaction.
    ///
    /// # Errors
    /// Returns `OracleMiddlewareError::ClosedConnection` after `close`, or
    /// `OracleMiddlewareError::Native` (with the statement attached) when the driver fails.
    pub async fn execute(
        &mut self,
        sql: &str,
        params: &Params,
        options: &ExecuteOptions,
    ) -> Result<ExecutionResult, OracleMiddlewareError> {
        let in_transaction = self.in_transaction;
        let client = self
            .client
            .as_deref_mut()
            .ok_or(OracleMiddlewareError::ClosedConnection)?;
        let result = execute_statement(client, in_transaction, sql, params, options).await?;
        if options.effective_auto_commit(in_transaction) {
            self.in_transaction = false;
        }
        Ok(result)
    }

    /// Start a fluent query on this connection.
    pub fn query<'conn, 'q>(&'conn mut self, sql: &'q str) -> QueryBuilder<'conn, 'q, Self> {
        QueryBuilder::new(self, sql)
    }

    /// Catalog queries running on this connection.
    pub fn meta(&mut self) -> Metadata<'_, Self> {
        Metadata::new(self)
    }

    /// Turn auto-commit off for subsequent statements until `commit` or `rollback`.
    pub fn start_transaction(&mut self) {
        self.in_transaction = true;
    }

    /// # Errors
    /// Returns `OracleMiddlewareError::ClosedConnection` after `close`, or
    /// `OracleMiddlewareError::Native` if the driver rejects the commit.
    pub async fn commit(&mut self) -> Result<(), OracleMiddlewareError> {
        let client = self
            .client
            .as_deref_mut()
            .ok_or(OracleMiddlewareError::ClosedConnection)?;
        client.commit().await?;
        self.in_transaction = false;
        Ok(())
    }

    /// # Errors
    /// Returns `OracleMiddlewareError::ClosedConnection` after `close`, or
    /// `OracleMiddlewareError::Native` if the driver rejects the rollback.
    pub async fn rollback(&mut self) -> Result<(), OracleMiddlewareError> {
        let client = self
            .client
            .as_deref_mut()
            .ok_or(OracleMiddlewareError::ClosedConnection)?;
        client.rollback().await?;
        self.in_transaction = false;
        Ok(())
    }

    /// Release the native session. A second call does nothing.
    ///
    /// Work left uncommitted after `start_transaction` is rolled back before the session is
    /// released.
    ///
    /// # Errors
    /// Returns `OracleMiddlewareError::Native` if the rollback or the release fails; the
    /// session is released and the connection counts as closed either way.
    pub async fn close(&mut self) -> Result<(), OracleMiddlewareError> {
        let Some(mut client) = self.client.take() else {
            return Ok(());
        };
        let rolled_back = if mem::take(&mut self.in_transaction) {
            debug!(session_id = ?self.session_id, "rolling back open transaction on close");
            client.rollback().await
        } else {
            Ok(())
        };
        if let Err(err) = &rolled_back {
            warn!(error = %err, "rollback on close failed");
        }
        client.close().await?;
        rolled_back?;
        debug!(session_id = ?self.session_id, "connection closed");
        Ok(())
    }

    /// Round-trip `select 1 from dual`.
    ///
    /// # Errors
    /// Same as [`OracleConnection::execute`].
    pub async fn test(&mut self) -> Result<(), OracleMiddlewareError> {
        self.execute(TEST_QUERY, &Params::default(), &ExecuteOptions::default())
            .await
            .map(|_| ())
    }
}
