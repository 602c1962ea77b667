use async_trait::async_trait;

use crate::error::OracleMiddlewareError;
use crate::oracle::{ExecuteOptions, OracleConnection};
use crate::results::ExecutionResult;
use crate::types::Params;

/// Connection contract the query builder and catalog operator run against.
#[async_trait]
pub trait MiddlewareConnection: Send {
    /// Execute one statement with bind parameters.
    async fn execute(
        &mut self,
        sql: &str,
        params: &Params,
        options: &ExecuteOptions,
    ) -> Result<ExecutionResult, OracleMiddlewareError>;

    fn start_transaction(&mut self);

    async fn commit(&mut self) -> Result<(), OracleMiddlewareError>;

    async fn rollback(&mut self) -> Result<(), OracleMiddlewareError>;

    /// Release the connection. Calling it twice is allowed.
    async fn close(&mut self) -> Result<(), OracleMiddlewareError>;

    fn is_closed(&self) -> bool;
}

#[async_trait]
impl MiddlewareConnection for OracleConnection {
    async fn execute(
        &mut self,
        sql: &str,
        params: &Params,
        options: &ExecuteOptions,
    ) -> Result<ExecutionResult, OracleMiddlewareError> {
        OracleConnection::execute(self, sql, params, options).await
    }

    fn start_transaction(&mut self) {
        OracleConnection::start_transaction(self);
    }

    async fn commit(&mut self) -> Result<(), OracleMiddlewareError> {
        OracleConnection::commit(self).await
    }

    async fn rollback(&mut self) -> Result<(), OracleMiddlewareError> {
        OracleConnection::rollback(self).await
    }

    async fn close(&mut self) -> Result<(), OracleMiddlewareError> {
        OracleConnection::close(self).await
    }

    fn is_closed(&self) -> bool {
        OracleConnection::is_closed(self)
    }
}
