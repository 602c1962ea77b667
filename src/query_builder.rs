use std::borrow::Cow;

use crate::connection::MiddlewareConnection;
use crate::error::OracleMiddlewareError;
use crate::oracle::{ExecuteOptions, FieldNaming};
use crate::results::ExecutionResult;
use crate::types::Params;

/// Fluent builder for one statement on a connection.
pub struct QueryBuilder<'conn, 'q, C: MiddlewareConnection + ?Sized> {
    conn: &'conn mut C,
    sql: &'q str,
    params: Cow<'q, Params>,
    options: ExecuteOptions,
}

impl<'conn, 'q, C: MiddlewareConnection + ?Sized> QueryBuilder<'conn, 'q, C> {
    pub fn new(conn: &'conn mut C, sql: &'q str) -> Self {
        Self {
            conn,
            sql,
            params: Cow::Owned(Params::default()),
            options: ExecuteOptions::default(),
        }
    }

    /// Provide bind parameters for this statement.
    #[must_use]
    pub fn params(mut self, params: &'q Params) -> Self {
        self.params = Cow::Borrowed(params);
        self
    }

    /// Replace all execute options at once.
    #[must_use]
    pub fn options(mut self, options: ExecuteOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn auto_commit(mut self, auto_commit: bool) -> Self {
        self.options.auto_commit = Some(auto_commit);
        self
    }

    /// Leave the result on the server and page it through a cursor.
    #[must_use]
    pub fn cursor(mut self, cursor: bool) -> Self {
        self.options.cursor = cursor;
        self
    }

    #[must_use]
    pub fn fetch_rows(mut self, rows: u32) -> Self {
        self.options.fetch_rows = Some(rows);
        self
    }

    #[must_use]
    pub fn extended_metadata(mut self, extended_metadata: bool) -> Self {
        self.options.extended_metadata = extended_metadata;
        self
    }

    /// Return rows keyed by column name.
    #[must_use]
    pub fn object_rows(mut self, object_rows: bool) -> Self {
        self.options.object_rows = object_rows;
        self
    }

    /// Add an output bind, e.g. `.returning("id", "number")`.
    #[must_use]
    pub fn returning(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.options
            .returning_fields
            .get_or_insert_with(Vec::new)
            .push((name.into(), type_name.into()));
        self
    }

    #[must_use]
    pub fn naming(mut self, naming: FieldNaming) -> Self {
        self.options.naming = Some(naming);
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.options.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.options.client_id = Some(client_id.into());
        self
    }

    #[must_use]
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.options.module = Some(module.into());
        self
    }

    /// Run the statement.
    ///
    /// # Errors
    /// Whatever the connection's `execute` returns.
    pub async fn execute(self) -> Result<ExecutionResult, OracleMiddlewareError> {
        self.conn
            .execute(self.sql, self.params.as_ref(), &self.options)
            .await
    }
}
