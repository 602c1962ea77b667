use std::sync::Arc;

use thiserror::Error;

use crate::oracle::ExecuteOptions;
use crate::types::Params;

/// Error reported by a native client, pool or result set.
///
/// The optional `code` is the server error number (`ORA-xxxxx`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_native(.code.as_ref(), .message))]
pub struct NativeError {
    pub code: Option<u32>,
    pub message: String,
}

impl NativeError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_code(code: u32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

fn render_native(code: Option<&u32>, message: &str) -> String {
    match code {
        Some(code) => format!("ORA-{code:05}: {message}"),
        None => message.to_string(),
    }
}

/// The statement a native failure belongs to.
#[derive(Debug, Clone)]
pub struct StatementContext {
    pub sql: String,
    pub params: Params,
    pub options: ExecuteOptions,
}

#[derive(Debug, Error)]
pub enum OracleMiddlewareError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Can not execute while connection is closed")]
    ClosedConnection,

    #[error("Cursor is closed")]
    ClosedCursor,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("{}", describe_native(.source, .statement.as_deref()))]
    Native {
        source: NativeError,
        statement: Option<Box<StatementContext>>,
    },

    #[error("Native pool creation failed: {0}")]
    PoolCreation(Arc<OracleMiddlewareError>),

    #[error("Connection pool is closed")]
    PoolClosed,

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl From<NativeError> for OracleMiddlewareError {
    fn from(source: NativeError) -> Self {
        OracleMiddlewareError::Native {
            source,
            statement: None,
        }
    }
}

impl OracleMiddlewareError {
    /// Attach the failing statement to a native error. Other variants are returned unchanged.
    #[must_use]
    pub fn with_statement(self, sql: &str, params: &Params, options: &ExecuteOptions) -> Self {
        match self {
            OracleMiddlewareError::Native { source, .. } => OracleMiddlewareError::Native {
                source,
                statement: Some(Box::new(StatementContext {
                    sql: sql.to_string(),
                    params: params.clone(),
                    options: options.clone(),
                })),
            },
            other => other,
        }
    }

    /// Statement context of a native failure, if one was attached.
    #[must_use]
    pub fn statement(&self) -> Option<&StatementContext> {
        match self {
            OracleMiddlewareError::Native { statement, .. } => statement.as_deref(),
            _ => None,
        }
    }

    /// The native error behind this failure, looking through shared pool-creation errors.
    #[must_use]
    pub fn native(&self) -> Option<&NativeError> {
        match self {
            OracleMiddlewareError::Native { source, .. } => Some(source),
            OracleMiddlewareError::PoolCreation(inner) => inner.native(),
            _ => None,
        }
    }
}

fn describe_native(source: &NativeError, statement: Option<&StatementContext>) -> String {
    match statement {
        Some(ctx) => format!(
            "{source} (sql: {}; params: {:?}; options: {:?})",
            ctx.sql, ctx.params, ctx.options
        ),
        None => source.to_string(),
    }
}
