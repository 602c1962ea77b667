use tracing::{debug, trace};

use super::native::{NativeClient, SessionTags};
use super::options::ExecuteOptions;
use super::params::with_returning_binds;
use super::query::build_execution_result;
use crate::error::OracleMiddlewareError;
use crate::results::ExecutionResult;
use crate::types::Params;

/// Run one statement on a native session and marshal the response.
///
/// Session tags are overwritten on every call. Native failures carry the statement text,
/// params and options.
///
/// # Errors
/// Returns `OracleMiddlewareError::Native` when the native driver rejects the statement.
pub async fn execute_statement(
    client: &mut dyn NativeClient,
    in_transaction: bool,
    sql: &str,
    params: &Params,
    options: &ExecuteOptions,
) -> Result<ExecutionResult, OracleMiddlewareError> {
    let native_options = options.to_native(in_transaction);
    let binds = with_returning_binds(params, options.returning_fields.as_deref());

    client.set_session_tags(SessionTags {
        action: options.action.clone().unwrap_or_default(),
        client_id: options.client_id.clone().unwrap_or_default(),
        module: options.module.clone().unwrap_or_default(),
    });

    debug!(sql, "execute");
    trace!(?native_options, binds = binds.len(), "execute options");

    let response = client
        .execute(sql, binds.as_ref(), &native_options)
        .await
        .map_err(|e| OracleMiddlewareError::from(e).with_statement(sql, params, options))?;

    Ok(build_execution_result(response, options))
}
