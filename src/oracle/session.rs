use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::config::{OracleOptions, validate_schema_name};
use super::connection::OracleConnection;
use super::native::{NativeClient, NativeExecuteOptions};
use crate::error::OracleMiddlewareError;
use crate::results::Row;
use crate::types::{Params, RowValues};

const SESSION_ID_QUERY: &str = "select sid from v$mystat where rownum <= 1";

static SERVER_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})(\d{2})(\d{2})(\d{2})").expect("version pattern is a valid regex")
});

/// Server release, e.g. `19.3.0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub build: u8,
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

impl FromStr for ServerVersion {
    type Err = OracleMiddlewareError;

    /// Parse the driver's packed form: two digits per component, trailing digits ignored.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let caps = SERVER_VERSION.captures(raw.trim()).ok_or_else(|| {
            OracleMiddlewareError::Protocol(format!("unrecognized server version {raw:?}"))
        })?;
        let part = |i: usize| -> Result<u8, OracleMiddlewareError> {
            caps[i].parse::<u8>().map_err(|e| {
                OracleMiddlewareError::Protocol(format!("bad server version component: {e}"))
            })
        };
        Ok(ServerVersion {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
            build: part(4)?,
        })
    }
}

/// Quote a schema name for `ALTER SESSION SET CURRENT_SCHEMA`.
///
/// The name is validated first and upper-cased, matching how the server folds unquoted
/// identifiers.
///
/// # Errors
/// Returns `OracleMiddlewareError::Config` for names that are not plain identifiers.
pub fn quote_identifier(name: &str) -> Result<String, OracleMiddlewareError> {
    validate_schema_name(name)?;
    Ok(format!("\"{}\"", name.to_uppercase().replace('"', "\"\"")))
}

/// Run the session setup on a freshly checked-out native session and wrap it.
///
/// On any failure the native session is closed before the error is returned.
pub(crate) async fn open_session(
    mut client: Box<dyn NativeClient>,
    options: &OracleOptions,
) -> Result<OracleConnection, OracleMiddlewareError> {
    match initialize(client.as_mut(), options).await {
        Ok((server_version, session_id)) => {
            debug!(%server_version, ?session_id, "session initialized");
            Ok(OracleConnection::new(client, server_version, session_id))
        }
        Err(err) => {
            if let Err(close_err) = client.close().await {
                warn!(error = %close_err, "closing session after failed initialization");
            }
            Err(err)
        }
    }
}

async fn initialize(
    client: &mut dyn NativeClient,
    options: &OracleOptions,
) -> Result<(ServerVersion, RowValues), OracleMiddlewareError> {
    let server_version: ServerVersion = client.server_version().parse()?;

    let session_id = match client.session_id() {
        Some(session_id) => session_id,
        None => {
            let session_id = query_session_id(client).await?;
            client.set_session_id(session_id.clone());
            session_id
        }
    };

    if let Some(schema) = &options.schema {
        let already_set = client
            .current_schema()
            .is_some_and(|current| current.eq_ignore_ascii_case(schema));
        if !already_set {
            let sql = format!(
                "ALTER SESSION SET CURRENT_SCHEMA = {}",
                quote_identifier(schema)?
            );
            let native_options = NativeExecuteOptions {
                auto_commit: true,
                ..NativeExecuteOptions::default()
            };
            client
                .execute(&sql, &Params::default(), &native_options)
                .await
                .map_err(OracleMiddlewareError::from)?;
        }
    }

    Ok((server_version, session_id))
}

async fn query_session_id(client: &mut dyn NativeClient) -> Result<RowValues, OracleMiddlewareError> {
    let response = client
        .execute(
            SESSION_ID_QUERY,
            &Params::default(),
            &NativeExecuteOptions::default(),
        )
        .await
        .map_err(OracleMiddlewareError::from)?;
    response
        .rows
        .as_ref()
        .and_then(|rows| rows.first())
        .and_then(|row| match row {
            Row::Array(values) => values.first().cloned(),
            Row::Object(map) => map.values().next().cloned(),
        })
        .ok_or_else(|| {
            OracleMiddlewareError::Protocol("session id query returned no row".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_packed_versions() {
        let v: ServerVersion = "19030000".parse().unwrap();
        assert_eq!(v.to_string(), "19.3.0.0");
        let v: ServerVersion = "1202000100".parse().unwrap();
        assert_eq!(
            v,
            ServerVersion {
                major: 12,
                minor: 2,
                patch: 0,
                build: 1
            }
        );
    }

    #[test]
    fn rejects_malformed_versions() {
        for raw in ["", "12.2", "1902", "abcdefgh"] {
            assert!(matches!(
                raw.parse::<ServerVersion>(),
                Err(OracleMiddlewareError::Protocol(_))
            ));
        }
    }

    #[test]
    fn versions_order_numerically() {
        let old: ServerVersion = "11020004".parse().unwrap();
        let new: ServerVersion = "19030000".parse().unwrap();
        assert!(old < new);
    }

    #[test]
    fn quotes_schema_identifiers() {
        assert_eq!(quote_identifier("hr").unwrap(), "\"HR\"");
        assert!(quote_identifier("hr\"; drop").is_err());
    }
}
