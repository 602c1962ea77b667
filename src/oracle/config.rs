use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::native::{NativeDriver, NativePoolAttributes};
use crate::error::OracleMiddlewareError;
use crate::pool::OraclePool;

const DEFAULT_PORT: u16 = 1521;

static SCHEMA_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("schema pattern is a valid regex"));

/// Reject schema names that are not plain identifiers.
///
/// # Errors
/// Returns `OracleMiddlewareError::Config` when `schema` does not match `^\w+$`.
pub fn validate_schema_name(schema: &str) -> Result<(), OracleMiddlewareError> {
    if SCHEMA_NAME.is_match(schema) {
        Ok(())
    } else {
        Err(OracleMiddlewareError::Config(format!(
            "Invalid schema name: {schema:?}"
        )))
    }
}

/// Native pool sizing. Values are handed to the native pool unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub min: u32,
    pub max: u32,
    pub increment: u32,
    /// Seconds an idle session may stay in the pool
    pub idle_timeout: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            min: 0,
            max: 4,
            increment: 1,
            idle_timeout: 60,
        }
    }
}

impl PoolSettings {
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }
}

/// Options for configuring an Oracle pool.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleOptions {
    pub user: Option<String>,
    pub password: Option<String>,
    /// Authenticate with OS/wallet credentials instead of user and password
    pub external_auth: bool,
    /// Easy-connect string or TNS alias; takes precedence over the host parts
    pub connect_string: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub server_type: Option<String>,
    pub instance_name: Option<String>,
    /// Default schema set on every new session
    pub schema: Option<String>,
    pub pool: PoolSettings,
}

impl fmt::Debug for OracleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleOptions")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("external_auth", &self.external_auth)
            .field("connect_string", &self.connect_string)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("server_type", &self.server_type)
            .field("instance_name", &self.instance_name)
            .field("schema", &self.schema)
            .field("pool", &self.pool)
            .finish()
    }
}

impl OracleOptions {
    #[must_use]
    pub fn new(user: String, password: String, connect_string: String) -> Self {
        Self {
            user: Some(user),
            password: Some(password),
            connect_string: Some(connect_string),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema;
        self
    }

    #[must_use]
    pub fn with_pool(mut self, pool: PoolSettings) -> Self {
        self.pool = pool;
        self
    }

    #[must_use]
    pub fn with_external_auth(mut self, external_auth: bool) -> Self {
        self.external_auth = external_auth;
        self
    }

    /// Check everything that can be checked without I/O.
    ///
    /// # Errors
    /// Returns `OracleMiddlewareError::Config` for an invalid schema name or a missing
    /// connect target.
    pub fn validate(&self) -> Result<(), OracleMiddlewareError> {
        if let Some(schema) = &self.schema {
            validate_schema_name(schema)?;
        }
        self.connect_target().map(|_| ())
    }

    /// Resolve the connect string, composing `host:port/database:server_type/instance_name`
    /// when no explicit connect string was given.
    ///
    /// # Errors
    /// Returns `OracleMiddlewareError::Config` when neither a connect string nor a host is set.
    pub fn connect_target(&self) -> Result<String, OracleMiddlewareError> {
        if let Some(connect_string) = &self.connect_string {
            return Ok(connect_string.clone());
        }
        let Some(host) = &self.host else {
            return Err(OracleMiddlewareError::Config(
                "either connect_string or host is required".to_string(),
            ));
        };
        let mut target = format!("{host}:{}", self.port.unwrap_or(DEFAULT_PORT));
        if let Some(database) = &self.database {
            target.push('/');
            target.push_str(database);
        }
        if let Some(server_type) = &self.server_type {
            target.push(':');
            target.push_str(server_type);
        }
        if let Some(instance_name) = &self.instance_name {
            target.push('/');
            target.push_str(instance_name);
        }
        Ok(target)
    }

    /// Arguments for the native pool constructor. External authentication drops the
    /// user/password pair.
    ///
    /// # Errors
    /// Propagates `connect_target` failures.
    pub fn native_pool_attributes(&self) -> Result<NativePoolAttributes, OracleMiddlewareError> {
        let (user, password) = if self.external_auth {
            (None, None)
        } else {
            (self.user.clone(), self.password.clone())
        };
        Ok(NativePoolAttributes {
            user,
            password,
            external_auth: self.external_auth,
            connect_string: self.connect_target()?,
            pool_min: self.pool.min,
            pool_max: self.pool.max,
            pool_increment: self.pool.increment,
            pool_timeout: self.pool.idle_timeout(),
        })
    }
}

/// Fluent builder for Oracle options.
#[derive(Debug, Clone, Default)]
pub struct OracleOptionsBuilder {
    opts: OracleOptions,
}

impl OracleOptionsBuilder {
    #[must_use]
    pub fn new(user: String, password: String) -> Self {
        Self {
            opts: OracleOptions {
                user: Some(user),
                password: Some(password),
                ..OracleOptions::default()
            },
        }
    }

    #[must_use]
    pub fn connect_string(mut self, connect_string: impl Into<String>) -> Self {
        self.opts.connect_string = Some(connect_string.into());
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.opts.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.opts.port = port;
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.opts.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn server_type(mut self, server_type: impl Into<String>) -> Self {
        self.opts.server_type = Some(server_type.into());
        self
    }

    #[must_use]
    pub fn instance_name(mut self, instance_name: impl Into<String>) -> Self {
        self.opts.instance_name = Some(instance_name.into());
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.opts.schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn external_auth(mut self, external_auth: bool) -> Self {
        self.opts.external_auth = external_auth;
        self
    }

    #[must_use]
    pub fn pool_min(mut self, min: u32) -> Self {
        self.opts.pool.min = min;
        self
    }

    #[must_use]
    pub fn pool_max(mut self, max: u32) -> Self {
        self.opts.pool.max = max;
        self
    }

    #[must_use]
    pub fn pool_increment(mut self, increment: u32) -> Self {
        self.opts.pool.increment = increment;
        self
    }

    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.opts.pool.idle_timeout = timeout.as_secs();
        self
    }

    #[must_use]
    pub fn finish(self) -> OracleOptions {
        self.opts
    }

    /// Build an `OraclePool` on top of `driver`. No connection is opened here.
    ///
    /// # Errors
    /// Returns `OracleMiddlewareError::Config` if the options fail validation.
    pub fn build(self, driver: Arc<dyn NativeDriver>) -> Result<OraclePool, OracleMiddlewareError> {
        OraclePool::new(self.finish(), driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(validate_schema_name("HR").is_ok());
        assert!(validate_schema_name("app_owner_01").is_ok());
    }

    #[test]
    fn rejects_injection_attempts() {
        for bad in ["hr; drop user x", "hr x", "", "hr--", "\"HR\""] {
            assert!(
                matches!(
                    validate_schema_name(bad),
                    Err(OracleMiddlewareError::Config(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn composes_connect_target_from_parts() {
        let opts = OracleOptionsBuilder::new("scott".into(), "tiger".into())
            .host("db.local")
            .database("ORCLPDB1")
            .server_type("dedicated")
            .instance_name("inst1")
            .finish();
        assert_eq!(
            opts.connect_target().unwrap(),
            "db.local:1521/ORCLPDB1:dedicated/inst1"
        );
    }

    #[test]
    fn explicit_connect_string_wins() {
        let opts = OracleOptionsBuilder::new("scott".into(), "tiger".into())
            .host("ignored")
            .connect_string("tns_alias")
            .finish();
        assert_eq!(opts.connect_target().unwrap(), "tns_alias");
    }

    #[test]
    fn missing_target_is_a_config_error() {
        let opts = OracleOptionsBuilder::new("scott".into(), "tiger".into()).finish();
        assert!(matches!(
            opts.validate(),
            Err(OracleMiddlewareError::Config(_))
        ));
    }

    #[test]
    fn external_auth_drops_credentials() {
        let attrs = OracleOptions::new("scott".into(), "tiger".into(), "db/x".into())
            .with_external_auth(true)
            .native_pool_attributes()
            .unwrap();
        assert!(attrs.user.is_none());
        assert!(attrs.password.is_none());
        assert!(attrs.external_auth);
    }

    #[test]
    fn pool_settings_pass_through() {
        let attrs = OracleOptionsBuilder::new("scott".into(), "tiger".into())
            .connect_string("db/x")
            .pool_min(2)
            .pool_max(10)
            .pool_increment(2)
            .idle_timeout(Duration::from_secs(120))
            .finish()
            .native_pool_attributes()
            .unwrap();
        assert_eq!(
            (attrs.pool_min, attrs.pool_max, attrs.pool_increment),
            (2, 10, 2)
        );
        assert_eq!(attrs.pool_timeout, Duration::from_secs(120));
    }

    #[test]
    fn options_deserialize_from_json() {
        let opts: OracleOptions = serde_json::from_str(
            r#"{"user":"scott","password":"tiger","connect_string":"db/x","schema":"HR","pool":{"max":8}}"#,
        )
        .unwrap();
        assert_eq!(opts.schema.as_deref(), Some("HR"));
        assert_eq!(opts.pool.max, 8);
        assert_eq!(opts.pool.increment, 1);
    }

    #[test]
    fn debug_output_redacts_password() {
        let opts = OracleOptions::new("scott".into(), "tiger".into(), "db/x".into());
        assert!(!format!("{opts:?}").contains("tiger"));
    }
}
