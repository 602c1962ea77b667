// Test utilities:
// - mock.rs: scriptable in-memory native driver
//
// Enabled for unit tests and with the `test-utils` feature.

pub mod mock;

pub use mock::{
    ExecutedStatement, MOCK_SERVER_VERSION, MOCK_SESSION_ID, MockConnector, MockDatabase,
    MockReply, MockStats,
};

use crate::error::OracleMiddlewareError;
use crate::oracle::OracleOptions;
use crate::pool::OraclePool;

/// Options pointing at a made-up listener, enough for the mock driver.
#[must_use]
pub fn test_options() -> OracleOptions {
    OracleOptions::new(
        "scott".to_string(),
        "tiger".to_string(),
        "localhost:1521/XEPDB1".to_string(),
    )
}

/// A pool over a fresh [`MockDatabase`].
///
/// # Errors
/// Returns `OracleMiddlewareError::Config` if `options` are invalid.
pub fn mock_pool(options: OracleOptions) -> Result<(OraclePool, MockDatabase), OracleMiddlewareError> {
    let db = MockDatabase::new();
    let pool = OraclePool::new(options, db.driver())?;
    Ok((pool, db))
}
