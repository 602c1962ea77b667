use std::sync::Arc;
use std::time::Duration;

use sql_middleware_oracle::prelude::*;
use sql_middleware_oracle::test_utils::{MockDatabase, mock_pool, test_options};

#[tokio::test]
async fn concurrent_acquisitions_create_one_native_pool() -> Result<(), OracleMiddlewareError> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let (pool, db) = mock_pool(test_options())?;
    db.set_create_delay(Duration::from_millis(50));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move { pool.get_connection().await }));
    }
    for handle in handles {
        let mut conn = handle.await.expect("task panicked")?;
        assert_eq!(conn.session_id(), &RowValues::Int(42));
        conn.close().await?;
    }

    let stats = db.stats();
    assert_eq!(stats.pools_created, 1);
    assert_eq!(stats.sessions_opened, 8);
    assert_eq!(stats.sessions_closed, 8);
    assert_eq!(pool.status(), PoolStatus::Ready);
    Ok(())
}

#[tokio::test]
async fn creation_failure_is_shared_by_every_waiter() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    db.set_create_delay(Duration::from_millis(50));
    db.fail_pool_creation(Some(NativeError::with_code(12541, "TNS:no listener")));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move { pool.get_connection().await }));
    }

    let mut shared = Vec::new();
    for handle in handles {
        match handle.await.expect("task panicked") {
            Err(OracleMiddlewareError::PoolCreation(err)) => shared.push(err),
            other => panic!("expected a pool creation error, got {other:?}"),
        }
    }
    assert_eq!(shared.len(), 4);
    assert!(shared.iter().all(|e| Arc::ptr_eq(e, &shared[0])));
    assert_eq!(shared[0].native().and_then(|n| n.code), Some(12541));
    assert!(shared[0].to_string().contains("ORA-12541"));
    assert_eq!(pool.status(), PoolStatus::Idle);

    // the next call tries again
    db.fail_pool_creation(None);
    let mut conn = pool.get_connection().await?;
    conn.close().await?;
    assert_eq!(db.stats().pools_created, 1);
    Ok(())
}

#[tokio::test]
async fn invalid_schema_fails_before_any_native_call() {
    let db = MockDatabase::new();
    let result = OracleOptionsBuilder::new("scott".into(), "tiger".into())
        .connect_string("localhost/XEPDB1")
        .schema("hr; drop table x")
        .build(db.driver());

    assert!(matches!(result, Err(OracleMiddlewareError::Config(_))));
    let stats = db.stats();
    assert!(stats.pool_attributes.is_empty());
    assert_eq!(stats.sessions_opened, 0);
}

#[tokio::test]
async fn pool_close_is_idempotent_and_pool_is_reusable() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;

    // closing a pool that never connected does nothing
    pool.close().await?;
    assert_eq!(db.stats().pools_closed, 0);

    let mut conn = pool.get_connection().await?;
    conn.close().await?;
    pool.close().await?;
    pool.close().await?;
    assert_eq!(db.stats().pools_closed, 1);
    assert_eq!(pool.status(), PoolStatus::Idle);

    let mut conn = pool.get_connection().await?;
    conn.test().await?;
    conn.close().await?;
    assert_eq!(db.stats().pools_created, 2);
    Ok(())
}

#[tokio::test]
async fn failed_native_close_keeps_pool_usable() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    let mut conn = pool.get_connection().await?;
    conn.close().await?;

    db.fail_pool_close(Some(NativeError::new("pool busy")));
    assert!(matches!(
        pool.close().await,
        Err(OracleMiddlewareError::Native { .. })
    ));
    assert_eq!(pool.status(), PoolStatus::Ready);

    db.fail_pool_close(None);
    pool.close().await?;
    assert_eq!(db.stats().pools_closed, 1);
    Ok(())
}

#[tokio::test]
async fn close_during_creation_tears_down_new_pool() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    db.set_create_delay(Duration::from_millis(100));

    let creator = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.get_connection().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.get_connection().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(pool.status(), PoolStatus::Creating { waiters: 1 });

    pool.close().await?;

    assert!(matches!(
        creator.await.expect("task panicked"),
        Err(OracleMiddlewareError::PoolClosed)
    ));
    assert!(matches!(
        waiter.await.expect("task panicked"),
        Err(OracleMiddlewareError::PoolClosed)
    ));
    let stats = db.stats();
    assert_eq!(stats.pools_created, 1);
    assert_eq!(stats.pools_closed, 1);
    assert_eq!(pool.status(), PoolStatus::Idle);
    Ok(())
}

#[tokio::test]
async fn cancelled_creation_releases_waiters() -> Result<(), OracleMiddlewareError> {
    let (pool, db) = mock_pool(test_options())?;
    db.set_create_delay(Duration::from_millis(200));

    let creator = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.get_connection().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.get_connection().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    creator.abort();
    assert!(matches!(
        waiter.await.expect("task panicked"),
        Err(OracleMiddlewareError::ConnectionError(_))
    ));
    assert_eq!(pool.status(), PoolStatus::Idle);
    Ok(())
}

#[tokio::test]
async fn single_session_pool_round_trip() -> Result<(), OracleMiddlewareError> {
    let db = MockDatabase::new();
    let pool = OracleOptionsBuilder::new("scott".into(), "tiger".into())
        .host("localhost")
        .database("XEPDB1")
        .pool_max(1)
        .build(db.driver())?;

    let mut conn = pool.get_connection().await?;
    let result = conn.execute("select 1 from dual", &Params::default(), &ExecuteOptions::default()).await?;
    assert_eq!(result.rows, Some(vec![Row::Array(vec![RowValues::Int(1)])]));
    conn.close().await?;
    pool.close().await?;

    let stats = db.stats();
    assert_eq!(stats.pools_created, 1);
    assert_eq!(stats.pools_closed, 1);
    assert_eq!(stats.pool_attributes[0].pool_max, 1);
    assert_eq!(stats.pool_attributes[0].connect_string, "localhost:1521/XEPDB1");
    Ok(())
}

#[tokio::test]
async fn external_auth_drops_credentials() -> Result<(), OracleMiddlewareError> {
    let db = MockDatabase::new();
    let pool = OracleOptionsBuilder::new("scott".into(), "tiger".into())
        .connect_string("db.example.com/ORCL")
        .external_auth(true)
        .pool_min(2)
        .pool_increment(2)
        .idle_timeout(Duration::from_secs(30))
        .build(db.driver())?;
    let mut conn = pool.get_connection().await?;
    conn.close().await?;

    let attrs = &db.stats().pool_attributes[0];
    assert!(attrs.external_auth);
    assert_eq!(attrs.user, None);
    assert_eq!(attrs.password, None);
    assert_eq!(attrs.pool_min, 2);
    assert_eq!(attrs.pool_increment, 2);
    assert_eq!(attrs.pool_timeout, Duration::from_secs(30));
    Ok(())
}
