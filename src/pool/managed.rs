use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use deadpool::managed::{Manager, Metrics, Object, Pool, PoolError, RecycleError, RecycleResult};
use tracing::{debug, trace};

use crate::error::NativeError;
use crate::oracle::{
    NativeClient, NativeDriver, NativeExecuteOptions, NativePool, NativePoolAttributes,
    NativeResponse, SessionTags,
};
use crate::types::{Params, RowValues};

/// Opens single native sessions for a [`ManagedDriver`].
#[async_trait]
pub trait NativeConnector: Send + Sync {
    async fn connect(
        &self,
        attributes: &NativePoolAttributes,
    ) -> Result<Box<dyn NativeClient>, NativeError>;
}

/// deadpool manager for native sessions
pub struct SessionManager<C> {
    connector: Arc<C>,
    attributes: NativePoolAttributes,
}

impl<C> fmt::Debug for SessionManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl<C: NativeConnector + 'static> Manager for SessionManager<C> {
    type Type = Box<dyn NativeClient>;
    type Error = NativeError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        trace!(connect_string = %self.attributes.connect_string, "opening native session");
        self.connector.connect(&self.attributes).await
    }

    async fn recycle(&self, client: &mut Self::Type, metrics: &Metrics) -> RecycleResult<Self::Error> {
        let idle = metrics.last_used();
        if !self.attributes.pool_timeout.is_zero() && idle > self.attributes.pool_timeout {
            debug!(?idle, "discarding idle native session");
            return Err(RecycleError::Backend(NativeError::new(format!(
                "session idle for {idle:?}"
            ))));
        }
        client.ping().await.map_err(RecycleError::Backend)
    }
}

pub type SessionPool<C> = Pool<SessionManager<C>>;

/// [`NativeDriver`] for clients that have no pool of their own; sessions are pooled with
/// deadpool.
///
/// `pool_max` becomes the deadpool max size, `pool_min` sessions are opened up front, and
/// `pool_timeout` is the idle limit checked whenever a session is handed out again.
/// `pool_increment` has no deadpool counterpart and is ignored.
pub struct ManagedDriver<C> {
    connector: Arc<C>,
}

impl<C> fmt::Debug for ManagedDriver<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedDriver").finish_non_exhaustive()
    }
}

impl<C: NativeConnector + 'static> ManagedDriver<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
        }
    }
}

#[async_trait]
impl<C: NativeConnector + 'static> NativeDriver for ManagedDriver<C> {
    async fn create_pool(
        &self,
        attributes: &NativePoolAttributes,
    ) -> Result<Arc<dyn NativePool>, NativeError> {
        let manager = SessionManager {
            connector: Arc::clone(&self.connector),
            attributes: attributes.clone(),
        };
        let max_size = usize::try_from(attributes.pool_max.max(1)).unwrap_or(usize::MAX);
        let pool = Pool::builder(manager)
            .max_size(max_size)
            .build()
            .map_err(|e| NativeError::new(format!("Failed to create session pool: {e}")))?;

        let mut warm = Vec::new();
        for _ in 0..attributes.pool_min.min(attributes.pool_max) {
            warm.push(pool.get().await.map_err(pool_error)?);
        }
        drop(warm);

        debug!(max_size, min = attributes.pool_min, "session pool ready");
        Ok(Arc::new(ManagedPool { pool }))
    }
}

struct ManagedPool<C: NativeConnector + 'static> {
    pool: SessionPool<C>,
}

#[async_trait]
impl<C: NativeConnector + 'static> NativePool for ManagedPool<C> {
    async fn get_connection(&self) -> Result<Box<dyn NativeClient>, NativeError> {
        let object = self.pool.get().await.map_err(pool_error)?;
        Ok(Box::new(PooledClient {
            object: Some(object),
        }))
    }

    async fn close(&self) -> Result<(), NativeError> {
        self.pool.close();
        Ok(())
    }
}

fn pool_error(err: PoolError<NativeError>) -> NativeError {
    match err {
        PoolError::Backend(e) => e,
        other => NativeError::new(format!("session pool: {other}")),
    }
}

/// A session borrowed from a [`SessionPool`]; `close` hands it back.
struct PooledClient<C: NativeConnector + 'static> {
    object: Option<Object<SessionManager<C>>>,
}

impl<C: NativeConnector + 'static> PooledClient<C> {
    fn session(&mut self) -> Result<&mut Box<dyn NativeClient>, NativeError> {
        self.object
            .as_deref_mut()
            .ok_or_else(|| NativeError::new("session already returned to the pool"))
    }
}

#[async_trait]
impl<C: NativeConnector + 'static> NativeClient for PooledClient<C> {
    fn server_version(&self) -> String {
        self.object
            .as_deref()
            .map(|client| client.server_version())
            .unwrap_or_default()
    }

    fn current_schema(&self) -> Option<String> {
        self.object.as_deref().and_then(|client| client.current_schema())
    }

    fn session_id(&self) -> Option<RowValues> {
        self.object.as_deref().and_then(|client| client.session_id())
    }

    fn set_session_id(&mut self, session_id: RowValues) {
        if let Some(client) = self.object.as_deref_mut() {
            client.set_session_id(session_id);
        }
    }

    fn set_session_tags(&mut self, tags: SessionTags) {
        if let Some(client) = self.object.as_deref_mut() {
            client.set_session_tags(tags);
        }
    }

    async fn execute(
        &mut self,
        sql: &str,
        params: &Params,
        options: &NativeExecuteOptions,
    ) -> Result<NativeResponse, NativeError> {
        self.session()?.execute(sql, params, options).await
    }

    async fn commit(&mut self) -> Result<(), NativeError> {
        self.session()?.commit().await
    }

    async fn rollback(&mut self) -> Result<(), NativeError> {
        self.session()?.rollback().await
    }

    async fn ping(&mut self) -> Result<(), NativeError> {
        self.session()?.ping().await
    }

    async fn close(&mut self) -> Result<(), NativeError> {
        // dropping the object returns the session to deadpool
        self.object.take();
        Ok(())
    }
}
