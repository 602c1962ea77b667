// Pool layer:
// - mod.rs: `OraclePool`, lazy single creation of the native pool with queued waiters
// - managed.rs: deadpool-backed `NativeDriver` for clients without a pool of their own

pub mod managed;

pub use managed::{ManagedDriver, NativeConnector, SessionManager, SessionPool};

use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::OracleMiddlewareError;
use crate::oracle::session::open_session;
use crate::oracle::{NativeDriver, NativePool, OracleConnection, OracleOptions};

type CreationOutcome = Result<Arc<dyn NativePool>, Arc<OracleMiddlewareError>>;

enum PoolState {
    Idle,
    Creating {
        waiters: VecDeque<oneshot::Sender<CreationOutcome>>,
        close_requested: bool,
    },
    Ready(Arc<dyn NativePool>),
}

/// Snapshot of the native pool's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// No native pool yet, or closed.
    Idle,
    /// A native pool is being created; `waiters` callers are queued behind it.
    Creating { waiters: usize },
    Ready,
}

struct PoolInner {
    options: OracleOptions,
    driver: Arc<dyn NativeDriver>,
    state: Mutex<PoolState>,
}

/// Pool of initialized Oracle sessions.
///
/// The native pool is created on the first `get_connection`; callers arriving while it is
/// being created wait in arrival order and all see the same outcome. Clones share the same
/// native pool.
#[derive(Clone)]
pub struct OraclePool {
    inner: Arc<PoolInner>,
}

impl fmt::Debug for OraclePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OraclePool")
            .field("options", &self.inner.options)
            .field("status", &self.status())
            .finish()
    }
}

impl OraclePool {
    /// Wrap `driver` with validated options. No I/O happens here.
    ///
    /// # Errors
    /// Returns `OracleMiddlewareError::Config` if the options are invalid.
    pub fn new(
        options: OracleOptions,
        driver: Arc<dyn NativeDriver>,
    ) -> Result<Self, OracleMiddlewareError> {
        options.validate()?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                options,
                driver,
                state: Mutex::new(PoolState::Idle),
            }),
        })
    }

    #[must_use]
    pub fn options(&self) -> &OracleOptions {
        &self.inner.options
    }

    #[must_use]
    pub fn status(&self) -> PoolStatus {
        match &*self.lock_state() {
            PoolState::Idle => PoolStatus::Idle,
            PoolState::Creating { waiters, .. } => PoolStatus::Creating {
                waiters: waiters.len(),
            },
            PoolState::Ready(_) => PoolStatus::Ready,
        }
    }

    /// Check out a native session and run the session setup on it.
    ///
    /// # Errors
    /// `PoolCreation` when the native pool could not be created, `PoolClosed` when the pool
    /// was closed while being created, `Native` or `Protocol` when the session could not be
    /// opened or initialized.
    pub async fn get_connection(&self) -> Result<OracleConnection, OracleMiddlewareError> {
        let native = self.native_pool().await?;
        let client = native.get_connection().await?;
        open_session(client, &self.inner.options).await
    }

    /// Tear the native pool down. Closing an idle pool does nothing; the next
    /// `get_connection` creates a fresh native pool.
    ///
    /// # Errors
    /// Returns `OracleMiddlewareError::Native` if the native pool refuses to close; the pool
    /// stays usable in that case.
    pub async fn close(&self) -> Result<(), OracleMiddlewareError> {
        let pool = {
            let mut state = self.lock_state();
            match mem::replace(&mut *state, PoolState::Idle) {
                PoolState::Idle => None,
                PoolState::Creating { waiters, .. } => {
                    debug!("close requested while the native pool is being created");
                    *state = PoolState::Creating {
                        waiters,
                        close_requested: true,
                    };
                    None
                }
                PoolState::Ready(pool) => Some(pool),
            }
        };
        let Some(pool) = pool else {
            return Ok(());
        };

        info!("closing native pool");
        if let Err(err) = pool.close().await {
            warn!(error = %err, "native pool close failed");
            let mut state = self.lock_state();
            if matches!(*state, PoolState::Idle) {
                *state = PoolState::Ready(pool);
            }
            return Err(err.into());
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn native_pool(&self) -> Result<Arc<dyn NativePool>, OracleMiddlewareError> {
        let receiver = {
            let mut state = self.lock_state();
            match &mut *state {
                PoolState::Ready(pool) => return Ok(Arc::clone(pool)),
                PoolState::Creating { waiters, .. } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push_back(tx);
                    debug!(position = waiters.len(), "queued behind native pool creation");
                    Some(rx)
                }
                PoolState::Idle => {
                    *state = PoolState::Creating {
                        waiters: VecDeque::new(),
                        close_requested: false,
                    };
                    None
                }
            }
        };

        match receiver {
            Some(rx) => match rx.await {
                Ok(Ok(pool)) => Ok(pool),
                Ok(Err(err)) if matches!(*err, OracleMiddlewareError::PoolClosed) => {
                    Err(OracleMiddlewareError::PoolClosed)
                }
                Ok(Err(err)) => Err(OracleMiddlewareError::PoolCreation(err)),
                Err(_) => Err(OracleMiddlewareError::ConnectionError(
                    "native pool creation was abandoned".to_string(),
                )),
            },
            None => self.create_native_pool().await,
        }
    }

    async fn create_native_pool(&self) -> Result<Arc<dyn NativePool>, OracleMiddlewareError> {
        let mut guard = CreationGuard {
            state: &self.inner.state,
            armed: true,
        };

        info!(user = ?self.inner.options.user, "creating native pool");
        let created = match self.inner.options.native_pool_attributes() {
            Ok(attributes) => self
                .inner
                .driver
                .create_pool(&attributes)
                .await
                .map_err(OracleMiddlewareError::from),
            Err(err) => Err(err),
        };
        guard.armed = false;

        let (waiters, close_requested) = {
            let mut state = self.lock_state();
            let (waiters, close_requested) = match mem::replace(&mut *state, PoolState::Idle) {
                PoolState::Creating {
                    waiters,
                    close_requested,
                } => (waiters, close_requested),
                other => {
                    *state = other;
                    (VecDeque::new(), false)
                }
            };
            if let Ok(pool) = &created
                && !close_requested
            {
                *state = PoolState::Ready(Arc::clone(pool));
            }
            (waiters, close_requested)
        };

        match created {
            Ok(pool) if close_requested => {
                info!("pool closed during creation, tearing down the new native pool");
                if let Err(err) = pool.close().await {
                    warn!(error = %err, "native pool close failed");
                }
                resolve_waiters(waiters, &Err(Arc::new(OracleMiddlewareError::PoolClosed)));
                Err(OracleMiddlewareError::PoolClosed)
            }
            Ok(pool) => {
                info!(waiters = waiters.len(), "native pool created");
                resolve_waiters(waiters, &Ok(Arc::clone(&pool)));
                Ok(pool)
            }
            Err(err) => {
                warn!(error = %err, waiters = waiters.len(), "native pool creation failed");
                let shared = Arc::new(err);
                resolve_waiters(waiters, &Err(Arc::clone(&shared)));
                Err(OracleMiddlewareError::PoolCreation(shared))
            }
        }
    }
}

fn resolve_waiters(waiters: VecDeque<oneshot::Sender<CreationOutcome>>, outcome: &CreationOutcome) {
    for waiter in waiters {
        // a waiter that gave up has dropped its receiver
        let _ = waiter.send(outcome.clone());
    }
}

/// Puts the state back to `Idle` if the creating future is dropped mid-flight. Dropping the
/// queued senders wakes every waiter with an error.
struct CreationGuard<'a> {
    state: &'a Mutex<PoolState>,
    armed: bool,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let PoolState::Creating { waiters, .. } = &*state {
            warn!(waiters = waiters.len(), "native pool creation cancelled");
            *state = PoolState::Idle;
        }
    }
}
