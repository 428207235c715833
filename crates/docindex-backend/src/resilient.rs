//! Reconnect-on-error wrapper around a shared stateful connection.
//!
//! Reconnecting eagerly under sustained transient load can make an
//! overloaded backend worse, so the policy is deliberately delayed: the
//! first observed error only starts a clock, and a reconnect happens only
//! once errors have persisted past `error_threshold` while still arriving.
//! Isolated stale errors never trigger a reconnect, and reconnects are
//! spaced at least `min_reconnect_interval` apart.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use docindex_core::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Cap on operation attempts within one `execute` call.
    pub max_attempts: usize,
    /// Minimum spacing between two reconnects.
    pub min_reconnect_interval: Duration,
    /// Errors must persist this long (and still be arriving) to reconnect.
    pub error_threshold: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_reconnect_interval: Duration::from_secs(60),
            error_threshold: Duration::from_secs(30),
        }
    }
}

pub type ConnectFn<C> = Box<dyn Fn() -> BoxFuture<'static, Result<C>> + Send + Sync>;

#[derive(Default)]
struct ReconnectState {
    last_reconnect: Option<Instant>,
    first_error: Option<Instant>,
    last_error: Option<Instant>,
}

/// One shared physical connection with threshold-gated reconnection.
///
/// Callers hold the wrapper; the underlying connection is swapped
/// atomically, so an in-flight operation on a stale connection simply
/// fails and gets retried against the new one.
pub struct ResilientConnection<C> {
    current: RwLock<Arc<C>>,
    connect: ConnectFn<C>,
    policy: ReconnectPolicy,
    state: Mutex<ReconnectState>,
}

impl<C: Send + Sync> ResilientConnection<C> {
    pub async fn connect(connect: ConnectFn<C>, policy: ReconnectPolicy) -> Result<Self> {
        let conn = (connect)().await?;
        Ok(Self {
            current: RwLock::new(Arc::new(conn)),
            connect,
            policy,
            state: Mutex::new(ReconnectState::default()),
        })
    }

    /// Handle to the current physical connection.
    pub async fn current(&self) -> Arc<C> {
        self.current.read().await.clone()
    }

    /// Run `op` against the current connection, retrying transient
    /// connection-class failures up to the attempt cap and consulting the
    /// reconnect policy between attempts.
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(Arc<C>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0usize;
        loop {
            let conn = self.current().await;
            match op(conn).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    attempts += 1;
                    if attempts >= self.policy.max_attempts {
                        warn!(attempts, "connection retry cap exhausted");
                        return Err(err);
                    }
                    self.maybe_reconnect().await?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Reconnect decision, serialized by a single mutex. Hot-path
    /// operations never take this lock.
    async fn maybe_reconnect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if let Some(last) = state.last_reconnect {
            if now.duration_since(last) < self.policy.min_reconnect_interval {
                return Ok(());
            }
        }

        let Some(first_error) = state.first_error else {
            // First error since the last reconnect: start the clock and let
            // the transport try to self-heal.
            state.first_error = Some(now);
            state.last_error = Some(now);
            return Ok(());
        };

        let elapsed_since_first = now.duration_since(first_error);
        let elapsed_since_recent =
            state.last_error.map(|t| now.duration_since(t)).unwrap_or_default();
        state.last_error = Some(now);

        let should_reconnect = elapsed_since_first >= self.policy.error_threshold
            && elapsed_since_recent <= self.policy.error_threshold;
        if !should_reconnect {
            return Ok(());
        }

        let fresh = (self.connect)().await?;
        let old = {
            let mut current = self.current.write().await;
            std::mem::replace(&mut *current, Arc::new(fresh))
        };
        state.first_error = None;
        state.last_error = None;
        state.last_reconnect = Some(now);
        info!("established replacement connection");
        // Old connection closes on drop once in-flight holders release it.
        drop(old);
        Ok(())
    }
}
