//! Blocking-call offload pool
//!
//! The XML-RPC transport is synchronous. Every call is handed to the
//! runtime's blocking threads so request handlers keep running while the
//! ERP answers. A semaphore bounds how many calls run at once; callers
//! beyond the bound queue for a slot.
//!
//! A timed-out caller stops waiting, but the worker keeps its slot until
//! the transport returns. The transport's own HTTP timeout bounds that.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, info, warn};

use crate::config::DEFAULT_MAX_IN_FLIGHT;
use crate::error::ErpError;

/// Bounds of an offload pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of calls running at once
    pub max_in_flight: usize,
    /// Maximum time a call waits for a slot; `None` waits without limit
    pub queue_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            queue_timeout: None,
        }
    }
}

/// Point-in-time view of a pool's load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolMetrics {
    pub capacity: usize,
    pub in_flight: usize,
    /// Calls waiting for a slot
    pub queued: usize,
    pub completed: u64,
    pub timed_out: u64,
    /// Calls refused because the pool was saturated or closed
    pub rejected: u64,
    pub closed: bool,
}

#[derive(Debug, Default)]
struct PoolCounters {
    queued: AtomicUsize,
    in_flight: AtomicUsize,
    completed: AtomicU64,
    timed_out: AtomicU64,
    rejected: AtomicU64,
}

/// Counts a caller as queued until dropped
struct QueuedGuard<'a>(&'a PoolCounters);

impl<'a> QueuedGuard<'a> {
    fn new(counters: &'a PoolCounters) -> Self {
        counters.queued.fetch_add(1, Ordering::Relaxed);
        Self(counters)
    }
}

impl Drop for QueuedGuard<'_> {
    fn drop(&mut self) {
        self.0.queued.fetch_sub(1, Ordering::Relaxed);
    }
}

/// A held slot; releases the permit and the in-flight count on drop
struct InFlightSlot {
    _permit: OwnedSemaphorePermit,
    counters: Arc<PoolCounters>,
}

impl InFlightSlot {
    fn new(permit: OwnedSemaphorePermit, counters: Arc<PoolCounters>) -> Self {
        counters.in_flight.fetch_add(1, Ordering::Relaxed);
        Self {
            _permit: permit,
            counters,
        }
    }
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Bounded pool for blocking ERP calls
#[derive(Debug)]
pub struct OffloadPool {
    semaphore: Arc<Semaphore>,
    config: PoolConfig,
    counters: Arc<PoolCounters>,
}

impl OffloadPool {
    pub fn new(config: PoolConfig) -> Self {
        let config = PoolConfig {
            max_in_flight: config.max_in_flight.max(1),
            ..config
        };
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_in_flight)),
            config,
            counters: Arc::new(PoolCounters::default()),
        }
    }

    /// Runs `call` on a blocking thread and waits for its result
    ///
    /// # Errors
    ///
    /// - `PoolClosed` if the pool was closed before a slot was obtained
    /// - `PoolSaturated` if no slot freed up within the queue timeout
    /// - `Timeout` if `timeout` elapsed before the call finished
    /// - `Worker` if the call panicked
    /// - whatever error `call` itself returns
    pub async fn run<F, T>(
        &self,
        operation: &str,
        timeout: Option<Duration>,
        call: F,
    ) -> Result<T, ErpError>
    where
        F: FnOnce() -> Result<T, ErpError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.acquire(operation).await?;
        let slot = InFlightSlot::new(permit, Arc::clone(&self.counters));

        debug!(operation, "Dispatching ERP call to blocking pool");
        let handle = tokio::task::spawn_blocking(move || {
            let _slot = slot;
            call()
        });

        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    self.counters.timed_out.fetch_add(1, Ordering::Relaxed);
                    let duration_ms = limit.as_millis() as u64;
                    warn!(operation, duration_ms, "ERP call timed out");
                    return Err(ErpError::Timeout {
                        operation: operation.to_string(),
                        duration_ms,
                    });
                }
            },
            None => handle.await,
        };

        self.counters.completed.fetch_add(1, Ordering::Relaxed);
        joined.map_err(|e| ErpError::Worker(e.to_string()))?
    }

    async fn acquire(&self, operation: &str) -> Result<OwnedSemaphorePermit, ErpError> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => return Ok(permit),
            Err(TryAcquireError::Closed) => return Err(self.reject_closed(operation)),
            Err(TryAcquireError::NoPermits) => {}
        }

        let _queued = QueuedGuard::new(&self.counters);
        let started = Instant::now();
        let acquire = Arc::clone(&self.semaphore).acquire_owned();

        let acquired = match self.config.queue_timeout {
            Some(limit) => match tokio::time::timeout(limit, acquire).await {
                Ok(acquired) => acquired,
                Err(_) => {
                    self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                    let waited_ms = started.elapsed().as_millis() as u64;
                    warn!(operation, waited_ms, "ERP pool saturated, rejecting call");
                    return Err(ErpError::PoolSaturated { waited_ms });
                }
            },
            None => acquire.await,
        };

        acquired.map_err(|_| self.reject_closed(operation))
    }

    fn reject_closed(&self, operation: &str) -> ErpError {
        self.counters.rejected.fetch_add(1, Ordering::Relaxed);
        debug!(operation, "ERP pool closed, rejecting call");
        ErpError::PoolClosed
    }

    /// Stops accepting work; running calls are not waited for
    pub fn close(&self) {
        if !self.semaphore.is_closed() {
            self.semaphore.close();
            info!(
                in_flight = self.counters.in_flight.load(Ordering::Relaxed),
                "ERP pool closed"
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub fn capacity(&self) -> usize {
        self.config.max_in_flight
    }

    /// Number of callers waiting for a slot
    pub fn queue_depth(&self) -> usize {
        self.counters.queued.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            capacity: self.config.max_in_flight,
            in_flight: self.counters.in_flight.load(Ordering::Relaxed),
            queued: self.counters.queued.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            timed_out: self.counters.timed_out.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            closed: self.semaphore.is_closed(),
        }
    }
}

impl Default for OffloadPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(max_in_flight: usize, queue_timeout: Option<Duration>) -> Arc<OffloadPool> {
        Arc::new(OffloadPool::new(PoolConfig {
            max_in_flight,
            queue_timeout,
        }))
    }

    #[tokio::test]
    async fn test_run_returns_call_result() {
        let pool = pool(2, None);
        let value = pool.run("answer", None, || Ok(42)).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(pool.metrics().completed, 1);
        assert_eq!(pool.metrics().in_flight, 0);
    }

    #[tokio::test]
    async fn test_call_error_is_propagated() {
        let pool = pool(2, None);
        let result: Result<(), _> = pool
            .run("failing", None, || Err(ErpError::transport("connection refused")))
            .await;
        assert!(matches!(result, Err(ErpError::Transport(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_flight_bound_is_respected() {
        let pool = pool(2, None);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                pool.run("slow", None, move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(30));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.metrics().completed, 8);
    }

    #[tokio::test]
    async fn test_call_timeout() {
        let pool = pool(2, None);
        let result = pool
            .run("hung", Some(Duration::from_millis(20)), || {
                std::thread::sleep(Duration::from_millis(300));
                Ok(())
            })
            .await;

        match result {
            Err(ErpError::Timeout { operation, duration_ms }) => {
                assert_eq!(operation, "hung");
                assert_eq!(duration_ms, 20);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(pool.metrics().timed_out, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_queue_timeout_rejects_when_saturated() {
        let pool = pool(1, Some(Duration::from_millis(20)));

        let busy = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                pool.run("busy", None, || {
                    std::thread::sleep(Duration::from_millis(300));
                    Ok(())
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let result = pool.run("waiting", None, || Ok(())).await;
        assert!(matches!(result, Err(ErpError::PoolSaturated { .. })));
        assert_eq!(pool.metrics().rejected, 1);

        busy.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_closed_pool_rejects_calls() {
        let pool = pool(2, None);
        pool.close();

        let result = pool.run("late", None, || Ok(())).await;
        assert!(matches!(result, Err(ErpError::PoolClosed)));
        assert!(pool.metrics().closed);
        assert_eq!(pool.metrics().rejected, 1);
    }

    #[tokio::test]
    async fn test_panicking_call_becomes_worker_error() {
        let pool = pool(1, None);
        let result: Result<(), _> = pool.run("panics", None, || panic!("boom")).await;
        assert!(matches!(result, Err(ErpError::Worker(_))));

        // the slot is released after the panic
        let value = pool.run("after", None, || Ok(1)).await.unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn test_zero_bound_is_clamped() {
        let pool = OffloadPool::new(PoolConfig {
            max_in_flight: 0,
            queue_timeout: None,
        });
        assert_eq!(pool.capacity(), 1);
    }
}
