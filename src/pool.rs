//! # Connection Pool
//!
//! Purpose: Bound the number of concurrently open store sessions and
//! amortize connection setup across calls.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: Keep a bounded set of reusable connections.
//! 2. **Minimal Locking**: The mutex guards only the idle list and the
//!    slot count; probes and dials run outside it.
//! 3. **Fail Fast**: Saturation returns `PoolExhausted` immediately rather
//!    than queueing borrowers.
//! 4. **Passive Reclamation**: Stale connections are detected on the next
//!    borrow (idle-age check plus a PING probe), not by a sweeper thread.
//!    A failed check discards the connection and attempts exactly one
//!    replacement dial before surfacing an error.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::store::{Conn, Reply, Store};

/// Pool tuning, copied out of [`Config`](crate::Config) at construction.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum idle connections kept for reuse.
    pub max_idle: usize,
    /// Maximum total connections (idle + on loan). 0 means unbounded.
    pub max_active: usize,
    /// Idle connections older than this are discarded on borrow.
    pub idle_timeout: Duration,
}

struct IdleConn<C> {
    conn: C,
    since: Instant,
}

struct PoolState<C> {
    idle: VecDeque<IdleConn<C>>,
    total: usize,
    closed: bool,
}

struct PoolInner<S: Store> {
    store: S,
    config: PoolConfig,
    state: Mutex<PoolState<S::Conn>>,
}

/// Shared handle to the pool. Cloning is cheap and all clones operate on
/// the same idle set.
pub struct Pool<S: Store> {
    inner: Arc<PoolInner<S>>,
}

impl<S: Store> Clone for Pool<S> {
    fn clone(&self) -> Self {
        Pool {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Store> Pool<S> {
    /// Creates an empty pool around the dial capability. No connection is
    /// opened here; the first borrow dials.
    pub fn new(store: S, config: PoolConfig) -> Self {
        let state = PoolState {
            idle: VecDeque::with_capacity(config.max_idle),
            total: 0,
            closed: false,
        };
        Pool {
            inner: Arc::new(PoolInner {
                store,
                config,
                state: Mutex::new(state),
            }),
        }
    }

    /// Borrows a connection, preferring a live idle one.
    ///
    /// An idle connection past `idle_timeout` or failing the PING probe is
    /// closed and replaced by exactly one fresh dial. With nothing idle,
    /// a new connection is dialed subject to `max_active`.
    pub fn borrow(&self) -> Result<PooledConn<S>> {
        if let Some(idle) = self.take_idle()? {
            let mut conn = idle.conn;
            if idle.since.elapsed() < self.inner.config.idle_timeout {
                match conn.ping() {
                    Ok(()) => {
                        trace!("reusing idle store connection");
                        return Ok(PooledConn::new(Arc::clone(&self.inner), conn));
                    }
                    Err(err) => {
                        debug!(%err, "idle connection failed liveness probe, redialing")
                    }
                }
            } else {
                debug!("idle connection exceeded idle_timeout, redialing");
            }
            self.discard(conn);
        }
        self.dial_new()
    }

    /// Closes every idle connection and marks the pool unusable. Further
    /// borrows fail with [`Error::PoolClosed`]. Idempotent.
    pub fn shutdown(&self) -> Result<()> {
        let drained = {
            let mut state = self.lock();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            state.total = state.total.saturating_sub(state.idle.len());
            std::mem::take(&mut state.idle)
        };

        debug!(idle = drained.len(), "shutting down connection pool");
        let mut first_err = None;
        for mut idle in drained {
            if let Err(err) = idle.conn.close() {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn dial_new(&self) -> Result<PooledConn<S>> {
        self.try_reserve()?;
        match self.inner.store.dial() {
            Ok(conn) => Ok(PooledConn::new(Arc::clone(&self.inner), conn)),
            Err(err) => {
                self.release_slot();
                Err(err)
            }
        }
    }

    fn take_idle(&self) -> Result<Option<IdleConn<S::Conn>>> {
        let mut state = self.lock();
        if state.closed {
            return Err(Error::PoolClosed);
        }
        Ok(state.idle.pop_front())
    }

    fn try_reserve(&self) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(Error::PoolClosed);
        }
        let max = self.inner.config.max_active;
        if max > 0 && state.total >= max {
            return Err(Error::PoolExhausted);
        }
        state.total += 1;
        Ok(())
    }

    fn release_slot(&self) {
        let mut state = self.lock();
        state.total = state.total.saturating_sub(1);
    }

    fn discard(&self, mut conn: S::Conn) {
        if let Err(err) = conn.close() {
            trace!(%err, "error closing discarded connection");
        }
        self.release_slot();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolState<S::Conn>> {
        self.inner.state.lock().expect("pool mutex poisoned")
    }
}

/// RAII guard for a borrowed connection.
///
/// Dropping the guard returns the connection to the idle set, or closes it
/// when the pool is full, shut down, or the connection saw an I/O or
/// protocol failure. Every exit path, panics included, releases the slot.
pub struct PooledConn<S: Store> {
    pool: Arc<PoolInner<S>>,
    conn: Option<S::Conn>,
    healthy: bool,
}

impl<S: Store> PooledConn<S> {
    fn new(pool: Arc<PoolInner<S>>, conn: S::Conn) -> Self {
        PooledConn {
            pool,
            conn: Some(conn),
            healthy: true,
        }
    }

    /// Executes one command on the borrowed connection. An I/O or protocol
    /// failure poisons the connection so it is not re-pooled; store error
    /// replies leave it reusable.
    pub fn execute(&mut self, command: &str, args: &[&[u8]]) -> Result<Reply> {
        let conn = self.conn.as_mut().expect("connection present until drop");
        let result = conn.execute(command, args);
        if matches!(result, Err(Error::Io(_)) | Err(Error::Protocol)) {
            self.healthy = false;
        }
        result
    }
}

impl<S: Store> Drop for PooledConn<S> {
    fn drop(&mut self) {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => return,
        };
        let pool = Pool {
            inner: Arc::clone(&self.pool),
        };

        if !self.healthy {
            pool.discard(conn);
            return;
        }

        let rejected = {
            let mut state = pool.lock();
            if !state.closed && state.idle.len() < pool.inner.config.max_idle {
                state.idle.push_back(IdleConn {
                    conn,
                    since: Instant::now(),
                });
                None
            } else {
                state.total = state.total.saturating_sub(1);
                Some(conn)
            }
        };

        if let Some(mut conn) = rejected {
            if let Err(err) = conn.close() {
                trace!(%err, "error closing surplus connection");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeState {
        dials: AtomicUsize,
        closes: AtomicUsize,
        fail_dial: AtomicBool,
        fail_ping: AtomicBool,
    }

    #[derive(Clone, Default)]
    struct FakeStore {
        state: Arc<FakeState>,
    }

    struct FakeConn {
        state: Arc<FakeState>,
    }

    impl Store for FakeStore {
        type Conn = FakeConn;

        fn dial(&self) -> Result<FakeConn> {
            if self.state.fail_dial.load(Ordering::SeqCst) {
                return Err(Error::Connectivity("fake store down".into()));
            }
            self.state.dials.fetch_add(1, Ordering::SeqCst);
            Ok(FakeConn {
                state: Arc::clone(&self.state),
            })
        }
    }

    impl Conn for FakeConn {
        fn execute(&mut self, command: &str, _args: &[&[u8]]) -> Result<Reply> {
            if command == "PING" && self.state.fail_ping.load(Ordering::SeqCst) {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "stale connection",
                )));
            }
            if command == "FAIL" {
                return Err(Error::Store("ERR operation against wrong type".into()));
            }
            if command == "BOOM" {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "peer reset",
                )));
            }
            Ok(Reply::Simple("OK".into()))
        }

        fn close(&mut self) -> Result<()> {
            self.state.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn pool_with(store: &FakeStore, max_idle: usize, max_active: usize) -> Pool<FakeStore> {
        Pool::new(
            store.clone(),
            PoolConfig {
                max_idle,
                max_active,
                idle_timeout: Duration::from_secs(240),
            },
        )
    }

    #[test]
    fn reuses_idle_connection() {
        let store = FakeStore::default();
        let pool = pool_with(&store, 2, 4);

        drop(pool.borrow().unwrap());
        drop(pool.borrow().unwrap());
        assert_eq!(store.state.dials.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_idle_connection_is_replaced() {
        let store = FakeStore::default();
        let pool = Pool::new(
            store.clone(),
            PoolConfig {
                max_idle: 2,
                max_active: 4,
                idle_timeout: Duration::ZERO,
            },
        );

        drop(pool.borrow().unwrap());
        drop(pool.borrow().unwrap());
        assert_eq!(store.state.dials.load(Ordering::SeqCst), 2);
        assert_eq!(store.state.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_probe_triggers_one_replacement_dial() {
        let store = FakeStore::default();
        let pool = pool_with(&store, 2, 4);

        drop(pool.borrow().unwrap());
        store.state.fail_ping.store(true, Ordering::SeqCst);

        let conn = pool.borrow().unwrap();
        drop(conn);
        assert_eq!(store.state.dials.load(Ordering::SeqCst), 2);
        assert_eq!(store.state.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn saturated_pool_fails_fast() {
        let store = FakeStore::default();
        let pool = pool_with(&store, 1, 1);

        let held = pool.borrow().unwrap();
        assert!(matches!(pool.borrow(), Err(Error::PoolExhausted)));
        drop(held);

        // Slot freed on drop, borrowing works again.
        assert!(pool.borrow().is_ok());
    }

    #[test]
    fn zero_max_active_is_unbounded() {
        let store = FakeStore::default();
        let pool = pool_with(&store, 1, 0);

        let a = pool.borrow().unwrap();
        let b = pool.borrow().unwrap();
        let c = pool.borrow().unwrap();
        assert_eq!(store.state.dials.load(Ordering::SeqCst), 3);
        drop((a, b, c));
    }

    #[test]
    fn surplus_idle_connection_is_closed_on_return() {
        let store = FakeStore::default();
        let pool = pool_with(&store, 1, 0);

        let a = pool.borrow().unwrap();
        let b = pool.borrow().unwrap();
        drop(a);
        drop(b);
        assert_eq!(store.state.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn io_failure_poisons_connection() {
        let store = FakeStore::default();
        let pool = pool_with(&store, 2, 4);

        let mut conn = pool.borrow().unwrap();
        assert!(conn.execute("BOOM", &[]).is_err());
        drop(conn);
        assert_eq!(store.state.closes.load(Ordering::SeqCst), 1);

        drop(pool.borrow().unwrap());
        assert_eq!(store.state.dials.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn store_error_reply_keeps_connection() {
        let store = FakeStore::default();
        let pool = pool_with(&store, 2, 4);

        let mut conn = pool.borrow().unwrap();
        assert!(matches!(conn.execute("FAIL", &[]), Err(Error::Store(_))));
        drop(conn);
        drop(pool.borrow().unwrap());
        assert_eq!(store.state.dials.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dial_failure_releases_reserved_slot() {
        let store = FakeStore::default();
        let pool = pool_with(&store, 1, 1);

        store.state.fail_dial.store(true, Ordering::SeqCst);
        assert!(matches!(pool.borrow(), Err(Error::Connectivity(_))));

        store.state.fail_dial.store(false, Ordering::SeqCst);
        assert!(pool.borrow().is_ok());
    }

    #[test]
    fn shutdown_closes_idle_and_rejects_borrow() {
        let store = FakeStore::default();
        let pool = pool_with(&store, 2, 4);

        drop(pool.borrow().unwrap());
        pool.shutdown().unwrap();
        assert_eq!(store.state.closes.load(Ordering::SeqCst), 1);
        assert!(matches!(pool.borrow(), Err(Error::PoolClosed)));

        // Idempotent.
        pool.shutdown().unwrap();
    }

    #[test]
    fn connection_returned_after_shutdown_is_closed() {
        let store = FakeStore::default();
        let pool = pool_with(&store, 2, 4);

        let held = pool.borrow().unwrap();
        pool.shutdown().unwrap();
        drop(held);
        assert_eq!(store.state.closes.load(Ordering::SeqCst), 1);
    }
}
