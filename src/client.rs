//! # Client Façade
//!
//! Purpose: Tie identity, pool, and namespacing together behind one compact
//! API for issuing commands against a shared store.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `Client` hides pooling and wire details; every
//!    call is one borrow, one round trip, one release.
//! 2. **Fail Fast at Construction**: A synchronous PING probe runs before
//!    `new` returns, so an unreachable store is reported immediately
//!    instead of on first use.
//! 3. **No Hidden Retries**: Transient failures surface to the caller
//!    unchanged; the only re-dial is the pool's single replacement of a
//!    dead idle connection.

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::namespace::KeyNamer;
use crate::pool::{Pool, PoolConfig};
use crate::serialize::{JsonSerializer, Serializer};
use crate::store::{Reply, Store, TcpStore};

/// Namespaced, pooled client for a shared key-value store.
///
/// Generic over the [`Store`] and [`Serializer`] capabilities; production
/// code uses the defaults (RESP2 over TCP, JSON), tests inject fakes.
pub struct Client<S: Store = TcpStore, Z: Serializer = JsonSerializer> {
    pub(crate) config: Config,
    pub(crate) namer: KeyNamer,
    pub(crate) serializer: Z,
    pool: Pool<S>,
}

impl Client<TcpStore, JsonSerializer> {
    /// Connects to a Redis-compatible server at `addr`
    /// (e.g. `"127.0.0.1:6379"`).
    ///
    /// Fails with [`Error::Connectivity`] when the store is unreachable;
    /// no command is attempted past the construction probe.
    pub fn new(addr: impl Into<String>, config: Config) -> Result<Self> {
        let store = TcpStore::new(addr)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .write_timeout(config.write_timeout);
        Self::with_store(store, JsonSerializer, config)
    }
}

impl<S: Store, Z: Serializer> Client<S, Z> {
    /// Builds a client around injected capabilities. Used directly by
    /// tests and by callers bringing their own store or encoding.
    pub fn with_store(store: S, serializer: Z, config: Config) -> Result<Self> {
        let pool = Pool::new(
            store,
            PoolConfig {
                max_idle: config.max_idle,
                max_active: config.max_active,
                idle_timeout: config.idle_timeout,
            },
        );

        // One synchronous probe so an unreachable store fails construction
        // rather than the first command.
        probe(&pool).map_err(|err| match err {
            err @ Error::Connectivity(_) => err,
            other => Error::Connectivity(other.to_string()),
        })?;

        debug!(name = %config.name, version = %config.version, "client connected");
        let namer = KeyNamer::new(&config.name, &config.version, &config.separator);
        Ok(Client {
            config,
            namer,
            serializer,
            pool,
        })
    }

    /// Issues `command` against the qualified form of `key`.
    ///
    /// The key is prefixed to `name:version:key` and sent as the command's
    /// first argument, followed by `args`. Exactly one connection is
    /// borrowed and released per call, on every exit path.
    pub fn execute(&self, command: &str, key: &str, args: &[&[u8]]) -> Result<Reply> {
        let qualified = self.namer.prefix(key);

        let mut full_args: Vec<&[u8]> = Vec::with_capacity(args.len() + 1);
        full_args.push(qualified.as_bytes());
        full_args.extend_from_slice(args);

        let mut conn = self.pool.borrow()?;
        conn.execute(command, &full_args)
    }

    /// Qualifies `key` with the client identity: `name:version:key`.
    pub fn prefix(&self, key: &str) -> String {
        self.namer.prefix(key)
    }

    /// Scopes `key` under `origin`: `origin:key`. Passed through
    /// [`execute`](Self::execute) this yields `name:version:origin:key`.
    pub fn with_origin(&self, origin: &str, key: &str) -> String {
        self.namer.with_origin(origin, key)
    }

    /// True when `err` is the store's "key does not exist" sentinel.
    pub fn is_not_found(&self, err: &Error) -> bool {
        err.is_not_found()
    }

    /// Closes all idle connections and rejects further operations.
    pub fn shutdown(&self) -> Result<()> {
        self.pool.shutdown()
    }
}

fn probe<S: Store>(pool: &Pool<S>) -> Result<()> {
    let mut conn = pool.borrow()?;
    match conn.execute("PING", &[])? {
        Reply::Simple(_) | Reply::Bulk(_) => Ok(()),
        _ => Err(Error::UnexpectedReply),
    }
}
