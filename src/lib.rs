//! # nskv — Namespaced KV Client
//!
//! Purpose: Give independent tenants isolated key spaces within one shared
//! Redis-compatible store, with connection pooling and a typed object
//! layer on top.
//!
//! ## Design Principles
//! 1. **Deterministic Namespacing**: Every key is qualified as
//!    `name:version[:origin]:key`, so tenants sharing a store never
//!    collide and key shapes stay predictable.
//! 2. **Object Pool Pattern**: Connections are reused through a bounded
//!    pool with liveness-checked borrowing and passive idle eviction.
//! 3. **Explicit Capabilities**: The store backend and the serialization
//!    format are injected traits, substitutable in tests without a
//!    network dependency.
//! 4. **Absence Is Not Failure**: A missing key is a classified sentinel,
//!    not a propagated error; only real faults reach the caller.
//!
//! ## Example
//! ```no_run
//! use nskv::{Client, Config};
//!
//! # fn main() -> nskv::Result<()> {
//! let client = Client::new("127.0.0.1:6379", Config::new("app", "0.1"))?;
//! client.save_object("tenantA", "counters", &vec![1u32, 2, 3])?;
//!
//! let mut counters: Vec<u32> = Vec::new();
//! client.get_object("tenantA", "counters", &mut counters)?;
//! // Key on the wire: "app:0.1:tenantA:counters"
//! client.shutdown()?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod namespace;
mod object;
mod pool;
mod resp;
mod serialize;
mod store;

pub use client::Client;
pub use config::{Config, DEFAULT_SEPARATOR, DEFAULT_SETTINGS_KEY};
pub use error::{Error, Result};
pub use namespace::KeyNamer;
pub use serialize::{JsonSerializer, Serializer};
pub use store::{Conn, Reply, Store, TcpStore};
