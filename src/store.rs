//! # Store Capability
//!
//! Purpose: Model the remote key-value backend as an explicit, injectable
//! capability so the client core can be exercised without a live server.
//!
//! ## Design Principles
//! 1. **Narrow Seam**: `Store` dials, `Conn` executes one command per round
//!    trip. Nothing else leaks through.
//! 2. **Sentinel Over Special-Casing**: A missing key surfaces as
//!    [`Reply::Nil`]; typed conversions turn it into [`Error::NotFound`]
//!    exactly once, at the conversion site.
//! 3. **Default Implementation Included**: [`TcpStore`] speaks RESP2 over a
//!    plain TCP stream for Redis-compatible servers.

use std::io::{BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::resp;

/// One decoded reply from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK` style status line.
    Simple(String),
    /// `:123` integer reply.
    Integer(i64),
    /// Bulk string payload.
    Bulk(Vec<u8>),
    /// Null bulk string: the key does not exist.
    Nil,
    /// Multi-element reply.
    Array(Vec<Reply>),
}

impl Reply {
    /// Converts a bulk reply into its bytes. `Nil` becomes
    /// [`Error::NotFound`], anything else [`Error::UnexpectedReply`].
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Reply::Bulk(data) => Ok(data),
            Reply::Nil => Err(Error::NotFound),
            _ => Err(Error::UnexpectedReply),
        }
    }

    /// Converts a bulk or status reply into a `String`.
    pub fn into_string(self) -> Result<String> {
        match self {
            Reply::Simple(text) => Ok(text),
            Reply::Bulk(data) => {
                String::from_utf8(data).map_err(|_| Error::UnexpectedReply)
            }
            Reply::Nil => Err(Error::NotFound),
            _ => Err(Error::UnexpectedReply),
        }
    }

    /// Converts an integer reply.
    pub fn into_integer(self) -> Result<i64> {
        match self {
            Reply::Integer(value) => Ok(value),
            Reply::Nil => Err(Error::NotFound),
            _ => Err(Error::UnexpectedReply),
        }
    }

    /// True for the not-found sentinel.
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }
}

/// Dial capability for the remote store.
pub trait Store: Send + Sync + 'static {
    type Conn: Conn;

    /// Opens a new session. Failures must map to [`Error::Connectivity`].
    fn dial(&self) -> Result<Self::Conn>;
}

/// One network session to the store.
pub trait Conn: Send {
    /// Issues `command` with `args` and decodes the reply. Server error
    /// replies come back as [`Error::Store`].
    fn execute(&mut self, command: &str, args: &[&[u8]]) -> Result<Reply>;

    /// Closes the session. Called by the pool when a connection is
    /// evicted; errors are logged, not propagated to borrowers.
    fn close(&mut self) -> Result<()>;

    /// Lightweight liveness probe used on borrow and at construction.
    fn ping(&mut self) -> Result<()> {
        match self.execute("PING", &[])? {
            Reply::Simple(_) | Reply::Bulk(_) => Ok(()),
            _ => Err(Error::UnexpectedReply),
        }
    }
}

/// RESP2-over-TCP store for Redis-compatible servers.
#[derive(Debug, Clone)]
pub struct TcpStore {
    addr: String,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl TcpStore {
    pub fn new(addr: impl Into<String>) -> Self {
        TcpStore {
            addr: addr.into(),
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }

    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }
}

impl Store for TcpStore {
    type Conn = TcpConn;

    fn dial(&self) -> Result<TcpConn> {
        let addr: SocketAddr = self
            .addr
            .parse()
            .map_err(|_| Error::InvalidAddress(self.addr.clone()))?;

        let stream = match self.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        }
        .map_err(|err| Error::Connectivity(format!("{}: {}", self.addr, err)))?;

        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        // Disable Nagle; commands are small and latency-sensitive.
        stream.set_nodelay(true)?;

        tracing::debug!(addr = %self.addr, "dialed store connection");
        Ok(TcpConn {
            reader: BufReader::new(stream),
            write_buf: Vec::with_capacity(256),
            scratch: Vec::with_capacity(128),
        })
    }
}

/// A single TCP session with per-connection reusable buffers.
pub struct TcpConn {
    reader: BufReader<TcpStream>,
    write_buf: Vec<u8>,
    scratch: Vec<u8>,
}

impl Conn for TcpConn {
    fn execute(&mut self, command: &str, args: &[&[u8]]) -> Result<Reply> {
        self.write_buf.clear();
        resp::encode_command(command, args, &mut self.write_buf);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buf)?;
        stream.flush()?;

        resp::read_reply(&mut self.reader, &mut self.scratch)
    }

    fn close(&mut self) -> Result<()> {
        // NotConnected just means the peer beat us to it.
        match self.reader.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_converts_to_bytes() {
        assert_eq!(Reply::Bulk(b"v".to_vec()).into_bytes().unwrap(), b"v");
    }

    #[test]
    fn nil_converts_to_not_found() {
        assert!(Reply::Nil.into_bytes().unwrap_err().is_not_found());
        assert!(Reply::Nil.into_string().unwrap_err().is_not_found());
        assert!(Reply::Nil.into_integer().unwrap_err().is_not_found());
    }

    #[test]
    fn mismatched_reply_is_unexpected() {
        assert!(matches!(
            Reply::Integer(1).into_bytes(),
            Err(Error::UnexpectedReply)
        ));
    }

    #[test]
    fn bad_address_is_rejected_before_dialing() {
        let store = TcpStore::new("not-an-address");
        assert!(matches!(store.dial(), Err(Error::InvalidAddress(_))));
    }
}
