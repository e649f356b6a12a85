// Rust guideline compliant 2026-10-18

//! Redis adapter for the `Storage` port.
//!
//! Speaks RESP2 over a single `tokio::net::TcpStream`. The stream is dialed
//! by [`Storage::connect`] and again by the first call after a failure
//! dropped it. Every network step is bounded by [`RedisConfig::timeout`]:
//!
//! - a command timeout is logged at `error` and reads as "no value" / no-op;
//! - a dial failure, timeout included, returns `StorageError::ConnectionFailed`;
//! - an I/O failure drops the stream and returns
//!   `StorageError::ConnectionFailed`;
//! - an error reply or malformed data returns `StorageError::Protocol`.

use std::io;
use std::time::Duration;

use domain::{Storage, StorageError, decode_value, encode_value};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncReadExt as _, AsyncWriteExt as _, BufStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Default per-step network timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Largest bulk string accepted from the server (Redis `proto-max-bulk-len`).
const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

// ---------------------------------------------------------------------------
// RedisConfig + builder
// ---------------------------------------------------------------------------

/// The supplied Redis configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid redis configuration: {reason}")]
pub struct InvalidRedisConfig {
    /// Human-readable description of the problem.
    pub reason: String,
}

/// Where and how to reach the Redis server.
///
/// Construct via [`RedisConfig::builder`].
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Bound on each connect, write and read step.
    pub timeout: Duration,
}

/// Builder for [`RedisConfig`].
///
/// Obtain via [`RedisConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct RedisConfigBuilder {
    host: String,
    port: u16,
    timeout: Duration,
}

impl RedisConfig {
    /// Create a builder for `host:port`.
    ///
    /// Default values: `timeout = 3 s`.
    #[must_use]
    pub fn builder(host: impl Into<String>, port: u16) -> RedisConfigBuilder {
        RedisConfigBuilder { host: host.into(), port, timeout: DEFAULT_TIMEOUT }
    }
}

impl RedisConfigBuilder {
    /// Override the per-step timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRedisConfig`] when the host is empty or the timeout is zero.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<RedisConfig, InvalidRedisConfig> {
        if self.host.is_empty() {
            return Err(InvalidRedisConfig { reason: "host must not be empty".to_owned() });
        }
        if self.timeout.is_zero() {
            return Err(InvalidRedisConfig { reason: "timeout must be > 0".to_owned() });
        }
        Ok(RedisConfig { host: self.host, port: self.port, timeout: self.timeout })
    }
}

// ---------------------------------------------------------------------------
// RESP2 codec
// ---------------------------------------------------------------------------

/// One RESP2 reply. Array replies are never requested and not decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Option<Vec<u8>>),
}

fn encode_command(args: &[&[u8]]) -> Vec<u8> {
    let mut out = format!("*{}\r\n", args.len()).into_bytes();
    for arg in args {
        out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        out.extend_from_slice(arg);
        out.extend_from_slice(b"\r\n");
    }
    out
}

fn invalid(reason: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, reason.into())
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<String> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line).await? == 0 {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    if !line.ends_with(b"\r\n") {
        return Err(invalid("reply line not terminated by CRLF"));
    }
    line.truncate(line.len() - 2);
    String::from_utf8(line).map_err(|e| invalid(e.to_string()))
}

async fn read_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Reply> {
    let line = read_line(reader).await?;
    let Some(kind) = line.chars().next() else {
        return Err(invalid("empty reply line"));
    };
    let rest = &line[kind.len_utf8()..];
    let integer = |s: &str| s.parse::<i64>().map_err(|e| invalid(format!("bad integer {s:?}: {e}")));
    match kind {
        '+' => Ok(Reply::Simple(rest.to_owned())),
        '-' => Ok(Reply::Error(rest.to_owned())),
        ':' => Ok(Reply::Integer(integer(rest)?)),
        '$' => {
            let Ok(len) = usize::try_from(integer(rest)?) else {
                return Ok(Reply::Bulk(None));
            };
            if len > MAX_BULK_LEN {
                return Err(invalid(format!("bulk length {len} exceeds {MAX_BULK_LEN}")));
            }
            let mut data = vec![0; len + 2];
            reader.read_exact(&mut data).await?;
            if !data.ends_with(b"\r\n") {
                return Err(invalid("bulk string not terminated by CRLF"));
            }
            data.truncate(len);
            Ok(Reply::Bulk(Some(data)))
        }
        other => Err(invalid(format!("unsupported reply type {other:?}"))),
    }
}

// ---------------------------------------------------------------------------
// RedisStorage
// ---------------------------------------------------------------------------

type Connection = BufStream<TcpStream>;

/// `Storage` adapter talking to a Redis server.
///
/// Holds at most one connection, created by [`Storage::connect`] (never by
/// the constructor). Calls are serialized on that connection.
#[derive(Debug)]
pub struct RedisStorage {
    config: RedisConfig,
    conn: Mutex<Option<Connection>>,
}

impl RedisStorage {
    /// Create an unconnected adapter.
    #[must_use]
    pub fn new(config: RedisConfig) -> Self {
        Self { config, conn: Mutex::new(None) }
    }

    async fn dial(&self) -> Result<Connection, StorageError> {
        let addr = (self.config.host.as_str(), self.config.port);
        match tokio::time::timeout(self.config.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                tracing::debug!(host = %self.config.host, port = self.config.port, "redis.connected");
                Ok(BufStream::new(stream))
            }
            Ok(Err(e)) => Err(StorageError::ConnectionFailed { reason: e.to_string() }),
            Err(_) => Err(StorageError::ConnectionFailed { reason: "connect timed out".to_owned() }),
        }
    }

    /// Send one command and read its reply. `Ok(None)` means the exchange
    /// timed out.
    async fn execute(&self, op: &'static str, args: &[&[u8]]) -> Result<Option<Reply>, StorageError> {
        let mut slot = self.conn.lock().await;
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => self.dial().await?,
        };
        let exchange = async {
            conn.write_all(&encode_command(args)).await?;
            conn.flush().await?;
            read_reply(&mut conn).await
        };
        let outcome = tokio::time::timeout(self.config.timeout, exchange).await;
        match outcome {
            Ok(Ok(Reply::Error(message))) => {
                *slot = Some(conn);
                Err(StorageError::Protocol { reason: message })
            }
            Ok(Ok(reply)) => {
                *slot = Some(conn);
                Ok(Some(reply))
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::error!(op, error = %e, "redis.protocol");
                Err(StorageError::Protocol { reason: e.to_string() })
            }
            Ok(Err(e)) => {
                tracing::warn!(op, error = %e, "redis.connection.lost");
                Err(StorageError::ConnectionFailed { reason: e.to_string() })
            }
            Err(_) => {
                // The late reply would desynchronize the stream; drop it.
                let timeout_ms = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::error!(op, timeout_ms, "redis.timeout");
                Ok(None)
            }
        }
    }
}

fn unexpected(op: &str, reply: &Reply) -> StorageError {
    StorageError::Protocol { reason: format!("unexpected {op} reply: {reply:?}") }
}

impl Storage for RedisStorage {
    async fn connect(&self) -> Result<(), StorageError> {
        let conn = self.dial().await?;
        *self.conn.lock().await = Some(conn);
        tracing::info!(host = %self.config.host, port = self.config.port, "redis.connect");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match self.execute("get", &[b"GET", key.as_bytes()]).await? {
            None | Some(Reply::Bulk(None)) => Ok(None),
            Some(Reply::Bulk(Some(data))) => Ok(Some(decode_value(String::from_utf8_lossy(&data).into_owned()))),
            Some(other) => Err(unexpected("get", &other)),
        }
    }

    async fn set(&self, key: &str, value: &Value, expires: Option<Duration>) -> Result<(), StorageError> {
        let text = encode_value(value);
        let millis = expires.map(|ttl| ttl.as_millis().max(1).to_string());
        let mut args: Vec<&[u8]> = vec![b"SET".as_slice(), key.as_bytes(), text.as_bytes()];
        if let Some(millis) = &millis {
            args.extend([b"PX".as_slice(), millis.as_bytes()]);
        }
        match self.execute("set", &args).await? {
            None | Some(Reply::Simple(_)) => Ok(()),
            Some(other) => Err(unexpected("set", &other)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self.execute("delete", &[b"DEL", key.as_bytes()]).await? {
            None | Some(Reply::Integer(_)) => Ok(()),
            Some(other) => Err(unexpected("delete", &other)),
        }
    }

    async fn close(&self) {
        if self.conn.lock().await.take().is_some() {
            tracing::info!(host = %self.config.host, port = self.config.port, "redis.close");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
