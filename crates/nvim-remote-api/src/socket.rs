//! Unix socket channel
//!
//! Speaks msgpack-rpc, the protocol of nvim's `--listen` socket:
//!
//! - request: `[0, msgid, method, args]`
//! - response: `[1, msgid, error, result]`
//! - notification: `[2, method, args]` (skipped while waiting for a response)
//!
//! Payloads are converted to and from `serde_json::Value` at this boundary.
//! Buffer, window and tabpage handles arrive as msgpack ext values and are
//! decoded to their integer ids. A non-null `error` is surfaced as
//! [`ChannelError::Remote`].

use std::io::{BufReader, ErrorKind, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread::sleep;
use std::time::Duration;

use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::{ChannelError, RemoteChannel};

/// Default number of connection retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Initial delay between retry attempts (100ms)
const INITIAL_RETRY_DELAY_MS: u64 = 100;

/// Maximum delay between retry attempts (1 second)
const MAX_RETRY_DELAY_MS: u64 = 1000;

/// Set by nvim for processes it spawns
const NVIM_SOCKET_ENV: &str = "NVIM";

/// Older name of `$NVIM`
const NVIM_LISTEN_ADDRESS_ENV: &str = "NVIM_LISTEN_ADDRESS";

const MSG_REQUEST: u64 = 0;
const MSG_RESPONSE: u64 = 1;
const MSG_NOTIFICATION: u64 = 2;

/// Discover the nvim socket path from the environment
///
/// Reads `$NVIM`, falling back to `$NVIM_LISTEN_ADDRESS`, and checks that
/// the path exists.
///
/// # Errors
///
/// Returns `ChannelError::SocketNotSet` if neither variable is set.
/// Returns `ChannelError::SocketNotFound` if the path doesn't exist.
pub fn get_socket_path() -> Result<PathBuf, ChannelError> {
    socket_path_from(|key| std::env::var(key).ok())
}

fn socket_path_from(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf, ChannelError> {
    let socket_path_str = lookup(NVIM_SOCKET_ENV)
        .or_else(|| lookup(NVIM_LISTEN_ADDRESS_ENV))
        .ok_or(ChannelError::SocketNotSet)?;

    let socket_path = PathBuf::from(&socket_path_str);

    if !socket_path.exists() {
        return Err(ChannelError::SocketNotFound { path: socket_path });
    }

    Ok(socket_path)
}

#[derive(Debug)]
struct Connection {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
    next_msgid: u64,
}

/// Channel to nvim over a Unix domain socket
///
/// One request is in flight at a time; the connection lock is held from
/// write to matching response, so the channel can be shared across threads.
#[derive(Debug)]
pub struct SocketChannel {
    connection: Mutex<Connection>,
    socket_path: PathBuf,
}

impl SocketChannel {
    /// Connect to the socket named by `$NVIM`
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::SocketNotSet` if `$NVIM` is not set.
    /// Returns `ChannelError::SocketNotFound` if the socket path doesn't exist.
    /// Returns `ChannelError::ConnectionFailed` if the connection fails.
    pub fn connect() -> Result<Self, ChannelError> {
        let socket_path = get_socket_path()?;
        Self::connect_to(socket_path)
    }

    /// Connect to an explicit socket path
    pub fn connect_to(socket_path: impl Into<PathBuf>) -> Result<Self, ChannelError> {
        let socket_path = socket_path.into();

        if !socket_path.exists() {
            return Err(ChannelError::SocketNotFound { path: socket_path });
        }

        let connection_failed = |source| ChannelError::ConnectionFailed {
            path: socket_path.clone(),
            source,
        };

        let writer = UnixStream::connect(&socket_path).map_err(connection_failed)?;
        let reader = writer.try_clone().map_err(connection_failed)?;

        Ok(Self {
            connection: Mutex::new(Connection {
                reader: BufReader::new(reader),
                writer,
                next_msgid: 0,
            }),
            socket_path,
        })
    }

    /// Attempt to connect with retry logic and exponential backoff
    ///
    /// `socket_path` of `None` means discover it from the environment.
    ///
    /// # Backoff Strategy
    ///
    /// - Initial delay: 100ms
    /// - Each retry: delay *= 2
    /// - Maximum delay: 1 second (capped)
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::SocketNotSet` immediately if discovery has
    /// nothing to go on. Returns `ChannelError::MaxRetriesExceeded` if all
    /// attempts fail.
    pub fn connect_with_retry(
        socket_path: Option<&Path>,
        max_retries: u32,
    ) -> Result<Self, ChannelError> {
        let mut attempt = 0;
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;
        let mut last_error: Option<ChannelError> = None;

        loop {
            attempt += 1;

            let result = match socket_path {
                Some(path) => Self::connect_to(path),
                None => Self::connect(),
            };

            match result {
                Ok(channel) => return Ok(channel),
                Err(e) => {
                    if matches!(e, ChannelError::SocketNotSet) {
                        return Err(e);
                    }

                    last_error = Some(e);

                    if attempt > max_retries {
                        break;
                    }

                    warn!(
                        attempt = attempt,
                        max_retries = max_retries,
                        delay_ms = delay_ms,
                        "nvim connection failed, retrying..."
                    );

                    sleep(Duration::from_millis(delay_ms));

                    delay_ms = (delay_ms * 2).min(MAX_RETRY_DELAY_MS);
                }
            }
        }

        warn!(
            attempts = attempt,
            last_error = ?last_error,
            "Failed to connect to nvim after all retry attempts"
        );

        Err(ChannelError::MaxRetriesExceeded { attempts: attempt })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

fn violation(message: impl Into<String>) -> ChannelError {
    ChannelError::ProtocolViolation {
        message: message.into(),
    }
}

fn to_msgpack(value: &Value) -> rmpv::Value {
    match value {
        Value::Null => rmpv::Value::Nil,
        Value::Bool(b) => rmpv::Value::from(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                rmpv::Value::from(i)
            } else if let Some(u) = n.as_u64() {
                rmpv::Value::from(u)
            } else {
                rmpv::Value::from(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => rmpv::Value::from(s.as_str()),
        Value::Array(items) => rmpv::Value::Array(items.iter().map(to_msgpack).collect()),
        Value::Object(map) => rmpv::Value::Map(
            map.iter()
                .map(|(k, v)| (rmpv::Value::from(k.as_str()), to_msgpack(v)))
                .collect(),
        ),
    }
}

fn from_msgpack(value: rmpv::Value) -> Result<Value, ChannelError> {
    Ok(match value {
        rmpv::Value::Nil => Value::Null,
        rmpv::Value::Boolean(b) => Value::Bool(b),
        rmpv::Value::Integer(i) => match (i.as_i64(), i.as_u64()) {
            (Some(v), _) => Value::from(v),
            (None, Some(v)) => Value::from(v),
            (None, None) => return Err(violation(format!("integer out of range: {}", i))),
        },
        rmpv::Value::F32(f) => Number::from_f64(f64::from(f)).map_or(Value::Null, Value::Number),
        rmpv::Value::F64(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        rmpv::Value::String(s) => Value::String(
            s.into_str()
                .ok_or_else(|| violation("string is not valid UTF-8"))?,
        ),
        rmpv::Value::Binary(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        rmpv::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_msgpack)
                .collect::<Result<_, _>>()?,
        ),
        rmpv::Value::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, value) in entries {
                let key = match from_msgpack(key)? {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                map.insert(key, from_msgpack(value)?);
            }
            Value::Object(map)
        }
        // Buffer, Window and Tabpage: the ext payload is the msgpack-encoded id
        rmpv::Value::Ext(kind, data) => match rmpv::decode::read_value(&mut data.as_slice()) {
            Ok(rmpv::Value::Integer(id)) => from_msgpack(rmpv::Value::Integer(id))?,
            _ => return Err(violation(format!("ext type {} does not hold a handle id", kind))),
        },
    })
}

impl RemoteChannel for SocketChannel {
    fn request(&self, method: &str, args: Vec<Value>) -> Result<Value, ChannelError> {
        let mut connection = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let msgid = connection.next_msgid;
        connection.next_msgid += 1;

        let message = rmpv::Value::Array(vec![
            rmpv::Value::from(MSG_REQUEST),
            rmpv::Value::from(msgid),
            rmpv::Value::from(method),
            rmpv::Value::Array(args.iter().map(to_msgpack).collect()),
        ]);
        let mut request_bytes = Vec::new();
        rmpv::encode::write_value(&mut request_bytes, &message)
            .map_err(ChannelError::SerializeFailed)?;

        connection
            .writer
            .write_all(&request_bytes)
            .map_err(ChannelError::SendFailed)?;
        connection
            .writer
            .flush()
            .map_err(ChannelError::SendFailed)?;

        loop {
            let message = match rmpv::decode::read_value(&mut connection.reader) {
                Ok(rmpv::Value::Array(items)) => items,
                Ok(other) => return Err(violation(format!("unexpected message: {}", other))),
                Err(rmpv::decode::Error::InvalidMarkerRead(e))
                    if e.kind() == ErrorKind::UnexpectedEof =>
                {
                    return Err(ChannelError::ConnectionClosed);
                }
                Err(e) => return Err(ChannelError::DeserializeFailed(e)),
            };

            match message.first().and_then(rmpv::Value::as_u64) {
                Some(MSG_NOTIFICATION) => {
                    debug!(
                        method = ?message.get(1).and_then(rmpv::Value::as_str),
                        "skipping notification while awaiting response"
                    );
                    continue;
                }
                Some(MSG_RESPONSE) => {}
                _ => {
                    return Err(violation(format!(
                        "unexpected message: {}",
                        rmpv::Value::Array(message)
                    )))
                }
            }

            let [_, reply_id, error, result]: [rmpv::Value; 4] = message
                .try_into()
                .map_err(|_| violation("response must have 4 elements"))?;

            // Only one request is in flight, so any other id is a leftover
            // nobody is waiting for.
            if reply_id.as_u64() != Some(msgid) {
                warn!(
                    expected = msgid,
                    got = %reply_id,
                    "discarding response to another request"
                );
                continue;
            }

            if !error.is_nil() {
                return Err(ChannelError::Remote(from_msgpack(error)?));
            }

            return from_msgpack(result);
        }
    }
}
