//! Opaque references to host-owned resources
//!
//! A [`RemoteHandle`] is nothing more than a resource kind, the integer id
//! the host assigned, and the channel used to reach the host. It stores no
//! remote state; every call is a full round trip.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::{ApiError, ChannelError, RemoteChannel};

/// Class of resource a handle refers to
///
/// The kind decides the method prefix: a window's `get_buf` operation is
/// sent as `nvim_win_get_buf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Window,
    Tabpage,
}

impl ResourceKind {
    /// Prefix prepended to every operation on this kind
    pub fn api_prefix(self) -> &'static str {
        match self {
            ResourceKind::Buffer => "nvim_buf_",
            ResourceKind::Window => "nvim_win_",
            ResourceKind::Tabpage => "nvim_tabpage_",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Window => "window",
            ResourceKind::Tabpage => "tabpage",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can stand in for a handle id in an argument list
///
/// Setters accept a raw id as well as a proxy, the same way the host does.
pub trait HandleId {
    fn handle_id(&self) -> i64;
}

impl HandleId for i64 {
    fn handle_id(&self) -> i64 {
        *self
    }
}

impl<T: HandleId + ?Sized> HandleId for &T {
    fn handle_id(&self) -> i64 {
        (**self).handle_id()
    }
}

/// A typed, channel-bound reference to a host resource
///
/// Equality and hashing use only `kind` and `id`; two handles created on
/// different channel clones still compare equal.
#[derive(Clone)]
pub struct RemoteHandle {
    kind: ResourceKind,
    id: i64,
    channel: Arc<dyn RemoteChannel>,
}

impl RemoteHandle {
    pub fn new(kind: ResourceKind, id: i64, channel: Arc<dyn RemoteChannel>) -> Self {
        Self { kind, id, channel }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// The shared channel, for building sibling handles
    pub fn channel(&self) -> &Arc<dyn RemoteChannel> {
        &self.channel
    }

    /// Build a handle of another kind on the same channel
    pub fn sibling(&self, kind: ResourceKind, id: i64) -> RemoteHandle {
        RemoteHandle::new(kind, id, Arc::clone(&self.channel))
    }

    /// Full remote method name for `operation` on this kind
    pub fn method_name(&self, operation: &str) -> String {
        format!("{}{}", self.kind.api_prefix(), operation)
    }

    /// Send `operation` with this handle's id prepended to `args`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Remote` if the host rejects the call, carrying the
    /// full method name and argument list. Transport failures come back as
    /// `ApiError::Channel`. Nothing is retried.
    pub fn request(&self, operation: &str, args: Vec<Value>) -> Result<Value, ApiError> {
        let method = self.method_name(operation);

        let mut full_args = Vec::with_capacity(args.len() + 1);
        full_args.push(Value::from(self.id));
        full_args.extend(args);

        trace!(method = %method, args = full_args.len(), "remote request");

        match self.channel.request(&method, full_args.clone()) {
            Ok(value) => Ok(value),
            Err(ChannelError::Remote(payload)) => {
                debug!(method = %method, payload = %payload, "host rejected request");
                Err(ApiError::Remote {
                    method,
                    args: full_args,
                    payload,
                })
            }
            Err(source) => Err(ApiError::Channel { method, source }),
        }
    }

    /// Like [`request`](Self::request), decoding the result into `T`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the result does not fit `T`, in
    /// addition to the errors of `request`.
    pub fn request_as<T: DeserializeOwned>(
        &self,
        operation: &str,
        args: Vec<Value>,
    ) -> Result<T, ApiError> {
        let value = self.request(operation, args)?;
        serde_json::from_value(value).map_err(|source| ApiError::Decode {
            method: self.method_name(operation),
            source,
        })
    }

    /// Turn an argument into a remote value for `operation`
    pub fn encode<T: Serialize + ?Sized>(
        &self,
        operation: &str,
        arg: &T,
    ) -> Result<Value, ApiError> {
        serde_json::to_value(arg).map_err(|source| ApiError::Encode {
            method: self.method_name(operation),
            source,
        })
    }
}

impl HandleId for RemoteHandle {
    fn handle_id(&self) -> i64 {
        self.id
    }
}

impl PartialEq for RemoteHandle {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.id == other.id
    }
}

impl Eq for RemoteHandle {}

impl Hash for RemoteHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteHandle")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}
