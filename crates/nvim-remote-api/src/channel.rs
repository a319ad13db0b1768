//! The request/response seam between proxies and the host

use std::sync::Arc;

use serde_json::Value;

use crate::ChannelError;

/// Synchronous request/response transport to the host
///
/// Implementations own all serialization of concurrent callers; proxies
/// built on top hold no mutable state and call `request` from any thread.
///
/// - In production: [`SocketChannel`](crate::SocketChannel)
/// - In tests: an in-memory host that answers from a table
pub trait RemoteChannel: Send + Sync {
    /// Invoke `method` with positional `args` and wait for the result
    ///
    /// Host-side rejections come back as [`ChannelError::Remote`] carrying
    /// the host's payload unchanged. Timeouts, if any, belong to the
    /// implementation.
    fn request(&self, method: &str, args: Vec<Value>) -> Result<Value, ChannelError>;
}

impl<C: RemoteChannel + ?Sized> RemoteChannel for Arc<C> {
    fn request(&self, method: &str, args: Vec<Value>) -> Result<Value, ChannelError> {
        (**self).request(method, args)
    }
}

impl<C: RemoteChannel + ?Sized> RemoteChannel for Box<C> {
    fn request(&self, method: &str, args: Vec<Value>) -> Result<Value, ChannelError> {
        (**self).request(method, args)
    }
}
