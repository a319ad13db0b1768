//! Client-side proxies for Neovim's remote API
//!
//! This crate maps locally held handles onto the host's RPC methods. It
//! provides:
//! - A `RemoteChannel` trait: the synchronous request/response seam
//! - `RemoteHandle`: a resource kind and id bound to a channel
//! - `Window`: accessors and operations for host windows
//! - `WindowConfig`: the floating-window placement schema
//!
//! ## Architecture
//!
//! A call on a proxy builds a method name from the resource prefix and the
//! operation (`nvim_win_` + `get_cursor`), prepends the handle id to the
//! arguments, and hands both to the channel. Nothing is cached: every
//! accessor is a round trip, and host rejections are returned to the caller
//! unchanged as `ApiError::Remote`.
//!
//! ## Transport
//!
//! `SocketChannel` speaks msgpack-rpc over the Unix socket found via
//! `$NVIM`. Any other transport only needs to implement
//! `RemoteChannel`.

mod channel;
pub mod compat;
mod config;
mod error;
mod handle;
mod socket;
mod window;

#[cfg(test)]
mod mock;

pub use channel::RemoteChannel;
pub use config::{
    Anchor, Border, BorderChar, BorderPreset, Coordinate, Relative, Style, WindowConfig,
    MANUAL_BORDER_LEN,
};
pub use error::{remote_message, ApiError, ChannelError};
pub use handle::{HandleId, RemoteHandle, ResourceKind};
pub use socket::{get_socket_path, SocketChannel, DEFAULT_MAX_RETRIES};
pub use window::Window;
