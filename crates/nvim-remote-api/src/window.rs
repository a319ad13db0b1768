//! Proxy for a host window
//!
//! Every accessor is a pass-through: one request, the result unpacked into
//! its documented shape, nothing remembered. Once the host closes a window
//! [`Window::is_valid`] turns false for good and all other calls are
//! rejected by the host.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::{ApiError, HandleId, RemoteChannel, RemoteHandle, ResourceKind, WindowConfig};

/// A remote window
///
/// Cheap to clone; clones share the channel and compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Window {
    handle: RemoteHandle,
}

impl Window {
    /// Wrap a window id the host handed out
    pub fn new(id: i64, channel: Arc<dyn RemoteChannel>) -> Self {
        Self {
            handle: RemoteHandle::new(ResourceKind::Window, id, channel),
        }
    }

    /// View a generic handle as a window
    ///
    /// Returns `None` if the handle is of another kind.
    pub fn from_handle(handle: RemoteHandle) -> Option<Self> {
        (handle.kind() == ResourceKind::Window).then_some(Self { handle })
    }

    pub fn id(&self) -> i64 {
        self.handle.id()
    }

    pub fn handle(&self) -> &RemoteHandle {
        &self.handle
    }

    /// The buffer currently displayed in the window
    pub fn buffer(&self) -> Result<RemoteHandle, ApiError> {
        let id: i64 = self.handle.request_as("get_buf", vec![])?;
        Ok(self.handle.sibling(ResourceKind::Buffer, id))
    }

    /// Display another buffer in the window
    pub fn set_buffer(&self, buffer: impl HandleId) -> Result<(), ApiError> {
        self.handle
            .request("set_buf", vec![json!(buffer.handle_id())])
            .map(drop)
    }

    /// Cursor as (row, col); row is 1-based, col is 0-based
    pub fn cursor(&self) -> Result<(i64, i64), ApiError> {
        self.handle.request_as("get_cursor", vec![])
    }

    pub fn set_cursor(&self, (row, col): (i64, i64)) -> Result<(), ApiError> {
        self.handle
            .request("set_cursor", vec![json!([row, col])])
            .map(drop)
    }

    /// Height in rows
    pub fn height(&self) -> Result<i64, ApiError> {
        self.handle.request_as("get_height", vec![])
    }

    pub fn set_height(&self, height: i64) -> Result<(), ApiError> {
        self.handle
            .request("set_height", vec![json!(height)])
            .map(drop)
    }

    /// Width in columns
    pub fn width(&self) -> Result<i64, ApiError> {
        self.handle.request_as("get_width", vec![])
    }

    pub fn set_width(&self, width: i64) -> Result<(), ApiError> {
        self.handle.request("set_width", vec![json!(width)]).map(drop)
    }

    /// 0-based on-screen (row, col) in display cells
    ///
    /// Use this instead of [`row`](Self::row) and [`col`](Self::col) when
    /// both are needed; it costs a single round trip.
    pub fn position(&self) -> Result<(i64, i64), ApiError> {
        self.handle.request_as("get_position", vec![])
    }

    /// 0-based screen row of the window's top edge
    pub fn row(&self) -> Result<i64, ApiError> {
        self.position().map(|(row, _)| row)
    }

    /// 0-based screen column of the window's left edge
    pub fn col(&self) -> Result<i64, ApiError> {
        self.position().map(|(_, col)| col)
    }

    /// The tabpage containing the window
    pub fn tabpage(&self) -> Result<RemoteHandle, ApiError> {
        let id: i64 = self.handle.request_as("get_tabpage", vec![])?;
        Ok(self.handle.sibling(ResourceKind::Tabpage, id))
    }

    /// Whether the window still exists
    pub fn is_valid(&self) -> Result<bool, ApiError> {
        self.handle.request_as("is_valid", vec![])
    }

    /// Window number as shown by `winnr()`
    pub fn number(&self) -> Result<i64, ApiError> {
        self.handle.request_as("get_number", vec![])
    }

    /// Close the window
    ///
    /// With `force` the host discards unsaved changes instead of refusing.
    pub fn close(&self, force: bool) -> Result<(), ApiError> {
        self.handle.request("close", vec![json!(force)]).map(drop)
    }

    /// Close the window, hiding the buffer it shows instead of unloading it
    pub fn hide(&self) -> Result<(), ApiError> {
        self.handle.request("hide", vec![]).map(drop)
    }

    /// Current placement as reported by the host
    pub fn config(&self) -> Result<WindowConfig, ApiError> {
        self.handle.request_as("get_config", vec![])
    }

    /// Reconfigure the window
    ///
    /// Only the fields set in `config` are sent.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ConfigValidation` without contacting the host if
    /// the border is malformed. Everything else is judged by the host.
    pub fn set_config(&self, config: &WindowConfig) -> Result<(), ApiError> {
        config.validate()?;
        let payload: Value = self.handle.encode("set_config", config)?;
        self.handle.request("set_config", vec![payload]).map(drop)
    }
}

impl HandleId for Window {
    fn handle_id(&self) -> i64 {
        self.handle.id()
    }
}
