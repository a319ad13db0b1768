//! Error types for remote API operations

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Errors reported by a [`RemoteChannel`](crate::RemoteChannel)
///
/// `Remote` is the only variant that originates on the host; everything else
/// is a transport failure on the client side.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The host rejected the request
    ///
    /// The payload is passed through untouched. Neovim reports `[code, message]`.
    #[error("host rejected request: {0}")]
    Remote(Value),

    /// Neither `$NVIM` nor `$NVIM_LISTEN_ADDRESS` is set
    #[error("NVIM environment variable not set - is nvim running?")]
    SocketNotSet,

    /// The socket path does not exist
    #[error("nvim socket not found at {path}")]
    SocketNotFound { path: PathBuf },

    /// Failed to connect to the nvim socket
    #[error("Failed to connect to nvim socket at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to send request to nvim
    #[error("Failed to send request to nvim: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Failed to receive response from nvim
    #[error("Failed to receive response from nvim: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Failed to encode request as msgpack
    #[error("Failed to serialize request: {0}")]
    SerializeFailed(#[source] rmpv::encode::Error),

    /// Failed to decode a msgpack message from nvim
    #[error("Failed to deserialize response: {0}")]
    DeserializeFailed(#[source] rmpv::decode::Error),

    /// Connection was closed unexpectedly
    #[error("Connection to nvim closed unexpectedly")]
    ConnectionClosed,

    /// The peer sent a message that is not a well-formed response
    #[error("Protocol violation: {message}")]
    ProtocolViolation { message: String },

    /// Maximum retry attempts exceeded
    #[error("Failed to connect to nvim after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },
}

/// Errors surfaced by handles and proxies
#[derive(Debug, Error)]
pub enum ApiError {
    /// The host rejected the call (invalid handle, invalid argument, ...)
    #[error("{method} failed: {}", remote_message(.payload))]
    Remote {
        method: String,
        args: Vec<Value>,
        payload: Value,
    },

    /// A configuration field failed local validation; nothing was sent
    #[error("invalid window config field `{field}`: {message}")]
    ConfigValidation { field: &'static str, message: String },

    /// The result did not have the documented shape
    #[error("Failed to decode result of {method}: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    /// An argument could not be turned into a remote value
    #[error("Failed to encode arguments for {method}: {source}")]
    Encode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    /// The channel failed before the host could answer
    #[error("Transport failure during {method}: {source}")]
    Channel {
        method: String,
        #[source]
        source: ChannelError,
    },
}

impl ApiError {
    /// Remote method the failed call targeted, if one was attempted
    pub fn method(&self) -> Option<&str> {
        match self {
            ApiError::Remote { method, .. }
            | ApiError::Decode { method, .. }
            | ApiError::Encode { method, .. }
            | ApiError::Channel { method, .. } => Some(method),
            ApiError::ConfigValidation { .. } => None,
        }
    }

    /// Whether the host itself rejected the call
    pub fn is_remote(&self) -> bool {
        matches!(self, ApiError::Remote { .. })
    }
}

/// Extract a readable message from a host error payload
///
/// Neovim sends `[code, "message"]`; other hosts may send a bare string.
/// Anything else is rendered as JSON.
pub fn remote_message(payload: &Value) -> String {
    match payload {
        Value::String(message) => message.clone(),
        Value::Array(items) => match items.as_slice() {
            [_, Value::String(message)] => message.clone(),
            _ => payload.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_message_from_code_and_text() {
        let payload = json!([0, "Invalid window id: 9"]);
        assert_eq!(remote_message(&payload), "Invalid window id: 9");
    }

    #[test]
    fn test_remote_message_from_bare_string() {
        assert_eq!(remote_message(&json!("boom")), "boom");
    }

    #[test]
    fn test_remote_message_falls_back_to_json() {
        assert_eq!(remote_message(&json!({"code": 1})), r#"{"code":1}"#);
    }

    #[test]
    fn test_remote_error_display_names_method() {
        let err = ApiError::Remote {
            method: "nvim_win_get_buf".to_string(),
            args: vec![json!(9)],
            payload: json!([0, "Invalid window id: 9"]),
        };

        assert_eq!(err.to_string(), "nvim_win_get_buf failed: Invalid window id: 9");
        assert_eq!(err.method(), Some("nvim_win_get_buf"));
        assert!(err.is_remote());
    }

    #[test]
    fn test_validation_error_has_no_method() {
        let err = ApiError::ConfigValidation {
            field: "border",
            message: "expected 8 entries, got 3".to_string(),
        };

        assert_eq!(err.method(), None);
        assert!(!err.is_remote());
    }
}
