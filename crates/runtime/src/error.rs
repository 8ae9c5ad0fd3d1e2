//! Error types for the bridge runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding or executing commands.
#[derive(Debug, Error)]
pub enum Error {
	/// Command name is not in the dispatch table.
	#[error("Unknown command: {0}")]
	UnknownCommand(String),

	/// No object is registered under the key.
	#[error("Object not found: {key}")]
	ObjectNotFound { key: String },

	/// The target has neither a callable property nor a native method by that name.
	#[error("Method not found: {key}.{method}")]
	MethodNotFound { key: String, method: String },

	/// Parameters missing or of the wrong shape.
	#[error("Invalid params for {command}: {reason}")]
	InvalidParams { command: String, reason: String },

	/// A `function ...` string that could not be turned into a closure.
	#[error("Malformed callable: {reason}")]
	MalformedCallable { reason: String },

	/// Failure raised while evaluating a remote closure.
	#[error("{kind}: {message}")]
	Script { kind: &'static str, message: String },

	/// Failure reported by a capability object.
	#[error("{0}")]
	Capability(String),

	/// Inbound line was not valid JSON.
	#[error("Decode error: {0}")]
	Decode(#[from] serde_json::Error),

	/// Wire framing error.
	#[error("Protocol error: {0}")]
	Protocol(#[from] bridge_protocol::ProtocolError),

	/// I/O error on the channel.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Internal channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,
}

impl Error {
	pub(crate) fn invalid_params(command: &str, reason: impl Into<String>) -> Self {
		Error::InvalidParams {
			command: command.to_string(),
			reason: reason.into(),
		}
	}

	pub(crate) fn type_error(message: impl Into<String>) -> Self {
		Error::Script {
			kind: "TypeError",
			message: message.into(),
		}
	}

	/// Returns true for failures raised while a handler ran.
	///
	/// These are reported to the controller as the command's `error`; the
	/// remaining variants concern the channel itself.
	pub fn is_handler_failure(&self) -> bool {
		match self {
			Error::ObjectNotFound { .. }
			| Error::MethodNotFound { .. }
			| Error::InvalidParams { .. }
			| Error::MalformedCallable { .. }
			| Error::Script { .. }
			| Error::Capability(_) => true,
			Error::UnknownCommand(_)
			| Error::Decode(_)
			| Error::Protocol(_)
			| Error::Io(_)
			| Error::ChannelClosed => false,
		}
	}
}
