use thiserror::Error;

/// Result type alias for wire-level operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while framing or parsing protocol lines.
#[derive(Debug, Error)]
pub enum ProtocolError {
	/// Line body was not valid JSON for the expected shape.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Outbound line did not start with a known tag.
	#[error("Unrecognized line tag: {0}")]
	UnknownTag(String),
}
