//! Command envelope and event notification payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A command as it appears on the wire.
///
/// The same envelope travels in both directions: the controller sends it
/// without `response`/`error`, the bridge echoes it back with one of them
/// filled in. Unknown fields are preserved so the echo is faithful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
	/// Correlation id chosen by the controller.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<Value>,
	/// Handler name (e.g. `property`, `invokeMethod`).
	pub name: String,
	/// Object space key the command operates on.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target: Option<String>,
	/// Positional parameters, still in raw JSON form.
	#[serde(default)]
	pub params: Vec<Value>,
	/// Handler result.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub response: Option<Value>,
	/// Failure message, set instead of `response` when the handler failed.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl CommandEnvelope {
	/// Parses a single inbound command line.
	pub fn from_line(line: &str) -> crate::Result<Self> {
		Ok(serde_json::from_str(line)?)
	}

	/// Returns the correlation id rendered as a plain string.
	///
	/// String ids are used verbatim, numbers use their JSON text.
	pub fn id_string(&self) -> Option<String> {
		match self.id.as_ref()? {
			Value::String(s) => Some(s.clone()),
			Value::Null => None,
			other => Some(other.to_string()),
		}
	}
}

/// Asynchronous notification that a native event fired on a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventNotification {
	/// Object space key of the object that raised the event.
	pub target: String,
	/// Event slot name, e.g. `onLoadFinished`.
	#[serde(rename = "type")]
	pub event: String,
	/// Arguments passed by the native side.
	pub args: Vec<Value>,
}
