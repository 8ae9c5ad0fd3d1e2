//! Decoded command as seen by handlers.

use bridge_protocol::CommandEnvelope;

use crate::error::{Error, Result};
use crate::value::Value;

/// A command whose parameters have been revived into [`Value`]s.
///
/// Handlers fill in `response` (or the loop fills in `error`); the whole
/// command is echoed back on completion.
#[derive(Debug, Clone, Default)]
pub struct Command {
	pub id: Option<serde_json::Value>,
	pub name: String,
	pub target: Option<String>,
	pub params: Vec<Value>,
	pub response: Option<Value>,
	pub error: Option<String>,
	/// Unknown envelope fields, echoed unchanged.
	pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Command {
	/// Builds a command from a wire envelope and already-revived parameters.
	pub(crate) fn from_envelope(envelope: CommandEnvelope, params: Vec<Value>) -> Self {
		Self {
			id: envelope.id,
			name: envelope.name,
			target: envelope.target,
			params,
			response: None,
			error: None,
			extra: envelope.extra,
		}
	}

	/// Returns the target key, failing when the command has none.
	pub fn target(&self) -> Result<&str> {
		self.target
			.as_deref()
			.ok_or_else(|| Error::invalid_params(&self.name, "missing target"))
	}

	/// Correlation id as a plain string; see [`CommandEnvelope::id_string`].
	pub fn id_string(&self) -> Option<String> {
		match self.id.as_ref()? {
			serde_json::Value::String(s) => Some(s.clone()),
			serde_json::Value::Null => None,
			other => Some(other.to_string()),
		}
	}

	pub fn param(&self, index: usize) -> Option<&Value> {
		self.params.get(index)
	}

	/// Required string parameter at `index`.
	pub fn str_param(&self, index: usize, what: &str) -> Result<&str> {
		self.params
			.get(index)
			.and_then(Value::as_str)
			.ok_or_else(|| Error::invalid_params(&self.name, format!("expected {what} as string parameter {index}")))
	}

	/// Wire form, with callables flattened to `null`.
	pub fn to_envelope(&self) -> CommandEnvelope {
		CommandEnvelope {
			id: self.id.clone(),
			name: self.name.clone(),
			target: self.target.clone(),
			params: self.params.iter().map(Value::to_json).collect(),
			response: self.response.as_ref().map(Value::to_json),
			error: self.error.clone(),
			extra: self.extra.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn missing_target_is_invalid_params() {
		let command = Command {
			name: "property".to_string(),
			..Default::default()
		};
		let err = command.target().unwrap_err();
		assert!(matches!(err, Error::InvalidParams { ref command, .. } if command == "property"));
	}

	#[test]
	fn envelope_carries_response_and_extra_fields() {
		let mut extra = serde_json::Map::new();
		extra.insert("trace".to_string(), json!("abc"));
		let command = Command {
			id: Some(json!(4)),
			name: "invokeMethod".to_string(),
			target: Some("page$1".to_string()),
			params: vec![Value::from("title")],
			response: Some(Value::from("Example")),
			extra,
			..Default::default()
		};

		let wire = serde_json::to_value(command.to_envelope()).unwrap();
		assert_eq!(
			wire,
			json!({
				"id": 4,
				"name": "invokeMethod",
				"target": "page$1",
				"params": ["title"],
				"response": "Example",
				"trace": "abc"
			})
		);
	}

	#[test]
	fn string_param_reports_position() {
		let command = Command {
			name: "property".to_string(),
			params: vec![Value::from(1i64)],
			..Default::default()
		};
		let err = command.str_param(0, "property name").unwrap_err();
		assert!(err.to_string().contains("property name"), "got {err}");
	}
}
