//! Value marshaling: inbound JSON to runtime [`Value`]s.
//!
//! Decoding revives `function (...) { ... }` strings into remote closures at
//! any nesting depth. The transform pass and out-parameter binding run later,
//! once the runtime is available.

mod transform;

use std::sync::Arc;

use bridge_protocol::CommandEnvelope;

pub use transform::{TransformMarker, bind_out_params, resolve_transforms};

use crate::callable::Callable;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::script::RemoteClosure;
use crate::value::Value;

/// Result of decoding one command line.
#[derive(Debug)]
pub struct Decoded {
	pub command: Command,
	/// Set when a parameter could not be revived.
	///
	/// The command is still returned (with inert parameters) so the failure
	/// can be reported against its id.
	pub rejection: Option<Error>,
}

/// Parses a command line and revives its parameters.
///
/// Fails only when the line is not a JSON command object.
pub fn decode(line: &str) -> Result<Decoded> {
	let mut envelope: CommandEnvelope = serde_json::from_str(line)?;
	let raw = std::mem::take(&mut envelope.params);

	let revived = raw.iter().cloned().map(revive).collect::<Result<Vec<_>>>();
	Ok(match revived {
		Ok(params) => Decoded {
			command: Command::from_envelope(envelope, params),
			rejection: None,
		},
		Err(err) => {
			let params = raw.into_iter().map(Value::from).collect();
			Decoded {
				command: Command::from_envelope(envelope, params),
				rejection: Some(err),
			}
		}
	})
}

/// Converts JSON into a [`Value`], turning closure candidates into callables.
pub fn revive(json: serde_json::Value) -> Result<Value> {
	match json {
		serde_json::Value::String(text) if RemoteClosure::is_candidate(&text) => {
			let closure = RemoteClosure::parse(&text)?;
			tracing::trace!(target: "bridge.marshal", signature = %closure.signature(), "revived closure");
			Ok(Value::Callable(Callable::Remote(Arc::new(closure))))
		}
		serde_json::Value::Array(items) => Ok(Value::Array(
			items.into_iter().map(revive).collect::<Result<Vec<_>>>()?,
		)),
		serde_json::Value::Object(map) => {
			let mut out = crate::value::Map::with_capacity(map.len());
			for (key, value) in map {
				out.insert(key, revive(value)?);
			}
			Ok(Value::Object(out))
		}
		other => Ok(Value::from(other)),
	}
}
