use super::Completion;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::marshal::bind_out_params;
use crate::runtime::Runtime;
use crate::value::Value;

/// Reads the `type` field of the `{type, event?, args?}` descriptor.
fn event_type(command: &Command) -> Result<String> {
	command
		.param(0)
		.and_then(|descriptor| descriptor.get("type"))
		.and_then(Value::as_str)
		.map(str::to_string)
		.ok_or_else(|| Error::invalid_params(&command.name, "expected {type} descriptor"))
}

/// `addEvent`: subscribes `event` (bound to the target, trailing `args`).
///
/// Unsupported event names are ignored.
pub(super) fn add_event(rt: &mut Runtime, command: &mut Command) -> Result<Completion> {
	let target = command.target()?.to_string();
	let event = event_type(command)?;

	if !rt.config().supports_event(&target, &event) {
		tracing::debug!(target: "bridge.events", key = %target, event = %event, "unsupported event ignored");
		return Ok(Completion::Now);
	}

	let descriptor = command.param(0).cloned().unwrap_or_default();
	let listener = match descriptor.get("event") {
		Some(Value::Callable(callback)) => {
			let args = descriptor
				.get("args")
				.and_then(Value::as_array)
				.cloned()
				.unwrap_or_default();
			let args = bind_out_params(rt.space_mut(), args);
			Some(callback.clone().bind(Value::Ref(target.clone()), args))
		}
		_ => None,
	};

	rt.add_listener(&target, &event, listener)?;
	Ok(Completion::Now)
}

/// `removeEvent`: detaches bookkeeping and the native slot.
///
/// Unsupported event names are ignored, as in `addEvent`.
pub(super) fn remove_event(rt: &mut Runtime, command: &mut Command) -> Result<Completion> {
	let target = command.target()?.to_string();
	let event = event_type(command)?;

	if !rt.config().supports_event(&target, &event) {
		tracing::debug!(target: "bridge.events", key = %target, event = %event, "unsupported event ignored");
		return Ok(Completion::Now);
	}

	rt.remove_listener(&target, &event)?;
	Ok(Completion::Now)
}
