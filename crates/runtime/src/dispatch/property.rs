//! Get/set handlers: `property`, `setting`, `windowProperty`, `defineMethod`.
//!
//! All three getters share one shape: `[name]` reads, `[name, value]` writes
//! and answers without a response field.

use super::Completion;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::marshal::bind_out_params;
use crate::runtime::Runtime;
use crate::value::Value;

/// `property`: `[name]`, `[name, value]`, or `[name, callback, ...extraArgs]`.
///
/// A callback is bound to the target with `extraArgs` appended to every
/// call; object-shaped extra args are registered as out-parameters first.
pub(super) fn property(rt: &mut Runtime, command: &mut Command) -> Result<Completion> {
	let target = command.target()?.to_string();
	let name = command.str_param(0, "property name")?.to_string();

	let Some(value) = command.param(1).cloned() else {
		command.response = Some(rt.get_property(&target, &name)?);
		return Ok(Completion::Now);
	};

	let value = match value {
		Value::Callable(callback) => {
			let extra = bind_out_params(rt.space_mut(), command.params[2..].to_vec());
			tracing::debug!(
				target: "bridge.dispatch",
				key = %target,
				property = %name,
				extra = extra.len(),
				"binding callable property"
			);
			Value::Callable(callback.bind(Value::Ref(target.clone()), extra))
		}
		other => other,
	};
	rt.set_property(&target, &name, value)?;
	Ok(Completion::Now)
}

/// `setting`: same contract as `property`, scoped to the settings namespace.
pub(super) fn setting(rt: &mut Runtime, command: &mut Command) -> Result<Completion> {
	let target = command.target()?.to_string();
	let name = command.str_param(0, "setting name")?.to_string();

	match command.param(1).cloned() {
		None => command.response = Some(rt.setting(&target, &name)?),
		Some(value) => rt.set_setting(&target, &name, value)?,
	}
	Ok(Completion::Now)
}

/// `windowProperty`: get/set on the process-wide window namespace.
pub(super) fn window_property(rt: &mut Runtime, command: &mut Command) -> Result<Completion> {
	let name = command.str_param(0, "window property name")?.to_string();

	match command.param(1).cloned() {
		None => command.response = Some(rt.global(&name)?),
		Some(value) => rt.set_global(&name, value)?,
	}
	Ok(Completion::Now)
}

/// `defineMethod`: stores a value or function as a property, unbound.
pub(super) fn define_method(rt: &mut Runtime, command: &mut Command) -> Result<Completion> {
	let target = command.target()?.to_string();
	let name = command.str_param(0, "method name")?.to_string();
	let value = command
		.param(1)
		.cloned()
		.ok_or_else(|| Error::invalid_params(&command.name, "missing method body"))?;

	rt.set_property(&target, &name, value)?;
	Ok(Completion::Now)
}
