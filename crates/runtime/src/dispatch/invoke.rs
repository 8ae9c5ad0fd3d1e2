use super::Completion;
use crate::callable::Callable;
use crate::command::Command;
use crate::error::Result;
use crate::runtime::Runtime;
use crate::value::Value;

/// `invokeMethod`: `[methodName, ...args]`, answered with the return value.
pub(super) fn invoke_method(rt: &mut Runtime, command: &mut Command) -> Result<Completion> {
	let target = command.target()?.to_string();
	let method = command.str_param(0, "method name")?.to_string();
	let args = command.params[1..].to_vec();

	command.response = Some(rt.invoke_method(&target, &method, args)?);
	Ok(Completion::Now)
}

/// `invokeAsyncMethod`: like `invokeMethod` with a trailing completion callback.
///
/// The command is answered when the callback runs, with its first argument
/// as the response. Each call of the callback writes one response line.
pub(super) fn invoke_async_method(rt: &mut Runtime, command: &mut Command) -> Result<Completion> {
	let target = command.target()?.to_string();
	let method = command.str_param(0, "method name")?.to_string();

	let pending = command.clone();
	let done = Callable::native(move |rt, args| {
		let mut finished = pending.clone();
		finished.response = Some(args.into_iter().next().unwrap_or_default());
		rt.complete(&finished);
		Ok(Value::Null)
	});

	let mut args = command.params[1..].to_vec();
	args.push(Value::Callable(done));
	rt.invoke_method(&target, &method, args)?;
	Ok(Completion::Deferred)
}

/// `noop`: succeeds with no response.
pub(super) fn noop(_rt: &mut Runtime, _command: &mut Command) -> Result<Completion> {
	Ok(Completion::Now)
}
